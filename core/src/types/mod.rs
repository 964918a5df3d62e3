//! Domain DTOs for the XMS API.
//!
//! # Design
//! Request types are closed structs: a field name that does not exist is a
//! compile error, not a runtime guard. Result families that share an
//! endpoint but differ by `type` are enums decoded through
//! `decode::Discriminated`.

pub mod batch;
pub mod callback;
pub mod group;
pub mod inbound;
pub mod parameters;
pub mod report;

pub use batch::{
    MtBatchBinarySmsCreate, MtBatchBinarySmsResult, MtBatchBinarySmsUpdate, MtBatchSmsCreate,
    MtBatchSmsResult, MtBatchSmsResultBase, MtBatchSmsUpdate, MtBatchTextSmsCreate,
    MtBatchTextSmsResult, MtBatchTextSmsUpdate,
};
pub use callback::CallbackEvent;
pub use group::{GroupAutoUpdate, GroupCreate, GroupResult, GroupUpdate, KeywordPair, Tags, TagsUpdate};
pub use inbound::{MoBinarySms, MoSms, MoSmsBase, MoTextSms};
pub use parameters::{ParameterValues, Parameters};
pub use report::{
    BatchDeliveryReport, DeliveryReportQuery, DeliveryReportStatus, DeliveryStatus, RecipientDeliveryReport,
    ReportType,
};
