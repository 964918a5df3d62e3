//! Outbound (mobile-terminated) batch types.
//!
//! # Design
//! Creates and updates are closed structs wrapped in internally tagged enums,
//! so the `type` discriminator is always written and no field outside the
//! struct can ever reach the wire. Results are decoded through the
//! `Discriminated` dispatcher instead of serde's tagged-enum support so an
//! unknown `type` surfaces as `ApiError::UnexpectedShape`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::codec;
use crate::decode::{decode_value, Discriminated, PageItem};
use crate::encode::{self, Encode};
use crate::error::ApiError;
use crate::tristate::{self, UpdateValue};
use crate::types::parameters::Parameters;
use crate::types::report::ReportType;

/// A new text batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MtBatchTextSmsCreate {
    pub from: String,
    pub to: Vec<String>,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_report: Option<ReportType>,
    #[serde(with = "codec::timestamp::option", skip_serializing_if = "Option::is_none")]
    pub send_at: Option<DateTime<Utc>>,
    #[serde(with = "codec::timestamp::option", skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_reference: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Parameters::is_empty")]
    pub parameters: Parameters,
}

impl MtBatchTextSmsCreate {
    pub fn new(from: impl Into<String>, to: Vec<String>, body: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to,
            body: body.into(),
            ..Self::default()
        }
    }
}

/// A new binary batch. `body` travels as base64, `udh` as hex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MtBatchBinarySmsCreate {
    pub from: String,
    pub to: Vec<String>,
    #[serde(with = "codec::base64_bytes")]
    pub body: Vec<u8>,
    #[serde(with = "codec::hex_bytes")]
    pub udh: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_report: Option<ReportType>,
    #[serde(with = "codec::timestamp::option", skip_serializing_if = "Option::is_none")]
    pub send_at: Option<DateTime<Utc>>,
    #[serde(with = "codec::timestamp::option", skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_reference: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl MtBatchBinarySmsCreate {
    pub fn new(from: impl Into<String>, to: Vec<String>, body: Vec<u8>, udh: Vec<u8>) -> Self {
        Self {
            from: from.into(),
            to,
            body,
            udh,
            ..Self::default()
        }
    }
}

/// Request body for creating or replacing a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum MtBatchSmsCreate {
    #[serde(rename = "mt_text")]
    Text(MtBatchTextSmsCreate),
    #[serde(rename = "mt_binary")]
    Binary(MtBatchBinarySmsCreate),
}

impl From<MtBatchTextSmsCreate> for MtBatchSmsCreate {
    fn from(batch: MtBatchTextSmsCreate) -> Self {
        MtBatchSmsCreate::Text(batch)
    }
}

impl From<MtBatchBinarySmsCreate> for MtBatchSmsCreate {
    fn from(batch: MtBatchBinarySmsCreate) -> Self {
        MtBatchSmsCreate::Binary(batch)
    }
}

impl Encode for MtBatchSmsCreate {
    fn validate(&self) -> Result<(), ApiError> {
        match self {
            MtBatchSmsCreate::Text(batch) => {
                encode::require_non_empty("from", &batch.from)?;
                encode::require_recipients("to", &batch.to)?;
                encode::require_parameters(&batch.parameters)
            }
            MtBatchSmsCreate::Binary(batch) => {
                encode::require_non_empty("from", &batch.from)?;
                encode::require_recipients("to", &batch.to)?;
                if batch.udh.is_empty() {
                    return Err(ApiError::Encoding("binary batch requires a udh".to_string()));
                }
                Ok(())
            }
        }
    }
}

// The service default for `delivery_report` is `none`, which is sent
// explicitly instead of `null`.
fn serialize_report_update<S: Serializer>(
    value: &UpdateValue<ReportType>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    tristate::serialize_with_reset_marker(value, &ReportType::None, serializer)
}

/// Changes to a text batch. Unset fields keep their server-side value.
///
/// `body` can be replaced but never reset; the service has no default body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MtBatchTextSmsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_add: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_remove: Vec<String>,
    #[serde(
        default,
        skip_serializing_if = "UpdateValue::is_unset",
        serialize_with = "serialize_report_update"
    )]
    pub delivery_report: UpdateValue<ReportType>,
    #[serde(default, skip_serializing_if = "UpdateValue::is_unset", with = "codec::timestamp::update")]
    pub send_at: UpdateValue<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "UpdateValue::is_unset", with = "codec::timestamp::update")]
    pub expire_at: UpdateValue<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "UpdateValue::is_unset")]
    pub callback_url: UpdateValue<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "UpdateValue::is_unset")]
    pub parameters: UpdateValue<Parameters>,
}

/// Changes to a binary batch. Unset fields keep their server-side value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MtBatchBinarySmsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_add: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_remove: Vec<String>,
    #[serde(
        default,
        skip_serializing_if = "UpdateValue::is_unset",
        serialize_with = "serialize_report_update"
    )]
    pub delivery_report: UpdateValue<ReportType>,
    #[serde(default, skip_serializing_if = "UpdateValue::is_unset", with = "codec::timestamp::update")]
    pub send_at: UpdateValue<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "UpdateValue::is_unset", with = "codec::timestamp::update")]
    pub expire_at: UpdateValue<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "UpdateValue::is_unset")]
    pub callback_url: UpdateValue<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "codec::base64_bytes::option")]
    pub body: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "codec::hex_bytes::option")]
    pub udh: Option<Vec<u8>>,
}

/// Request body for updating a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MtBatchSmsUpdate {
    #[serde(rename = "mt_text")]
    Text(MtBatchTextSmsUpdate),
    #[serde(rename = "mt_binary")]
    Binary(MtBatchBinarySmsUpdate),
}

impl From<MtBatchTextSmsUpdate> for MtBatchSmsUpdate {
    fn from(update: MtBatchTextSmsUpdate) -> Self {
        MtBatchSmsUpdate::Text(update)
    }
}

impl From<MtBatchBinarySmsUpdate> for MtBatchSmsUpdate {
    fn from(update: MtBatchBinarySmsUpdate) -> Self {
        MtBatchSmsUpdate::Binary(update)
    }
}

impl Encode for MtBatchSmsUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        let (from, to_add, to_remove) = match self {
            MtBatchSmsUpdate::Text(u) => (&u.from, &u.to_add, &u.to_remove),
            MtBatchSmsUpdate::Binary(u) => (&u.from, &u.to_add, &u.to_remove),
        };
        if let Some(from) = from {
            encode::require_non_empty("from", from)?;
        }
        encode::require_no_blank("to_add", to_add)?;
        encode::require_no_blank("to_remove", to_remove)?;
        match self {
            MtBatchSmsUpdate::Text(u) => match &u.parameters {
                UpdateValue::Value(parameters) => encode::require_parameters(parameters),
                _ => Ok(()),
            },
            MtBatchSmsUpdate::Binary(u) => match &u.udh {
                Some(udh) if udh.is_empty() => {
                    Err(ApiError::Encoding("udh must not be empty".to_string()))
                }
                _ => Ok(()),
            },
        }
    }
}

/// Fields shared by every batch result. Optional fields are `None` when the
/// service left them out.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MtBatchSmsResultBase {
    pub id: String,
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub canceled: bool,
    #[serde(default)]
    pub delivery_report: Option<ReportType>,
    #[serde(default, with = "codec::timestamp::option")]
    pub send_at: Option<DateTime<Utc>>,
    #[serde(default, with = "codec::timestamp::option")]
    pub expire_at: Option<DateTime<Utc>>,
    #[serde(default, with = "codec::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "codec::timestamp::option")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub client_reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MtBatchTextSmsResult {
    #[serde(flatten)]
    pub base: MtBatchSmsResultBase,
    pub body: String,
    #[serde(default)]
    pub parameters: Parameters,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MtBatchBinarySmsResult {
    #[serde(flatten)]
    pub base: MtBatchSmsResultBase,
    #[serde(with = "codec::base64_bytes")]
    pub body: Vec<u8>,
    #[serde(with = "codec::hex_bytes")]
    pub udh: Vec<u8>,
}

/// A batch as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MtBatchSmsResult {
    Text(MtBatchTextSmsResult),
    Binary(MtBatchBinarySmsResult),
}

impl MtBatchSmsResult {
    pub fn base(&self) -> &MtBatchSmsResultBase {
        match self {
            MtBatchSmsResult::Text(r) => &r.base,
            MtBatchSmsResult::Binary(r) => &r.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn sender(&self) -> &str {
        &self.base().from
    }

    pub fn recipients(&self) -> &[String] {
        &self.base().to
    }

    pub fn is_canceled(&self) -> bool {
        self.base().canceled
    }

    pub fn as_text(&self) -> Option<&MtBatchTextSmsResult> {
        match self {
            MtBatchSmsResult::Text(r) => Some(r),
            MtBatchSmsResult::Binary(_) => None,
        }
    }

    pub fn as_binary(&self) -> Option<&MtBatchBinarySmsResult> {
        match self {
            MtBatchSmsResult::Binary(r) => Some(r),
            MtBatchSmsResult::Text(_) => None,
        }
    }
}

impl Discriminated for MtBatchSmsResult {
    const FAMILY: &'static str = "batch result";

    fn decode_variant(tag: &str, value: Value) -> Option<serde_json::Result<Self>> {
        match tag {
            "mt_text" => Some(serde_json::from_value(value).map(MtBatchSmsResult::Text)),
            "mt_binary" => Some(serde_json::from_value(value).map(MtBatchSmsResult::Binary)),
            _ => None,
        }
    }
}

impl PageItem for MtBatchSmsResult {
    const CONTENT_KEY: &'static str = "batches";

    fn decode_item(value: Value, body: &[u8]) -> Result<Self, ApiError> {
        decode_value(value, body)
    }
}
