//! Payloads the service pushes to a customer's callback URL.

use serde_json::Value;

use crate::decode::{decode, Discriminated};
use crate::error::ApiError;
use crate::types::inbound::MoSms;
use crate::types::report::{BatchDeliveryReport, RecipientDeliveryReport};

/// Anything that can arrive at a callback endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackEvent {
    Inbound(MoSms),
    BatchReport(BatchDeliveryReport),
    RecipientReport(RecipientDeliveryReport),
}

impl CallbackEvent {
    /// Decode the body of a callback request.
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        decode(body)
    }
}

impl Discriminated for CallbackEvent {
    const FAMILY: &'static str = "callback";

    fn decode_variant(tag: &str, value: Value) -> Option<serde_json::Result<Self>> {
        match tag {
            "mo_text" | "mo_binary" => MoSms::decode_variant(tag, value).map(|r| r.map(CallbackEvent::Inbound)),
            "delivery_report_sms" => {
                BatchDeliveryReport::decode_variant(tag, value).map(|r| r.map(CallbackEvent::BatchReport))
            }
            "recipient_delivery_report_sms" => RecipientDeliveryReport::decode_variant(tag, value)
                .map(|r| r.map(CallbackEvent::RecipientReport)),
            _ => None,
        }
    }
}
