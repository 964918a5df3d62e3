//! Inbound (mobile-originated) messages.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::codec;
use crate::decode::{decode_value, Discriminated, PageItem};
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MoSmsBase {
    pub id: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default, with = "codec::timestamp::option")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default, with = "codec::timestamp::option")]
    pub received_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MoTextSms {
    #[serde(flatten)]
    pub base: MoSmsBase,
    pub body: String,
    /// The matched keyword when the message was routed by keyword.
    #[serde(default)]
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MoBinarySms {
    #[serde(flatten)]
    pub base: MoSmsBase,
    #[serde(with = "codec::base64_bytes")]
    pub body: Vec<u8>,
    #[serde(with = "codec::hex_bytes")]
    pub udh: Vec<u8>,
}

/// A message sent by a handset to one of the account's numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoSms {
    Text(MoTextSms),
    Binary(MoBinarySms),
}

impl MoSms {
    pub fn base(&self) -> &MoSmsBase {
        match self {
            MoSms::Text(m) => &m.base,
            MoSms::Binary(m) => &m.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }
}

impl Discriminated for MoSms {
    const FAMILY: &'static str = "mobile originated message";

    fn decode_variant(tag: &str, value: Value) -> Option<serde_json::Result<Self>> {
        match tag {
            "mo_text" => Some(serde_json::from_value(value).map(MoSms::Text)),
            "mo_binary" => Some(serde_json::from_value(value).map(MoSms::Binary)),
            _ => None,
        }
    }
}

impl PageItem for MoSms {
    const CONTENT_KEY: &'static str = "inbounds";

    fn decode_item(value: Value, body: &[u8]) -> Result<Self, ApiError> {
        decode_value(value, body)
    }
}
