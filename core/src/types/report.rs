//! Delivery report types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::codec;
use crate::decode::Discriminated;

/// Which delivery reports the service produces for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    None,
    Summary,
    Full,
    PerRecipient,
    PerRecipientFinal,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::None => "none",
            ReportType::Summary => "summary",
            ReportType::Full => "full",
            ReportType::PerRecipient => "per_recipient",
            ReportType::PerRecipientFinal => "per_recipient_final",
        }
    }
}

/// Delivery state of a message. Names the service adds later are kept
/// verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeliveryStatus {
    Queued,
    Dispatched,
    Aborted,
    Cancelled,
    Rejected,
    Deleted,
    Delivered,
    Failed,
    Expired,
    Unknown,
    Other(String),
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DeliveryStatus::Queued => "Queued",
            DeliveryStatus::Dispatched => "Dispatched",
            DeliveryStatus::Aborted => "Aborted",
            DeliveryStatus::Cancelled => "Cancelled",
            DeliveryStatus::Rejected => "Rejected",
            DeliveryStatus::Deleted => "Deleted",
            DeliveryStatus::Delivered => "Delivered",
            DeliveryStatus::Failed => "Failed",
            DeliveryStatus::Expired => "Expired",
            DeliveryStatus::Unknown => "Unknown",
            DeliveryStatus::Other(name) => name,
        }
    }

    /// Whether no further status transitions are expected.
    pub fn is_final(&self) -> bool {
        !matches!(self, DeliveryStatus::Queued | DeliveryStatus::Dispatched)
    }

    pub fn from_name(s: &str) -> Self {
        match s {
            "Queued" => DeliveryStatus::Queued,
            "Dispatched" => DeliveryStatus::Dispatched,
            "Aborted" => DeliveryStatus::Aborted,
            "Cancelled" => DeliveryStatus::Cancelled,
            "Rejected" => DeliveryStatus::Rejected,
            "Deleted" => DeliveryStatus::Deleted,
            "Delivered" => DeliveryStatus::Delivered,
            "Failed" => DeliveryStatus::Failed,
            "Expired" => DeliveryStatus::Expired,
            "Unknown" => DeliveryStatus::Unknown,
            other => DeliveryStatus::Other(other.to_string()),
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(DeliveryStatus::from_name(s))
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeliveryStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DeliveryStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(DeliveryStatus::from_name(&raw))
    }
}

/// One status bucket of a batch delivery report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeliveryReportStatus {
    pub code: u32,
    pub status: DeliveryStatus,
    pub count: u64,
    /// Only present in `full` reports.
    #[serde(default)]
    pub recipients: Vec<String>,
}

/// Aggregated delivery report of a whole batch (`delivery_report_sms`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BatchDeliveryReport {
    pub batch_id: String,
    pub total_message_count: u64,
    #[serde(default)]
    pub statuses: Vec<DeliveryReportStatus>,
}

impl Discriminated for BatchDeliveryReport {
    const FAMILY: &'static str = "batch delivery report";

    fn decode_variant(tag: &str, value: Value) -> Option<serde_json::Result<Self>> {
        match tag {
            "delivery_report_sms" => Some(serde_json::from_value(value)),
            _ => None,
        }
    }
}

/// Delivery report for a single recipient (`recipient_delivery_report_sms`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecipientDeliveryReport {
    pub batch_id: String,
    pub recipient: String,
    pub code: u32,
    pub status: DeliveryStatus,
    #[serde(with = "codec::timestamp")]
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default, with = "codec::timestamp::option")]
    pub operator_status_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub client_reference: Option<String>,
}

impl Discriminated for RecipientDeliveryReport {
    const FAMILY: &'static str = "recipient delivery report";

    fn decode_variant(tag: &str, value: Value) -> Option<serde_json::Result<Self>> {
        match tag {
            "recipient_delivery_report_sms" => Some(serde_json::from_value(value)),
            _ => None,
        }
    }
}

/// Parameters of a batch delivery report request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReportQuery {
    /// `Summary` or `Full`; the service default is `Summary`.
    pub report_type: Option<ReportType>,
    pub statuses: Vec<DeliveryStatus>,
    pub codes: Vec<u32>,
}

impl DeliveryReportQuery {
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(report_type) = self.report_type {
            pairs.push(("type", report_type.as_str().to_string()));
        }
        if !self.statuses.is_empty() {
            let joined: Vec<&str> = self.statuses.iter().map(DeliveryStatus::as_str).collect();
            pairs.push(("status", joined.join(",")));
        }
        if !self.codes.is_empty() {
            let joined: Vec<String> = self.codes.iter().map(u32::to_string).collect();
            pairs.push(("code", joined.join(",")));
        }
        pairs
    }
}
