//! Recipient groups and tags.
//!
//! Groups are not polymorphic, so they decode as plain serde types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec;
use crate::decode::PageItem;
use crate::encode::{self, Encode};
use crate::error::ApiError;
use crate::tristate::UpdateValue;

/// Keywords an inbound message must start with to trigger an auto update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordPair {
    pub first_word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_word: Option<String>,
}

/// Lets handsets join or leave a group by texting keywords to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAutoUpdate {
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add: Option<KeywordPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove: Option<KeywordPair>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub child_groups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_update: Option<GroupAutoUpdate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Encode for GroupCreate {
    fn validate(&self) -> Result<(), ApiError> {
        encode::require_no_blank("members", &self.members)?;
        encode::require_no_blank("child_groups", &self.child_groups)?;
        if let Some(auto_update) = &self.auto_update {
            encode::require_non_empty("auto_update.to", &auto_update.to)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUpdate {
    #[serde(default, skip_serializing_if = "UpdateValue::is_unset")]
    pub name: UpdateValue<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<String>,
    /// Copy every member of this group into the updated group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_from_group: Option<String>,
    /// Remove every member of this group from the updated group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_from_group: Option<String>,
    #[serde(default, skip_serializing_if = "UpdateValue::is_unset")]
    pub auto_update: UpdateValue<GroupAutoUpdate>,
}

impl Encode for GroupUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        encode::require_no_blank("add", &self.add)?;
        encode::require_no_blank("remove", &self.remove)?;
        if let UpdateValue::Value(auto_update) = &self.auto_update {
            encode::require_non_empty("auto_update.to", &auto_update.to)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupResult {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub size: u64,
    #[serde(default)]
    pub child_groups: Vec<String>,
    #[serde(default)]
    pub auto_update: Option<GroupAutoUpdate>,
    #[serde(default, with = "codec::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "codec::timestamp::option")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl PageItem for GroupResult {
    const CONTENT_KEY: &'static str = "groups";

    fn decode_item(value: Value, body: &[u8]) -> Result<Self, ApiError> {
        serde_json::from_value(value).map_err(|e| ApiError::malformed(format!("invalid group: {e}"), body))
    }
}

/// The full tag set of a batch or group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
    pub tags: Vec<String>,
}

impl Encode for Tags {
    fn validate(&self) -> Result<(), ApiError> {
        encode::require_no_blank("tags", &self.tags)
    }
}

/// Incremental change to a tag set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagsUpdate {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<String>,
}

impl Encode for TagsUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        encode::require_no_blank("add", &self.add)?;
        encode::require_no_blank("remove", &self.remove)
    }
}
