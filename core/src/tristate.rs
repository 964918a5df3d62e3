//! Three-state field slots for update requests.
//!
//! An update request distinguishes "leave this field alone" from "restore
//! the server default" and from "replace with this value". `Option` can only
//! express two of those, so update fields use `UpdateValue` instead.
//!
//! On the wire `Unset` fields are omitted (the containing struct uses
//! `skip_serializing_if = "UpdateValue::is_unset"`), `Reset` becomes `null`
//! and `Value(v)` becomes `v`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UpdateValue<T> {
    /// Leave the server-side value unchanged.
    Unset,
    /// Restore the server-side default.
    Reset,
    /// Replace the server-side value.
    Value(T),
}

impl<T> UpdateValue<T> {
    pub fn set(&mut self, value: T) {
        *self = UpdateValue::Value(value);
    }

    pub fn reset(&mut self) {
        *self = UpdateValue::Reset;
    }

    pub fn unset(&mut self) {
        *self = UpdateValue::Unset;
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, UpdateValue::Unset)
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, UpdateValue::Reset)
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            UpdateValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> UpdateValue<&T> {
        match self {
            UpdateValue::Unset => UpdateValue::Unset,
            UpdateValue::Reset => UpdateValue::Reset,
            UpdateValue::Value(v) => UpdateValue::Value(v),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> UpdateValue<U> {
        match self {
            UpdateValue::Unset => UpdateValue::Unset,
            UpdateValue::Reset => UpdateValue::Reset,
            UpdateValue::Value(v) => UpdateValue::Value(f(v)),
        }
    }
}

// Hand-written so `T` needs no `Default` bound.
impl<T> Default for UpdateValue<T> {
    fn default() -> Self {
        UpdateValue::Unset
    }
}

impl<T> From<T> for UpdateValue<T> {
    fn from(value: T) -> Self {
        UpdateValue::Value(value)
    }
}

impl<T: Serialize> Serialize for UpdateValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // Only reachable when the containing field forgot the skip attribute.
            UpdateValue::Unset | UpdateValue::Reset => serializer.serialize_none(),
            UpdateValue::Value(v) => v.serialize(serializer),
        }
    }
}

/// Missing keys are handled by `#[serde(default)]`; a present `null` is a reset.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for UpdateValue<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            None => UpdateValue::Reset,
            Some(v) => UpdateValue::Value(v),
        })
    }
}

/// Serializer for update fields whose reset marker is a named value rather
/// than `null`.
pub(crate) fn serialize_with_reset_marker<T, S>(
    value: &UpdateValue<T>,
    marker: &T,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        UpdateValue::Reset => marker.serialize(serializer),
        other => other.serialize(serializer),
    }
}
