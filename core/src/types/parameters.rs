//! Template parameters for text batches.
//!
//! A text body may reference `${name}` placeholders. Each parameter maps
//! recipients to their substitution, and an optional fallback applies to
//! every recipient not listed. On the wire the fallback travels under the
//! reserved `"default"` key next to the recipients:
//!
//! ```json
//! { "name": { "123456789": "Mary", "default": "customer" } }
//! ```

use std::collections::BTreeMap;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// The key under which the fallback substitution is sent.
pub const DEFAULT_KEY: &str = "default";

/// Substitutions for one template parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterValues {
    /// Recipient (MSISDN) to substitution.
    pub substitutions: BTreeMap<String, String>,
    /// Substitution for recipients not in `substitutions`.
    pub default: Option<String>,
}

impl ParameterValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>, value: impl Into<String>) -> Self {
        self.substitutions.insert(recipient.into(), value.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// The substitution `recipient` receives, falling back to the default.
    pub fn value_for(&self, recipient: &str) -> Option<&str> {
        self.substitutions
            .get(recipient)
            .or(self.default.as_ref())
            .map(String::as_str)
    }
}

impl Serialize for ParameterValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.substitutions.len() + usize::from(self.default.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (recipient, value) in &self.substitutions {
            map.serialize_entry(recipient, value)?;
        }
        if let Some(default) = &self.default {
            map.serialize_entry(DEFAULT_KEY, default)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParameterValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValuesVisitor;

        impl<'de> Visitor<'de> for ValuesVisitor {
            type Value = ParameterValues;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of recipient to substitution")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut values = ParameterValues::default();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    if key == DEFAULT_KEY {
                        values.default = Some(value);
                    } else {
                        values.substitutions.insert(key, value);
                    }
                }
                Ok(values)
            }
        }

        deserializer.deserialize_map(ValuesVisitor)
    }
}

/// All template parameters of a text batch, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, ParameterValues>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, values: ParameterValues) -> Self {
        self.0.insert(name.into(), values);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, values: ParameterValues) {
        self.0.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValues> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValues)> {
        self.0.iter()
    }

    /// A recipient literally named `"default"` would collide with the
    /// fallback key on the wire.
    pub(crate) fn reserved_key_conflict(&self) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, values)| values.substitutions.contains_key(DEFAULT_KEY))
            .map(|(name, _)| name.as_str())
    }
}
