//! Wire representations shared by the request and result types.
//!
//! Each submodule is a `#[serde(with = "...")]` adapter:
//! - `timestamp`: RFC 3339 instants, emitted with millisecond precision and a
//!   `Z` offset. Decoding also accepts the `+0000` offset form.
//! - `base64_bytes`: binary message bodies.
//! - `hex_bytes`: user data headers, emitted as lowercase hex.
//!
//! The `option` variants wrap the same formats in `Option` slots. Only
//! `timestamp` has an `update` variant, since a message body or header has
//! no server default to reset to.

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};

const OFFSET_WITHOUT_COLON: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Render an instant in the profile the service expects.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 instant with an explicit offset.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::<FixedOffset>::parse_from_str(raw, OFFSET_WITHOUT_COLON))
        .map(|at| at.with_timezone(&Utc))
}

/// Render a calendar date for query parameters.
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .map_err(|e| de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            at: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match at {
                Some(at) => super::serialize(at, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapper(#[serde(with = "super")] DateTime<Utc>);

            Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
        }
    }

    pub mod update {
        use chrono::{DateTime, Utc};
        use serde::{Deserializer, Serializer};

        use crate::tristate::UpdateValue;

        pub fn serialize<S: Serializer>(
            at: &UpdateValue<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match at {
                UpdateValue::Value(at) => super::serialize(at, serializer),
                _ => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<UpdateValue<DateTime<Utc>>, D::Error> {
            Ok(match super::option::deserialize(deserializer)? {
                Some(at) => UpdateValue::Value(at),
                None => UpdateValue::Reset,
            })
        }
    }
}

pub mod base64_bytes {
    use base64::prelude::*;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64_STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BASE64_STANDARD
            .decode(raw.as_bytes())
            .map_err(|e| de::Error::custom(format!("invalid base64: {e}")))
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
            match bytes {
                Some(bytes) => super::serialize(bytes, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapper(#[serde(with = "super")] Vec<u8>);

            Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
        }
    }
}

pub mod hex_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        hex::decode(&raw).map_err(|e| de::Error::custom(format!("invalid hex {raw:?}: {e}")))
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
            match bytes {
                Some(bytes) => super::serialize(bytes, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapper(#[serde(with = "super")] Vec<u8>);

            Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
        }
    }
}
