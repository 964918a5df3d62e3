//! Response decoding.
//!
//! # Design
//! Polymorphic payloads are decoded in two steps: the body is parsed into a
//! generic JSON value, then the discriminator string selects the variant
//! through `Discriminated::decode_variant`, an explicit match whose fallback
//! arm reports the tag as unknown. No variant is ever guessed.
//!
//! Every failure carries the complete original body and no partially
//! decoded value is returned.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::paging::Page;

/// A family of payloads distinguished by a discriminator field.
pub trait Discriminated: Sized {
    /// Human readable family name, used in errors.
    const FAMILY: &'static str;

    /// Name of the discriminator field.
    const DISCRIMINATOR: &'static str = "type";

    /// Decode the variant selected by `tag`, or `None` if the family has no
    /// such variant.
    fn decode_variant(tag: &str, value: Value) -> Option<serde_json::Result<Self>>;
}

/// An element of a paged collection.
pub trait PageItem: Sized {
    /// Key of the content array in the page envelope.
    const CONTENT_KEY: &'static str;

    fn decode_item(value: Value, body: &[u8]) -> Result<Self, ApiError>;
}

/// Parse `body` as a member of the `T` family.
pub fn decode<T: Discriminated>(body: &[u8]) -> Result<T, ApiError> {
    let value = parse(body)?;
    decode_value(value, body)
}

/// Decode an already parsed member of the `T` family. `body` is the
/// enclosing payload, attached to any error.
pub fn decode_value<T: Discriminated>(value: Value, body: &[u8]) -> Result<T, ApiError> {
    // A tag that is absent, null or not a string has no name to report.
    let tag = match value.get(T::DISCRIMINATOR) {
        Some(Value::String(tag)) => tag.clone(),
        _ => {
            return Err(ApiError::UnexpectedShape {
                family: T::FAMILY,
                discriminator: None,
                body: body.to_vec(),
            })
        }
    };
    match T::decode_variant(&tag, value) {
        Some(Ok(decoded)) => Ok(decoded),
        Some(Err(e)) => Err(ApiError::malformed(format!("invalid {tag} payload: {e}"), body)),
        None => {
            tracing::warn!(family = T::FAMILY, discriminator = %tag, "unknown discriminator");
            Err(ApiError::UnexpectedShape {
                family: T::FAMILY,
                discriminator: Some(tag),
                body: body.to_vec(),
            })
        }
    }
}

/// Parse `body` as a plain, non-polymorphic payload.
pub fn decode_plain<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::malformed(e.to_string(), body))
}

/// Parse `body` as one page of `T` items.
pub fn decode_page<T: PageItem>(body: &[u8]) -> Result<Page<T>, ApiError> {
    #[derive(Deserialize)]
    struct Envelope {
        page: u32,
        page_size: u32,
        count: u64,
        #[serde(flatten)]
        rest: Map<String, Value>,
    }

    let mut envelope: Envelope = decode_plain(body)?;
    let items = match envelope.rest.remove(T::CONTENT_KEY) {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => Vec::new(),
        Some(_) => {
            return Err(ApiError::malformed(
                format!("{} is not an array", T::CONTENT_KEY),
                body,
            ))
        }
    };
    if items.len() != envelope.page_size as usize {
        return Err(ApiError::malformed(
            format!(
                "page_size {} does not match {} {} entries",
                envelope.page_size,
                items.len(),
                T::CONTENT_KEY
            ),
            body,
        ));
    }
    let content = items
        .into_iter()
        .map(|item| T::decode_item(item, body))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page {
        page: envelope.page,
        size: envelope.page_size,
        total_size: envelope.count,
        content,
    })
}

fn parse(body: &[u8]) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::malformed(e.to_string(), body))
}
