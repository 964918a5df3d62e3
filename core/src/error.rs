//! Error types for the XMS client core.
//!
//! # Design
//! Every failure mode gets its own variant so callers can match on the kind
//! instead of parsing messages. Variants raised after a response was
//! obtained keep the raw body bytes, letting a caller log or replay the exact
//! payload without repeating the request.

use thiserror::Error;

use crate::config::Credentials;

/// Errors returned by the encoder, the classifier and the decoder.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was obtained from the service.
    #[error("transport failure for {url}: {message}")]
    Transport { url: String, message: String },

    /// The service returned 401; the credentials were rejected.
    #[error("unauthorized: credentials for service plan {} were rejected", credentials.service_plan_id)]
    Unauthorized { credentials: Credentials },

    /// The service returned 404 for the requested URL.
    #[error("resource not found: {url}")]
    NotFound { url: String },

    /// The service returned 400 or 403 with a `{code, text}` body.
    #[error("request rejected ({code}): {text}")]
    RequestRejected { code: String, text: String },

    /// Any other non-2xx status.
    #[error("unexpected HTTP status {status}: {}", String::from_utf8_lossy(body))]
    UnexpectedStatus { status: u16, body: Vec<u8> },

    /// A success response whose body could not be decoded.
    #[error("malformed response: {message}")]
    MalformedResponse { message: String, body: Vec<u8> },

    /// The payload's discriminator is absent or unknown to the expected family.
    /// `discriminator` is `None` unless the tag was a string.
    #[error("unexpected {family} shape: discriminator {discriminator:?}")]
    UnexpectedShape {
        family: &'static str,
        discriminator: Option<String>,
        body: Vec<u8>,
    },

    /// An outgoing request object is structurally invalid.
    #[error("cannot encode request: {0}")]
    Encoding(String),
}

impl ApiError {
    pub(crate) fn malformed(message: impl Into<String>, body: &[u8]) -> Self {
        ApiError::MalformedResponse {
            message: message.into(),
            body: body.to_vec(),
        }
    }

    /// The raw response body attached to this error, if it carries one.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            ApiError::UnexpectedStatus { body, .. }
            | ApiError::MalformedResponse { body, .. }
            | ApiError::UnexpectedShape { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// The `{code, text}` body the service sends with 400 and 403 responses.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub text: String,
}
