//! Classification of transport outcomes.
//!
//! # Design
//! Every exchange passes through `classify` before any body is decoded. A
//! success comes back as `SuccessResponse`, which is the only thing the
//! client's `parse_*` methods accept, so a 404 page or an HTML error body
//! can never reach the decoder.

use crate::config::Credentials;
use crate::error::{ApiError, ApiErrorBody};
use crate::http::{HttpRequest, HttpResponse, TransportFailure};

/// A 2xx response, ready for decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessResponse {
    url: String,
    status: u16,
    body: Vec<u8>,
}

impl SuccessResponse {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Map the outcome of one exchange to a success or exactly one typed failure.
pub fn classify(
    request: &HttpRequest,
    credentials: &Credentials,
    outcome: Result<HttpResponse, TransportFailure>,
) -> Result<SuccessResponse, ApiError> {
    let url = &request.path;
    let response = match outcome {
        Ok(response) => response,
        Err(failure) => {
            tracing::warn!(method = request.method.as_str(), %url, error = %failure, "transport failure");
            return Err(ApiError::Transport {
                url: url.clone(),
                message: failure.message,
            });
        }
    };

    let status = response.status;
    if response.is_success() {
        tracing::debug!(method = request.method.as_str(), %url, status, "request succeeded");
        return Ok(SuccessResponse {
            url: url.clone(),
            status,
            body: response.body,
        });
    }

    tracing::warn!(method = request.method.as_str(), %url, status, "request failed");
    Err(match status {
        401 => ApiError::Unauthorized {
            credentials: credentials.clone(),
        },
        404 => ApiError::NotFound { url: url.clone() },
        400 | 403 => match serde_json::from_slice::<ApiErrorBody>(&response.body) {
            Ok(ApiErrorBody { code, text }) => ApiError::RequestRejected { code, text },
            Err(_) => ApiError::UnexpectedStatus {
                status,
                body: response.body,
            },
        },
        _ => ApiError::UnexpectedStatus {
            status,
            body: response.body,
        },
    })
}
