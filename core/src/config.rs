//! Client configuration and credentials.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://api.clxcommunications.com/xms";

pub const ENV_SERVICE_PLAN_ID: &str = "XMS_SERVICE_PLAN_ID";
pub const ENV_TOKEN: &str = "XMS_TOKEN";
pub const ENV_ENDPOINT: &str = "XMS_ENDPOINT";

/// Errors raised while loading a `ClientConfig`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVariable(&'static str),

    #[error("environment variable {0} must not be empty")]
    EmptyVariable(&'static str),

    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// The service plan id and API token used to authenticate every request.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub service_plan_id: String,
    pub token: String,
}

impl Credentials {
    pub fn new(service_plan_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            service_plan_id: service_plan_id.into(),
            token: token.into(),
        }
    }
}

// Tokens end up in logs through error values; never print them.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("service_plan_id", &self.service_plan_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Everything needed to construct an `XmsClient`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(flatten)]
    pub credentials: Credentials,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl ClientConfig {
    pub fn new(service_plan_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: default_endpoint(),
            credentials: Credentials::new(service_plan_id, token),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Load configuration from `XMS_SERVICE_PLAN_ID`, `XMS_TOKEN` and the
    /// optional `XMS_ENDPOINT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| match lookup(key) {
            None => Err(ConfigError::MissingVariable(key)),
            Some(v) if v.trim().is_empty() => Err(ConfigError::EmptyVariable(key)),
            Some(v) => Ok(v),
        };
        let config = Self::new(required(ENV_SERVICE_PLAN_ID)?, required(ENV_TOKEN)?);
        Ok(match lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            Some(endpoint) => config.with_endpoint(endpoint),
            None => config,
        })
    }
}
