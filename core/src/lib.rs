//! Synchronous client core for the XMS SMS messaging REST API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses responses without touching the
//! network (host-does-IO pattern). The caller executes the HTTP round-trip,
//! either by hand followed by `XmsClient::classify`, or through a
//! `Transport` handed to `XmsClient::execute`.
//!
//! # Design
//! - `XmsClient` is stateless: it holds the service plan URL and the
//!   credentials.
//! - Each operation is split into `build_*` and `parse_*`. Parsers only
//!   accept a `SuccessResponse`, so status classification always happens
//!   before decoding.
//! - Polymorphic results are decoded by an explicit discriminator match and
//!   unknown tags fail with `ApiError::UnexpectedShape`.
//! - Update requests use `UpdateValue` to tell "leave unchanged" apart from
//!   "reset to the service default".
//! - Collections are exposed as restartable `PagedSequence`s.

pub mod classify;
pub mod client;
pub mod codec;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod filter;
pub mod http;
pub mod paging;
pub mod tristate;
pub mod types;

pub use classify::SuccessResponse;
pub use client::XmsClient;
pub use config::{ClientConfig, ConfigError, Credentials};
pub use error::ApiError;
pub use filter::{BatchFilter, GroupFilter, InboundFilter};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportFailure};
pub use paging::{Page, PagedSequence};
pub use tristate::UpdateValue;
