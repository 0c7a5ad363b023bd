//! Synchronous client for the Formstack v2 REST API.
//!
//! # Overview
//! Validates typed inputs, turns them into `HttpRequest` values, hands them
//! to a `Transport`, and parses the JSON that comes back. Requests and
//! responses are plain data, so the client can also be used without any
//! transport (`FormstackClient::detached`) with the caller doing the I/O.
//!
//! # Design
//! - `FormstackClient` is immutable after construction and keeps no per-call
//!   state; one instance can serve many call sites.
//! - Three outcomes stay separate: `ApiError::InvalidArgument` for caller
//!   mistakes (raised before any I/O), `ApiError::BadToken` for responses
//!   outside 2xx, and ordinary JSON for everything else, including the
//!   service's own `{"status":"error"}` replies.
//! - The default `ureq` feature provides a blocking `UreqTransport`.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod transport;
pub mod types;
pub mod validate;

pub use client::FormstackClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use params::Params;
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{
    file_field_value, FieldSpec, FieldType, FormListing, Numeric, SubmissionInput, SubmissionQuery,
};
