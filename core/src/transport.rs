//! The I/O seam between request building and response parsing.
//!
//! `FormstackClient` never opens a socket itself. It hands a finished
//! `HttpRequest` to a `Transport` and gets an `HttpResponse` back, which
//! keeps status interpretation in one place and lets tests swap the network
//! for a canned response.

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
///
/// Implementations must return non-2xx responses as `Ok`; only a failure to
/// obtain any response at all is an `Err`.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request)
    }
}

#[cfg(feature = "ureq")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "ureq")]
mod ureq_transport {
    use std::time::Duration;

    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    use super::Transport;

    /// Blocking transport backed by a shared `ureq::Agent`.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            Self::with_timeout(None)
        }

        /// `None` keeps ureq's own default.
        pub fn with_timeout(timeout: Option<Duration>) -> Self {
            // Status codes are data here; `FormstackClient` interprets them.
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(timeout)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    fn with_headers<B>(
        mut builder: ureq::RequestBuilder<B>,
        headers: &[(String, String)],
    ) -> ureq::RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    impl Transport for UreqTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            let url = request.url.as_str();
            let headers = request.headers.as_slice();
            let body = request.body.as_deref();

            let result = match request.method {
                HttpMethod::Get => with_headers(self.agent.get(url), headers).call(),
                HttpMethod::Delete => with_headers(self.agent.delete(url), headers).call(),
                HttpMethod::Post => {
                    let builder = with_headers(self.agent.post(url), headers);
                    match body {
                        Some(b) => builder.send(b.as_bytes()),
                        None => builder.send_empty(),
                    }
                }
                HttpMethod::Put => {
                    let builder = with_headers(self.agent.put(url), headers);
                    match body {
                        Some(b) => builder.send(b.as_bytes()),
                        None => builder.send_empty(),
                    }
                }
            };

            let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| ApiError::Transport(e.to_string()))?;

            Ok(HttpResponse { status, headers, body })
        }
    }
}
