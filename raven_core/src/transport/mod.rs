/*!
 * Transport layer — how event payloads reach the collector.
 *
 * - `Transport` — the seam: `post(url, headers, body) -> status + body`
 * - `http` — the default blocking implementation on top of `ureq`
 * - `encoding` — optional gzip of the serialized payload
 *
 * Anything implementing `Transport` can be plugged into the client,
 * including plain closures, which is how tests fake the collector.
 */

pub mod encoding;
pub mod http;

use thiserror::Error;

pub use encoding::Encoding;
pub use http::HttpTransport;

/// What came back from the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// The request did not produce a response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
}

pub trait Transport: Send + Sync {
    /// Issues one blocking POST. Non-2xx statuses are responses, not errors.
    fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &[u8],
    ) -> Result<Response, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&str, &[(String, String)], &[u8]) -> Result<Response, TransportError> + Send + Sync,
{
    fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &[u8],
    ) -> Result<Response, TransportError> {
        self(url, headers, body)
    }
}
