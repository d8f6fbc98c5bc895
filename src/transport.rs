use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Header name/value pairs attached to a request.
pub type Headers = HashMap<String, String>;

/// Error type for the transport seam (boxed, like the other trait seams).
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Status and raw body of a completed request.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// "Send request, get status + body." Every remote call of the upload
/// protocol is a POST, so that is the whole surface. Implemented by
/// [`ReqwestTransport`] in production and by the generated mock in tests.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST `body` to `url` with the given headers. Returns the response
    /// status and body regardless of the status class; only transport-level
    /// failures (connect, TLS, read) are errors.
    async fn post(
        &self,
        url: &str,
        headers: &Headers,
        body: Bytes,
    ) -> Result<ApiResponse, TransportError>;
}

/// Production transport over a pooled [`reqwest::Client`].
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Connect timeout only; chunk bodies can legitimately take minutes on
    /// slow links, so no overall request deadline is set here.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(ReqwestTransport { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(
        &self,
        url: &str,
        headers: &Headers,
        body: Bytes,
    ) -> Result<ApiResponse, TransportError> {
        let mut request = self.client.post(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.body(body).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_2xx() {
        for (status, ok) in [(199, false), (200, true), (204, true), (299, true), (300, false), (404, false), (500, false)] {
            let response = ApiResponse {
                status,
                body: Bytes::new(),
            };
            assert_eq!(response.is_success(), ok, "status {status}");
        }
    }
}
