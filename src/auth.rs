//! Credential/digest gate: exchanges credential material for transport auth
//! headers, then for the short-lived form digest every mutating call needs.
//!
//! A fresh [`AuthContext`] is produced for every upload invocation and never
//! cached across calls.

use std::fmt;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use tracing::{debug, error};

use crate::destination::Destination;
use crate::error::UploadError;
use crate::transport::{Headers, HttpTransport};

/// Header that disables the forms-based-auth interstitial on SharePoint.
pub const FORMS_AUTH_HEADER: &str = "X-FORMS_BASED_AUTH_ACCEPTED";
/// Header carrying the form digest on every mutating request.
pub const DIGEST_HEADER: &str = "X-RequestDigest";

const DIGEST_OPEN_TAG: &str = "<d:FormDigestValue>";
const DIGEST_CLOSE_TAG: &str = "</d:FormDigestValue>";

/// Opaque credential material handed to the [`CredentialProvider`].
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Pre-acquired transport headers (e.g. an `Authorization` value or an
    /// auth `Cookie`), used as-is by [`StaticCredentialProvider`].
    pub headers: Headers,
}

/// Secret material never reaches log output: only header names and the
/// presence of a password are formatted.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut header_names: Vec<&str> = self.headers.keys().map(String::as_str).collect();
        header_names.sort_unstable();
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("headers", &header_names)
            .finish()
    }
}

/// Turns (site root URL, credential material) into the header set attached
/// to every request. Real SharePoint auth exchanges (AAD, NTLM, add-in
/// tokens) live behind this trait; the crate ships only the static variant.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn acquire(
        &self,
        site_url: &str,
        credentials: &Credentials,
    ) -> Result<Headers, Box<dyn std::error::Error + Send + Sync>>;
}

/// Provider for headers acquired out of band: returns `credentials.headers`
/// unchanged, rejecting empty material.
pub struct StaticCredentialProvider;

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn acquire(
        &self,
        _site_url: &str,
        credentials: &Credentials,
    ) -> Result<Headers, Box<dyn std::error::Error + Send + Sync>> {
        if credentials.headers.is_empty() {
            return Err("no auth headers configured; set credentials.headers or use a credential provider that performs an auth exchange".into());
        }
        Ok(credentials.headers.clone())
    }
}

/// Auth state owned by exactly one upload call.
pub struct AuthContext {
    /// Headers returned by the credential provider.
    pub headers: Headers,
    /// The anti-forgery token from `/_api/contextinfo`.
    pub form_digest: String,
    pub issued_at: Instant,
}

impl AuthContext {
    /// Headers for the chunk transfer calls: auth plus digest.
    pub fn upload_headers(&self) -> Headers {
        let mut headers = self.headers.clone();
        headers.insert(DIGEST_HEADER.to_string(), self.form_digest.clone());
        headers
    }

    /// Headers for folder/file mutations: auth, digest and the
    /// forms-auth-disable flag.
    pub fn mutating_headers(&self) -> Headers {
        let mut headers = self.upload_headers();
        headers.insert(FORMS_AUTH_HEADER.to_string(), "f".to_string());
        headers
    }
}

/// Acquire auth headers and a fresh form digest for one upload call.
pub async fn acquire(
    transport: &dyn HttpTransport,
    provider: &dyn CredentialProvider,
    destination: &Destination,
    credentials: &Credentials,
) -> Result<AuthContext, UploadError> {
    let headers = provider
        .acquire(destination.root_url(), credentials)
        .await
        .map_err(|e| {
            error!(site_url = destination.root_url(), error = %e, "Credential provider failed");
            UploadError::AuthenticationFailed {
                detail: e.to_string(),
            }
        })?;
    debug!(header_count = headers.len(), "Credential provider returned auth headers");

    let url = format!("{}/_api/contextinfo", destination.root_url());
    let mut request_headers = headers.clone();
    request_headers.insert(FORMS_AUTH_HEADER.to_string(), "f".to_string());

    let response = transport
        .post(&url, &request_headers, Bytes::new())
        .await
        .map_err(|e| UploadError::DigestUnavailable {
            detail: e.to_string(),
            status: None,
        })?;

    if !response.is_success() {
        error!(status = response.status, url = %url, "contextinfo call rejected");
        return Err(UploadError::DigestUnavailable {
            detail: format!("contextinfo returned status {}", response.status),
            status: Some(response.status),
        });
    }

    let body = String::from_utf8_lossy(&response.body);
    let form_digest =
        extract_form_digest(&body).ok_or_else(|| UploadError::DigestUnavailable {
            detail: "contextinfo body has no FormDigestValue element".to_string(),
            status: Some(response.status),
        })?;
    debug!(digest_len = form_digest.len(), "Form digest acquired");

    Ok(AuthContext {
        headers,
        form_digest,
        issued_at: Instant::now(),
    })
}

/// Inner text of the first `<d:FormDigestValue>` element. A plain substring
/// scan is all this one known tag needs; a malformed body yields `None`,
/// never a panic.
fn extract_form_digest(body: &str) -> Option<String> {
    let start = body.find(DIGEST_OPEN_TAG)? + DIGEST_OPEN_TAG.len();
    let len = body[start..].find(DIGEST_CLOSE_TAG)?;
    Some(body[start..start + len].to_string())
}
