use thiserror::Error;

/// Failure kinds for one upload invocation.
///
/// Every network step maps to its own variant so callers can tell at which
/// point of the protocol the upload broke off. The response status is
/// carried where one was received; transport-level failures (connection
/// refused, TLS) surface with `status: None`. There is no automatic retry
/// anywhere in this crate; retrying the whole `upload` call is the caller's
/// job, and `overwrite=true` on the next attempt discards any partially
/// uploaded file object left behind.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The destination URL has fewer than two non-empty path segments, so no
    /// site can be identified.
    #[error("destination URL {url:?} does not identify a site")]
    InvalidDestination { url: String },

    /// The credential provider itself failed.
    #[error("authentication failed: {detail}")]
    AuthenticationFailed { detail: String },

    /// The contextinfo call failed or its body held no form digest.
    #[error("form digest unavailable: {detail}")]
    DigestUnavailable { detail: String, status: Option<u16> },

    /// The create-or-overwrite file call was rejected.
    #[error("file creation failed: {detail}")]
    FileCreationFailed { detail: String, status: Option<u16> },

    /// The `startupload` call of a chunked transfer was rejected.
    #[error("start upload failed: {detail}")]
    StartUploadFailed { detail: String, status: Option<u16> },

    /// A `continueupload` call was rejected; no further chunk is attempted.
    #[error("continue upload failed at offset {offset}: {detail}")]
    ContinueUploadFailed {
        detail: String,
        status: Option<u16>,
        offset: u64,
    },

    /// The terminal `finishupload` call was rejected.
    #[error("finish upload failed at offset {offset}: {detail}")]
    FinishUploadFailed {
        detail: String,
        status: Option<u16>,
        offset: u64,
    },

    /// Either call of the single-shot small-file path was rejected.
    #[error("small-file upload failed: {detail}")]
    SmallUploadFailed { detail: String, status: Option<u16> },

    /// Reading the source file failed.
    #[error("failed to read source file: {0}")]
    Source(#[from] std::io::Error),

    /// The HTTP transport could not be initialised.
    #[error("failed to initialise HTTP transport: {detail}")]
    TransportInit { detail: String },
}

impl UploadError {
    /// The HTTP status of the rejected call, where one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            UploadError::DigestUnavailable { status, .. }
            | UploadError::FileCreationFailed { status, .. }
            | UploadError::StartUploadFailed { status, .. }
            | UploadError::ContinueUploadFailed { status, .. }
            | UploadError::FinishUploadFailed { status, .. }
            | UploadError::SmallUploadFailed { status, .. } => *status,
            _ => None,
        }
    }
}
