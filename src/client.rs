//! Caller-facing uploader: owns the resolved destination and the external
//! collaborators (transport, credential provider) and orchestrates one
//! upload call end to end: fresh auth context, create-or-overwrite of the
//! file object, then the chunked session.

use std::io;
use std::path::Path;

use bytes::Bytes;
use tracing::{error, info};

use crate::auth::{self, AuthContext, CredentialProvider, Credentials, StaticCredentialProvider};
use crate::chunk::{ChunkSource, FileChunkSource, DEFAULT_CHUNK_SIZE};
use crate::destination::Destination;
use crate::error::UploadError;
use crate::progress::ProgressSink;
use crate::session::{self, UploadReport};
use crate::transport::{HttpTransport, ReqwestTransport};

/// Construction parameters for [`SharepointUploader`].
///
/// Progress reporting is strictly opt-in: with no sink configured the
/// uploader produces no output of its own (tracing events aside).
pub struct UploaderConfig {
    /// Folder URL, path `/{siteSlug}/{site}/{...folder}`.
    pub url: String,
    pub credentials: Credentials,
    pub max_chunk_size: usize,
    pub progress_sink: Option<ProgressSink>,
}

impl UploaderConfig {
    pub fn new(url: impl Into<String>, credentials: Credentials) -> Self {
        UploaderConfig {
            url: url.into(),
            credentials,
            max_chunk_size: DEFAULT_CHUNK_SIZE,
            progress_sink: None,
        }
    }
}

/// Per-call options for [`SharepointUploader::upload`].
#[derive(Debug, Default, Clone)]
pub struct UploadOptions {
    /// Name for the file object at the destination; defaults to the source
    /// path's file name.
    pub file_name: Option<String>,
    /// Folder override below the site, replacing the folder segments of the
    /// construction URL.
    pub folder: Option<String>,
}

/// Upload client for one SharePoint folder.
///
/// Invocations are independent: each `upload` call builds its own auth
/// context and session, so one uploader value can serve concurrent calls
/// without shared mutable state.
pub struct SharepointUploader {
    destination: Destination,
    credentials: Credentials,
    transport: Box<dyn HttpTransport>,
    provider: Box<dyn CredentialProvider>,
    max_chunk_size: usize,
    progress_sink: Option<ProgressSink>,
}

impl SharepointUploader {
    /// Build an uploader with the production transport (reqwest) and the
    /// static credential provider.
    pub fn new(config: UploaderConfig) -> Result<Self, UploadError> {
        let transport = ReqwestTransport::new().map_err(|e| UploadError::TransportInit {
            detail: e.to_string(),
        })?;
        Self::with_parts(config, Box::new(transport), Box::new(StaticCredentialProvider))
    }

    /// Build an uploader over caller-supplied collaborators. This is the
    /// seam for custom auth exchanges and for tests.
    pub fn with_parts(
        config: UploaderConfig,
        transport: Box<dyn HttpTransport>,
        provider: Box<dyn CredentialProvider>,
    ) -> Result<Self, UploadError> {
        let destination = Destination::resolve(&config.url)?;
        info!(
            folder = destination.folder(),
            root_url = destination.root_url(),
            max_chunk_size = config.max_chunk_size,
            "Uploader created"
        );
        Ok(SharepointUploader {
            destination,
            credentials: config.credentials,
            transport,
            provider,
            max_chunk_size: config.max_chunk_size,
            progress_sink: config.progress_sink,
        })
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Upload the file at `path`, creating or overwriting the file object of
    /// the same (or overridden) name at the destination folder.
    pub async fn upload(
        &self,
        path: impl AsRef<Path>,
        options: UploadOptions,
    ) -> Result<UploadReport, UploadError> {
        let path = path.as_ref();
        let file_name = match options.file_name.clone() {
            Some(name) => name,
            None => path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("path {} has no file name", path.display()),
                    )
                })?,
        };

        let mut source = FileChunkSource::open(path, self.max_chunk_size).await?;
        self.upload_source(&mut source, &file_name, options.folder.as_deref())
            .await
    }

    /// Upload from any [`ChunkSource`]. Same protocol as [`upload`], for
    /// callers whose bytes do not live in a file.
    ///
    /// [`upload`]: SharepointUploader::upload
    pub async fn upload_source(
        &self,
        source: &mut dyn ChunkSource,
        file_name: &str,
        folder: Option<&str>,
    ) -> Result<UploadReport, UploadError> {
        let destination = match folder {
            Some(folder) => self.destination.with_folder(folder),
            None => self.destination.clone(),
        };
        info!(
            file_name,
            folder = destination.folder(),
            total_size = source.total_size(),
            "Starting upload"
        );

        let auth = auth::acquire(
            self.transport.as_ref(),
            self.provider.as_ref(),
            &destination,
            &self.credentials,
        )
        .await?;

        self.create_file(&destination, file_name, &auth).await?;

        let report = session::run(
            self.transport.as_ref(),
            &auth,
            &destination,
            file_name,
            source,
            self.max_chunk_size,
            self.progress_sink.as_ref(),
        )
        .await?;

        info!(file_name, requests = report.requests, "File uploaded");
        Ok(report)
    }

    /// Create or overwrite the file object that the chunk calls target. The
    /// store requires this before any `startupload`.
    async fn create_file(
        &self,
        destination: &Destination,
        file_name: &str,
        auth: &AuthContext,
    ) -> Result<(), UploadError> {
        let url = format!(
            "{}/_api/web/getfolderbyserverrelativeurl('{}')/files/add(url='{}',overwrite=true)",
            destination.root_url(),
            destination.folder(),
            file_name
        );

        let response = self
            .transport
            .post(&url, &auth.mutating_headers(), Bytes::new())
            .await
            .map_err(|e| UploadError::FileCreationFailed {
                detail: e.to_string(),
                status: None,
            })?;

        if !response.is_success() {
            error!(
                status = response.status,
                file_name,
                folder = destination.folder(),
                "files/add call rejected"
            );
            return Err(UploadError::FileCreationFailed {
                detail: format!("files/add returned status {}", response.status),
                status: Some(response.status),
            });
        }

        info!(file_name, folder = destination.folder(), "File object created (overwrite=true)");
        Ok(())
    }
}
