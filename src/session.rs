//! Upload session driver: the protocol state machine behind one `upload`
//! call. Picks the single-shot path for files that fit in one chunk and the
//! start/continue/finish sequence otherwise, keeping the byte offset in
//! lockstep with what the store has acknowledged.
//!
//! Chunks are transferred strictly in source order; chunk n+1 is not
//! submitted before the response to chunk n has been observed, because the
//! `fileOffset` of each call must equal exactly the bytes already accepted.

use bytes::Bytes;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::chunk::ChunkSource;
use crate::destination::Destination;
use crate::error::UploadError;
use crate::progress::{Progress, ProgressSink};
use crate::transport::{ApiResponse, Headers, HttpTransport, TransportError};

/// Lifecycle of one upload session. One-directional: no chunk is sent once
/// the session is `Finished` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Created,
    Transferring,
    Finished,
    Failed,
}

/// Outcome of a successful upload call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub file_name: String,
    pub total_size: u64,
    /// Session calls made (start/continue/finish).
    pub requests: u32,
}

/// One upload session: fresh id per call, discarded when the call returns.
/// Success or failure, there is no persisted session state to resume from.
struct Session<'a> {
    transport: &'a dyn HttpTransport,
    headers: Headers,
    file_url: String,
    id: Uuid,
}

impl Session<'_> {
    fn start_url(&self) -> String {
        format!("{}/startupload(uploadId=guid'{}')", self.file_url, self.id)
    }

    fn continue_url(&self, offset: u64) -> String {
        format!(
            "{}/continueupload(uploadId=guid'{}',fileOffset={})",
            self.file_url, self.id, offset
        )
    }

    fn finish_url(&self, offset: u64) -> String {
        format!(
            "{}/finishupload(uploadId=guid'{}',fileOffset={})",
            self.file_url, self.id, offset
        )
    }

    async fn post(&self, url: &str, body: Bytes) -> Result<ApiResponse, TransportError> {
        self.transport.post(url, &self.headers, body).await
    }
}

/// Drive the session for `file_name` against the already-created file
/// object, consuming `source` to exhaustion or first failure.
///
/// Returns after the terminal `finishupload` succeeded; any non-success
/// response aborts immediately with the step-specific error, leaving the
/// partially uploaded file object for the next attempt's `overwrite=true`
/// to discard.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    transport: &dyn HttpTransport,
    auth: &AuthContext,
    destination: &Destination,
    file_name: &str,
    source: &mut dyn ChunkSource,
    max_chunk_size: usize,
    sink: Option<&ProgressSink>,
) -> Result<UploadReport, UploadError> {
    let total_size = source.total_size();
    let session = Session {
        transport,
        headers: auth.upload_headers(),
        file_url: format!(
            "{}/_api/web/getfilebyserverrelativeurl('{}/{}')",
            destination.root_url(),
            destination.folder(),
            file_name
        ),
        id: Uuid::new_v4(),
    };
    info!(
        file_name,
        total_size,
        max_chunk_size,
        session_id = %session.id,
        status = ?SessionStatus::Created,
        "Upload session created"
    );

    let requests = if total_size <= max_chunk_size as u64 {
        run_small(&session, source, total_size, sink).await?
    } else {
        run_chunked(&session, source, total_size, sink).await?
    };

    info!(
        file_name,
        total_size,
        session_id = %session.id,
        status = ?SessionStatus::Finished,
        "Upload session finished"
    );
    Ok(UploadReport {
        file_name: file_name.to_string(),
        total_size,
        requests,
    })
}

/// Fast path for files that fit in one chunk (including zero-byte files):
/// one start call carrying the whole body, one finish call at
/// `fileOffset = total_size` with an empty body. Never a continue call.
async fn run_small(
    session: &Session<'_>,
    source: &mut dyn ChunkSource,
    total_size: u64,
    sink: Option<&ProgressSink>,
) -> Result<u32, UploadError> {
    let body = source.next_chunk().await?.unwrap_or_default();
    debug!(
        session_id = %session.id,
        body_len = body.len(),
        status = ?SessionStatus::Transferring,
        "Small upload: start call"
    );

    let response = session
        .post(&session.start_url(), body)
        .await
        .map_err(|e| small_failed(session, format!("start call: {e}"), None))?;
    if !response.is_success() {
        return Err(small_failed(
            session,
            format!("start call returned status {}", response.status),
            Some(response.status),
        ));
    }

    let response = session
        .post(&session.finish_url(total_size), Bytes::new())
        .await
        .map_err(|e| small_failed(session, format!("finish call: {e}"), None))?;
    if !response.is_success() {
        return Err(small_failed(
            session,
            format!("finish call returned status {}", response.status),
            Some(response.status),
        ));
    }

    emit(sink, Progress::new(total_size, total_size));
    Ok(2)
}

fn small_failed(session: &Session<'_>, detail: String, status: Option<u16>) -> UploadError {
    error!(
        session_id = %session.id,
        status = ?status,
        status_tag = ?SessionStatus::Failed,
        "Small upload failed: {detail}"
    );
    UploadError::SmallUploadFailed { detail, status }
}

/// Generic path: start with the first chunk, continue through the middle,
/// finish with the chunk whose end lands exactly on `total_size`. The
/// last-chunk test is byte equality on offsets, never chunk count, so a file
/// sized an exact multiple of the chunk size needs no special case. A source
/// whose first chunk already covers the file gets an empty-body finish call,
/// and one that ends short of its declared size fails the session.
async fn run_chunked(
    session: &Session<'_>,
    source: &mut dyn ChunkSource,
    total_size: u64,
    sink: Option<&ProgressSink>,
) -> Result<u32, UploadError> {
    let mut offset: u64 = 0;
    let mut first = true;
    let mut requests: u32 = 0;
    let mut finished = false;

    while let Some(chunk) = source.next_chunk().await? {
        let len = chunk.len() as u64;

        let (url, step) = if first {
            (session.start_url(), Step::Start)
        } else if offset + len == total_size {
            (session.finish_url(offset), Step::Finish)
        } else {
            (session.continue_url(offset), Step::Continue)
        };
        debug!(
            session_id = %session.id,
            offset,
            chunk_len = len,
            step = ?step,
            status = ?SessionStatus::Transferring,
            "Submitting chunk"
        );

        let response = session
            .post(&url, chunk)
            .await
            .map_err(|e| step.failed(session, offset, e.to_string(), None))?;
        if !response.is_success() {
            return Err(step.failed(
                session,
                offset,
                format!("status {}", response.status),
                Some(response.status),
            ));
        }

        first = false;
        finished = matches!(step, Step::Finish);
        offset += len;
        requests += 1;
        emit(sink, Progress::new(offset, total_size));
    }

    if offset != total_size {
        // Source ended early or late against the size queried up front; the
        // file was mutated mid-upload, which the protocol does not support.
        return Err(Step::Finish.failed(
            session,
            offset,
            format!("source ended at {offset} bytes of a declared {total_size}"),
            None,
        ));
    }

    // A lone chunk covering the whole file goes out as the start call; the
    // session still needs its terminal call, empty-bodied like the
    // single-shot path.
    if !finished {
        let response = session
            .post(&session.finish_url(offset), Bytes::new())
            .await
            .map_err(|e| Step::Finish.failed(session, offset, e.to_string(), None))?;
        if !response.is_success() {
            return Err(Step::Finish.failed(
                session,
                offset,
                format!("status {}", response.status),
                Some(response.status),
            ));
        }
        requests += 1;
    }
    Ok(requests)
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Start,
    Continue,
    Finish,
}

impl Step {
    fn failed(
        self,
        session: &Session<'_>,
        offset: u64,
        detail: String,
        status: Option<u16>,
    ) -> UploadError {
        error!(
            session_id = %session.id,
            offset,
            step = ?self,
            status = ?status,
            status_tag = ?SessionStatus::Failed,
            "Chunk call failed: {detail}"
        );
        match self {
            Step::Start => UploadError::StartUploadFailed { detail, status },
            Step::Continue => UploadError::ContinueUploadFailed {
                detail,
                status,
                offset,
            },
            Step::Finish => UploadError::FinishUploadFailed {
                detail,
                status,
                offset,
            },
        }
    }
}

fn emit(sink: Option<&ProgressSink>, progress: Progress) {
    if let Some(sink) = sink {
        sink(&progress);
    }
}
