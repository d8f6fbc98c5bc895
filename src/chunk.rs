use std::io;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Default maximum chunk size: 16 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// A lazy, ordered, finite, non-restartable sequence of byte chunks plus the
/// total byte length of the source.
///
/// Every chunk is the configured maximum size except possibly the last,
/// which may be smaller. `total_size` is queried once when the source is
/// opened and treated as authoritative for the last-chunk boundary test and
/// for progress percentages; the source file must not be mutated while the
/// upload runs.
#[async_trait]
pub trait ChunkSource: Send {
    fn total_size(&self) -> u64;

    /// Next chunk in source order, or `None` when exhausted.
    async fn next_chunk(&mut self) -> io::Result<Option<Bytes>>;
}

/// Chunk source over a file on disk.
pub struct FileChunkSource {
    file: File,
    total_size: u64,
    max_chunk_size: usize,
}

impl FileChunkSource {
    pub async fn open(path: impl AsRef<Path>, max_chunk_size: usize) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).await?;
        let total_size = file.metadata().await?.len();
        debug!(path = %path.display(), total_size, max_chunk_size, "Opened chunk source");

        Ok(FileChunkSource {
            file,
            total_size,
            max_chunk_size,
        })
    }
}

#[async_trait]
impl ChunkSource for FileChunkSource {
    fn total_size(&self) -> u64 {
        self.total_size
    }

    async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        let mut buffer = vec![0u8; self.max_chunk_size];
        let mut filled = 0;

        // A single read may return short; keep filling until the buffer is
        // full or the file ends.
        while filled < buffer.len() {
            let n = self.file.read(&mut buffer[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }
        buffer.truncate(filled);
        Ok(Some(Bytes::from(buffer)))
    }
}

/// In-memory chunk source for tests.
#[cfg(any(test, feature = "test-export-mocks"))]
pub struct MemoryChunkSource {
    data: Bytes,
    position: usize,
    max_chunk_size: usize,
}

#[cfg(any(test, feature = "test-export-mocks"))]
impl MemoryChunkSource {
    pub fn new(data: impl Into<Bytes>, max_chunk_size: usize) -> Self {
        MemoryChunkSource {
            data: data.into(),
            position: 0,
            max_chunk_size,
        }
    }
}

#[cfg(any(test, feature = "test-export-mocks"))]
#[async_trait]
impl ChunkSource for MemoryChunkSource {
    fn total_size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        if self.position >= self.data.len() {
            return Ok(None);
        }
        let end = (self.position + self.max_chunk_size).min(self.data.len());
        let chunk = self.data.slice(self.position..end);
        self.position = end;
        Ok(Some(chunk))
    }
}
