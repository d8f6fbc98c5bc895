use std::io::Write;

use sp_upload::chunk::{ChunkSource, FileChunkSource};
use tempfile::NamedTempFile;

fn temp_file_with(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(bytes).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

#[tokio::test]
async fn reads_file_in_max_size_chunks_with_smaller_tail() {
    let file = temp_file_with(&[9u8; 10]);
    let mut source = FileChunkSource::open(file.path(), 4)
        .await
        .expect("open chunk source");

    assert_eq!(source.total_size(), 10);

    let mut chunks = Vec::new();
    while let Some(chunk) = source.next_chunk().await.expect("read chunk") {
        chunks.push(chunk);
    }
    let lengths: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
    assert_eq!(lengths, vec![4, 4, 2]);

    let rejoined: Vec<u8> = chunks.concat();
    assert_eq!(rejoined, vec![9u8; 10], "chunks re-join to the source bytes in order");
}

#[tokio::test]
async fn exact_multiple_of_chunk_size_has_no_empty_tail_chunk() {
    let file = temp_file_with(&[1u8; 8]);
    let mut source = FileChunkSource::open(file.path(), 4).await.expect("open");

    let mut lengths = Vec::new();
    while let Some(chunk) = source.next_chunk().await.expect("read chunk") {
        lengths.push(chunk.len());
    }
    assert_eq!(lengths, vec![4, 4]);
}

#[tokio::test]
async fn zero_byte_file_yields_no_chunks() {
    let file = temp_file_with(&[]);
    let mut source = FileChunkSource::open(file.path(), 4).await.expect("open");

    assert_eq!(source.total_size(), 0);
    assert!(source.next_chunk().await.expect("read chunk").is_none());
}

#[tokio::test]
async fn file_smaller_than_chunk_size_is_one_chunk() {
    let file = temp_file_with(b"hello");
    let mut source = FileChunkSource::open(file.path(), 1024).await.expect("open");

    let chunk = source
        .next_chunk()
        .await
        .expect("read chunk")
        .expect("one chunk expected");
    assert_eq!(&chunk[..], b"hello");
    assert!(source.next_chunk().await.expect("read past end").is_none());
}

#[tokio::test]
async fn missing_file_fails_to_open() {
    let result = FileChunkSource::open("/definitely/not/here.bin", 4).await;
    assert!(result.is_err());
}
