use crate::errors::MediaGateResult;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A pull-based chunked byte source.
///
/// Consumers call `read` until it yields `None` and must `cancel` the stream
/// when they stop consuming it, on every exit path, so the underlying
/// resource is released.
#[async_trait]
pub trait ByteStream: Send {
    /// Pull the next chunk, or `None` once the stream is exhausted.
    async fn read(&mut self) -> MediaGateResult<Option<Vec<u8>>>;

    /// Release the underlying source. Idempotent.
    async fn cancel(&mut self) -> MediaGateResult<()>;
}

/// A provider of byte streams for one logical file.
///
/// `open_stream` returns a fresh stream on every call; a partially consumed
/// stream is never handed out twice.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Total size of the file in bytes.
    fn size(&self) -> u64;

    /// Open a fresh stream over the file contents.
    async fn open_stream(&self) -> MediaGateResult<Box<dyn ByteStream>>;
}

/// In-memory `ByteStream` yielding preset chunks.
///
/// Used for one-shot file contents handed over by hosts without durable
/// capabilities, and as the stream double in tests.
pub struct ChunkStream {
    chunks: VecDeque<Vec<u8>>,
    cancelled: Arc<AtomicBool>,
}

impl ChunkStream {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Split `data` into chunks of at most `chunk_size` bytes.
    pub fn from_bytes(data: &[u8], chunk_size: usize) -> Self {
        let chunks = data
            .chunks(chunk_size.max(1))
            .map(|c| c.to_vec())
            .collect();
        Self::new(chunks)
    }

    /// Shared flag flipped once the stream is cancelled.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }
}

#[async_trait]
impl ByteStream for ChunkStream {
    async fn read(&mut self) -> MediaGateResult<Option<Vec<u8>>> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.chunks.pop_front())
    }

    async fn cancel(&mut self) -> MediaGateResult<()> {
        self.cancelled.store(true, Ordering::SeqCst);
        self.chunks.clear();
        Ok(())
    }
}

/// In-memory `MediaSource` over a shared byte buffer.
#[derive(Clone)]
pub struct MemorySource {
    data: Arc<Vec<u8>>,
    chunk_size: usize,
}

impl MemorySource {
    const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(data),
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(data: Vec<u8>, chunk_size: usize) -> Self {
        Self {
            data: Arc::new(data),
            chunk_size: chunk_size.max(1),
        }
    }
}

#[async_trait]
impl MediaSource for MemorySource {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn open_stream(&self) -> MediaGateResult<Box<dyn ByteStream>> {
        Ok(Box::new(ChunkStream::from_bytes(&self.data, self.chunk_size)))
    }
}
