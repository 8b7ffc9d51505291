use crate::errors::{MediaGateResult, StreamError};
use crate::streams::byte_stream::{ByteStream, MediaSource};
use async_trait::async_trait;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Chunk size for local file reads
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Local file wrapper yielding pull-based chunks.
pub struct LocalFileStream {
    file: Option<File>,
}

impl LocalFileStream {
    pub fn open<P: AsRef<Path>>(path: P) -> MediaGateResult<Self> {
        Ok(Self {
            file: Some(File::open(path)?),
        })
    }
}

#[async_trait]
impl ByteStream for LocalFileStream {
    async fn read(&mut self) -> MediaGateResult<Option<Vec<u8>>> {
        let Some(file) = self.file.as_mut() else {
            return Ok(None);
        };
        let mut buf = vec![0u8; READ_CHUNK_SIZE];
        let n = file
            .read(&mut buf)
            .map_err(|e| StreamError::new(format!("failed to read file chunk: {}", e)))?;
        if n == 0 {
            self.file = None;
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf))
    }

    async fn cancel(&mut self) -> MediaGateResult<()> {
        self.file = None;
        Ok(())
    }
}

/// A local file as a `MediaSource`.
///
/// The size is captured at open time; each `open_stream` call reads the file
/// from the beginning through a fresh descriptor.
pub struct LocalMediaFile {
    path: PathBuf,
    size: u64,
}

impl LocalMediaFile {
    pub fn open<P: AsRef<Path>>(path: P) -> MediaGateResult<Self> {
        let path = path.as_ref().to_path_buf();
        let size = std::fs::metadata(&path)?.len();
        Ok(Self { path, size })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MediaSource for LocalMediaFile {
    fn size(&self) -> u64 {
        self.size
    }

    async fn open_stream(&self) -> MediaGateResult<Box<dyn ByteStream>> {
        Ok(Box::new(LocalFileStream::open(&self.path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::LocalMediaFile;
    use crate::streams::byte_stream::MediaSource;
    use std::io::Write;

    #[tokio::test]
    async fn test_local_file_round_trip() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"local file contents").unwrap();

        let source = LocalMediaFile::open(tmp.path()).unwrap();
        assert_eq!(source.size(), 19);

        let mut stream = source.open_stream().await.unwrap();
        let mut collected = Vec::new();
        while let Some(chunk) = stream.read().await.unwrap() {
            collected.extend_from_slice(&chunk);
        }
        stream.cancel().await.unwrap();
        assert_eq!(collected, b"local file contents");
    }
}
