pub mod byte_stream;
pub use byte_stream::{ByteStream, ChunkStream, MediaSource, MemorySource};

pub mod local;
pub use local::{LocalFileStream, LocalMediaFile};
