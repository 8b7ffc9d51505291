pub mod bits;

pub mod streams;
pub use streams::{ByteStream, ChunkStream, LocalFileStream, LocalMediaFile, MediaSource, MemorySource};

pub mod fingerprint;
pub use fingerprint::{fingerprint_source, hash_stream, hash_stream_seeded, HASH_BYTE_BUDGET};

pub mod access;
pub use access::{
    AccessMode, CapabilityStore, FileAccessCoordinator, FileCapability, HostEnvironment,
    LocalHost, MemoryBackend, PathCapability, PermissionState, PersistableCapability, PickedFile,
    Selection, SqliteBackend, StoreBackend,
};

pub mod mp4;
pub use mp4::{
    build_decoder_config, parse_container, parse_source, AudioGeometry, AvccConfig,
    ContainerInfo, ContainerParser, DecoderConfig, ParsedContainer, ParserPhase, Track,
    TrackKind, VideoGeometry,
};

pub mod errors;
pub use errors::{
    AccessError, MediaGateError, MediaGateResult, Mp4Error, StoreError, StreamError,
};
