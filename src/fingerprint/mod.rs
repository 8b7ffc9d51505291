pub mod stream_hash;
pub use stream_hash::{hash_stream, hash_stream_seeded, HASH_BYTE_BUDGET};

pub mod file_id;
pub use file_id::fingerprint_source;
