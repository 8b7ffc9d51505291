use crate::errors::MediaGateResult;
use crate::fingerprint::stream_hash::hash_stream;
use crate::streams::MediaSource;

/// Compute the fingerprint of a file: `<hex size>:<hex content hash>`.
///
/// A fresh byte stream is opened for every call. Files of different sizes
/// always fingerprint differently; same-size files collide only when their
/// first 30MB coincide, which is acceptable for a cache key.
pub async fn fingerprint_source(source: &dyn MediaSource) -> MediaGateResult<String> {
    let mut stream = source.open_stream().await?;
    let hash = hash_stream(stream.as_mut()).await?;
    Ok(format!("{:x}:{}", source.size(), hash))
}
