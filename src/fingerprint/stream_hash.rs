//! Streaming fingerprint hash (cyrb53 family).
//!
//! Fast and well distributed, but collision-findable: suitable as a cache or
//! dedup key, never as a security boundary.

use crate::errors::MediaGateResult;
use crate::streams::ByteStream;

/// Only the first 30MB of content participate in the hash.
pub const HASH_BYTE_BUDGET: usize = 30_000_000;

const SEED_1: u32 = 0xdead_beef;
const SEED_2: u32 = 0x41c6_ce57;
const MIX_1: u32 = 2_654_435_761;
const MIX_2: u32 = 1_597_334_677;
const FINAL_1: u32 = 2_246_822_507;
const FINAL_2: u32 = 3_266_489_909;

/// Hash a byte stream with seed 0.
///
/// See [`hash_stream_seeded`].
pub async fn hash_stream(stream: &mut dyn ByteStream) -> MediaGateResult<String> {
    hash_stream_seeded(stream, 0).await
}

/// Hash a byte stream into a 64-bit-class value, printed as lowercase hex.
///
/// The stream is consumed to completion even past the mixing budget, so the
/// source observes an ordinary end of stream, and is cancelled afterward no
/// matter how the hashing loop exits.
pub async fn hash_stream_seeded(stream: &mut dyn ByteStream, seed: u32) -> MediaGateResult<String> {
    let digest = mix_stream(stream, seed).await;

    // release the stream, errors are uninteresting here
    if let Err(err) = stream.cancel().await {
        log::debug!("byte stream cancel failed: {}", err);
    }

    digest
}

async fn mix_stream(stream: &mut dyn ByteStream, seed: u32) -> MediaGateResult<String> {
    let mut h1 = SEED_1 ^ seed;
    let mut h2 = SEED_2 ^ seed;
    let mut mixed = 0usize;

    while let Some(chunk) = stream.read().await? {
        let take = chunk.len().min(HASH_BYTE_BUDGET - mixed);
        for &byte in &chunk[..take] {
            h1 = (h1 ^ byte as u32).wrapping_mul(MIX_1);
            h2 = (h2 ^ byte as u32).wrapping_mul(MIX_2);
        }
        mixed += take;
        // keep draining chunks past the budget without mixing them
    }

    h1 = (h1 ^ (h1 >> 16)).wrapping_mul(FINAL_1) ^ (h2 ^ (h2 >> 13)).wrapping_mul(FINAL_2);
    h2 = (h2 ^ (h2 >> 16)).wrapping_mul(FINAL_1) ^ (h1 ^ (h1 >> 13)).wrapping_mul(FINAL_2);

    let value = (((h2 & 0x1F_FFFF) as u64) << 32) | h1 as u64;
    Ok(format!("{:x}", value))
}

#[cfg(test)]
mod tests {
    use super::{hash_stream, hash_stream_seeded, HASH_BYTE_BUDGET};
    use crate::streams::ChunkStream;
    use proptest::prelude::*;
    use std::sync::atomic::Ordering;

    async fn hash_bytes(data: &[u8], chunk_size: usize) -> String {
        let mut stream = ChunkStream::from_bytes(data, chunk_size);
        hash_stream(&mut stream).await.unwrap()
    }

    #[tokio::test]
    async fn test_known_digests() {
        assert_eq!(hash_bytes(b"", 16).await, "bdcb81aee8d83");
        assert_eq!(hash_bytes(b"\x00", 16).await, "fcc4eeb27845a");
        assert_eq!(hash_bytes(b"abc", 16).await, "11f9f91ac18c8d");
        assert_eq!(hash_bytes(b"hello world", 16).await, "b9417d15d1014");
        assert_eq!(
            hash_bytes(b"The quick brown fox jumps over the lazy dog", 7).await,
            "dc350ebfa20ed"
        );
    }

    #[tokio::test]
    async fn test_seed_changes_digest() {
        let mut stream = ChunkStream::from_bytes(b"abc", 16);
        let seeded = hash_stream_seeded(&mut stream, 1).await.unwrap();
        assert_eq!(seeded, "ff0af160c97e2");
        assert_ne!(seeded, hash_bytes(b"abc", 16).await);
    }

    #[tokio::test]
    async fn test_near_collision_diverges() {
        assert_ne!(hash_bytes(b"abc", 16).await, hash_bytes(b"abd", 16).await);
        assert_ne!(hash_bytes(b"abc", 16).await, hash_bytes(b"acb", 16).await);
    }

    #[tokio::test]
    async fn test_stream_cancelled_after_hashing() {
        let mut stream = ChunkStream::from_bytes(b"abc", 16);
        let flag = stream.cancel_flag();
        hash_stream(&mut stream).await.unwrap();
        assert!(flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_budget_cap_is_strict() {
        // Two streams identical in their first 30MB but different afterward
        // must hash identically; the tail is drained but never mixed.
        let mut head = vec![0xA5u8; HASH_BYTE_BUDGET];
        head.extend_from_slice(b"tail one");
        let one = hash_bytes(&head, 1 << 20).await;

        head.truncate(HASH_BYTE_BUDGET);
        head.extend_from_slice(b"a very different tail");
        let two = hash_bytes(&head, 1 << 20).await;

        assert_eq!(one, two);

        // A difference inside the budget still diverges.
        head[HASH_BYTE_BUDGET - 1] ^= 0xFF;
        let three = hash_bytes(&head, 1 << 20).await;
        assert_ne!(one, three);
    }

    proptest! {
        #[test]
        fn prop_deterministic_and_chunking_invariant(
            data in proptest::collection::vec(any::<u8>(), 0..2048),
            chunk_a in 1usize..64,
            chunk_b in 1usize..64,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            let (a, b) = rt.block_on(async {
                (hash_bytes(&data, chunk_a).await, hash_bytes(&data, chunk_b).await)
            });
            prop_assert_eq!(a, b);
        }
    }
}
