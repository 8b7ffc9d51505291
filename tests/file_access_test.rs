use mediagate::{FileAccessCoordinator, LocalHost, MediaSource};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn pattern_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

fn write_media_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn coordinator_in(dir: &TempDir) -> FileAccessCoordinator<LocalHost> {
    FileAccessCoordinator::new(LocalHost::new(dir.path().join("handles.db")))
}

#[tokio::test]
async fn test_new_file_then_recent_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = write_media_file(&dir, "clip.mp4", &pattern_bytes(7680));
    let coordinator = coordinator_in(&dir);

    coordinator.host().enqueue_selection(&path);
    let picked = coordinator.request_new_file().await.unwrap();
    assert_eq!(picked.fingerprint, "1e00:1f9f84ad0f3421");
    assert_eq!(picked.file.size(), 7680);

    let recovered = coordinator
        .request_recent_file(&picked.fingerprint)
        .await
        .unwrap()
        .expect("cached capability should re-open the file");
    assert_eq!(recovered.fingerprint, picked.fingerprint);
    assert_eq!(recovered.file.size(), 7680);
}

#[tokio::test]
async fn test_recent_file_unknown_fingerprint_is_absent() {
    let dir = TempDir::new().unwrap();
    let coordinator = coordinator_in(&dir);

    let recovered = coordinator.request_recent_file("1e00:deadbeef").await.unwrap();
    assert!(recovered.is_none());
}

#[tokio::test]
async fn test_dismissed_selection_surfaces_no_file_selected() {
    let dir = TempDir::new().unwrap();
    let coordinator = coordinator_in(&dir);

    // nothing enqueued: the user dismissed the dialog
    let err = coordinator.request_new_file().await.unwrap_err();
    assert!(err.is_no_file_selected());
}

#[tokio::test]
async fn test_changed_file_rekeys_and_keeps_old_entry() {
    let dir = TempDir::new().unwrap();
    let path = write_media_file(&dir, "clip.mp4", &pattern_bytes(4096));
    let coordinator = coordinator_in(&dir);

    coordinator.host().enqueue_selection(&path);
    let old_fingerprint = coordinator.request_new_file().await.unwrap().fingerprint;

    // same size, different content: only the hash side changes
    let mut changed = pattern_bytes(4096);
    changed[0] ^= 0xFF;
    fs::write(&path, &changed).unwrap();

    let recovered = coordinator
        .request_recent_file(&old_fingerprint)
        .await
        .unwrap()
        .expect("capability still opens the changed file");
    assert_ne!(recovered.fingerprint, old_fingerprint);

    // the new key resolves
    let by_new_key = coordinator
        .request_recent_file(&recovered.fingerprint)
        .await
        .unwrap();
    assert!(by_new_key.is_some());

    // soft staleness: the old key is not deleted and still resolves until
    // the eviction sweep ages it out
    let by_old_key = coordinator
        .request_recent_file(&old_fingerprint)
        .await
        .unwrap()
        .expect("old key must stay usable");
    assert_eq!(by_old_key.fingerprint, recovered.fingerprint);
}

#[tokio::test]
async fn test_deleted_file_downgrades_to_absent() {
    let dir = TempDir::new().unwrap();
    let path = write_media_file(&dir, "clip.mp4", &pattern_bytes(512));
    let coordinator = coordinator_in(&dir);

    coordinator.host().enqueue_selection(&path);
    let picked = coordinator.request_new_file().await.unwrap();

    // the host revokes the capability out from under the cache
    fs::remove_file(&path).unwrap();

    let recovered = coordinator
        .request_recent_file(&picked.fingerprint)
        .await
        .unwrap();
    assert!(recovered.is_none());
}

#[tokio::test]
async fn test_host_without_capabilities_never_recovers() {
    let dir = TempDir::new().unwrap();
    let path = write_media_file(&dir, "clip.mp4", &pattern_bytes(2048));
    let coordinator = FileAccessCoordinator::new(LocalHost::without_capabilities(
        dir.path().join("handles.db"),
    ));

    coordinator.host().enqueue_selection(&path);
    let picked = coordinator.request_new_file().await.unwrap();

    // nothing was persisted, so recovery is absent immediately
    let recovered = coordinator
        .request_recent_file(&picked.fingerprint)
        .await
        .unwrap();
    assert!(recovered.is_none());
}

#[tokio::test]
async fn test_capabilities_persist_across_coordinators() {
    let dir = TempDir::new().unwrap();
    let path = write_media_file(&dir, "clip.mp4", &pattern_bytes(1024));

    let fingerprint = {
        let coordinator = coordinator_in(&dir);
        coordinator.host().enqueue_selection(&path);
        coordinator.request_new_file().await.unwrap().fingerprint
    };

    // a fresh coordinator over the same store recovers the file, as a new
    // session would
    let coordinator = coordinator_in(&dir);
    let recovered = coordinator.request_recent_file(&fingerprint).await.unwrap();
    assert!(recovered.is_some());
}
