//! Reference host for native embeddings.
//!
//! Desktop-style hosts have no browser picker dialog; the embedder's UI
//! enqueues the user's selection and capabilities are path-backed tokens
//! whose permission state is probed from the filesystem.

use crate::access::host::{
    AccessMode, FileCapability, HostEnvironment, PermissionState, Selection,
};
use crate::access::sqlite_store::{PersistableCapability, SqliteBackend};
use crate::access::store::StoreBackend;
use crate::errors::{AccessError, MediaGateResult};
use crate::streams::{LocalMediaFile, MediaSource};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A path-backed capability granted by a `LocalHost`.
///
/// Deleting or un-sharing the underlying file is the local analog of the
/// host revoking the token.
#[derive(Debug, Clone, PartialEq)]
pub struct PathCapability {
    path: PathBuf,
}

impl PathCapability {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn probe(&self, mode: AccessMode) -> PermissionState {
        match std::fs::metadata(&self.path) {
            Ok(meta) => match mode {
                AccessMode::Read => PermissionState::Granted,
                AccessMode::ReadWrite => {
                    if meta.permissions().readonly() {
                        PermissionState::Denied
                    } else {
                        PermissionState::Granted
                    }
                }
            },
            Err(_) => PermissionState::Denied,
        }
    }
}

#[async_trait]
impl FileCapability for PathCapability {
    async fn query_permission(&self, mode: AccessMode) -> MediaGateResult<PermissionState> {
        Ok(self.probe(mode))
    }

    async fn request_permission(&self, mode: AccessMode) -> MediaGateResult<PermissionState> {
        // no interactive prompt to escalate with; requesting re-probes
        Ok(self.probe(mode))
    }

    async fn open(&self) -> MediaGateResult<Box<dyn MediaSource>> {
        Ok(Box::new(LocalMediaFile::open(&self.path)?))
    }
}

impl PersistableCapability for PathCapability {
    fn to_stored_bytes(&self) -> Vec<u8> {
        self.path.to_string_lossy().into_owned().into_bytes()
    }

    fn from_stored_bytes(bytes: &[u8]) -> Option<Self> {
        String::from_utf8(bytes.to_vec())
            .ok()
            .map(|s| Self::new(PathBuf::from(s)))
    }
}

/// Host environment backed by the local filesystem.
///
/// File selection is embedder-driven: the surrounding UI pushes the chosen
/// path with `enqueue_selection` before the coordinator calls `pick_file`.
/// An empty queue means the user dismissed the selection.
pub struct LocalHost {
    db_path: PathBuf,
    selections: Mutex<VecDeque<PathBuf>>,
    capabilities: bool,
}

impl LocalHost {
    /// Host with durable path capabilities persisted at `db_path`.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            selections: Mutex::new(VecDeque::new()),
            capabilities: true,
        }
    }

    /// Legacy host yielding only one-shot file contents, never capabilities.
    pub fn without_capabilities<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            capabilities: false,
            ..Self::new(db_path)
        }
    }

    /// Record a user selection for the next `pick_file` call.
    pub fn enqueue_selection<P: AsRef<Path>>(&self, path: P) {
        if let Ok(mut queue) = self.selections.lock() {
            queue.push_back(path.as_ref().to_path_buf());
        }
    }
}

#[async_trait]
impl HostEnvironment for LocalHost {
    type Capability = PathCapability;

    fn supports_capabilities(&self) -> bool {
        self.capabilities
    }

    async fn pick_file(&self) -> MediaGateResult<Selection<PathCapability>> {
        let picked = self
            .selections
            .lock()
            .map_err(|_| std::io::Error::other("selection queue mutex poisoned"))?
            .pop_front();

        let Some(path) = picked else {
            return Err(AccessError::NoFileSelected.into());
        };

        let file: Box<dyn MediaSource> = Box::new(LocalMediaFile::open(&path)?);
        let capability = self.capabilities.then(|| PathCapability::new(&path));
        Ok(Selection { file, capability })
    }

    async fn open_capability_store(
        &self,
    ) -> MediaGateResult<Box<dyn StoreBackend<PathCapability>>> {
        let backend: SqliteBackend<PathCapability> = SqliteBackend::open(&self.db_path)?;
        Ok(Box::new(backend))
    }
}

#[cfg(test)]
mod tests {
    use super::{PathCapability, PersistableCapability};
    use crate::access::host::{AccessMode, FileCapability, PermissionState};
    use std::io::Write;

    #[tokio::test]
    async fn test_path_capability_permission_tracks_file_presence() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"content").unwrap();

        let capability = PathCapability::new(tmp.path());
        assert_eq!(
            capability.query_permission(AccessMode::Read).await.unwrap(),
            PermissionState::Granted
        );

        let path = tmp.path().to_path_buf();
        drop(tmp);
        let revoked = PathCapability::new(&path);
        assert_eq!(
            revoked.query_permission(AccessMode::Read).await.unwrap(),
            PermissionState::Denied
        );
    }

    #[test]
    fn test_stored_bytes_round_trip() {
        let capability = PathCapability::new("/media/clips/take-01.mp4");
        let decoded = PathCapability::from_stored_bytes(&capability.to_stored_bytes()).unwrap();
        assert_eq!(decoded, capability);
    }
}
