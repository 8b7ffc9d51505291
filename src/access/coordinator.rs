//! Orchestrates user file selection, fingerprinting, and capability
//! persistence.
//!
//! `request_new_file` is a deliberate user action and surfaces every
//! failure. `request_recent_file` is best-effort recovery: a revoked
//! capability or denied permission is steady state, downgraded to `None`,
//! while a broken backing store still surfaces.

use crate::access::host::{AccessMode, FileCapability, HostEnvironment, PermissionState, Selection};
use crate::access::store::{CapabilityStore, StoreCell};
use crate::errors::{AccessError, MediaGateResult};
use crate::fingerprint::fingerprint_source;
use crate::streams::MediaSource;
use std::sync::Arc;

/// A selected or recovered file together with its fingerprint.
pub struct PickedFile {
    pub file: Box<dyn MediaSource>,
    pub fingerprint: String,
}

impl std::fmt::Debug for PickedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickedFile")
            .field("fingerprint", &self.fingerprint)
            .field("size", &self.file.size())
            .finish()
    }
}

pub struct FileAccessCoordinator<H: HostEnvironment> {
    host: H,
    store: StoreCell<H::Capability>,
}

impl<H: HostEnvironment> FileAccessCoordinator<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            store: StoreCell::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    async fn store(&self) -> MediaGateResult<Arc<CapabilityStore<H::Capability>>> {
        self.store
            .open(|| self.host.open_capability_store())
            .await
    }

    /// Ask the user to pick a file, fingerprint it, and remember the granted
    /// capability (if any) for later sessions.
    ///
    /// The returned fingerprint is the key for `request_recent_file`.
    pub async fn request_new_file(&self) -> MediaGateResult<PickedFile> {
        let Selection { file, capability } = self.host.pick_file().await?;

        let fingerprint = fingerprint_source(file.as_ref()).await?;

        if self.host.supports_capabilities() {
            if let Some(capability) = capability {
                self.store().await?.put(&fingerprint, capability).await?;
            }
        }

        Ok(PickedFile { file, fingerprint })
    }

    /// Try to re-open a previously selected file without user interaction.
    ///
    /// Returns `None` when nothing can be recovered: no capability support,
    /// no cached entry, permission not granted, or the capability no longer
    /// opens the file. If the file changed since last use the entry is
    /// re-keyed under the new fingerprint; the old key is left to age out so
    /// concurrent lookups under it keep working.
    pub async fn request_recent_file(
        &self,
        fingerprint: &str,
    ) -> MediaGateResult<Option<PickedFile>> {
        if !self.host.supports_capabilities() {
            return Ok(None);
        }

        let store = self.store().await?;
        let Some(capability) = store.get(fingerprint).await? else {
            return Ok(None);
        };

        match self.reopen(&capability, fingerprint, &store).await {
            Ok(picked) => Ok(Some(picked)),
            Err(err) => {
                log::warn!("cannot re-use cached capability for {}: {}", fingerprint, err);
                Ok(None)
            }
        }
    }

    async fn reopen(
        &self,
        capability: &H::Capability,
        fingerprint: &str,
        store: &CapabilityStore<H::Capability>,
    ) -> MediaGateResult<PickedFile> {
        if capability.query_permission(AccessMode::Read).await? != PermissionState::Granted {
            let state = capability.request_permission(AccessMode::Read).await?;
            if state != PermissionState::Granted {
                return Err(AccessError::PermissionUnavailable {
                    message: "read permission was not granted".to_string(),
                }
                .into());
            }
        }

        let file = capability.open().await?;
        let new_fingerprint = fingerprint_source(file.as_ref()).await?;

        if new_fingerprint != fingerprint {
            // file content changed since last use; re-key, keep the old entry
            store.put(&new_fingerprint, capability.clone()).await?;
        }

        Ok(PickedFile {
            file,
            fingerprint: new_fingerprint,
        })
    }
}
