//! Host environment seam.
//!
//! The interactive file picker, the capability tokens it may grant, and the
//! persistent store backing the capability cache are all supplied by the
//! embedding host. This crate only orchestrates them.

use crate::errors::MediaGateResult;
use crate::streams::MediaSource;
use async_trait::async_trait;

use super::store::StoreBackend;

/// Access mode asked of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    ReadWrite,
}

/// Permission state reported by the host for a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// The host would need to prompt the user before deciding.
    Prompt,
}

/// An unforgeable, host-granted token for re-opening one specific file
/// without a fresh selection dialog.
///
/// Tokens are only ever obtained from the host; cloning one denotes the same
/// underlying grant, not a new one. The host may revoke a token at any time,
/// after which `open` fails permanently.
#[async_trait]
pub trait FileCapability: Clone + Send + Sync {
    /// Current permission state, without prompting the user.
    async fn query_permission(&self, mode: AccessMode) -> MediaGateResult<PermissionState>;

    /// Ask the host to grant permission. May suspend on a user prompt
    /// indefinitely; no timeout is imposed here.
    async fn request_permission(&self, mode: AccessMode) -> MediaGateResult<PermissionState>;

    /// Re-open the file this capability refers to.
    async fn open(&self) -> MediaGateResult<Box<dyn MediaSource>>;
}

/// Result of one interactive file selection.
pub struct Selection<C> {
    pub file: Box<dyn MediaSource>,
    /// Present only when the host supports durable capabilities.
    pub capability: Option<C>,
}

/// The embedding host: file selection, capability support, and the
/// persistent key-value store backing the capability cache.
#[async_trait]
pub trait HostEnvironment: Send + Sync {
    type Capability: FileCapability + 'static;

    /// Whether this host can grant durable capabilities at all. Hosts
    /// without support only ever yield one-shot file contents.
    fn supports_capabilities(&self) -> bool;

    /// Show the interactive file selection and wait for the user.
    ///
    /// A dismissed dialog is `AccessError::NoFileSelected`.
    async fn pick_file(&self) -> MediaGateResult<Selection<Self::Capability>>;

    /// Open the host's persistent store for cached capabilities.
    async fn open_capability_store(
        &self,
    ) -> MediaGateResult<Box<dyn StoreBackend<Self::Capability>>>;
}
