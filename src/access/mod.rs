pub mod host;
pub use host::{AccessMode, FileCapability, HostEnvironment, PermissionState, Selection};

pub mod store;
pub use store::{
    CacheEntry, CapabilityStore, MemoryBackend, StoreBackend, StoreCell, ATIME_INDEX,
    RETENTION_MS, STORE_NAME,
};

pub mod sqlite_store;
pub use sqlite_store::{PersistableCapability, SqliteBackend};

pub mod local;
pub use local::{LocalHost, PathCapability};

pub mod coordinator;
pub use coordinator::{FileAccessCoordinator, PickedFile};
