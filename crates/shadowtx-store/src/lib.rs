mod access;
mod config;
mod error;
mod fs_utils;
mod identity;
mod layout;
mod lock;
mod staging;
mod store;
mod table;

pub use config::{LockSettings, StoreConfig};
pub use error::{ErrorKind, Result, StoreError};
pub use identity::{FileTables, IdentityTransaction, TableOps};
pub use layout::{
    staging_path, DatabasePaths, SYSTEM_GROUP_PATH, SYSTEM_LOCK_PATH, SYSTEM_PASSWD_PATH,
    SYSTEM_SHADOW_PATH,
};
pub use lock::{CancellationToken, DatabaseLock, DatabaseLockGuard};
pub use store::{IdentityStore, LockedStore};
pub use table::{AtomicTable, CountDelta, Disposition};
