use std::path::Path;

use shadowtx_core::{days_since_epoch, AccountRecord, GroupRecord, ShadowRecord};

use crate::config::{LockSettings, StoreConfig};
use crate::identity::{FileTables, IdentityTransaction};
use crate::layout::DatabasePaths;
use crate::lock::{CancellationToken, DatabaseLock, DatabaseLockGuard};
use crate::Result;

#[derive(Debug, Clone)]
pub struct IdentityStore {
    paths: DatabasePaths,
    lock_settings: LockSettings,
}

impl IdentityStore {
    pub fn new(paths: DatabasePaths, lock_settings: LockSettings) -> Self {
        Self {
            paths,
            lock_settings,
        }
    }

    pub fn system() -> Self {
        Self::new(DatabasePaths::system(), LockSettings::default())
    }

    pub fn from_config(config: &StoreConfig, root: Option<&Path>) -> Self {
        Self::new(config.paths(root), config.lock_settings())
    }

    pub fn paths(&self) -> &DatabasePaths {
        &self.paths
    }

    pub fn lock(&self, cancel: &CancellationToken) -> Result<DatabaseLockGuard> {
        DatabaseLock::new(self.paths.clone(), self.lock_settings).acquire(cancel)
    }

    pub fn with_lock<T, F>(&self, cancel: &CancellationToken, operation: F) -> Result<T>
    where
        F: FnOnce(&LockedStore<'_>) -> Result<T>,
    {
        let guard = self.lock(cancel)?;
        let result = operation(&self.assume_locked());
        guard.release();
        result
    }

    /// For callers already holding the lock, e.g. through `lckpwdf(3)`.
    pub fn assume_locked(&self) -> LockedStore<'_> {
        LockedStore { paths: &self.paths }
    }

    /// Creates the account and its credential entry. Without `credential` a
    /// disabled entry dated today is written.
    pub fn create_user(
        &self,
        account: &AccountRecord,
        credential: Option<&ShadowRecord>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.with_lock(cancel, |locked| locked.create_user(account, credential))
    }

    pub fn remove_user(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        self.with_lock(cancel, |locked| locked.remove_user(name))
    }

    pub fn create_credential(
        &self,
        credential: &ShadowRecord,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.with_lock(cancel, |locked| locked.create_credential(credential))
    }

    pub fn remove_credential(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        self.with_lock(cancel, |locked| locked.remove_credential(name))
    }

    pub fn create_group(&self, group: &GroupRecord, cancel: &CancellationToken) -> Result<()> {
        self.with_lock(cancel, |locked| locked.create_group(group))
    }

    pub fn remove_group(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        self.with_lock(cancel, |locked| locked.remove_group(name))
    }

    pub fn accounts(&self) -> Result<Vec<AccountRecord>> {
        FileTables::new(&self.paths).accounts().records()
    }

    pub fn credentials(&self) -> Result<Vec<ShadowRecord>> {
        FileTables::new(&self.paths).shadows().records()
    }

    pub fn groups(&self) -> Result<Vec<GroupRecord>> {
        FileTables::new(&self.paths).groups().records()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LockedStore<'a> {
    paths: &'a DatabasePaths,
}

impl<'a> LockedStore<'a> {
    fn transaction(&self) -> IdentityTransaction<FileTables<'a>> {
        IdentityTransaction::new(FileTables::new(self.paths))
    }

    pub fn create_user(
        &self,
        account: &AccountRecord,
        credential: Option<&ShadowRecord>,
    ) -> Result<()> {
        match credential {
            Some(credential) => self.transaction().create_user(account, credential),
            None => {
                let credential = ShadowRecord::disabled(account.name.clone(), days_since_epoch());
                self.transaction().create_user(account, &credential)
            }
        }
    }

    pub fn remove_user(&self, name: &str) -> Result<()> {
        self.transaction().remove_user(name)
    }

    pub fn create_credential(&self, credential: &ShadowRecord) -> Result<()> {
        self.transaction().create_credential(credential)
    }

    pub fn remove_credential(&self, name: &str) -> Result<()> {
        self.transaction().remove_credential(name)
    }

    pub fn create_group(&self, group: &GroupRecord) -> Result<()> {
        self.transaction().create_group(group)
    }

    pub fn remove_group(&self, name: &str) -> Result<()> {
        self.transaction().remove_group(name)
    }
}
