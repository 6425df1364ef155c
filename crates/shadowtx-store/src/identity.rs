use shadowtx_core::{AccountRecord, GroupRecord, ShadowRecord, TableKind};
use tracing::{info, warn};

use crate::layout::DatabasePaths;
use crate::table::{AtomicTable, CountDelta};
use crate::{Result, StoreError};

pub trait TableOps {
    fn insert_account(&self, record: &AccountRecord) -> Result<CountDelta>;
    fn remove_account(&self, name: &str) -> Result<CountDelta>;
    fn insert_shadow(&self, record: &ShadowRecord) -> Result<CountDelta>;
    fn remove_shadow(&self, name: &str) -> Result<CountDelta>;
    fn insert_group(&self, record: &GroupRecord) -> Result<CountDelta>;
    fn remove_group(&self, name: &str) -> Result<CountDelta>;
}

#[derive(Debug, Clone, Copy)]
pub struct FileTables<'a> {
    paths: &'a DatabasePaths,
}

impl<'a> FileTables<'a> {
    pub fn new(paths: &'a DatabasePaths) -> Self {
        Self { paths }
    }

    pub fn accounts(&self) -> AtomicTable<AccountRecord> {
        AtomicTable::new(self.paths.passwd())
    }

    pub fn shadows(&self) -> AtomicTable<ShadowRecord> {
        AtomicTable::new(self.paths.shadow())
    }

    pub fn groups(&self) -> AtomicTable<GroupRecord> {
        AtomicTable::new(self.paths.group())
    }
}

impl TableOps for FileTables<'_> {
    fn insert_account(&self, record: &AccountRecord) -> Result<CountDelta> {
        self.accounts().insert(record)
    }

    fn remove_account(&self, name: &str) -> Result<CountDelta> {
        self.accounts().remove(name)
    }

    fn insert_shadow(&self, record: &ShadowRecord) -> Result<CountDelta> {
        self.shadows().insert(record)
    }

    fn remove_shadow(&self, name: &str) -> Result<CountDelta> {
        self.shadows().remove(name)
    }

    fn insert_group(&self, record: &GroupRecord) -> Result<CountDelta> {
        self.groups().insert(record)
    }

    fn remove_group(&self, name: &str) -> Result<CountDelta> {
        self.groups().remove(name)
    }
}

#[derive(Debug, Clone)]
pub struct IdentityTransaction<T> {
    tables: T,
}

impl<T: TableOps> IdentityTransaction<T> {
    pub fn new(tables: T) -> Self {
        Self { tables }
    }

    pub fn create_user(&self, account: &AccountRecord, credential: &ShadowRecord) -> Result<()> {
        if account.name != credential.name {
            return Err(StoreError::InvalidRecord {
                table: TableKind::Shadow,
                reason: format!(
                    "credential '{}' does not belong to account '{}'",
                    credential.name, account.name
                ),
            });
        }

        self.tables.insert_shadow(credential)?;
        if let Err(err) = self.tables.insert_account(account) {
            self.compensate("remove_shadow", &account.name, &err, || {
                self.tables.remove_shadow(&account.name)
            });
            return Err(err);
        }

        info!(user = %account.name, uid = account.uid, gid = account.gid, "created user");
        Ok(())
    }

    /// A failed shadow removal retries the account removal; the shadow error
    /// is returned either way.
    pub fn remove_user(&self, name: &str) -> Result<()> {
        self.tables.remove_account(name)?;
        if let Err(err) = self.tables.remove_shadow(name) {
            self.compensate("remove_account", name, &err, || {
                self.tables.remove_account(name)
            });
            return Err(err);
        }

        info!(user = %name, "removed user");
        Ok(())
    }

    pub fn create_credential(&self, credential: &ShadowRecord) -> Result<()> {
        self.tables.insert_shadow(credential)?;
        info!(user = %credential.name, "created credential entry");
        Ok(())
    }

    pub fn remove_credential(&self, name: &str) -> Result<()> {
        self.tables.remove_shadow(name)?;
        info!(user = %name, "removed credential entry");
        Ok(())
    }

    pub fn create_group(&self, group: &GroupRecord) -> Result<()> {
        self.tables.insert_group(group)?;
        info!(group = %group.name, gid = group.gid, "created group");
        Ok(())
    }

    pub fn remove_group(&self, name: &str) -> Result<()> {
        self.tables.remove_group(name)?;
        info!(group = %name, "removed group");
        Ok(())
    }

    fn compensate<F>(&self, step: &'static str, name: &str, cause: &StoreError, undo: F)
    where
        F: FnOnce() -> Result<CountDelta>,
    {
        match undo() {
            Ok(_) => warn!(step, user = %name, cause = %cause, "rolled back partial user mutation"),
            Err(undo_err) => warn!(
                step,
                user = %name,
                cause = %cause,
                error = %undo_err,
                "compensating step failed"
            ),
        }
    }
}
