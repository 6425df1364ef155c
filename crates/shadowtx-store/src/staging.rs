use std::fs::{self, File, Metadata, OpenOptions, Permissions};
use std::io::{BufWriter, Write};
use std::os::unix::fs::{fchown, MetadataExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::fs_utils::{remove_file_if_exists, sync_parent_dir};
use crate::{Result, StoreError};

pub(crate) struct StagingFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    installed: bool,
}

impl StagingFile {
    pub(crate) fn create(path: PathBuf, template: &Metadata) -> Result<Self> {
        remove_file_if_exists(&path)
            .map_err(|err| StoreError::system("remove stale staging file", &path, err))?;

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(&path)
            .map_err(|err| StoreError::system("create staging file", &path, err))?;
        let mut staging = Self {
            path,
            writer: None,
            installed: false,
        };

        fchown(&file, Some(template.uid()), Some(template.gid()))
            .map_err(|err| StoreError::system("chown", &staging.path, err))?;
        file.set_permissions(Permissions::from_mode(template.mode() & 0o7777))
            .map_err(|err| StoreError::system("chmod", &staging.path, err))?;

        staging.writer = Some(BufWriter::new(file));
        Ok(staging)
    }

    pub(crate) fn write_line(&mut self, line: &str) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(StoreError::integrity(
                &self.path,
                "staging file written after it was closed",
            ));
        };
        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.write_all(b"\n"))
            .map_err(|err| StoreError::system("write", &self.path, err))
    }

    pub(crate) fn install(mut self, target: &Path) -> Result<()> {
        let Some(writer) = self.writer.take() else {
            return Err(StoreError::integrity(
                &self.path,
                "staging file installed after it was closed",
            ));
        };
        let file = writer
            .into_inner()
            .map_err(|err| StoreError::system("flush", &self.path, err.into_error()))?;
        file.sync_all()
            .map_err(|err| StoreError::system("fsync", &self.path, err))?;
        drop(file);

        fs::rename(&self.path, target)
            .map_err(|err| StoreError::system("rename", target, err))?;
        self.installed = true;

        if let Err(err) = sync_parent_dir(target) {
            warn!(path = %target.display(), error = %err, "failed to sync table directory");
        }
        Ok(())
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        drop(self.writer.take());
        if self.installed {
            return;
        }
        if let Err(err) = remove_file_if_exists(&self.path) {
            warn!(path = %self.path.display(), error = %err, "failed to remove staging file");
        }
    }
}
