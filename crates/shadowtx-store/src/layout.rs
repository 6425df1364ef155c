use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const SYSTEM_PASSWD_PATH: &str = "/etc/passwd";
pub const SYSTEM_SHADOW_PATH: &str = "/etc/shadow";
pub const SYSTEM_GROUP_PATH: &str = "/etc/group";
/// Lock file shared with `lckpwdf(3)`.
pub const SYSTEM_LOCK_PATH: &str = "/etc/.pwd.lock";

const STAGING_SUFFIX: &str = "cow";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabasePaths {
    passwd: PathBuf,
    shadow: PathBuf,
    group: PathBuf,
    lock: PathBuf,
}

impl DatabasePaths {
    pub fn new(
        passwd: impl Into<PathBuf>,
        shadow: impl Into<PathBuf>,
        group: impl Into<PathBuf>,
        lock: impl Into<PathBuf>,
    ) -> Self {
        Self {
            passwd: passwd.into(),
            shadow: shadow.into(),
            group: group.into(),
            lock: lock.into(),
        }
    }

    pub fn system() -> Self {
        Self::new(
            SYSTEM_PASSWD_PATH,
            SYSTEM_SHADOW_PATH,
            SYSTEM_GROUP_PATH,
            SYSTEM_LOCK_PATH,
        )
    }

    pub fn under_root(root: impl AsRef<Path>) -> Self {
        let etc = root.as_ref().join("etc");
        Self::new(
            etc.join("passwd"),
            etc.join("shadow"),
            etc.join("group"),
            etc.join(".pwd.lock"),
        )
    }

    pub fn passwd(&self) -> &Path {
        &self.passwd
    }

    pub fn shadow(&self) -> &Path {
        &self.shadow
    }

    pub fn group(&self) -> &Path {
        &self.group
    }

    pub fn lock(&self) -> &Path {
        &self.lock
    }
}

pub fn staging_path(table: &Path) -> PathBuf {
    let mut name = table
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| OsString::from("table"));
    name.push(".");
    name.push(STAGING_SUFFIX);
    table.with_file_name(name)
}
