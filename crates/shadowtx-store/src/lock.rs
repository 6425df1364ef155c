use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use tracing::{debug, warn};

use crate::access::{require_access, Access};
use crate::config::LockSettings;
use crate::layout::DatabasePaths;
use crate::{Result, StoreError};

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseLock {
    paths: DatabasePaths,
    settings: LockSettings,
}

impl DatabaseLock {
    pub fn new(paths: DatabasePaths, settings: LockSettings) -> Self {
        Self { paths, settings }
    }

    pub fn path(&self) -> &Path {
        self.paths.lock()
    }

    pub fn acquire(&self, cancel: &CancellationToken) -> Result<DatabaseLockGuard> {
        require_access(self.paths.passwd(), Access::ReadWrite)?;
        require_access(self.paths.group(), Access::ReadWrite)?;

        let lock_path = self.paths.lock();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o600)
            .open(lock_path)
            .map_err(|err| StoreError::system("open lock file", lock_path, err))?;

        let started = Instant::now();
        let mut attempts = 0_u64;
        loop {
            if cancel.is_cancelled() {
                debug!(
                    lock = %lock_path.display(),
                    attempts,
                    "lock wait cancelled"
                );
                return Err(StoreError::Cancelled);
            }

            attempts += 1;
            let acquired = try_lock_exclusive(&file)
                .map_err(|err| StoreError::system("lock", lock_path, err))?;
            if acquired {
                debug!(
                    lock = %lock_path.display(),
                    attempts,
                    waited_ms = started.elapsed().as_millis() as u64,
                    "acquired database lock"
                );
                return Ok(DatabaseLockGuard {
                    file: Some(file),
                    path: lock_path.to_path_buf(),
                });
            }

            if let Some(timeout) = self.settings.timeout {
                if started.elapsed() >= timeout {
                    return Err(StoreError::LockTimeout {
                        waited_ms: started.elapsed().as_millis(),
                    });
                }
            }
            thread::sleep(self.settings.poll_interval);
        }
    }
}

#[derive(Debug)]
pub struct DatabaseLockGuard {
    file: Option<File>,
    path: PathBuf,
}

impl DatabaseLockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(mut self) {
        self.unlock();
    }

    fn unlock(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };
        if let Err(err) = unlock(&file) {
            warn!(lock = %self.path.display(), error = %err, "failed to release database lock");
        }
        drop(file);
        debug!(lock = %self.path.display(), "released database lock");
    }
}

impl Drop for DatabaseLockGuard {
    fn drop(&mut self) {
        self.unlock();
    }
}

#[cfg(target_os = "linux")]
fn set_ofd_lock(file: &File, lock_type: libc::c_int) -> io::Result<bool> {
    use std::os::unix::io::AsRawFd;

    // SAFETY: `flock` is plain old data; an all-zero value is valid and
    // leaves `l_pid` at 0 as open-file-description locks require.
    let mut lock: libc::flock = unsafe { std::mem::zeroed() };
    lock.l_type = lock_type as libc::c_short;
    lock.l_whence = libc::SEEK_SET as libc::c_short;
    lock.l_start = 0;
    lock.l_len = 0;

    // SAFETY: the descriptor is owned by `file` and `lock` is a valid
    // `struct flock` for the duration of the call.
    let rc = unsafe {
        libc::fcntl(
            file.as_raw_fd(),
            libc::F_OFD_SETLK,
            &lock as *const libc::flock,
        )
    };
    if rc == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::EAGAIN) | Some(libc::EACCES) => Ok(false),
        _ => Err(err),
    }
}

#[cfg(target_os = "linux")]
fn try_lock_exclusive(file: &File) -> io::Result<bool> {
    set_ofd_lock(file, libc::F_WRLCK)
}

#[cfg(target_os = "linux")]
fn unlock(file: &File) -> io::Result<()> {
    set_ofd_lock(file, libc::F_UNLCK).map(|_| ())
}

#[cfg(not(target_os = "linux"))]
fn try_lock_exclusive(file: &File) -> io::Result<bool> {
    match fs2::FileExt::try_lock_exclusive(file) {
        Ok(()) => Ok(true),
        Err(err)
            if err.kind() == io::ErrorKind::WouldBlock
                || err.raw_os_error() == fs2::lock_contended_error().raw_os_error() =>
        {
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

#[cfg(not(target_os = "linux"))]
fn unlock(file: &File) -> io::Result<()> {
    fs2::FileExt::unlock(file)
}
