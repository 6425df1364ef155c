use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::{Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Read,
    ReadWrite,
}

impl Access {
    fn mode(self) -> libc::c_int {
        match self {
            Access::Read => libc::R_OK,
            Access::ReadWrite => libc::R_OK | libc::W_OK,
        }
    }
}

pub(crate) fn require_access(path: &Path, access: Access) -> Result<()> {
    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        StoreError::system(
            "access",
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte"),
        )
    })?;

    // SAFETY: `c_path` is a valid NUL-terminated string that outlives the call.
    let rc = unsafe { libc::access(c_path.as_ptr(), access.mode()) };
    if rc == 0 {
        return Ok(());
    }

    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::EACCES) | Some(libc::EPERM) | Some(libc::EROFS) => {
            Err(StoreError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        _ => Err(StoreError::system("access", path, err)),
    }
}
