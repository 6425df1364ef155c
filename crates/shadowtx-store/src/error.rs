use std::io;
use std::path::PathBuf;

use shadowtx_core::TableKind;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PermissionDenied,
    InvalidInput,
    ValueExists,
    NotFound,
    Internal,
    System,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::ValueExists => "value_exists",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
            ErrorKind::System => "system",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },
    #[error("invalid {table} entry: {reason}")]
    InvalidRecord { table: TableKind, reason: String },
    #[error("{table} entry with {field} '{value}' already exists")]
    ValueExists {
        table: TableKind,
        field: &'static str,
        value: String,
    },
    #[error("{table} entry '{name}' not found")]
    NotFound { table: TableKind, name: String },
    #[error("integrity fault in {}: {detail}", path.display())]
    Integrity { path: PathBuf, detail: String },
    #[error("corrupt entry at {}:{line}: {reason}", path.display())]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("{op} failed for {}: {source}", path.display())]
    System {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cancelled while waiting for the database lock")]
    Cancelled,
    #[error("timed out after {waited_ms}ms waiting for the database lock")]
    LockTimeout { waited_ms: u128 },
    #[error("invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            StoreError::InvalidRecord { .. } => ErrorKind::InvalidInput,
            StoreError::ValueExists { .. } => ErrorKind::ValueExists,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Integrity { .. } | StoreError::Corrupt { .. } => ErrorKind::Internal,
            StoreError::System { .. } | StoreError::LockTimeout { .. } => ErrorKind::System,
            StoreError::Config { .. } => ErrorKind::System,
            StoreError::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            StoreError::System { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }

    pub(crate) fn system(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::System {
            op,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn integrity(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        StoreError::Integrity {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
