use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use shadowtx_core::TableRecord;
use tracing::debug;

use crate::access::{require_access, Access};
use crate::layout::staging_path;
use crate::staging::StagingFile;
use crate::{Result, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Keep,
    Omit,
    Conflict { field: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountDelta {
    pub read: usize,
    pub written: usize,
}

impl CountDelta {
    pub fn delta(&self) -> isize {
        self.written as isize - self.read as isize
    }
}

#[derive(Debug, Clone)]
pub struct AtomicTable<R> {
    path: PathBuf,
    _record: PhantomData<fn() -> R>,
}

impl<R: TableRecord> AtomicTable<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn insert(&self, record: &R) -> Result<CountDelta> {
        record.validate().map_err(|err| StoreError::InvalidRecord {
            table: R::KIND,
            reason: format!("{err:#}"),
        })?;

        let name = record.name();
        let id = record.numeric_id();
        self.apply(
            name,
            |existing| {
                if existing.name() == name {
                    return Disposition::Conflict {
                        field: "name",
                        value: name.to_string(),
                    };
                }
                match id {
                    Some(id) if existing.numeric_id() == Some(id) => Disposition::Conflict {
                        field: R::KIND.id_label().unwrap_or("id"),
                        value: id.to_string(),
                    },
                    _ => Disposition::Keep,
                }
            },
            Some(record),
        )
    }

    pub fn remove(&self, name: &str) -> Result<CountDelta> {
        self.apply(
            name,
            |existing| {
                if existing.name() == name {
                    Disposition::Omit
                } else {
                    Disposition::Keep
                }
            },
            None,
        )
    }

    /// Caller must hold the database lock. With `append` the table must grow
    /// by one entry, otherwise shrink by one with `key` omitted.
    pub fn apply<F>(&self, key: &str, mut filter: F, append: Option<&R>) -> Result<CountDelta>
    where
        F: FnMut(&R) -> Disposition,
    {
        let path = self.path.as_path();
        require_access(path, Access::Read)?;
        let metadata = fs::metadata(path).map_err(|err| StoreError::system("stat", path, err))?;

        let mut staging = StagingFile::create(staging_path(path), &metadata)?;
        let source = File::open(path).map_err(|err| StoreError::system("open", path, err))?;

        let mut counts = CountDelta {
            read: 0,
            written: 0,
        };
        let mut omitted = 0_usize;
        for (index, line) in BufReader::new(source).lines().enumerate() {
            let line = line.map_err(|err| match err.kind() {
                io::ErrorKind::InvalidData => StoreError::Corrupt {
                    path: path.to_path_buf(),
                    line: index + 1,
                    reason: "entry is not valid UTF-8".to_string(),
                },
                _ => StoreError::system("read", path, err),
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let record = R::decode_line(&line).map_err(|err| StoreError::Corrupt {
                path: path.to_path_buf(),
                line: index + 1,
                reason: format!("{err:#}"),
            })?;
            counts.read += 1;

            match filter(&record) {
                Disposition::Keep => {
                    staging.write_line(&line)?;
                    counts.written += 1;
                }
                Disposition::Omit => omitted += 1,
                Disposition::Conflict { field, value } => {
                    debug!(
                        table = R::KIND.as_str(),
                        path = %path.display(),
                        field,
                        value = %value,
                        "rejecting conflicting entry"
                    );
                    return Err(StoreError::ValueExists {
                        table: R::KIND,
                        field,
                        value,
                    });
                }
            }
        }

        if let Some(record) = append {
            staging.write_line(&record.encode_line())?;
            counts.written += 1;
        }

        if counts.read == 0 {
            return Err(StoreError::integrity(path, "table has no entries"));
        }
        if append.is_none() && omitted == 0 {
            return Err(StoreError::NotFound {
                table: R::KIND,
                name: key.to_string(),
            });
        }

        let expected = match append {
            Some(_) => counts.read + 1,
            None => counts.read - 1,
        };
        if counts.written != expected {
            return Err(StoreError::integrity(
                path,
                format!(
                    "read {} entries and wrote {}, expected {}",
                    counts.read, counts.written, expected
                ),
            ));
        }

        staging.install(path)?;
        debug!(
            table = R::KIND.as_str(),
            path = %path.display(),
            read = counts.read,
            written = counts.written,
            "installed table"
        );
        Ok(counts)
    }

    pub fn records(&self) -> Result<Vec<R>> {
        let path = self.path.as_path();
        let raw = fs::read_to_string(path).map_err(|err| match err.kind() {
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => StoreError::system("read", path, err),
        })?;

        raw.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                R::decode_line(line).map_err(|err| StoreError::Corrupt {
                    path: path.to_path_buf(),
                    line: index + 1,
                    reason: format!("{err:#}"),
                })
            })
            .collect()
    }

    pub fn find(&self, name: &str) -> Result<Option<R>> {
        Ok(self
            .records()?
            .into_iter()
            .find(|record| record.name() == name))
    }

    pub fn find_by_id(&self, id: u32) -> Result<Option<R>> {
        Ok(self
            .records()?
            .into_iter()
            .find(|record| record.numeric_id() == Some(id)))
    }
}
