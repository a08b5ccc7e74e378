//! File persistence
//!
//! The database lives in one UTF-8 JSON file that is read whole on open and
//! rewritten whole after every mutation.
//!
//! - Opening never truncates; a missing file is created empty.
//! - With atomic writes the new content goes to `<file>.tmp` first and is
//!   renamed over the database file, so a crash leaves either the old or
//!   the new content.
//! - With direct writes the file is truncated and rewritten in place.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::config::StoreConfig;
use crate::errors::{DbError, DbResult};

/// Whole-file reader and writer for the database file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    atomic: bool,
    sync: bool,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>, config: &StoreConfig) -> Self {
        Self {
            path: path.into(),
            atomic: config.atomic_writes,
            sync: config.sync_writes,
        }
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the temporary file used by atomic writes.
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Reads the whole file, creating it empty if it does not exist.
    ///
    /// Content that is not valid UTF-8 fails with `InvalidDatabaseFile`.
    ///
    /// An existing file is opened read-only, so a read-only database can be
    /// loaded; write access is only needed to create it.
    pub fn load(&self) -> DbResult<String> {
        let read_failed = |source| DbError::StorageRead {
            path: self.path.clone(),
            source,
        };

        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                OpenOptions::new()
                    .write(true)
                    .create(true)
                    .open(&self.path)
                    .map_err(read_failed)?;
                return Ok(String::new());
            }
            Err(e) => return Err(read_failed(e)),
        };

        let mut content = String::new();
        match file.read_to_string(&mut content) {
            Ok(_) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => Err(DbError::InvalidDatabaseFile {
                path: self.path.clone(),
                reason: "content is not valid UTF-8".to_string(),
            }),
            Err(source) => Err(DbError::StorageRead {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Replaces the file content with `content`.
    pub fn write(&self, content: &str) -> DbResult<()> {
        if self.atomic {
            self.write_atomic(content)
        } else {
            write_file(&self.path, content.as_bytes(), self.sync).map_err(|e| {
                DbError::write_failed(format!("failed to write {}", self.path.display()), e)
            })
        }
    }

    fn write_atomic(&self, content: &str) -> DbResult<()> {
        let tmp_path = self.temp_path();

        write_file(&tmp_path, content.as_bytes(), self.sync).map_err(|e| {
            DbError::write_failed(format!("failed to write {}", tmp_path.display()), e)
        })?;

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DbError::write_failed(
                format!(
                    "failed to rename {} over {}",
                    tmp_path.display(),
                    self.path.display()
                ),
                e,
            )
        })
    }
}

fn write_file(path: &Path, data: &[u8], sync: bool) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    if sync {
        file.sync_all()?;
    }
    Ok(())
}
