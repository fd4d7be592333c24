//! Durable status storage: versioned JSON health records with atomic writes
//!
//! The status file is the only memory nanomon has between invocations. Writes
//! are crash-safe via write-to-temp + fsync + rename. Reads validate version
//! and structure; corrupted files surface errors so a run can recover by
//! starting clean. An advisory lock on a sidecar file serializes overlapping
//! invocations around the whole load-evaluate-save transaction.

use crate::{MonitorError, Result};
use nix::fcntl::{Flock, FlockArg};
use schema::{HealthRecord, RECORD_VERSION};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-backed store for the health record
#[derive(Debug, Clone)]
pub struct StatusStore {
    path: PathBuf,
}

/// RAII guard for the store's advisory lock
///
/// The lock lives on a sidecar `<status>.lock` file rather than the record
/// itself: atomic saves replace the record's inode, which would detach any
/// lock held on the old file.
#[derive(Debug)]
pub struct StoreLock {
    _lock: Flock<File>,
}

impl StatusStore {
    /// Create a store over the given status file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the status file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        with_suffix(&self.path, ".lock")
    }

    /// Acquire the exclusive advisory lock, blocking until it is free
    ///
    /// The lock is released when the returned guard is dropped.
    pub fn lock(&self) -> Result<StoreLock> {
        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| {
                MonitorError::IoError(std::io::Error::new(
                    e.kind(),
                    format!("Failed to open lock file {}: {}", lock_path.display(), e),
                ))
            })?;

        let lock = Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, errno)| {
            let e = std::io::Error::from_raw_os_error(errno as i32);
            MonitorError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to lock {}: {}", lock_path.display(), e),
            ))
        })?;

        debug!("Acquired status lock {}", lock_path.display());
        Ok(StoreLock { _lock: lock })
    }

    /// Load the health record from file.
    ///
    /// Returns `Err` for I/O, parse, or version errors so callers can recover
    /// by ignoring the record and starting clean.
    pub fn load(&self) -> Result<HealthRecord> {
        let mut file = File::open(&self.path).map_err(|e| {
            MonitorError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to open record {}: {}", self.path.display(), e),
            ))
        })?;
        let mut buf = String::new();
        file.read_to_string(&mut buf).map_err(|e| {
            MonitorError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to read record {}: {}", self.path.display(), e),
            ))
        })?;

        let record: HealthRecord =
            serde_json::from_str(&buf).map_err(MonitorError::SerializationError)?;

        if record.version != RECORD_VERSION {
            return Err(MonitorError::ValidationError(format!(
                "Unsupported health record version {} (expected {})",
                record.version, RECORD_VERSION
            )));
        }

        Ok(record)
    }

    /// Load the health record, falling back to an empty one on any failure
    pub fn load_or_default(&self) -> HealthRecord {
        match self.load() {
            Ok(record) => {
                debug!(
                    "Loaded health record from {} with {} service(s)",
                    self.path.display(),
                    record.services.len()
                );
                record
            }
            Err(e) => {
                if self.path.exists() {
                    warn!(
                        "Ignoring unreadable health record {} ({}). Starting clean.",
                        self.path.display(),
                        e
                    );
                } else {
                    debug!(
                        "No health record at {}. Starting clean.",
                        self.path.display()
                    );
                }
                HealthRecord::empty()
            }
        }
    }

    /// Atomically write the health record to file.
    ///
    /// Steps:
    /// - Ensure the parent directory exists
    /// - Write JSON to a temp file in the same directory
    /// - `flush` + `sync_all` on the temp file
    /// - `rename` the temp file over the destination
    /// - Best-effort fsync of the directory to persist the rename
    pub fn save(&self, record: &HealthRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                MonitorError::IoError(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create record dir {}: {}", parent.display(), e),
                ))
            })?;
        }

        let tmp_path = with_suffix(&self.path, ".tmp");
        let json = serde_json::to_vec_pretty(record)?;

        {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .map_err(|e| {
                    MonitorError::IoError(std::io::Error::new(
                        e.kind(),
                        format!("Failed to open temp record {}: {}", tmp_path.display(), e),
                    ))
                })?;
            f.write_all(&json).map_err(|e| {
                MonitorError::IoError(std::io::Error::new(
                    e.kind(),
                    format!("Failed to write temp record {}: {}", tmp_path.display(), e),
                ))
            })?;
            f.flush().ok();
            // Best-effort durability
            let _ = f.sync_all();
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            MonitorError::IoError(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to replace record {} with {}: {}",
                    self.path.display(),
                    tmp_path.display(),
                    e
                ),
            ))
        })?;

        // Best-effort fsync of directory to persist rename
        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        debug!("Wrote health record to {}", self.path.display());
        Ok(())
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}
