//! # File I/O Module
//!
//! Project file operations with safety features:
//! - **Atomic saves**: write to `.tmp`, sync, rename over the target
//! - **File locking**: advisory `.gmp.lock` next to the project, held with an
//!   OS lock for the life of a [`FileLock`]
//! - **Version validation**: refuse files from an incompatible schema
//!
//! ## Example
//!
//! ```rust,no_run
//! use ground_core::file_io::{save_project, load_project, FileLock};
//! use ground_core::project::Project;
//! use std::path::Path;
//!
//! let project = Project::new("Engineer", "25-001", "Riverside");
//! let path = Path::new("site.gmp");
//!
//! let lock = FileLock::acquire(path, "engineer@company.com").unwrap();
//! save_project(&project, path).unwrap();
//! drop(lock);
//!
//! let loaded = load_project(path).unwrap();
//! assert_eq!(loaded.meta.job_id, "25-001");
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{GroundError, GroundResult};
use crate::project::{Project, SCHEMA_VERSION};

/// Project file extension
pub const PROJECT_EXTENSION: &str = "gmp";

/// Locks older than this are ignored.
const STALE_LOCK_HOURS: i64 = 24;

/// Lock file metadata stored in `.gmp.lock` files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// Dead process on this machine, or older than a day.
    pub fn is_stale(&self) -> bool {
        if hostname().as_deref() == Some(self.machine.as_str()) && !process_alive(self.pid) {
            return true;
        }
        (Utc::now() - self.locked_at).num_hours() > STALE_LOCK_HOURS
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
            .or_else(|| fs::read_to_string("/etc/hostname").ok().map(|h| h.trim().to_string()))
    }
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Project lock guard; the lock file is removed when dropped.
#[derive(Debug)]
pub struct FileLock {
    project_path: PathBuf,
    lock_path: PathBuf,
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a project file.
    ///
    /// # Errors
    ///
    /// `FileLocked` when a live lock exists, `FileError` when the lock file
    /// cannot be written.
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> GroundResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if let Some(existing) = read_lock_info(&lock_path) {
            if !existing.is_stale() {
                return Err(GroundError::file_locked(
                    path.display().to_string(),
                    format!("{} ({})", existing.user_id, existing.machine),
                    existing.locked_at.to_rfc3339(),
                ));
            }
            warn!(path = %lock_path.display(), holder = %existing.user_id, "taking over stale lock");
        }

        // Cleared only once the OS lock is held; a losing racer must leave the
        // holder's metadata intact.
        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| GroundError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        lock_file.try_lock_exclusive().map_err(|_| {
            let holder = read_lock_info(&lock_path);
            GroundError::file_locked(
                path.display().to_string(),
                holder.as_ref().map_or_else(|| "another process".to_string(), |h| h.user_id.clone()),
                holder.map_or_else(|| "unknown".to_string(), |h| h.locked_at.to_rfc3339()),
            )
        })?;

        let lock_json = serde_json::to_string_pretty(&info).map_err(GroundError::serialization)?;
        lock_file
            .set_len(0)
            .and_then(|_| lock_file.seek(SeekFrom::Start(0)))
            .and_then(|_| lock_file.write_all(lock_json.as_bytes()))
            .and_then(|_| lock_file.sync_all())
            .map_err(|e| GroundError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;

        debug!(path = %path.display(), user = %info.user_id, "acquired project lock");
        Ok(FileLock {
            project_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Current live lock on `path`, if any, without acquiring it.
    pub fn check(path: &Path) -> Option<LockInfo> {
        read_lock_info(&lock_path_for(path)).filter(|info| !info.is_stale())
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `site.gmp` -> `site.gmp.lock`
fn lock_path_for(project_path: &Path) -> PathBuf {
    let mut lock_path = project_path.to_path_buf();
    let extension = lock_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    lock_path.set_extension(extension);
    lock_path
}

fn read_lock_info(lock_path: &Path) -> Option<LockInfo> {
    let contents = fs::read_to_string(lock_path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Save a project with atomic write semantics (tmp file, fsync, rename).
pub fn save_project(project: &Project, path: &Path) -> GroundResult<()> {
    let json = serde_json::to_string_pretty(project).map_err(GroundError::serialization)?;
    write_atomic(path, json.as_bytes())?;
    debug!(path = %path.display(), models = project.model_count(), "saved project");
    Ok(())
}

/// Write `contents` to `path` through a sibling `.tmp` file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> GroundResult<()> {
    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| GroundError::file_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .write_all(contents)
        .and_then(|_| tmp_file.sync_all())
        .map_err(|e| GroundError::file_error("write temp file", tmp_path.display().to_string(), e.to_string()))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        GroundError::file_error("rename to final", path.display().to_string(), e.to_string())
    })
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp_path = path.to_path_buf();
    let extension = tmp_path
        .extension()
        .map(|e| format!("{}.tmp", e.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    tmp_path.set_extension(extension);
    tmp_path
}

/// Load a project file.
///
/// # Errors
///
/// `FileError` for I/O problems, `SerializationError` for invalid JSON or
/// out-of-range values, `VersionMismatch` for an incompatible schema.
pub fn load_project(path: &Path) -> GroundResult<Project> {
    let contents = fs::read_to_string(path)
        .map_err(|e| GroundError::file_error("read", path.display().to_string(), e.to_string()))?;

    // Check the version before the full parse so an old file reports a
    // version error rather than a field error.
    if let Ok(header) = serde_json::from_str::<VersionHeader>(&contents) {
        validate_version(&header.meta.version)?;
    }

    let project: Project = serde_json::from_str(&contents)
        .map_err(|e| GroundError::serialization(format!("Invalid project file {}: {}", path.display(), e)))?;
    debug!(path = %path.display(), models = project.model_count(), "loaded project");
    Ok(project)
}

#[derive(Deserialize)]
struct VersionHeader {
    meta: VersionField,
}

#[derive(Deserialize)]
struct VersionField {
    version: String,
}

/// Load a project along with any live lock another user holds on it.
pub fn load_project_with_lock_check(path: &Path) -> GroundResult<(Project, Option<LockInfo>)> {
    let project = load_project(path)?;
    Ok((project, FileLock::check(path)))
}

/// Major versions must match; within 0.x a newer minor is rejected.
fn validate_version(file_version: &str) -> GroundResult<()> {
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);

    let mismatch = || GroundError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    match (file_parts.as_slice(), current_parts.as_slice()) {
        ([file_major, rest @ ..], [major, current_rest @ ..]) => {
            if file_major != major {
                return Err(mismatch());
            }
            if *major == 0 {
                if let (Some(file_minor), Some(minor)) = (rest.first(), current_rest.first()) {
                    if file_minor > minor {
                        return Err(mismatch());
                    }
                }
            }
            Ok(())
        }
        _ => Err(mismatch()),
    }
}
