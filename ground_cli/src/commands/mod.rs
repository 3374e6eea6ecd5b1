pub mod convert;
pub mod describe;
pub mod model;
pub mod project;

use crate::error::{CliError, Result};
use ground_core::file_io::{load_project, save_project, write_atomic, FileLock};
use ground_core::Project;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Lock holder name: `--user`, then the login name.
pub(crate) fn user_id(user: Option<&str>) -> String {
    user.map(str::to_string)
        .or_else(|| std::env::var("USER").ok())
        .or_else(|| std::env::var("USERNAME").ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Lock, load, edit and save a project. The file is only written when
/// `edit` succeeds.
pub(crate) fn edit_project<T>(
    path: &Path,
    user: Option<&str>,
    edit: impl FnOnce(&mut Project) -> Result<T>,
) -> Result<T> {
    let _lock = FileLock::acquire(path, user_id(user))?;
    let mut project = load_project(path)?;
    let outcome = edit(&mut project)?;
    save_project(&project, path)?;
    info!("Saved project {}", path.display());
    Ok(outcome)
}

/// Write command output to `output`, or return it for stdout.
pub(crate) fn emit(content: String, output: Option<&PathBuf>) -> Result<Option<String>> {
    match output {
        Some(path) => {
            write_atomic(path, content.as_bytes())?;
            debug!("Wrote {} bytes to {}", content.len(), path.display());
            Ok(None)
        }
        None => Ok(Some(content)),
    }
}

/// Serialize records as CSV, header row from the record's field names.
pub(crate) fn to_csv<T: serde::Serialize>(records: impl IntoIterator<Item = T>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer.into_inner().map_err(|e| CliError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| CliError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

pub(crate) fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        CliError::Argument(format!("Cannot read input file '{}': {}", path.display(), e))
    })
}
