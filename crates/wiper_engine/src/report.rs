use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use wiper_core::RunSummary;

use crate::MessageReport;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("report path has no file name: {0}")]
    NoFileName(PathBuf),
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Summary plus per-message outcomes, in processing order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<'a> {
    pub generated_utc: String,
    pub summary: RunSummary,
    pub messages: &'a [MessageReport],
}

/// Ensure the directory exists and is writable; create it if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), ReportError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| ReportError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(ReportError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| ReportError::OutputDir(e.to_string()))?;
    }
    NamedTempFile::new_in(dir).map_err(|e| ReportError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Write the report as pretty JSON: temp file in the target directory, then rename.
pub fn write_report(path: &Path, report: &RunReport<'_>) -> Result<PathBuf, ReportError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ReportError::NoFileName(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_output_dir(&dir)?;

    let json = serde_json::to_string_pretty(report)?;
    let target = dir.join(file_name);
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;

    tmp.persist(&target).map_err(|e| ReportError::Io(e.error))?;
    Ok(target)
}
