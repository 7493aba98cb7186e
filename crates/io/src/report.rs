// JSON run report

use std::fs;
use std::path::{Path, PathBuf};

use acctsync_recon::{Conflict, Record};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::ReportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    Error,
}

/// Outcome of one sync run as persisted on disk.
#[derive(Debug, Clone, Serialize)]
pub struct ReportPayload {
    pub status: ReportStatus,
    pub generated_at: String,
    pub created_records: Vec<Record>,
    pub conflicts: Vec<Conflict>,
    pub error: Option<String>,
}

impl ReportPayload {
    pub fn success(created_records: Vec<Record>, conflicts: Vec<Conflict>) -> Self {
        Self {
            status: ReportStatus::Success,
            generated_at: iso_timestamp(),
            created_records,
            conflicts,
            error: None,
        }
    }

    /// Error payload for a run that stopped before computing anything.
    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self::failure_with(Vec::new(), Vec::new(), error)
    }

    /// Error payload keeping whatever the run computed before it stopped.
    pub fn failure_with(
        created_records: Vec<Record>,
        conflicts: Vec<Conflict>,
        error: impl std::fmt::Display,
    ) -> Self {
        Self {
            status: ReportStatus::Error,
            generated_at: iso_timestamp(),
            created_records,
            conflicts,
            error: Some(error.to_string()),
        }
    }
}

/// Current UTC time as ISO-8601 with an explicit offset.
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Serialize the payload as two-space indented UTF-8 JSON, creating parent
/// directories. Returns the written path.
pub fn write_report(payload: &ReportPayload, path: &Path) -> Result<PathBuf, ReportError> {
    let io_err = |source: std::io::Error| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut json = serde_json::to_string_pretty(payload)?;
    json.push('\n');
    fs::write(path, json).map_err(io_err)?;

    Ok(path.to_path_buf())
}
