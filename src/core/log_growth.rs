/// Log file growth checks
///
/// Compares a log's size between the start-of-run sample and the end of the
/// run. Growth is a heuristic for "the writer is alive", nothing more: an idle
/// service legitimately writes nothing.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::finding::{Finding, Section, Severity};
use crate::utils::format_bytes;

/// Size and mtime of one log file at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct LogSample {
    pub path: PathBuf,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Local>>,
    pub error: Option<String>,
}

impl LogSample {
    pub fn take<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Self {
                size: Some(meta.len()),
                modified: meta.modified().ok().map(DateTime::<Local>::from),
                error: None,
                path,
            },
            Ok(_) => Self {
                size: None,
                modified: None,
                error: Some("not a regular file".to_string()),
                path,
            },
            Err(e) => Self {
                size: None,
                modified: None,
                error: Some(e.to_string()),
                path,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogGrowthRecord {
    pub name: String,
    /// Byte-size change across the two samples, absent when unreadable
    pub delta: Option<i64>,
    pub size: Option<u64>,
    pub status: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Local>>,
}

impl LogGrowthRecord {
    pub fn to_finding(&self) -> Finding {
        Finding::new(Section::Logs, self.status, self.message.clone()).with_item(self.name.clone())
    }
}

pub struct LogGrowthChecker;

impl LogGrowthChecker {
    /// Sample the file now and classify growth against `baseline_size`.
    /// A file that did not exist at baseline counts as having been empty.
    pub fn check<P: AsRef<Path>>(log_path: P, baseline_size: Option<u64>) -> LogGrowthRecord {
        Self::classify(&LogSample::take(log_path), baseline_size)
    }

    pub fn classify(current: &LogSample, baseline_size: Option<u64>) -> LogGrowthRecord {
        let name = current
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| current.path.display().to_string());

        let Some(size) = current.size else {
            let reason = current.error.as_deref().unwrap_or("unreadable");
            return LogGrowthRecord {
                name,
                delta: None,
                size: None,
                status: Severity::Fail,
                message: format!("missing or unreadable: {}", reason),
                modified: None,
            };
        };

        let delta = size as i64 - baseline_size.unwrap_or(0) as i64;

        let (status, message) = if delta > 0 {
            (Severity::Ok, format!("grew +{} (now {})", format_bytes(delta as u64), format_bytes(size)))
        } else if delta == 0 {
            (
                Severity::Warn,
                "no growth observed during run (may be idle or stalled)".to_string(),
            )
        } else {
            (
                Severity::Warn,
                format!("shrank by {} (rotated or truncated)", format_bytes(delta.unsigned_abs())),
            )
        };

        LogGrowthRecord {
            name,
            delta: Some(delta),
            size: Some(size),
            status,
            message,
            modified: current.modified,
        }
    }
}
