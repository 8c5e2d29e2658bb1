//! Append-only JSONL audit log

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{BudgetError, BudgetResult};

use super::entry::AuditEntry;

/// Writes one JSON object per line to the audit log
///
/// Lines are only ever appended; a line that fails to parse on read is
/// reported with its line number rather than skipped.
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Append an entry and flush it
    pub fn log(&self, entry: &AuditEntry) -> BudgetResult<()> {
        let line = serde_json::to_string(entry)
            .map_err(|e| BudgetError::Json(format!("Failed to serialize audit entry: {}", e)))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| BudgetError::Io(format!("Failed to open audit log: {}", e)))?;
        writeln!(file, "{}", line)
            .and_then(|_| file.flush())
            .map_err(|e| BudgetError::Io(format!("Failed to write audit entry: {}", e)))
    }

    /// Every entry, oldest first
    pub fn read_all(&self) -> BudgetResult<Vec<AuditEntry>> {
        let contents = match fs::read_to_string(&self.log_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BudgetError::Io(format!("Failed to read audit log: {}", e))),
        };

        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|e| {
                    BudgetError::Json(format!("Bad audit entry at line {}: {}", index + 1, e))
                })
            })
            .collect()
    }

    /// The last `count` entries, oldest first
    pub fn read_recent(&self, count: usize) -> BudgetResult<Vec<AuditEntry>> {
        let mut entries = self.read_all()?;
        let start = entries.len().saturating_sub(count);
        Ok(entries.split_off(start))
    }
}
