//! JSONL audit log - reader and filter
//!
//! Reads daily files back for the `audit` CLI command. Lines that fail to
//! parse are skipped; the log is advisory, not authoritative.

use crate::audit::store::AuditRecord;
use crate::error::StoreResult;
use std::fs;
use std::path::{Path, PathBuf};

/// Reader over a directory of daily audit files.
pub struct AuditReader {
    base_path: PathBuf,
}

impl AuditReader {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn read_file(&self, path: &Path) -> StoreResult<Vec<AuditRecord>> {
        let content = fs::read_to_string(path)?;
        Ok(content
            .lines()
            .filter_map(|line| serde_json::from_str::<AuditRecord>(line).ok())
            .collect())
    }

    /// All records across all days, in file order.
    pub fn read_all(&self) -> StoreResult<Vec<AuditRecord>> {
        let mut records = Vec::new();
        let mut files: Vec<PathBuf> = fs::read_dir(&self.base_path)?
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |ext| ext == "jsonl"))
            .collect();
        files.sort();

        for file in files {
            records.extend(self.read_file(&file)?);
        }
        Ok(records)
    }

    /// Records for an inclusive date range (YYYY-MM-DD file names).
    pub fn read_range(&self, from: &str, to: &str) -> StoreResult<Vec<AuditRecord>> {
        let mut records = Vec::new();
        let mut files: Vec<PathBuf> = fs::read_dir(&self.base_path)?
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                let Some(stem) = p.file_stem().and_then(|s| s.to_str()) else {
                    return false;
                };
                p.extension().map_or(false, |ext| ext == "jsonl")
                    && stem >= from
                    && stem <= to
            })
            .collect();
        files.sort();

        for file in files {
            records.extend(self.read_file(&file)?);
        }
        Ok(records)
    }

    /// Records whose action matches exactly.
    pub fn read_by_action(&self, action: &str) -> StoreResult<Vec<AuditRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.action == action)
            .collect())
    }
}
