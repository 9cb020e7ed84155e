//! JSONL audit log - append-only writer
//!
//! Records are written to daily JSONL files: `audit/2026-08-05.jsonl`.

use crate::error::StoreResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// One audit line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// ID unique to this record (AUD_000001, ...)
    pub audit_id: String,
    pub timestamp: DateTime<Utc>,
    /// What happened (e.g. "route_revenue", "quest_submit")
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<i64>,
    /// Entity the action touched (flow id, quest uuid, user id)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    pub detail: String,
}

impl AuditRecord {
    pub fn new(audit_id: String, action: &str, detail: &str) -> Self {
        Self {
            audit_id,
            timestamp: Utc::now(),
            action: action.to_string(),
            actor_id: None,
            subject: None,
            amount: None,
            detail: detail.to_string(),
        }
    }

    pub fn with_actor(mut self, actor_id: i64) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn with_subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn with_amount(mut self, amount: &str) -> Self {
        self.amount = Some(amount.to_string());
        self
    }
}

/// Audit log - writes records to daily JSONL files.
pub struct AuditLog {
    /// Directory holding the daily files
    base_path: PathBuf,
    /// Counter for record IDs
    counter: AtomicU64,
    /// Current file writer (thread-safe)
    current_writer: Mutex<Option<DayWriter>>,
}

struct DayWriter {
    date: String,
    writer: BufWriter<File>,
}

impl AuditLog {
    pub fn new<P: AsRef<Path>>(base_path: P) -> StoreResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        let counter = Self::load_counter(&base_path)?;

        Ok(Self {
            base_path,
            counter: AtomicU64::new(counter),
            current_writer: Mutex::new(None),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Scan existing files so the counter continues across restarts.
    fn load_counter(base_path: &Path) -> StoreResult<u64> {
        let mut max_id: u64 = 0;

        if let Ok(entries) = fs::read_dir(base_path) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map_or(false, |ext| ext == "jsonl") {
                    if let Ok(content) = fs::read_to_string(&path) {
                        for line in content.lines() {
                            if let Ok(record) = serde_json::from_str::<AuditRecord>(line) {
                                if let Some(num_str) = record.audit_id.strip_prefix("AUD_") {
                                    if let Ok(num) = num_str.parse::<u64>() {
                                        max_id = max_id.max(num);
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        Ok(max_id + 1)
    }

    fn file_path(&self, date: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", date))
    }

    fn current_date() -> String {
        Utc::now().format("%Y-%m-%d").to_string()
    }

    pub fn next_audit_id(&self) -> String {
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("AUD_{:06}", id)
    }

    /// Append one record to today's file.
    pub fn append(&self, record: &AuditRecord) -> StoreResult<()> {
        let date = Self::current_date();
        let json = serde_json::to_string(record)?;

        let mut guard = self.current_writer.lock().unwrap();

        let needs_new_file = guard.as_ref().map_or(true, |w| w.date != date);

        if needs_new_file {
            let path = self.file_path(&date);
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            *guard = Some(DayWriter {
                date: date.clone(),
                writer: BufWriter::new(file),
            });
        }

        if let Some(ref mut w) = *guard {
            writeln!(w.writer, "{}", json)?;
            w.writer.flush()?;
        }

        Ok(())
    }

    /// Convenience: stamp an id and append in one call.
    pub fn record(&self, action: &str, detail: &str) -> StoreResult<AuditRecord> {
        let record = AuditRecord::new(self.next_audit_id(), action, detail);
        self.append(&record)?;
        Ok(record)
    }

    pub fn list_files(&self) -> StoreResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "jsonl") {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    pub fn flush(&self) -> StoreResult<()> {
        let mut guard = self.current_writer.lock().unwrap();
        if let Some(ref mut w) = *guard {
            w.writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for AuditLog {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
