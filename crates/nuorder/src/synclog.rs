//! Append-only connector log.
//!
//! Queued syncs are fire-and-forget; their outcomes are observable only here.
//! Entries go to an in-memory ring and, when a path is configured, to a
//! JSON-lines file. Every write also emits a `tracing` event, so the log is
//! never the only place a failure shows up.

use std::{
    fs::{self, OpenOptions},
    io::Write as _,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::error::RemoteError;

const MEMORY_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    CheckConnection,
    Test,
    GetOrders,
    PushCustomers,
    PushItems,
    QueueSync,
    FullSync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Ok,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub at: DateTime<Utc>,
    pub operation: SyncOperation,
    pub outcome: SyncOutcome,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
}

pub struct SyncLog {
    path: Option<PathBuf>,
    memory: Mutex<Vec<SyncLogEntry>>,
}

impl SyncLog {
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            memory: Mutex::new(Vec::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            memory: Mutex::new(Vec::new()),
        }
    }

    pub fn record_ok(&self, operation: SyncOperation, detail: impl Into<String>) {
        self.record(SyncLogEntry {
            at: Utc::now(),
            operation,
            outcome: SyncOutcome::Ok,
            detail: detail.into(),
            error: None,
        });
    }

    pub fn record_failed(
        &self,
        operation: SyncOperation,
        detail: impl Into<String>,
        error: RemoteError,
    ) {
        self.record(SyncLogEntry {
            at: Utc::now(),
            operation,
            outcome: SyncOutcome::Failed,
            detail: detail.into(),
            error: Some(error),
        });
    }

    fn record(&self, entry: SyncLogEntry) {
        match entry.outcome {
            SyncOutcome::Ok => {
                tracing::info!(operation = ?entry.operation, detail = %entry.detail, "sync log")
            }
            SyncOutcome::Failed => tracing::warn!(
                operation = ?entry.operation,
                detail = %entry.detail,
                error = ?entry.error,
                "sync log"
            ),
        }

        if let Some(path) = &self.path {
            if let Err(err) = append_line(path, &entry) {
                // A broken log file must not take the connector down with it.
                tracing::error!("failed to append sync log '{}': {err}", path.display());
            }
        }

        let mut memory = self.memory.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        memory.push(entry);
        if memory.len() > MEMORY_LIMIT {
            let excess = memory.len() - MEMORY_LIMIT;
            memory.drain(..excess);
        }
    }

    /// Most recent entries, oldest first. Reads the file when one is
    /// configured so entries from other processes are visible too.
    pub fn recent(&self, limit: usize) -> Vec<SyncLogEntry> {
        if let Some(path) = &self.path {
            if let Ok(raw) = fs::read_to_string(path) {
                let entries: Vec<SyncLogEntry> = raw
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .filter_map(|line| serde_json::from_str(line).ok())
                    .collect();
                let skip = entries.len().saturating_sub(limit);
                return entries.into_iter().skip(skip).collect();
            }
            return Vec::new();
        }

        let memory = self.memory.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let skip = memory.len().saturating_sub(limit);
        memory[skip..].to_vec()
    }
}

fn append_line(path: &Path, entry: &SyncLogEntry) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let line = serde_json::to_string(entry).map_err(std::io::Error::other)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use shared::error::ErrorCode;

    use super::*;

    #[test]
    fn file_log_round_trips_entries() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("nuorder_synclog_test_{suffix}.jsonl"));

        let log = SyncLog::to_file(&path);
        log.record_ok(SyncOperation::GetOrders, "orders read: 3");
        log.record_failed(
            SyncOperation::PushItems,
            "push failed",
            RemoteError::new(ErrorCode::Transport, "connection refused"),
        );

        let entries = log.recent(10);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].operation, SyncOperation::GetOrders);
        assert_eq!(entries[0].outcome, SyncOutcome::Ok);
        assert_eq!(entries[1].outcome, SyncOutcome::Failed);
        assert_eq!(
            entries[1].error.as_ref().map(|err| err.code),
            Some(ErrorCode::Transport)
        );

        // A tail smaller than the log returns the newest entries.
        let tail = log.recent(1);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].operation, SyncOperation::PushItems);

        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn memory_log_is_bounded() {
        let log = SyncLog::in_memory();
        for i in 0..(MEMORY_LIMIT + 10) {
            log.record_ok(SyncOperation::Test, format!("entry {i}"));
        }
        let entries = log.recent(usize::MAX);
        assert_eq!(entries.len(), MEMORY_LIMIT);
        assert_eq!(entries.last().expect("entries").detail, format!("entry {}", MEMORY_LIMIT + 9));
    }
}
