use crate::errors::ReplayError;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_DISK_BUDGET_BYTES: u64 = 50 * 1024 * 1024;
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 4096;

/// Appends one JSON object per line to `path`.
#[derive(Debug, Clone)]
pub struct JsonlLogger {
    pub path: PathBuf,
    pub max_payload_bytes: usize,
    pub budget_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent<'a> {
    pub level: &'a str,
    pub event_type: &'a str,
    pub payload: Value,
}

impl<'a> LogEvent<'a> {
    pub fn info(event_type: &'a str, payload: Value) -> Self {
        Self {
            level: "info",
            event_type,
            payload,
        }
    }

    pub fn warn(event_type: &'a str, payload: Value) -> Self {
        Self {
            level: "warn",
            event_type,
            payload,
        }
    }
}

impl JsonlLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            budget_bytes: DEFAULT_DISK_BUDGET_BYTES,
        }
    }

    pub fn append(&self, event: &LogEvent<'_>) -> Result<(), ReplayError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ReplayError::Io(e.to_string()))?;
            }
        }
        let line = serde_json::to_string(&LogEvent {
            level: event.level,
            event_type: event.event_type,
            payload: truncate_json(event.payload.clone(), self.max_payload_bytes),
        })
        .map_err(|e| ReplayError::Io(e.to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ReplayError::Io(e.to_string()))?;
        file.write_all(line.as_bytes())
            .and_then(|()| file.write_all(b"\n"))
            .map_err(|e| ReplayError::Io(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            enforce_total_budget(parent, &self.path, self.budget_bytes)?;
        }
        Ok(())
    }
}

/// Deletes the oldest `.jsonl` files in `dir` until the directory's logs fit
/// in `budget_bytes`. The log currently being written is never removed.
pub fn enforce_total_budget(
    dir: &Path,
    current: &Path,
    budget_bytes: u64,
) -> Result<Vec<PathBuf>, ReplayError> {
    let mut files = fs::read_dir(dir)
        .map_err(|e| ReplayError::Io(e.to_string()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl"))
        .filter_map(|path| {
            let meta = fs::metadata(&path).ok()?;
            Some((meta.modified().ok(), meta.len(), path))
        })
        .collect::<Vec<_>>();
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut total = files.iter().map(|(_, len, _)| *len).sum::<u64>();
    let mut deleted = Vec::new();
    for (_, len, path) in files {
        if total <= budget_bytes {
            break;
        }
        if path == current {
            continue;
        }
        fs::remove_file(&path).map_err(|e| ReplayError::Io(e.to_string()))?;
        total = total.saturating_sub(len);
        deleted.push(path);
    }
    Ok(deleted)
}

/// Single-line progress record for non-interactive stdout.
pub fn structured_fallback_line(step: usize, status: &str, message: &str) -> String {
    format!(
        "step={step} status={status} message={}",
        message.replace('\n', "\\n")
    )
}

fn truncate_json(value: Value, max_bytes: usize) -> Value {
    let rendered = serde_json::to_string(&value).unwrap_or_default();
    if rendered.len() <= max_bytes {
        return value;
    }
    let mut cut = max_bytes.saturating_sub(3);
    while !rendered.is_char_boundary(cut) {
        cut -= 1;
    }
    Value::String(format!("{}...", &rendered[..cut]))
}

#[cfg(test)]
mod tests {
    use super::{enforce_total_budget, structured_fallback_line, JsonlLogger, LogEvent};
    use serde_json::json;
    use std::fs;

    #[test]
    fn logger_truncates_large_payloads_and_writes_jsonl() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logs").join("run.jsonl");
        let mut logger = JsonlLogger::new(&path);
        logger.max_payload_bytes = 20;
        logger.budget_bytes = 1024;

        logger
            .append(&LogEvent::info(
                "divergence",
                json!({"cells": "abcdefghijklmnopqrstuvwxyz"}),
            ))
            .expect("append");
        logger
            .append(&LogEvent::info("replay_finished", json!({"transitions": 3})))
            .expect("append");

        let text = fs::read_to_string(&path).expect("read");
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"event_type\":\"divergence\""));
        assert!(lines[0].contains("..."));
        let last: serde_json::Value = serde_json::from_str(lines[1]).expect("json line");
        assert_eq!(last["payload"]["transitions"], json!(3));
    }

    #[test]
    fn retention_prunes_oldest_logs_but_keeps_the_current_one() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.jsonl"), vec![b'x'; 40]).expect("a");
        std::thread::sleep(std::time::Duration::from_millis(5));
        fs::write(dir.path().join("b.jsonl"), vec![b'x'; 40]).expect("b");
        std::thread::sleep(std::time::Duration::from_millis(5));
        fs::write(dir.path().join("notes.txt"), vec![b'x'; 400]).expect("notes");
        let current = dir.path().join("run.jsonl");
        fs::write(&current, vec![b'x'; 40]).expect("current");

        let deleted = enforce_total_budget(dir.path(), &current, 50).expect("pruned");
        assert_eq!(deleted.len(), 2);
        assert!(deleted[0].ends_with("a.jsonl"));
        assert!(current.exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn fallback_line_is_deterministic() {
        let line = structured_fallback_line(4, "diverged", "2 cells\ndiffer");
        assert_eq!(line, "step=4 status=diverged message=2 cells\\ndiffer");
    }
}
