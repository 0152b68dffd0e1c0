//! Pipeline logging.
//!
//! Every entry is printed to stdout, broadcast to subscribers, and, once
//! [`init_file_log`] has been called, appended as one JSON object per line to
//! `<log_dir>/<YYYY-MM-DD_HH-MM-SS>_logfile.log`.

use chrono::{Local, SecondsFormat};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// ISO-8601 local timestamp
    pub timestamp: String,
    /// Log level
    pub level: LogLevel,
    /// Log message
    #[serde(rename = "event")]
    pub message: String,
    /// Optional indentation level (console only)
    #[serde(default, skip_serializing)]
    pub indent: u8,
    /// Structured key/value context
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LogEntry {
    fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Millis, false),
            level,
            message: message.into(),
            indent: 0,
            fields: Map::new(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Attach a structured field (written to the log file, not the console).
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Fans log entries out to stdout, subscribers and the log file.
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
    file: Mutex<Option<File>>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1024);
        Self {
            sender,
            file: Mutex::new(None),
        }
    }

    /// Send a log entry to every sink
    pub fn log(&self, entry: LogEntry) {
        let prefix = match entry.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(entry.indent as usize);
        println!("{}{} {}", indent, prefix, entry.message);

        if let Ok(mut guard) = self.file.lock() {
            if let Some(file) = guard.as_mut() {
                if let Ok(line) = serde_json::to_string(&entry) {
                    // Write errors are ignored
                    let _ = writeln!(file, "{}", line);
                }
            }
        }

        // Ignore if no receivers
        let _ = self.sender.send(entry);
    }

    /// Get a receiver for log entries
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }

    /// Start appending entries to a timestamped file in `dir`.
    pub fn open_file(&self, dir: &Path) -> std::io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let filename = format!("{}_logfile.log", Local::now().format("%Y-%m-%d_%H-%M-%S"));
        let path = dir.join(filename);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        if let Ok(mut guard) = self.file.lock() {
            *guard = Some(file);
        }
        Ok(path)
    }
}

/// Buffers the entries broadcast after it was attached.
pub struct LogCollector {
    receiver: broadcast::Receiver<LogEntry>,
}

impl LogCollector {
    /// Collect from the global broadcaster.
    pub fn global() -> Self {
        Self::attach(&LOG_BROADCASTER)
    }

    pub fn attach(broadcaster: &LogBroadcaster) -> Self {
        Self {
            receiver: broadcaster.subscribe(),
        }
    }

    /// Everything received so far. Entries dropped by a lagging receiver are skipped.
    pub fn drain(&mut self) -> Vec<LogEntry> {
        let mut entries = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(entry) => entries.push(entry),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        entries
    }

    /// Warning and error entries received so far.
    pub fn drain_problems(&mut self) -> Vec<LogEntry> {
        self.drain()
            .into_iter()
            .filter(|e| matches!(e.level, LogLevel::Warning | LogLevel::Error))
            .collect()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Write the global log to a timestamped file in `dir` as well.
pub fn init_file_log(dir: &Path) -> std::io::Result<PathBuf> {
    LOG_BROADCASTER.open_file(dir)
}

/// Convenient logging functions
pub fn log(entry: LogEntry) {
    LOG_BROADCASTER.log(entry);
}

pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::error(msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::info(msg).with_indent(indent));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribers_receive_entries() {
        let broadcaster = LogBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.log(LogEntry::warning("3 rows without entity key").with_field("rows", 3));

        let entry = rx.try_recv().unwrap();
        assert_eq!(entry.level, LogLevel::Warning);
        assert_eq!(entry.message, "3 rows without entity key");
        assert_eq!(entry.fields["rows"], 3);
    }

    #[test]
    fn test_collector_keeps_only_problems() {
        let broadcaster = LogBroadcaster::new();
        broadcaster.log(LogEntry::info("before attach"));

        let mut collector = LogCollector::attach(&broadcaster);
        broadcaster.log(LogEntry::info("Reading file"));
        broadcaster.log(LogEntry::warning("2 rows produced no year record"));
        broadcaster.log(LogEntry::error("Process failed"));

        let problems = collector.drain_problems();
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].message, "2 rows produced no year record");
        assert_eq!(problems[1].level, LogLevel::Error);
        assert!(collector.drain().is_empty());
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = LogEntry::info("Reading file")
            .with_indent(2)
            .with_field("file_path", "data/export.xlsx");
        let json: Value = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["level"], "info");
        assert_eq!(json["event"], "Reading file");
        assert_eq!(json["file_path"], "data/export.xlsx");
        assert!(json["timestamp"].is_string());
        assert!(json.get("indent").is_none());
    }

    #[test]
    fn test_file_sink_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let broadcaster = LogBroadcaster::new();
        let path = broadcaster.open_file(dir.path()).unwrap();

        broadcaster.log(LogEntry::info("Starting process"));
        broadcaster.log(LogEntry::success("Union completed").with_field("total_rows", 12));

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert!(path.file_name().unwrap().to_string_lossy().ends_with("_logfile.log"));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "Starting process");
        assert_eq!(lines[1]["level"], "success");
        assert_eq!(lines[1]["total_rows"], 12);
    }
}
