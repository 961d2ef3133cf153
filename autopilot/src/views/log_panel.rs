//! Append-only log shown beneath a view
//!
//! Entries live for the viewing session only. A reload rebuilds them from
//! the authoritative project payload.

use autopilot_sdk::{LogEntry, Severity};

pub const DEFAULT_CAPACITY: usize = 500;

#[derive(Debug, Clone)]
pub struct LogPanel {
    entries: Vec<LogEntry>,
    capacity: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogEntry::info(message));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(LogEntry::success(message));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(LogEntry::warning(message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogEntry::error(message));
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);

        // Keep only recent entries
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.severity == severity)
            .count()
    }
}

impl Default for LogPanel {
    fn default() -> Self {
        Self::new()
    }
}
