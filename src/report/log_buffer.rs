//! Log buffer — circular buffer of recent log lines.

use std::collections::VecDeque;
use std::time::SystemTime;

/// A timestamped log line.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: SystemTime,
    pub message: String,
}

/// Circular buffer of recent log lines.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl LogBuffer {
    /// Create a new buffer with the given capacity (at least one entry).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a line, evicting the oldest if at capacity.
    pub fn push(&mut self, message: impl Into<String>) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            timestamp: SystemTime::now(),
            message: message.into(),
        });
    }

    /// The N most recent entries (newest last).
    pub fn recent(&self, n: usize) -> Vec<&LogEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Messages only, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.message.clone()).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_empty() {
        let log = LogBuffer::new(10);
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn capacity_overflow_evicts_oldest() {
        let mut log = LogBuffer::new(3);
        for m in ["a", "b", "c", "d"] {
            log.push(m);
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.messages(), vec!["b", "c", "d"]);
    }

    #[test]
    fn recent_returns_newest() {
        let mut log = LogBuffer::new(10);
        log.push("a");
        log.push("b");
        log.push("c");

        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "b");
        assert_eq!(recent[1].message, "c");
        assert_eq!(log.recent(5).len(), 3);
    }

    #[test]
    fn entries_are_timestamped() {
        let mut log = LogBuffer::new(10);
        log.push("test");
        let entry = log.entries().next().unwrap();
        let elapsed = entry.timestamp.elapsed().unwrap();
        assert!(elapsed.as_secs() < 1);
    }

    #[test]
    fn zero_capacity_still_keeps_latest() {
        let mut log = LogBuffer::new(0);
        log.push("x");
        log.push("y");
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.messages(), vec!["y"]);
    }

    #[test]
    fn clear_empties() {
        let mut log = LogBuffer::default();
        log.push("x");
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.capacity(), 50);
    }
}
