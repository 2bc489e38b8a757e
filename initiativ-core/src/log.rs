//! The combat log.
//!
//! An append-only audit trail of everything the engine did. Entries are
//! mirrored to `tracing` as they are appended; nothing in the engine reads
//! the log back to make decisions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of thing a log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogCategory {
    Damage,
    Healing,
    Event,
    Info,
}

impl LogCategory {
    pub fn name(&self) -> &'static str {
        match self {
            LogCategory::Damage => "DAMAGE",
            LogCategory::Healing => "HEALING",
            LogCategory::Event => "EVENT",
            LogCategory::Info => "INFO",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single log line. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    message: String,
    category: LogCategory,
}

impl LogEntry {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn category(&self) -> LogCategory {
        self.category
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombatLog {
    entries: Vec<LogEntry>,
}

impl CombatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, category: LogCategory, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(category = %category, "{message}");
        self.entries.push(LogEntry { message, category });
    }

    pub(crate) fn info(&mut self, message: impl Into<String>) {
        self.push(LogCategory::Info, message);
    }

    pub(crate) fn event(&mut self, message: impl Into<String>) {
        self.push(LogCategory::Event, message);
    }

    pub(crate) fn damage(&mut self, message: impl Into<String>) {
        self.push(LogCategory::Damage, message);
    }

    pub(crate) fn healing(&mut self, message: impl Into<String>) {
        self.push(LogCategory::Healing, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Entries of one category, oldest first.
    pub fn of_category(&self, category: LogCategory) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    /// Whether any entry of `category` contains `needle`.
    pub fn contains(&self, category: LogCategory, needle: &str) -> bool {
        self.of_category(category).any(|e| e.message.contains(needle))
    }

    /// Entries appended after the first `start` ones.
    pub fn since(&self, start: usize) -> &[LogEntry] {
        self.entries.get(start..).unwrap_or(&[])
    }
}
