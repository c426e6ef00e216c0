//! Author-facing diagnostics.
//!
//! A [`Logger`] is handed explicitly to the script parser and interpreter;
//! it accumulates categorised entries with a running count per category so
//! a host can decide whether to run a script and can show the history.
//! Every entry is also forwarded to the `log` facade.

use std::fmt;

use crate::scan::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Information,
    Warning,
    Error,
}

impl Severity {
    fn index(self) -> usize {
        self as usize
    }

    fn log_level(self) -> log::Level {
        match self {
            Severity::Information => log::Level::Info,
            Severity::Warning => log::Level::Warn,
            Severity::Error => log::Level::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Information => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub severity: Severity,
    pub message: String,
    pub position: Option<Position>,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "{} at {pos}: {}", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

// ── Logger ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Logger {
    entries: Vec<Entry>,
    counts: [usize; 3],
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, severity: Severity, message: impl Into<String>, position: Option<Position>) {
        let entry = Entry {
            severity,
            message: message.into(),
            position,
        };
        log::log!(target: "vns::script", severity.log_level(), "{entry}");
        self.counts[severity.index()] += 1;
        self.entries.push(entry);
    }

    pub fn info(&mut self, message: impl Into<String>, position: Option<Position>) {
        self.log(Severity::Information, message, position);
    }

    pub fn warn(&mut self, message: impl Into<String>, position: Option<Position>) {
        self.log(Severity::Warning, message, position);
    }

    pub fn error(&mut self, message: impl Into<String>, position: Option<Position>) {
        self.log(Severity::Error, message, position);
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.counts[severity.index()]
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Every entry, one per line, in the order recorded.
    pub fn history(&self) -> String {
        self.history_at(Severity::Information)
    }

    /// Entries at `min` severity or above, one per line.
    pub fn history_at(&self, min: Severity) -> String {
        let mut out = String::new();
        for e in self.entries.iter().filter(|e| e.severity >= min) {
            out.push_str(&e.to_string());
            out.push('\n');
        }
        out
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.counts = [0; 3];
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_severity() {
        let mut log = Logger::new();
        log.info("parsed", None);
        log.warn("unknown tag", None);
        log.warn("unknown attribute", None);
        assert_eq!(log.count(Severity::Information), 1);
        assert_eq!(log.count(Severity::Warning), 2);
        assert!(!log.has_errors());
        log.error("bad", None);
        assert!(log.has_errors());
    }

    #[test]
    fn history_formatting() {
        let mut log = Logger::new();
        let pos = Position { offset: 4, line: 2, column: 3 };
        log.error("duplicate label", Some(pos));
        log.info("done", None);
        assert_eq!(log.history(), "error at 2:3: duplicate label\ninfo: done\n");
        assert_eq!(log.history_at(Severity::Warning), "error at 2:3: duplicate label\n");
    }

    #[test]
    fn clear_resets() {
        let mut log = Logger::new();
        log.error("x", None);
        log.clear();
        assert!(log.entries().is_empty());
        assert_eq!(log.count(Severity::Error), 0);
    }
}
