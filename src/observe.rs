// ============================================================================
// Logging Sink
// ============================================================================

use std::error::Error;
use std::fmt;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// External logging collaborator.
///
/// The engine reports every warning/error condition through this trait.
/// Implementations must not let their own failures escape back into the
/// engine; the dispatcher treats `log` as infallible.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, source: &str, message: &str, error: Option<&dyn Error>);
}

/// Default sink: routes entries to the `log` crate facade.
#[derive(Debug, Default)]
pub struct StdLogSink;

impl LogSink for StdLogSink {
    fn log(&self, level: LogLevel, source: &str, message: &str, error: Option<&dyn Error>) {
        let line = match error {
            Some(err) => format!("[{}] {}: {}", source, message, err),
            None => format!("[{}] {}", source, message),
        };
        match level {
            LogLevel::Debug => log::debug!("{}", line),
            LogLevel::Info => log::info!("{}", line),
            LogLevel::Warn => log::warn!("{}", line),
            LogLevel::Error => log::error!("{}", line),
        }
    }
}

/// A captured log entry.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub source: String,
    pub message: String,
    pub error: Option<String>,
}

/// Capturing sink for tests and diagnostics.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn entries_at(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .collect()
    }

    pub fn contains(&self, fragment: &str) -> bool {
        self.entries().iter().any(|e| e.message.contains(fragment))
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: LogLevel, source: &str, message: &str, error: Option<&dyn Error>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry {
                level,
                source: source.to_string(),
                message: message.to_string(),
                error: error.map(|e| e.to_string()),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_captures_entries() {
        let sink = MemorySink::new();
        sink.log(LogLevel::Warn, "limits", "queries at 80%", None);
        sink.log(LogLevel::Error, "dispatch", "handler failed", None);

        assert_eq!(sink.entries().len(), 2);
        assert_eq!(sink.entries_at(LogLevel::Warn).len(), 1);
        assert!(sink.contains("80%"));
    }

    #[test]
    fn test_memory_sink_clear() {
        let sink = MemorySink::new();
        sink.log(LogLevel::Info, "test", "entry", None);
        sink.clear();
        assert!(sink.entries().is_empty());
    }
}
