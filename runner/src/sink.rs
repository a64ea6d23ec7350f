//! Logging sinks receiving step reports
//!
//! The runner never logs step outcomes through global state directly; it
//! reports to an injected `LogSink`. `TracingSink` forwards to `tracing`,
//! `RecordingSink` keeps records in memory for inspection.

use std::sync::Mutex;

use tracing::Level;

/// Destination for step reports
pub trait LogSink: Send + Sync {
    fn record(&self, level: Level, message: &str);
}

/// Forwards records to the `tracing` subscriber under the `scenario_runner::steps` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "scenario_runner::steps", "{}", message),
            Level::WARN => tracing::warn!(target: "scenario_runner::steps", "{}", message),
            Level::INFO => tracing::info!(target: "scenario_runner::steps", "{}", message),
            Level::DEBUG => tracing::debug!(target: "scenario_runner::steps", "{}", message),
            _ => tracing::trace!(target: "scenario_runner::steps", "{}", message),
        }
    }
}

/// A record captured by `RecordingSink`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
}

/// In-memory sink
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// Records at exactly `level`
    pub fn at_level(&self, level: Level) -> Vec<LogRecord> {
        self.lock()
            .iter()
            .filter(|r| r.level == level)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for RecordingSink {
    fn record(&self, level: Level, message: &str) {
        self.lock().push(LogRecord {
            level,
            message: message.to_string(),
        });
    }
}
