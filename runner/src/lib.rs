//! Scripted HTTP scenario runner
//!
//! Drives an ordered sequence of named HTTP requests against a target host,
//! classifies each response as success or failure and reports through an
//! injected logging sink. The `harness` module runs many independent
//! runners concurrently for simple load generation.

pub mod config;
pub mod error;
pub mod harness;
pub mod runner;
pub mod sink;
pub mod step;

// Re-export commonly used types
pub use config::{Config, HarnessConfig};
pub use error::{ConfigError, ScenarioError, StepError};
pub use harness::{HarnessReport, StepTally};
pub use runner::{RunnerState, ScenarioRunner};
pub use sink::{LogRecord, LogSink, RecordingSink, TracingSink};
pub use step::{HttpMethod, Scenario, Step, StepOutcome, StepResult};
