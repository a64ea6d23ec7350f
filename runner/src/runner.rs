//! Scenario runner
//!
//! A `ScenarioRunner` owns an immutable `Config` and an ordered list of
//! steps. Each call to `run_scenario` executes every step once, in order,
//! and yields exactly one `StepResult` per step. Step failures (non-200
//! statuses and transport errors) are classified, reported to the sink
//! and never abort the remaining steps.

use std::sync::Arc;
use std::time::Instant;

use reqwest::{Client, StatusCode};
use tracing::{Level, debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{ConfigError, StepError};
use crate::sink::{LogSink, TracingSink};
use crate::step::{Step, StepOutcome, StepResult};

/// Lifecycle state of a runner.
///
/// `run_scenario` borrows the runner mutably, so callers only ever observe
/// `Idle`. `Running` stays set if a `run_scenario` future is dropped
/// mid-run, until the next run completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Running,
}

/// Executes a fixed sequence of HTTP steps against one host
pub struct ScenarioRunner {
    id: Uuid,
    config: Config,
    steps: Vec<Step>,
    sink: Arc<dyn LogSink>,
    /// Pooled HTTP client; `None` after teardown until the next run
    client: Option<Client>,
    state: RunnerState,
}

impl ScenarioRunner {
    /// Validate `config` and build a runner. No network I/O happens here.
    pub fn new(
        config: Config,
        steps: Vec<Step>,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = build_client(&config)?;

        Ok(Self {
            id: Uuid::new_v4(),
            config,
            steps,
            sink,
            client: Some(client),
            state: RunnerState::Idle,
        })
    }

    /// Build a runner reporting through `TracingSink`
    pub fn with_tracing(config: Config, steps: Vec<Step>) -> Result<Self, ConfigError> {
        Self::new(config, steps, Arc::new(TracingSink))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Whether an HTTP client (and its connection pool) is currently held
    pub fn holds_connections(&self) -> bool {
        self.client.is_some()
    }

    /// Execute every step once, in definition order
    pub async fn run_scenario(&mut self) -> Vec<StepResult> {
        self.state = RunnerState::Running;
        debug!(
            "Runner {} starting scenario ({} steps) against {}",
            self.id,
            self.steps.len(),
            self.config.host
        );

        let client = self.acquire_client();
        let mut results = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            let result = match &client {
                Ok(client) => execute_step(client, &self.config, step).await,
                Err(e) => StepResult {
                    step: step.name.clone(),
                    url: step.resolve_url(&self.config.host),
                    status: None,
                    outcome: StepOutcome::Failure,
                    detail: StepError::Transport(e.to_string()).to_string(),
                    elapsed: std::time::Duration::ZERO,
                },
            };
            self.report(step, &result);
            results.push(result);
        }

        let failures = results.iter().filter(|r| !r.is_success()).count();
        debug!(
            "Runner {} finished scenario: {} passed, {} failed",
            self.id,
            results.len() - failures,
            failures
        );

        self.state = RunnerState::Idle;
        results
    }

    /// Release the HTTP client and its pooled connections. Idempotent.
    pub fn teardown(&mut self) {
        if self.client.take().is_some() {
            debug!("Runner {} released HTTP client", self.id);
            if self.config.debug {
                self.sink
                    .record(Level::INFO, "Test completed, released HTTP client.");
            }
        }
    }

    /// Reuse the held client or rebuild one after a teardown
    fn acquire_client(&mut self) -> Result<Client, ConfigError> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }

        match build_client(&self.config) {
            Ok(client) => {
                self.client = Some(client.clone());
                Ok(client)
            }
            Err(e) => {
                warn!("Runner {} could not rebuild HTTP client: {}", self.id, e);
                Err(e)
            }
        }
    }

    fn report(&self, step: &Step, result: &StepResult) {
        match result.outcome {
            StepOutcome::Success => {
                if self.config.debug {
                    self.sink.record(
                        Level::INFO,
                        &format!("Successfully completed {}.", step.name),
                    );
                }
            }
            StepOutcome::Failure => {
                self.sink.record(
                    Level::ERROR,
                    &format!("Step '{}' failed. {}", step.name, result.detail),
                );
                if self.config.debug {
                    self.sink.record(
                        Level::ERROR,
                        &format!("Request URL: {}, Headers: {:?}", result.url, step.headers),
                    );
                }
            }
        }
    }
}

fn build_client(config: &Config) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

async fn execute_step(client: &Client, config: &Config, step: &Step) -> StepResult {
    let url = step.resolve_url(&config.host);
    let started = Instant::now();
    let outcome = send_step(client, config, step, &url).await;
    let elapsed = started.elapsed();

    match outcome {
        Ok(status) => StepResult {
            step: step.name.clone(),
            url,
            status: Some(status),
            outcome: StepOutcome::Success,
            detail: format!("Status: {status}"),
            elapsed,
        },
        Err(err) => StepResult {
            step: step.name.clone(),
            url,
            status: err.status(),
            outcome: StepOutcome::Failure,
            detail: err.to_string(),
            elapsed,
        },
    }
}

/// Send one request and classify the response. The response is fully
/// consumed before returning on every path.
async fn send_step(
    client: &Client,
    config: &Config,
    step: &Step,
    url: &str,
) -> Result<u16, StepError> {
    let mut request = client
        .request(step.method.into(), url)
        .timeout(config.timeout);
    for (key, value) in &step.headers {
        request = request.header(key.as_str(), value.as_str());
    }

    let response = request
        .send()
        .await
        .map_err(|e| classify_transport_error(&e, config))?;
    let status = response.status();

    if status == StatusCode::OK {
        // A body that times out or breaks off fails the step despite the 200
        response
            .bytes()
            .await
            .map_err(|e| classify_transport_error(&e, config))?;
        Ok(status.as_u16())
    } else {
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {}>", error_chain(&e)));
        Err(StepError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        })
    }
}

fn classify_transport_error(err: &reqwest::Error, config: &Config) -> StepError {
    if err.is_timeout() {
        StepError::Timeout(config.timeout)
    } else {
        StepError::Transport(error_chain(err))
    }
}

/// Render an error with its full source chain
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
