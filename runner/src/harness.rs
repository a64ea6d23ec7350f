//! Local orchestration harness
//!
//! Spawns one independent `ScenarioRunner` per simulated user, runs the
//! configured number of iterations with a random think time between them,
//! and tallies outcomes per step. Only counts are kept.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use indexmap::IndexMap;
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Config, HarnessConfig};
use crate::error::ConfigError;
use crate::runner::ScenarioRunner;
use crate::sink::LogSink;
use crate::step::{Scenario, StepResult};

/// Success/failure counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepTally {
    pub successes: u64,
    pub failures: u64,
}

impl StepTally {
    pub fn total(&self) -> u64 {
        self.successes + self.failures
    }

    fn add(&mut self, result: &StepResult) {
        if result.is_success() {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
    }
}

/// Outcome counts of a harness run
#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    pub users: usize,
    pub iterations: usize,
    /// Per-step tallies in scenario order
    pub steps: IndexMap<String, StepTally>,
    pub total: StepTally,
    pub elapsed: Duration,
}

impl HarnessReport {
    fn new(harness: &HarnessConfig, scenario: &Scenario) -> Self {
        Self {
            users: harness.users,
            iterations: harness.iterations,
            steps: scenario
                .steps
                .iter()
                .map(|step| (step.name.clone(), StepTally::default()))
                .collect(),
            total: StepTally::default(),
            elapsed: Duration::ZERO,
        }
    }

    fn absorb(&mut self, results: &[StepResult]) {
        for result in results {
            self.steps.entry(result.step.clone()).or_default().add(result);
            self.total.add(result);
        }
    }

    /// Print a human readable summary to stdout
    pub fn print_summary(&self) {
        println!(
            "\n{} users x {} iterations in {:.1}s",
            self.users,
            self.iterations,
            self.elapsed.as_secs_f64()
        );
        println!("{:<40} {:>10} {:>10}", "Step", "Passed", "Failed");
        for (name, tally) in &self.steps {
            println!("{:<40} {:>10} {:>10}", name, tally.successes, tally.failures);
        }
        println!(
            "{:<40} {:>10} {:>10}",
            "Total", self.total.successes, self.total.failures
        );
    }
}

/// Run `scenario` for every simulated user and collect the tallies.
///
/// All runners are constructed before any request is sent, so an invalid
/// configuration fails without touching the network.
pub async fn run(
    config: Config,
    harness: HarnessConfig,
    scenario: Scenario,
    sink: Arc<dyn LogSink>,
) -> Result<HarnessReport, ConfigError> {
    harness.validate()?;

    let mut runners = Vec::with_capacity(harness.users);
    for _ in 0..harness.users {
        runners.push(ScenarioRunner::new(
            config.clone(),
            scenario.steps.clone(),
            sink.clone(),
        )?);
    }

    info!(
        "Starting {} users x {} iterations against {}",
        harness.users, harness.iterations, config.host
    );

    let started = Instant::now();
    let mut handles = Vec::with_capacity(runners.len());
    for (idx, runner) in runners.into_iter().enumerate() {
        if idx > 0 && !harness.spawn_interval.is_zero() {
            tokio::time::sleep(harness.spawn_interval).await;
        }
        handles.push(tokio::spawn(simulate_user(runner, harness.clone())));
    }

    let mut report = HarnessReport::new(&harness, &scenario);
    for joined in join_all(handles).await {
        match joined {
            Ok(results) => report.absorb(&results),
            Err(e) => warn!("Simulated user task failed: {}", e),
        }
    }
    report.elapsed = started.elapsed();

    info!(
        "Harness finished: {} passed, {} failed",
        report.total.successes, report.total.failures
    );
    Ok(report)
}

async fn simulate_user(mut runner: ScenarioRunner, harness: HarnessConfig) -> Vec<StepResult> {
    let mut results = Vec::with_capacity(harness.iterations * runner.steps().len());
    for iteration in 0..harness.iterations {
        if iteration > 0 {
            tokio::time::sleep(think_time(harness.think_time_min, harness.think_time_max)).await;
        }
        results.extend(runner.run_scenario().await);
    }
    runner.teardown();
    results
}

/// Uniformly random pause in `[min, max]`
fn think_time(min: Duration, max: Duration) -> Duration {
    if min >= max {
        return min;
    }
    let secs = rand::rng().random_range(min.as_secs_f64()..=max.as_secs_f64());
    Duration::from_secs_f64(secs)
}
