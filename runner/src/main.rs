use std::sync::Arc;

use anyhow::Context;
use scenario_runner::{Config, HarnessConfig, Scenario, TracingSink, harness};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; variables may come from the real environment
    let dotenv_path = dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scenario_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(path) = dotenv_path {
        info!("Loaded environment from {:?}", path);
    }

    // Load configuration from environment
    let config = Config::from_env().context("invalid runner configuration")?;
    let harness_config = HarnessConfig::from_env().context("invalid harness configuration")?;
    info!(
        "Loaded configuration: host={}, timeout={:?}, debug={}",
        config.host, config.timeout, config.debug
    );

    let scenario = match harness_config.scenario_file {
        Some(ref path) => {
            info!("Loading scenario from {:?}", path);
            Scenario::from_file(path)
                .with_context(|| format!("failed to load scenario from {}", path.display()))?
        }
        None => Scenario::products(harness_config.product_id),
    };

    let report = harness::run(config, harness_config, scenario, Arc::new(TracingSink)).await?;

    report.print_summary();
    println!("JSON: {}", serde_json::to_string(&report)?);

    Ok(())
}
