//! poolwatch-daemon entry point.
//!
//! Loads configuration (file + environment + CLI), initializes logging,
//! wires the line source and alert sink into a [`Monitor`], and runs it
//! until a shutdown signal arrives.
//!
//! Configuration errors are the one fatal error class at startup; the
//! monitor itself survives missing log files, malformed records, and
//! sink delivery failures.

mod cli;
mod logging;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use poolwatch_core::config::PoolwatchConfig;
use poolwatch_monitor::{ConsoleSink, FileLineSource, Monitor, MonitorBuilder, WebhookSink};

use crate::cli::{DEFAULT_CONFIG_PATH, DaemonCli};

#[tokio::main]
async fn main() -> Result<()> {
    let args = DaemonCli::parse();

    let mut config = load_config(&args).await?;

    // CLI overrides take precedence over file and environment
    if let Some(level) = &args.log_level {
        config.general.log_level = level.clone();
    }
    if let Some(format) = &args.log_format {
        config.general.log_format = format.clone();
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if args.validate {
        println!("configuration OK");
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!("poolwatch-daemon starting");

    let mut monitor = build_monitor(&config)?;

    tokio::select! {
        result = monitor.run() => {
            result.map_err(|e| anyhow::anyhow!("monitor terminated: {}", e))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    let stats = monitor.stats();
    tracing::info!(
        processed = stats.processed,
        parse_errors = stats.parse_errors,
        alerts_sent = stats.alerts_sent,
        alerts_suppressed = stats.alerts_suppressed,
        send_failures = stats.send_failures,
        "poolwatch-daemon shut down"
    );
    Ok(())
}

/// Resolve the configuration according to the CLI contract.
///
/// An explicit `--config` path must exist. The default path is optional:
/// when absent, built-in defaults plus environment overrides apply.
async fn load_config(args: &DaemonCli) -> Result<PoolwatchConfig> {
    let config = match &args.config {
        Some(path) => PoolwatchConfig::load(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?,
        None => {
            if Path::new(DEFAULT_CONFIG_PATH).exists() {
                PoolwatchConfig::load(DEFAULT_CONFIG_PATH)
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?
            } else {
                PoolwatchConfig::from_env()
                    .map_err(|e| anyhow::anyhow!("failed to load config from env: {}", e))?
            }
        }
    };
    Ok(config)
}

/// Assemble the monitor from configuration.
fn build_monitor(config: &PoolwatchConfig) -> Result<Monitor> {
    let builder = MonitorBuilder::new()
        .config(config.monitor.clone())
        .source(FileLineSource::new(config.source.clone()));

    let monitor = if config.sink.webhook_url.is_empty() {
        tracing::info!("no webhook configured, alerts will be surfaced in logs only");
        builder.sink(ConsoleSink::new()).build()
    } else {
        let sink = WebhookSink::new(
            &config.sink.webhook_url,
            Duration::from_secs(config.sink.timeout_secs),
        )
        .map_err(|e| anyhow::anyhow!("failed to build webhook sink: {}", e))?;
        tracing::info!(timeout_secs = config.sink.timeout_secs, "webhook sink configured");
        builder.sink(sink).build()
    };

    monitor.map_err(|e| anyhow::anyhow!("failed to build monitor: {}", e))
}
