use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use chainwatch_tracer::chain::registry::supported_chains;
use chainwatch_tracer::chain::ChainRef;
use chainwatch_tracer::config::Config;
use chainwatch_tracer::pipeline::{InvestigationPipeline, TimeWindow};
use chainwatch_tracer::provider::snapshot::load_snapshot;
use chainwatch_tracer::provider::{ChainDataProvider, InMemoryProvider, RetryingProvider};

const USAGE: &str = "usage: chainwatch-tracer <config.toml> <command> [args]

commands:
  trace <address> [chain]            one-hop graph on a single chain (default: 1)
  scan <address>                     one-hop graph merged across candidate chains
  path <source> <target> [chain]     bounded path search between two addresses
  investigate <address> [chain]      graph plus anomaly and pattern findings
      [--start <date>] [--end <date>]  limit to a time window (YYYY-MM-DD or full timestamp)
  chains                             list supported chains";

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Logs go to stderr so stdout stays valid JSON (set RUST_LOG=debug for more)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let (args, window) = split_window_flags(std::env::args().skip(1).collect())?;
    let (config_path, command, rest) = match args.as_slice() {
        [config_path, command, rest @ ..] => (config_path.as_str(), command.as_str(), rest),
        _ => return Err(eyre::eyre!("{}", USAGE)),
    };

    let config = Config::load(config_path)?;
    tracing::info!("Configuration loaded from {}", config_path);

    if command == "chains" {
        return print_json(&supported_chains());
    }

    let provider = build_provider(&config);
    let pipeline = InvestigationPipeline::init(&config, provider);

    let chain_arg = |index: usize| -> ChainRef {
        rest.get(index)
            .map(|s| ChainRef::parse(s))
            .unwrap_or(ChainRef::Id(1))
    };

    match (command, rest) {
        ("trace", [address, ..]) => {
            let graph = pipeline.trace(address, &chain_arg(1)).await;
            print_json(&graph.to_elements())
        }
        ("scan", [address, ..]) => {
            let graph = pipeline.trace_all(address).await;
            print_json(&graph.to_elements())
        }
        ("path", [source, target, ..]) => {
            let result = pipeline.find_path(source, target, &chain_arg(2)).await?;
            print_json(&result.to_json())
        }
        ("investigate", [address, ..]) => {
            let report = pipeline.investigate(address, &chain_arg(1), &window).await;
            print_json(&report)
        }
        _ => Err(eyre::eyre!("{}", USAGE)),
    }
}

/// Snapshot-backed provider with retries, or an empty one when no snapshot is configured.
fn build_provider(config: &Config) -> Arc<dyn ChainDataProvider> {
    let inner = match &config.provider.snapshot_path {
        Some(path) => match load_snapshot(path) {
            Ok(provider) => {
                tracing::info!(histories = provider.len(), "Snapshot provider loaded");
                provider
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load snapshot, continuing without history");
                InMemoryProvider::new()
            }
        },
        None => {
            tracing::warn!("No provider.snapshot_path configured, every address will have empty history");
            InMemoryProvider::new()
        }
    };

    Arc::new(RetryingProvider::new(
        inner,
        config.provider.max_retries,
        Duration::from_millis(config.provider.retry_base_delay_ms),
    ))
}

/// Pull `--start`/`--end` out of the argument list, leaving positional arguments in order.
fn split_window_flags(args: Vec<String>) -> eyre::Result<(Vec<String>, TimeWindow)> {
    let mut positional = Vec::new();
    let mut start: Option<String> = None;
    let mut end: Option<String> = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let slot = if arg == "--start" {
            &mut start
        } else if arg == "--end" {
            &mut end
        } else {
            positional.push(arg);
            continue;
        };
        match iter.next() {
            Some(value) => *slot = Some(value),
            None => return Err(eyre::eyre!("{} requires a value\n\n{}", arg, USAGE)),
        }
    }

    let window = TimeWindow::parse(start.as_deref(), end.as_deref())?;
    Ok((positional, window))
}

fn print_json<T: Serialize>(value: &T) -> eyre::Result<()> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| eyre::eyre!("Failed to serialize output: {}", e))?;
    println!("{}", out);
    Ok(())
}
