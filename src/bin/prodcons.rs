//! Runs the producer/consumer demo and prints its report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prodcons::demo::run_demo;
use prodcons::DemoConfig;

#[derive(Parser, Debug)]
#[command(name = "prodcons", version, about = "Bounded-buffer producer/consumer demo")]
struct Cli {
    #[arg(long, help = "TOML file overriding the demo defaults")]
    config: Option<PathBuf>,
    #[arg(long, help = "Print the report as JSON")]
    json: bool,
    #[arg(long, help = "Milliseconds each multi-producer task sleeps between puts")]
    pace_ms: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DemoConfig::load(path)
            .with_context(|| format!("loading demo config from {}", path.display()))?,
        None => DemoConfig::default(),
    };
    if let Some(pace_ms) = cli.pace_ms {
        config.multi_producer.pace_ms = pace_ms;
    }

    let report = run_demo(&config).context("demo run failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let text = report.to_string();
        for line in text.lines() {
            if line.starts_with("===") || line.starts_with("---") {
                println!("{}", line.bold());
            } else {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
