//! Scenario Runner
//!
//! Command-line tool for running the scrollwatch scenarios headlessly.
//!
//! Usage:
//!   scrollwatch-scenarios                        # Run all scenarios
//!   scrollwatch-scenarios --filter anchoring     # Run scenarios matching "anchoring"
//!   scrollwatch-scenarios --list                 # List all scenarios
//!   scrollwatch-scenarios --config scrollwatch.toml --json

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scrollwatch_engine::ContainerConfig;
use scrollwatch_test_suite::{runner::TestRunner, scenarios, TestHarness};

#[derive(Parser)]
#[command(name = "scrollwatch-scenarios")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Headless scenarios for the scrollwatch engine", long_about = None)]
struct Cli {
    /// List scenarios without running them
    #[arg(long)]
    list: bool,

    /// Only run scenarios whose name or category contains this
    #[arg(short, long)]
    filter: Option<String>,

    /// Container configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Latency of the demo data service
    #[arg(long, default_value = "50")]
    latency_ms: u64,

    /// Print the results as JSON instead of a summary table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if cli.list {
        println!("Available scenario suites:");
        for suite in scenarios::all_suites() {
            println!("\n  {}:", suite.name);
            for case in &suite.cases {
                println!("    - {}", case.name);
            }
        }
        return Ok(());
    }

    let config = match cli.config {
        Some(ref path) => {
            let parsed = ContainerConfig::load(path)?;
            for diagnostic in &parsed.diagnostics {
                warn!("{}: {}", path.display(), diagnostic);
            }
            parsed.into_value()
        }
        None => ContainerConfig::default(),
    };

    let harness =
        TestHarness::new(config).with_latency(Duration::from_millis(cli.latency_ms));
    let mut runner = TestRunner::with_harness(harness);
    for suite in scenarios::all_suites() {
        runner.add_suite(suite);
    }

    if let Some(ref pattern) = cli.filter {
        if !cli.json {
            println!("Running scenarios matching: {}\n", pattern);
        }
        runner.filter(pattern);
    }

    let result = runner.run();

    if cli.json {
        println!("{}", result.to_json()?);
    } else {
        result.print_summary();
    }

    if result.all_passed() {
        if !cli.json {
            println!("\nAll scenarios passed!");
        }
        Ok(())
    } else {
        std::process::exit(1);
    }
}
