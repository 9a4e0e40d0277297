//! Collection micro-benchmark suite.
//!
//! Compares try-add and try-get across hash, concurrent, sorted, tree,
//! persistent and set containers for several element types.
//!
//! Run with: cargo run --release
//!
//! Set `COLLECTION_BENCH_CONFIG` to a JSON file to override the defaults and
//! `RUST_LOG` to adjust logging.

use anyhow::{Context, Result};
use collection_bench::report::ComparisonTable;
use collection_bench::{Harness, HarnessConfig};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "COLLECTION_BENCH_CONFIG";

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => HarnessConfig::from_json_file(&path)
            .with_context(|| format!("loading {CONFIG_ENV}={}", path.to_string_lossy()))?,
        None => HarnessConfig::default(),
    };
    let harness = Harness::new(config).context("invalid benchmark configuration")?;

    let measurement = &harness.config().measurement;
    println!();
    println!("{}", "=".repeat(80));
    println!("                    Collection TryAdd / TryGetValue Benchmark Suite");
    println!("{}", "=".repeat(80));
    println!(
        "Iterations: {} (+ {} warmup)   Seed: {}   Platform: {}",
        measurement.iterations,
        measurement.warmup_min_iterations,
        harness.config().seed,
        std::env::consts::ARCH
    );
    println!();

    let mut table = ComparisonTable::new();
    let summary = harness.run(None, &mut table);
    print!("{}", table.render());

    println!("{}", "=".repeat(80));
    println!(
        "Benchmark complete: {} measured, {} failed.",
        summary.measured, summary.failed
    );
    println!("{}", "=".repeat(80));
    println!();
    Ok(())
}
