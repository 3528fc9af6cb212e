//! Standalone benchmark runner that verifies and times every workload profile.
//!
//! Each profile's operation stream is first replayed against a `VecDeque`
//! model with a check after every step; only a stream that verifies is timed.
//!
//! Configuration (see `config.rs`):
//!   CIRCBUF_BENCH_CONFIG=/path/to/bench.json   # full config file
//!   CIRCBUF_OPS=50000 CIRCBUF_SEED=0x1234      # single overrides
//!   CIRCBUF_LOG=debug                          # stderr log level
//!
//! Usage:
//!   cargo run --release -p circbuf-bench

use anyhow::{Context, Result};
use circbuf::GrowthPolicy;
use circbuf_bench::config::BenchConfig;
use circbuf_bench::model::{run_circular, run_vecdeque, verify};
use circbuf_bench::report::{print_report, ContainerResult, WorkloadResult};
use circbuf_bench::workload::{generate, Op, Profile};
use std::hint::black_box;
use std::time::Instant;

fn time_runs<F>(label: &str, config: &BenchConfig, mut run: F) -> ContainerResult
where
    F: FnMut() -> u64,
{
    for _ in 0..config.warmup_runs {
        black_box(run());
    }
    let mut result = ContainerResult::new(label);
    for _ in 0..config.sample_runs {
        let start = Instant::now();
        black_box(run());
        result.add_sample(start.elapsed());
    }
    result
}

fn bench_profile(
    profile: Profile,
    config: &BenchConfig,
    growth: GrowthPolicy,
) -> Result<WorkloadResult> {
    let ops: Vec<Op> = generate(profile, config.ops, config.seed);
    let stats = verify(&ops, growth)
        .with_context(|| format!("{} workload diverged from the model", profile.name()))?;
    log::info!(
        "{}: verified {} ops, {} growth events, peak length {}",
        profile.name(),
        stats.ops,
        stats.growth_events,
        stats.peak_len
    );

    let circular = time_runs("circular", config, || run_circular(&ops, growth));
    let vecdeque = time_runs("vecdeque", config, || run_vecdeque(&ops));
    Ok(WorkloadResult {
        profile: profile.name().to_string(),
        stats,
        circular,
        vecdeque,
    })
}

fn main() -> Result<()> {
    let config = BenchConfig::load()?;
    circbuf::initialize_logger(config.level_filter()?, config.log_file.as_deref())?;

    println!("Running circular buffer replay benchmark...");
    println!("  Operations:   {}", config.ops);
    println!("  Seed:         {:#x}", config.seed);
    println!("  Warmup runs:  {}", config.warmup_runs);
    println!("  Sample runs:  {}", config.sample_runs);
    log::debug!("growth policy: {:?}", config.growth);

    let mut results = Vec::new();
    for &profile in &config.profiles {
        eprint!("  Benchmarking {}...", profile.name());
        let result = bench_profile(profile, &config, config.growth)?;
        eprintln!(" done ({:.1}µs mean)", result.circular.mean_us());
        results.push(result);
    }

    print_report(&results);
    Ok(())
}
