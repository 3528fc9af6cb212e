//! Report module: prints replay timings for both containers side by side.

use std::time::Duration;

use crate::model::ReplayStats;

/// Timings of one container on one workload.
#[derive(Debug, Clone)]
pub struct ContainerResult {
    pub container: String,
    pub run_durations: Vec<Duration>,
}

impl ContainerResult {
    pub fn new(container: &str) -> Self {
        Self {
            container: container.to_string(),
            run_durations: Vec::new(),
        }
    }

    pub fn add_sample(&mut self, total: Duration) {
        self.run_durations.push(total);
    }

    pub fn mean_us(&self) -> f64 {
        if self.run_durations.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .run_durations
            .iter()
            .map(|d| d.as_secs_f64() * 1e6)
            .sum();
        sum / self.run_durations.len() as f64
    }

    pub fn percentile_us(&self, pct: f64) -> f64 {
        if self.run_durations.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self
            .run_durations
            .iter()
            .map(|d| d.as_secs_f64() * 1e6)
            .collect();
        sorted.sort_by(f64::total_cmp);
        let idx = ((pct / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    /// Mean cost of one operation in nanoseconds.
    pub fn ns_per_op(&self, ops: usize) -> f64 {
        if ops == 0 {
            return 0.0;
        }
        self.mean_us() * 1000.0 / ops as f64
    }
}

/// Results for one workload profile.
#[derive(Debug, Clone)]
pub struct WorkloadResult {
    pub profile: String,
    pub stats: ReplayStats,
    pub circular: ContainerResult,
    pub vecdeque: ContainerResult,
}

impl WorkloadResult {
    /// Mean time of the circular buffer relative to `VecDeque`; below 1.0 is faster.
    pub fn relative_mean(&self) -> f64 {
        let baseline = self.vecdeque.mean_us();
        if baseline <= 0.0 {
            return 0.0;
        }
        self.circular.mean_us() / baseline
    }
}

pub fn print_report(results: &[WorkloadResult]) {
    println!("\n{}", "=".repeat(80));
    println!("  Circular Buffer Replay Report");
    println!("{}", "=".repeat(80));

    for result in results {
        let stats = &result.stats;
        println!("\n  Workload: {}", result.profile);
        println!("  {}", "-".repeat(60));
        println!("  Operations:      {:>10}", stats.ops);
        println!("  Growth events:   {:>10}", stats.growth_events);
        println!("  Peak length:     {:>10}", stats.peak_len);
        println!("  Peak capacity:   {:>10}", stats.peak_capacity);
        println!("  Final length:    {:>10}", stats.final_len);
        println!(
            "\n  {:14} {:>12} {:>12} {:>12} {:>10}",
            "Container", "Mean (µs)", "p50 (µs)", "p99 (µs)", "ns/op"
        );
        println!("  {}", "-".repeat(64));
        for container in [&result.circular, &result.vecdeque] {
            println!(
                "  {:14} {:>12.1} {:>12.1} {:>12.1} {:>10.2}",
                container.container,
                container.mean_us(),
                container.percentile_us(50.0),
                container.percentile_us(99.0),
                container.ns_per_op(stats.ops),
            );
        }
    }

    println!("\n{}", "=".repeat(80));

    if results.len() >= 2 {
        println!("\n  Comparison Summary:");
        println!(
            "  {:12} {:>14} {:>14} {:>10}",
            "Workload", "circular (µs)", "vecdeque (µs)", "ratio"
        );
        println!("  {}", "-".repeat(54));
        for r in results {
            println!(
                "  {:12} {:>14.1} {:>14.1} {:>10.2}",
                r.profile,
                r.circular.mean_us(),
                r.vecdeque.mean_us(),
                r.relative_mean()
            );
        }
    }

    println!();
}
