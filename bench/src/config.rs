//! Runner configuration.
//!
//! Values are layered: built-in defaults, then the JSON file named by
//! `CIRCBUF_BENCH_CONFIG` (if set), then the individual env overrides
//! `CIRCBUF_OPS`, `CIRCBUF_SEED` and `CIRCBUF_LOG`.

use anyhow::{Context, Result};
use circbuf::GrowthPolicy;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, str::FromStr};

use crate::workload::Profile;

pub const CONFIG_PATH_VAR: &str = "CIRCBUF_BENCH_CONFIG";
pub const OPS_VAR: &str = "CIRCBUF_OPS";
pub const SEED_VAR: &str = "CIRCBUF_SEED";
pub const LOG_VAR: &str = "CIRCBUF_LOG";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BenchConfig {
    /// Operations per generated workload.
    pub ops: usize,
    pub seed: u64,
    pub warmup_runs: u32,
    pub sample_runs: u32,
    /// `log` level name for stderr, e.g. "info" or "trace".
    pub log_level: String,
    /// Optional log file receiving everything the root logger accepts.
    pub log_file: Option<String>,
    pub profiles: Vec<Profile>,
    pub growth: GrowthPolicy,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            ops: 20_000,
            seed: 0x5eed,
            warmup_runs: 3,
            sample_runs: 30,
            log_level: "info".to_string(),
            log_file: None,
            profiles: Profile::ALL.to_vec(),
            growth: GrowthPolicy::default(),
        }
    }
}

impl BenchConfig {
    /// Defaults, then the config file, then env overrides.
    pub fn load() -> Result<Self> {
        let mut config = match env::var(CONFIG_PATH_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_overrides(|name| env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading bench config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing bench config {}", path.display()))
    }

    /// Applies the single-value overrides. `lookup` returns the raw value of
    /// an env variable, if set.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ops) = lookup(OPS_VAR) {
            self.ops = ops
                .trim()
                .parse()
                .with_context(|| format!("{OPS_VAR}={ops} is not a count"))?;
        }
        if let Some(seed) = lookup(SEED_VAR) {
            self.seed = parse_seed(seed.trim())
                .with_context(|| format!("{SEED_VAR}={seed} is not a seed"))?;
        }
        if let Some(level) = lookup(LOG_VAR) {
            self.log_level = level.trim().to_string();
        }
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level)
            .with_context(|| format!("unknown log level {:?}", self.log_level))
    }
}

/// Accepts decimal or `0x`-prefixed hex.
fn parse_seed(raw: &str) -> Result<u64> {
    let seed = match raw.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16)?,
        None => raw.parse()?,
    };
    Ok(seed)
}
