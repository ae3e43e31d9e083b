use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::classify::{DEFAULT_CARDINALITY_THRESHOLD, DEFAULT_NOISE_THRESHOLD};
use crate::intervals::DEFAULT_MIN_RUN_LENGTH;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub analysis: AnalysisConfig,
    pub activity: ActivityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub cardinality_threshold: usize, // more distinct values than this => numeric
    pub min_run_length: usize,        // shorter runs are not reported as intervals
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    pub noise_threshold: f64, // mean |step| above this => noisy
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            cardinality_threshold: DEFAULT_CARDINALITY_THRESHOLD,
            min_run_length: DEFAULT_MIN_RUN_LENGTH,
        }
    }
}

impl Default for ActivityConfig {
    fn default() -> Self {
        ActivityConfig {
            noise_threshold: DEFAULT_NOISE_THRESHOLD,
        }
    }
}

impl SystemConfig {
    /// Load a JSON config file. Missing sections and fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }
}
