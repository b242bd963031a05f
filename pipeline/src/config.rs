//! Runtime configuration for the processing pipeline.

use std::path::Path;

use anyhow::Context;
use knownsource::MatcherConfig;
use serde::{Deserialize, Serialize};
use sifter::SifterConfig;

/// Thresholds for both pipeline stages.
///
/// Loadable from a JSON file; missing sections fall back to the
/// defaults. Validation happens when the clusterer and matcher are
/// constructed from the sub-configs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Clustering thresholds.
    pub sifter: SifterConfig,
    /// Known-source matching thresholds.
    pub known_sources: MatcherConfig,
}

impl PipelineConfig {
    /// Load the configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;

        let config = serde_json::from_str(&text)
            .with_context(|| format!("cannot parse config file {}", path.display()))?;

        Ok(config)
    }
}
