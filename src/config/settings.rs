/// Configuration structures

use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Thresholds, CLAIM_THRESHOLDS, DEPOSIT_THRESHOLDS};
use crate::analysis::{AnalysisMode, AnalysisOptions};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub analysis: Analysis,
    pub distribution: Distribution,
    pub moving_users: MovingUsers,
    pub logging: Logging,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    FullHistory,
    Windowed,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Analysis {
    pub bucket_count: usize,
    pub mode: Mode,
    /// Window start in unix seconds, required for windowed mode
    pub window_start: Option<i64>,
    /// Explicit boundaries replacing the evenly spaced ones
    pub boundaries: Option<Vec<i64>>,
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            bucket_count: 50,
            mode: Mode::FullHistory,
            window_start: None,
            boundaries: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Distribution {
    pub deposit_thresholds: Vec<f64>,
    pub claim_thresholds: Vec<f64>,
}

impl Default for Distribution {
    fn default() -> Self {
        Self {
            deposit_thresholds: DEPOSIT_THRESHOLDS.to_vec(),
            claim_thresholds: CLAIM_THRESHOLDS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MovingUsers {
    /// Ignore destination deposits after this instant
    pub until: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: "logs".to_string(),
            file_prefix: "prizeflow.log".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn analysis_options(&self) -> anyhow::Result<AnalysisOptions> {
        let mode = match (self.analysis.mode, self.analysis.window_start) {
            (Mode::FullHistory, _) => AnalysisMode::FullHistory,
            (Mode::Windowed, Some(start)) => AnalysisMode::Windowed { start },
            (Mode::Windowed, None) => bail!("analysis.window_start is required in windowed mode"),
        };

        Ok(AnalysisOptions {
            bucket_count: self.analysis.bucket_count,
            mode,
            boundaries: self.analysis.boundaries.clone(),
            deposit_thresholds: Thresholds::new(self.distribution.deposit_thresholds.clone()),
            claim_thresholds: Thresholds::new(self.distribution.claim_thresholds.clone()),
        })
    }
}
