//! Configuration structures for the matchday feature pipeline.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::season::Season;

/// Main configuration for the feature pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input data configuration.
    pub data: DataConfig,
    /// Feature computation configuration.
    pub features: FeatureConfig,
    /// Export configuration.
    pub export: ExportConfig,
}

impl Config {
    /// Load a configuration from a JSON file. Missing sections keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.features.rolling_window == 0 {
            return Err(Error::config("features.rolling_window must be at least 1"));
        }
        if self.data.training_start < self.data.history_start {
            return Err(Error::config(format!(
                "data.training_start {} precedes data.history_start {}",
                self.data.training_start, self.data.history_start
            )));
        }
        let last = self.data.resolve_last_season()?;
        if last < self.data.training_start {
            return Err(Error::config(format!(
                "data.last_season {} precedes data.training_start {}",
                last, self.data.training_start
            )));
        }
        Ok(())
    }
}

/// Input data configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding one `<season-code>.csv` file per season.
    pub data_dir: PathBuf,
    /// First season loaded (feeds the historical averages only).
    pub history_start: Season,
    /// First season that produces training rows.
    pub training_start: Season,
    /// Last season loaded. Defaults to the season ending this calendar year.
    pub last_season: Option<Season>,
    /// Seasons never loaded.
    pub skip_seasons: Vec<Season>,
    /// Abort on a season that fails to load instead of skipping it.
    pub strict: bool,
}

impl DataConfig {
    /// Last season to load, resolving the calendar default.
    pub fn resolve_last_season(&self) -> Result<Season> {
        match self.last_season {
            Some(season) => Ok(season),
            None => Season::current(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./cleaned_data"),
            history_start: Season::new_unchecked(1994),
            training_start: Season::new_unchecked(2015),
            last_season: None,
            skip_seasons: Vec::new(),
            strict: false,
        }
    }
}

/// Feature computation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Rolling window (matches) for the LastN averages.
    pub rolling_window: usize,
    /// Rows dropped from the start of every season before merging.
    pub pruning: usize,
    /// Teams flagged by the IsItElite columns.
    pub elite_teams: Vec<String>,
}

impl FeatureConfig {
    /// Whether `team` is in the elite set.
    pub fn is_elite(&self, team: &str) -> bool {
        self.elite_teams.iter().any(|t| t == team)
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            rolling_window: 6,
            pruning: 120,
            elite_teams: [
                "Man City",
                "Man United",
                "Arsenal",
                "Liverpool",
                "Chelsea",
                "Tottenham",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Encoded training table.
    pub output_path: PathBuf,
    /// Team name to code mapping.
    pub encoding_path: PathBuf,
    /// Merged table with team names, written before encoding when set.
    pub named_output_path: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("features.csv"),
            encoding_path: PathBuf::from("encoding.csv"),
            named_output_path: None,
        }
    }
}
