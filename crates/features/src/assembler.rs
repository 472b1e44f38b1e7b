//! Training table assembly.
//!
//! Per training season: run the event stream through a fresh aggregator,
//! attach historical averages and elite flags, and drop the first
//! `pruning` rows. Seasons are then merged chronologically and the team
//! names replaced by their encoded codes.

use matchday_core::config::FeatureConfig;
use matchday_core::{Config, FeatureRow, MatchFeatures, Result, Season, Side, SideFeatures};
use matchday_ingestion::{EventStreamBuilder, MatchStore, SeasonTable};
use tracing::{info, warn};

use crate::aggregator::RunningAggregator;
use crate::encoding::EncodingTable;
use crate::historical::HistoricalAverager;

/// Encoded training table.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    /// Rolling window the LastN columns were computed with.
    window: usize,
    rows: Vec<FeatureRow>,
    encoding: EncodingTable,
}

impl FeatureTable {
    pub fn new(window: usize, rows: Vec<FeatureRow>, encoding: EncodingTable) -> Self {
        Self {
            window,
            rows,
            encoding,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Rows in chronological order.
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn encoding(&self) -> &EncodingTable {
        &self.encoding
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Result of an assembly run.
#[derive(Debug, Clone)]
pub struct AssembledTable {
    /// Merged rows keyed by team name, before encoding.
    pub named: Vec<MatchFeatures>,
    /// Encoded table with its encoding.
    pub table: FeatureTable,
}

/// Builds the training table from loaded seasons.
#[derive(Debug, Clone)]
pub struct TableAssembler {
    features: FeatureConfig,
    /// First season that produces rows.
    training_start: Season,
}

impl TableAssembler {
    pub fn new(features: FeatureConfig, training_start: Season) -> Self {
        Self {
            features,
            training_start,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.features.clone(), config.data.training_start)
    }

    /// Pre-match features for every match of one season, unpruned.
    pub fn season_features(
        &self,
        table: &SeasonTable,
        history: &HistoricalAverager,
    ) -> Result<Vec<MatchFeatures>> {
        let events = EventStreamBuilder::new().build(table);
        let pre = RunningAggregator::new(self.features.rolling_window).process(&events)?;
        let historical = history.averages_before(table.season());

        let side = |team: &str, snapshot| SideFeatures {
            snapshot,
            historical_avg_points: historical.get(team).copied().unwrap_or(0.0),
            is_elite: self.features.is_elite(team),
        };

        Ok(table
            .matches()
            .iter()
            .zip(pre)
            .map(|(m, pre)| MatchFeatures {
                season: m.season,
                sequence_index: m.sequence_index,
                home_team: m.home_team.clone(),
                away_team: m.away_team.clone(),
                home_goals: m.home_goals,
                away_goals: m.away_goals,
                home: side(m.team(Side::Home), pre.home),
                away: side(m.team(Side::Away), pre.away),
                result: m.result,
            })
            .collect())
    }

    /// Assemble the training table from every loaded season at or after the
    /// training start. Earlier seasons only feed the historical averages.
    pub fn assemble(&self, store: &MatchStore) -> Result<AssembledTable> {
        let history = HistoricalAverager::from_store(store);
        let mut named = Vec::new();
        let mut seasons = 0usize;

        for table in store.seasons_from(self.training_start) {
            let rows = self.season_features(table, &history)?;
            let total = rows.len();
            let kept = prune(rows, self.features.pruning);
            if kept.is_empty() {
                warn!(
                    season = %table.season(),
                    matches = total,
                    pruning = self.features.pruning,
                    "season fully pruned"
                );
            }
            info!(
                season = %table.season(),
                matches = total,
                kept = kept.len(),
                "season features computed"
            );
            named.extend(kept);
            seasons += 1;
        }

        if named.is_empty() {
            warn!(training_start = %self.training_start, "assembled table is empty");
        }

        let table = encode(&named, self.features.rolling_window)?;
        info!(
            seasons,
            rows = table.len(),
            teams = table.encoding().len(),
            "training table assembled"
        );

        Ok(AssembledTable { named, table })
    }
}

/// Drop the first `k` rows. Fewer than `k` rows leaves nothing.
pub fn prune(rows: Vec<MatchFeatures>, k: usize) -> Vec<MatchFeatures> {
    rows.into_iter().skip(k).collect()
}

/// Fit an encoding on every team in `rows` and encode them.
pub fn encode(rows: &[MatchFeatures], window: usize) -> Result<FeatureTable> {
    let encoding = EncodingTable::fit(
        rows.iter()
            .flat_map(|m| [m.home_team.as_str(), m.away_team.as_str()]),
    );
    let encoded = rows
        .iter()
        .map(|m| Ok(m.encode(encoding.encode(&m.home_team)?, encoding.encode(&m.away_team)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(FeatureTable::new(window, encoded, encoding))
}

/// Load every configured season and assemble the training table.
pub fn export_data(config: &Config) -> Result<AssembledTable> {
    config.validate()?;
    let store = MatchStore::load(&config.data)?;
    TableAssembler::from_config(config).assemble(&store)
}
