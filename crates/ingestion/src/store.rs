//! Per-season match storage.
//!
//! Loads one CSV file per season (`HomeTeam, AwayTeam, FTHG, FTAG, FTR`),
//! validates it and keeps the seasons in chronological order.

use matchday_core::{config::DataConfig, Error, Match, MatchResult, Result, Season};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Columns every season file must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = ["HomeTeam", "AwayTeam", "FTHG", "FTAG", "FTR"];

/// One CSV row as written by the cleaning step.
#[derive(Debug, Deserialize)]
struct RawMatchRow {
    #[serde(rename = "HomeTeam")]
    home_team: String,
    #[serde(rename = "AwayTeam")]
    away_team: String,
    #[serde(rename = "FTHG")]
    home_goals: Option<String>,
    #[serde(rename = "FTAG")]
    away_goals: Option<String>,
    #[serde(rename = "FTR")]
    result: Option<String>,
}

/// The ordered matches of one season.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonTable {
    season: Season,
    matches: Vec<Match>,
}

impl SeasonTable {
    /// Create a table, checking that matches belong to `season` and are
    /// indexed `0..n` in order.
    pub fn new(season: Season, matches: Vec<Match>) -> Result<Self> {
        for (i, m) in matches.iter().enumerate() {
            if m.season != season {
                return Err(Error::data_integrity(format!(
                    "match {} belongs to season {}, not {}",
                    i, m.season, season
                )));
            }
            if m.sequence_index != i {
                return Err(Error::data_integrity(format!(
                    "season {}: match at position {} has sequence index {}",
                    season, i, m.sequence_index
                )));
            }
        }
        Ok(Self { season, matches })
    }

    /// Build a table from `(home, away, home_goals, away_goals, result)` tuples.
    pub fn from_results<'a, I>(season: Season, rows: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, u32, u32, MatchResult)>,
    {
        let matches = rows
            .into_iter()
            .enumerate()
            .map(|(i, (home, away, hg, ag, result))| Match {
                season,
                sequence_index: i,
                home_team: home.to_string(),
                away_team: away.to_string(),
                home_goals: hg,
                away_goals: ag,
                result,
            })
            .collect();
        Self { season, matches }
    }

    /// Parse a season from CSV. Rows without a result are dropped; any other
    /// malformed row fails the whole season.
    pub fn from_csv<R: Read>(season: Season, reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = rdr.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(Error::data_integrity(format!(
                    "season {}: missing column {}",
                    season, column
                )));
            }
        }

        let mut matches = Vec::new();
        let mut dropped = 0usize;

        for (line, record) in rdr.deserialize::<RawMatchRow>().enumerate() {
            let row = record.map_err(|e| {
                Error::data_integrity(format!("season {} row {}: {}", season, line + 1, e))
            })?;

            let result = match row.result.as_deref().map(str::trim) {
                None | Some("") => {
                    dropped += 1;
                    continue;
                }
                Some(code) => code.parse::<MatchResult>().map_err(|e| {
                    Error::data_integrity(format!("season {} row {}: {}", season, line + 1, e))
                })?,
            };

            if row.home_team.is_empty() || row.away_team.is_empty() {
                return Err(Error::data_integrity(format!(
                    "season {} row {}: empty team name",
                    season,
                    line + 1
                )));
            }

            matches.push(Match {
                season,
                sequence_index: matches.len(),
                home_goals: parse_goals(season, line, "FTHG", row.home_goals.as_deref())?,
                away_goals: parse_goals(season, line, "FTAG", row.away_goals.as_deref())?,
                home_team: row.home_team,
                away_team: row.away_team,
                result,
            });
        }

        if dropped > 0 {
            debug!(season = %season, dropped, "dropped rows without a result");
        }

        Ok(Self { season, matches })
    }

    pub fn season(&self) -> Season {
        self.season
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Distinct team names appearing in the season.
    pub fn teams(&self) -> BTreeSet<&str> {
        self.matches
            .iter()
            .flat_map(|m| [m.home_team.as_str(), m.away_team.as_str()])
            .collect()
    }
}

fn parse_goals(season: Season, line: usize, column: &str, raw: Option<&str>) -> Result<u32> {
    let raw = raw.map(str::trim).unwrap_or("");
    // Some exports write integral goals as floats ("2.0").
    let value = raw
        .parse::<u32>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u32::MAX as f64)
                .map(|v| v as u32)
        });
    value.ok_or_else(|| {
        Error::data_integrity(format!(
            "season {} row {}: invalid {} value {:?}",
            season,
            line + 1,
            column,
            raw
        ))
    })
}

/// Somewhere season tables can be read from.
pub trait SeasonSource {
    /// Load one season. A season that does not exist yields `SeasonUnavailable`.
    fn load_season(&self, season: Season) -> Result<SeasonTable>;
}

/// A directory of `<season-code>.csv` files.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    data_dir: PathBuf,
}

impl CsvDirectory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path of the file holding `season`.
    pub fn season_path(&self, season: Season) -> PathBuf {
        self.data_dir.join(format!("{}.csv", season.code()))
    }
}

impl SeasonSource for CsvDirectory {
    fn load_season(&self, season: Season) -> Result<SeasonTable> {
        let path = self.season_path(season);
        let file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                Error::season_unavailable(season.code(), format!("{} not found", path.display()))
            }
            _ => Error::Io(e),
        })?;
        SeasonTable::from_csv(season, io::BufReader::new(file))
    }
}

/// Chronologically ordered collection of season tables.
#[derive(Debug, Clone, Default)]
pub struct MatchStore {
    seasons: BTreeMap<Season, SeasonTable>,
}

impl MatchStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from already loaded tables.
    pub fn from_tables(tables: impl IntoIterator<Item = SeasonTable>) -> Self {
        let mut store = Self::new();
        for table in tables {
            store.insert(table);
        }
        store
    }

    /// Load every configured season from the data directory.
    pub fn load(config: &DataConfig) -> Result<Self> {
        let source = CsvDirectory::new(&config.data_dir);
        let last = config.resolve_last_season()?;
        let seasons = Season::range_inclusive(config.history_start, last)
            .filter(|s| !config.skip_seasons.contains(s));
        Self::load_from(&source, seasons, config.strict)
    }

    /// Load the given seasons from `source`.
    ///
    /// A season that fails to load is skipped with a warning, unless `strict`
    /// is set, in which case the error is returned.
    pub fn load_from<S, I>(source: &S, seasons: I, strict: bool) -> Result<Self>
    where
        S: SeasonSource + ?Sized,
        I: IntoIterator<Item = Season>,
    {
        let mut store = Self::new();
        let mut skipped = 0usize;

        for season in seasons {
            match source.load_season(season) {
                Ok(table) => {
                    debug!(season = %season, rows = table.len(), "loaded season");
                    store.insert(table);
                }
                Err(e) if !strict && e.is_season_failure() => {
                    warn!(season = %season, error = %e, "skipping season");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(seasons = store.len(), skipped, "match store loaded");
        Ok(store)
    }

    /// Insert or replace a season table.
    pub fn insert(&mut self, table: SeasonTable) {
        self.seasons.insert(table.season(), table);
    }

    /// Table for a season, if loaded.
    pub fn get(&self, season: Season) -> Option<&SeasonTable> {
        self.seasons.get(&season)
    }

    /// All loaded seasons, oldest first.
    pub fn seasons(&self) -> impl Iterator<Item = &SeasonTable> {
        self.seasons.values()
    }

    /// Loaded seasons starting at `first`, oldest first.
    pub fn seasons_from(&self, first: Season) -> impl Iterator<Item = &SeasonTable> {
        self.seasons.range(first..).map(|(_, table)| table)
    }

    /// Number of loaded seasons.
    pub fn len(&self) -> usize {
        self.seasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }
}
