//! Team lookup service.

use matchday_core::config::FeatureConfig;
use matchday_core::{Error, FeatureRow, Result, Side, TeamCode, TeamSnapshot};
use matchday_features::FeatureTable;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// A team identified by name or by encoded code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamKey<'a> {
    Name(&'a str),
    Code(TeamCode),
}

impl<'a> TeamKey<'a> {
    /// Read a command-line argument: all digits is a code, anything else a name.
    pub fn parse(raw: &'a str) -> Self {
        match raw.parse::<TeamCode>() {
            Ok(code) => TeamKey::Code(code),
            Err(_) => TeamKey::Name(raw),
        }
    }
}

impl<'a> From<&'a str> for TeamKey<'a> {
    fn from(name: &'a str) -> Self {
        TeamKey::Name(name)
    }
}

impl<'a> From<&'a String> for TeamKey<'a> {
    fn from(name: &'a String) -> Self {
        TeamKey::Name(name)
    }
}

impl From<TeamCode> for TeamKey<'_> {
    fn from(code: TeamCode) -> Self {
        TeamKey::Code(code)
    }
}

impl fmt::Display for TeamKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamKey::Name(name) => f.write_str(name),
            TeamKey::Code(code) => write!(f, "code {}", code),
        }
    }
}

/// Averages over a team's last N matches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecentForm {
    pub matches: usize,
    pub avg_goals_scored: f64,
    pub avg_goals_conceded: f64,
    pub avg_points: f64,
}

/// Everything known about a team as of its latest match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamStats {
    pub team: String,
    pub code: TeamCode,
    pub matches: u32,
    pub goals: u32,
    pub conceded: u32,
    pub points: u32,
    pub avg_goals_scored: f64,
    pub avg_goals_conceded: f64,
    pub avg_points: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent: Option<RecentForm>,
    pub is_elite: bool,
}

/// Feature vector for a prospective fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PredictionFeatures {
    pub total_home_goals: u32,
    pub total_away_goals: u32,
    pub total_home_conceded: u32,
    pub total_away_conceded: u32,
    pub total_home_points: u32,
    pub total_away_points: u32,
    #[serde(serialize_with = "as_flag")]
    pub is_it_elite_home: bool,
    #[serde(serialize_with = "as_flag")]
    pub is_it_elite_away: bool,
}

impl PredictionFeatures {
    /// Column names, in the order of [`PredictionFeatures::values`].
    pub const NAMES: [&'static str; 8] = [
        "TotalHomeGoals",
        "TotalAwayGoals",
        "TotalHomeConceded",
        "TotalAwayConceded",
        "TotalHomePoints",
        "TotalAwayPoints",
        "IsItEliteHome",
        "IsItEliteAway",
    ];

    /// The vector handed to the classifier.
    pub fn values(&self) -> [f64; 8] {
        [
            f64::from(self.total_home_goals),
            f64::from(self.total_away_goals),
            f64::from(self.total_home_conceded),
            f64::from(self.total_away_conceded),
            f64::from(self.total_home_points),
            f64::from(self.total_away_points),
            f64::from(u8::from(self.is_it_elite_home)),
            f64::from(u8::from(self.is_it_elite_away)),
        ]
    }
}

fn as_flag<S: serde::Serializer>(
    value: &bool,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

/// One appearance of a team in the table.
#[derive(Debug, Clone, Copy)]
struct Appearance<'t> {
    row: &'t FeatureRow,
    side: Side,
}

impl<'t> Appearance<'t> {
    /// Pre-match figures of the team in this row.
    fn snapshot(&self) -> &'t TeamSnapshot {
        &self.row.side(self.side).snapshot
    }

    fn goals_for(&self) -> u32 {
        self.row.goals_for(self.side)
    }

    fn goals_against(&self) -> u32 {
        self.row.goals_against(self.side)
    }

    fn points(&self) -> u32 {
        self.row.points(self.side)
    }

    /// Matches played including this one.
    fn total_matches(&self) -> Result<u32> {
        checked_total(self.snapshot().matches_played, 1, "matches")
    }

    /// Goals scored including this match.
    fn total_goals(&self) -> Result<u32> {
        checked_total(self.snapshot().goals_for, self.goals_for(), "goals")
    }

    fn total_conceded(&self) -> Result<u32> {
        checked_total(self.snapshot().goals_against, self.goals_against(), "goals conceded")
    }

    fn total_points(&self) -> Result<u32> {
        checked_total(self.snapshot().points, self.points(), "points")
    }
}

/// Lookups over an assembled table.
pub struct LookupService<'t> {
    table: &'t FeatureTable,
    elite_teams: BTreeSet<String>,
}

impl<'t> LookupService<'t> {
    pub fn new(table: &'t FeatureTable, features: &FeatureConfig) -> Self {
        Self {
            table,
            elite_teams: features.elite_teams.iter().cloned().collect(),
        }
    }

    /// Resolve a key to its code and name, failing with `UnknownTeam`.
    fn resolve<'k>(&self, team: impl Into<TeamKey<'k>>) -> Result<(TeamCode, &'t str)> {
        let encoding = self.table.encoding();
        match team.into() {
            TeamKey::Name(name) => {
                let code = encoding.encode(name)?;
                Ok((code, encoding.decode(code)?))
            }
            TeamKey::Code(code) => Ok((code, encoding.decode(code)?)),
        }
    }

    fn appearances(&self, code: TeamCode) -> impl DoubleEndedIterator<Item = Appearance<'t>> {
        self.table
            .rows()
            .iter()
            .filter_map(move |row| row.side_of(code).map(|side| Appearance { row, side }))
    }

    /// Latest appearance of the team, failing with `NoMatchData` when it has none.
    fn latest<'k>(&self, team: impl Into<TeamKey<'k>>) -> Result<Appearance<'t>> {
        let (code, name) = self.resolve(team)?;
        let last = self
            .appearances(code)
            .next_back()
            .ok_or_else(|| Error::no_match_data(name))?;
        debug!(team = name, code, side = ?last.side, "resolved latest appearance");
        Ok(last)
    }

    /// The team's last `n` appearances, most recent first.
    fn last_n<'k>(&self, team: impl Into<TeamKey<'k>>, n: usize) -> Result<Vec<Appearance<'t>>> {
        if n == 0 {
            return Err(Error::invalid_argument("last-N window must be at least 1"));
        }
        let (code, name) = self.resolve(team)?;
        let recent: Vec<Appearance<'t>> = self.appearances(code).rev().take(n).collect();
        if recent.len() < n {
            return Err(Error::InsufficientHistory {
                team: name.to_string(),
                available: recent.len(),
                required: n,
            });
        }
        Ok(recent)
    }

    /// Points including the latest match.
    pub fn total_points<'k>(&self, team: impl Into<TeamKey<'k>>) -> Result<u32> {
        self.latest(team)?.total_points()
    }

    /// Matches played including the latest match.
    pub fn total_matches<'k>(&self, team: impl Into<TeamKey<'k>>) -> Result<u32> {
        self.latest(team)?.total_matches()
    }

    /// Goals scored including the latest match.
    pub fn total_goals<'k>(&self, team: impl Into<TeamKey<'k>>) -> Result<u32> {
        self.latest(team)?.total_goals()
    }

    /// Goals conceded including the latest match.
    pub fn total_conceded<'k>(&self, team: impl Into<TeamKey<'k>>) -> Result<u32> {
        self.latest(team)?.total_conceded()
    }

    pub fn average_goals_scored<'k>(&self, team: impl Into<TeamKey<'k>>) -> Result<f64> {
        let last = self.latest(team)?;
        Ok(ratio(last.total_goals()?, last.total_matches()?))
    }

    pub fn average_goals_conceded<'k>(&self, team: impl Into<TeamKey<'k>>) -> Result<f64> {
        let last = self.latest(team)?;
        Ok(ratio(last.total_conceded()?, last.total_matches()?))
    }

    pub fn average_points<'k>(&self, team: impl Into<TeamKey<'k>>) -> Result<f64> {
        let last = self.latest(team)?;
        Ok(ratio(last.total_points()?, last.total_matches()?))
    }

    /// Mean goals scored over exactly the last `n` matches.
    pub fn average_goals_scored_last_n<'k>(
        &self,
        team: impl Into<TeamKey<'k>>,
        n: usize,
    ) -> Result<f64> {
        let recent = self.last_n(team, n)?;
        Ok(mean_of(&recent, Appearance::goals_for))
    }

    /// Mean goals conceded over exactly the last `n` matches.
    pub fn average_goals_conceded_last_n<'k>(
        &self,
        team: impl Into<TeamKey<'k>>,
        n: usize,
    ) -> Result<f64> {
        let recent = self.last_n(team, n)?;
        Ok(mean_of(&recent, Appearance::goals_against))
    }

    /// Mean points over exactly the last `n` matches.
    pub fn average_points_last_n<'k>(
        &self,
        team: impl Into<TeamKey<'k>>,
        n: usize,
    ) -> Result<f64> {
        let recent = self.last_n(team, n)?;
        Ok(mean_of(&recent, Appearance::points))
    }

    /// Whether the team is in the configured elite set.
    pub fn is_elite<'k>(&self, team: impl Into<TeamKey<'k>>) -> Result<bool> {
        let (_, name) = self.resolve(team)?;
        Ok(self.elite_teams.contains(name))
    }

    /// All season-to-date figures, plus recent form when `last_n` is given.
    pub fn team_stats<'k>(
        &self,
        team: impl Into<TeamKey<'k>>,
        last_n: Option<usize>,
    ) -> Result<TeamStats> {
        let key = team.into();
        let (code, name) = self.resolve(key)?;
        let last = self.latest(key)?;

        let matches = last.total_matches()?;
        let goals = last.total_goals()?;
        let conceded = last.total_conceded()?;
        let points = last.total_points()?;

        let recent = match last_n {
            Some(n) => {
                let rows = self.last_n(key, n)?;
                Some(RecentForm {
                    matches: n,
                    avg_goals_scored: mean_of(&rows, Appearance::goals_for),
                    avg_goals_conceded: mean_of(&rows, Appearance::goals_against),
                    avg_points: mean_of(&rows, Appearance::points),
                })
            }
            None => None,
        };

        Ok(TeamStats {
            team: name.to_string(),
            code,
            matches,
            goals,
            conceded,
            points,
            avg_goals_scored: ratio(goals, matches),
            avg_goals_conceded: ratio(conceded, matches),
            avg_points: ratio(points, matches),
            recent,
            is_elite: self.elite_teams.contains(name),
        })
    }

    /// Feature vector for `home` hosting `away`.
    pub fn prediction_features<'h, 'a>(
        &self,
        home: impl Into<TeamKey<'h>>,
        away: impl Into<TeamKey<'a>>,
    ) -> Result<PredictionFeatures> {
        let home = self.team_stats(home, None)?;
        let away = self.team_stats(away, None)?;
        Ok(PredictionFeatures {
            total_home_goals: home.goals,
            total_away_goals: away.goals,
            total_home_conceded: home.conceded,
            total_away_conceded: away.conceded,
            total_home_points: home.points,
            total_away_points: away.points,
            is_it_elite_home: home.is_elite,
            is_it_elite_away: away.is_elite,
        })
    }
}

fn checked_total(before: u32, own: u32, what: &str) -> Result<u32> {
    before.checked_add(own).ok_or_else(|| {
        Error::data_integrity(format!("{} total overflows: {} + {}", what, before, own))
    })
}

#[inline]
fn ratio(total: u32, matches: u32) -> f64 {
    if matches == 0 {
        0.0
    } else {
        f64::from(total) / f64::from(matches)
    }
}

fn mean_of<'t>(recent: &[Appearance<'t>], value: impl Fn(&Appearance<'t>) -> u32) -> f64 {
    if recent.is_empty() {
        return 0.0;
    }
    let total: u64 = recent.iter().map(|a| u64::from(value(a))).sum();
    total as f64 / recent.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use matchday_core::{MatchResult, Season};
    use matchday_features::TableAssembler;
    use matchday_ingestion::{MatchStore, SeasonTable};

    fn season(code: &str) -> Season {
        code.parse().unwrap()
    }

    fn config() -> FeatureConfig {
        FeatureConfig {
            rolling_window: 6,
            pruning: 0,
            ..FeatureConfig::default()
        }
    }

    /// Arsenal: W 2-1, L 0-3, D 1-1, W 2-0 (away). Leeds never plays after pruning.
    fn table(pruning: usize) -> FeatureTable {
        let season_table = SeasonTable::from_results(
            season("1516"),
            [
                ("Leeds", "Everton", 0, 1, MatchResult::Away),
                ("Arsenal", "Chelsea", 2, 1, MatchResult::Home),
                ("Everton", "Arsenal", 3, 0, MatchResult::Home),
                ("Arsenal", "Burnley", 1, 1, MatchResult::Draw),
                ("Chelsea", "Burnley", 4, 0, MatchResult::Home),
                ("Burnley", "Arsenal", 0, 2, MatchResult::Away),
            ],
        );
        let features = FeatureConfig {
            pruning,
            ..config()
        };
        TableAssembler::new(features, season("1516"))
            .assemble(&MatchStore::from_tables([season_table]))
            .unwrap()
            .table
    }

    #[test]
    fn test_totals_include_latest_match() {
        let table = table(0);
        let lookup = LookupService::new(&table, &config());

        assert_eq!(lookup.total_matches("Arsenal").unwrap(), 4);
        assert_eq!(lookup.total_goals("Arsenal").unwrap(), 5);
        assert_eq!(lookup.total_conceded("Arsenal").unwrap(), 5);
        assert_eq!(lookup.total_points("Arsenal").unwrap(), 7);
        assert_abs_diff_eq!(lookup.average_goals_scored("Arsenal").unwrap(), 1.25);
        assert_abs_diff_eq!(lookup.average_goals_conceded("Arsenal").unwrap(), 1.25);
        assert_abs_diff_eq!(lookup.average_points("Arsenal").unwrap(), 1.75);
    }

    #[test]
    fn test_latest_match_on_either_side() {
        let table = table(0);
        let lookup = LookupService::new(&table, &config());

        // Burnley's last match was at home, a 0-2 loss.
        assert_eq!(lookup.total_matches("Burnley").unwrap(), 3);
        assert_eq!(lookup.total_goals("Burnley").unwrap(), 1);
        assert_eq!(lookup.total_conceded("Burnley").unwrap(), 7);
        assert_eq!(lookup.total_points("Burnley").unwrap(), 1);
    }

    #[test]
    fn test_name_and_code_agree() {
        let table = table(0);
        let lookup = LookupService::new(&table, &config());
        let code = table.encoding().code("Chelsea").unwrap();

        assert_eq!(
            lookup.team_stats("Chelsea", Some(2)).unwrap(),
            lookup.team_stats(code, Some(2)).unwrap()
        );
    }

    #[test]
    fn test_unknown_team() {
        let table = table(0);
        let lookup = LookupService::new(&table, &config());

        assert!(matches!(lookup.total_points("Wrexham"), Err(Error::UnknownTeam(_))));
        assert!(matches!(lookup.total_goals(99u32), Err(Error::UnknownTeam(_))));
        assert!(matches!(
            lookup.prediction_features("Arsenal", "Wrexham"),
            Err(Error::UnknownTeam(_))
        ));
    }

    #[test]
    fn test_last_n_is_strict() {
        let table = table(0);
        let lookup = LookupService::new(&table, &config());

        // Arsenal's last two: D 1-1, W 2-0.
        assert_abs_diff_eq!(lookup.average_goals_scored_last_n("Arsenal", 2).unwrap(), 1.5);
        assert_abs_diff_eq!(lookup.average_goals_conceded_last_n("Arsenal", 2).unwrap(), 0.5);
        assert_abs_diff_eq!(lookup.average_points_last_n("Arsenal", 2).unwrap(), 2.0);
        assert_abs_diff_eq!(lookup.average_points_last_n("Arsenal", 4).unwrap(), 1.75);

        assert!(matches!(
            lookup.average_points_last_n("Arsenal", 5),
            Err(Error::InsufficientHistory { available: 4, required: 5, .. })
        ));
        assert!(matches!(
            lookup.average_goals_scored_last_n("Arsenal", 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_pruned_team_has_no_data() {
        // With one row pruned, Leeds is no longer in the table at all.
        let table = table(1);
        let lookup = LookupService::new(&table, &config());
        assert!(matches!(lookup.total_points("Leeds"), Err(Error::UnknownTeam(_))));
    }

    #[test]
    fn test_known_team_without_rows() {
        use matchday_features::EncodingTable;

        let full = table(0);
        let mut encoding_names: Vec<&str> = full.encoding().iter().map(|(n, _)| n).collect();
        encoding_names.push("Wrexham");
        let encoding = EncodingTable::fit(encoding_names);
        let rows = full
            .rows()
            .iter()
            .map(|r| {
                let mut r = r.clone();
                let home = full.encoding().name(r.home_team_enc).unwrap();
                let away = full.encoding().name(r.away_team_enc).unwrap();
                r.home_team_enc = encoding.code(home).unwrap();
                r.away_team_enc = encoding.code(away).unwrap();
                r
            })
            .collect();
        let table = FeatureTable::new(6, rows, encoding);
        let lookup = LookupService::new(&table, &config());

        assert!(matches!(lookup.total_points("Wrexham"), Err(Error::NoMatchData(_))));
        assert!(matches!(
            lookup.average_points_last_n("Wrexham", 1),
            Err(Error::InsufficientHistory { available: 0, .. })
        ));
    }

    #[test]
    fn test_prediction_features() {
        let table = table(0);
        let lookup = LookupService::new(&table, &config());
        let features = lookup.prediction_features("Arsenal", "Burnley").unwrap();

        assert_eq!(features.total_home_goals, 5);
        assert_eq!(features.total_away_conceded, 7);
        assert_eq!(features.total_home_points, 7);
        assert!(features.is_it_elite_home);
        assert!(!features.is_it_elite_away);
        assert_eq!(features.values()[6], 1.0);

        let json = serde_json::to_value(features).unwrap();
        assert_eq!(json["TotalHomeGoals"], 5);
        assert_eq!(json["IsItEliteAway"], 0);
        assert_eq!(json.as_object().unwrap().len(), PredictionFeatures::NAMES.len());
    }

    #[test]
    fn test_overflowing_totals_are_rejected() {
        let table = table(0);
        let mut rows = table.rows().to_vec();
        let n = rows.len();
        // Arsenal's last two matches: home to Burnley, then away at Burnley.
        rows[n - 3].home_goals = u32::MAX;
        rows[n - 1].away_goals = u32::MAX;
        rows[n - 1].away.snapshot.goals_for = 1;
        rows[n - 1].away.snapshot.points = u32::MAX;
        let corrupt = FeatureTable::new(table.window(), rows, table.encoding().clone());
        let lookup = LookupService::new(&corrupt, &config());

        assert!(matches!(lookup.total_goals("Arsenal"), Err(Error::DataIntegrity(_))));
        assert!(matches!(lookup.total_points("Arsenal"), Err(Error::DataIntegrity(_))));
        assert!(matches!(lookup.average_points("Arsenal"), Err(Error::DataIntegrity(_))));
        assert!(matches!(lookup.team_stats("Arsenal", None), Err(Error::DataIntegrity(_))));
        assert_eq!(lookup.total_conceded("Arsenal").unwrap(), 5);

        // Recent form sums in 64 bits.
        let avg = lookup.average_goals_scored_last_n("Arsenal", 2).unwrap();
        assert_abs_diff_eq!(avg, f64::from(u32::MAX), epsilon = 1.0);
    }

    #[test]
    fn test_team_key_parse() {
        assert_eq!(TeamKey::parse("12"), TeamKey::Code(12));
        assert_eq!(TeamKey::parse("Man City"), TeamKey::Name("Man City"));
    }
}
