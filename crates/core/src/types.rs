//! Core data types for the matchday feature pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::season::Season;

/// Dense integer identifier assigned to a team by the encoding table.
pub type TeamCode = u32;

/// Full-time result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    /// Home win (`H`).
    Home,
    /// Draw (`D`).
    Draw,
    /// Away win (`A`).
    Away,
}

impl MatchResult {
    /// Single-letter FTR code.
    pub fn code(self) -> &'static str {
        match self {
            MatchResult::Home => "H",
            MatchResult::Draw => "D",
            MatchResult::Away => "A",
        }
    }

    /// League points earned by the given side: 3 for a win, 1 for a draw.
    #[inline]
    pub fn points(self, side: Side) -> u32 {
        match (self, side) {
            (MatchResult::Draw, _) => 1,
            (MatchResult::Home, Side::Home) | (MatchResult::Away, Side::Away) => 3,
            _ => 0,
        }
    }
}

impl FromStr for MatchResult {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "H" => Ok(MatchResult::Home),
            "D" => Ok(MatchResult::Draw),
            "A" => Ok(MatchResult::Away),
            other => Err(Error::data_integrity(format!(
                "invalid result code {:?}, expected H, D or A",
                other
            ))),
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Side of a fixture. `Home` orders before `Away`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    /// The other side of the same fixture.
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

/// A single played match, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Season the match belongs to.
    pub season: Season,
    /// Position in the season file (chronological within the season).
    pub sequence_index: usize,
    pub home_team: String,
    pub away_team: String,
    /// Full-time home goals.
    pub home_goals: u32,
    /// Full-time away goals.
    pub away_goals: u32,
    /// Full-time result.
    pub result: MatchResult,
}

impl Match {
    /// Team playing on the given side.
    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    /// Goals scored by the given side.
    pub fn goals_for(&self, side: Side) -> u32 {
        match side {
            Side::Home => self.home_goals,
            Side::Away => self.away_goals,
        }
    }

    /// Goals conceded by the given side.
    pub fn goals_against(&self, side: Side) -> u32 {
        self.goals_for(side.opposite())
    }

    /// Points earned by the given side.
    pub fn points(&self, side: Side) -> u32 {
        self.result.points(side)
    }

    /// Side played by `team`, if it took part.
    pub fn side_of(&self, team: &str) -> Option<Side> {
        if self.home_team == team {
            Some(Side::Home)
        } else if self.away_team == team {
            Some(Side::Away)
        } else {
            None
        }
    }
}

/// One team's participation in one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamEvent {
    pub team: String,
    pub season: Season,
    /// Sequence index of the match this event belongs to.
    pub match_index: usize,
    pub side: Side,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: u32,
}

impl TeamEvent {
    /// Build the event for `side` of `m`.
    pub fn from_match(m: &Match, side: Side) -> Self {
        Self {
            team: m.team(side).to_string(),
            season: m.season,
            match_index: m.sequence_index,
            side,
            goals_for: m.goals_for(side),
            goals_against: m.goals_against(side),
            points: m.points(side),
        }
    }

    /// Ordering key: match sequence, then home before away.
    #[inline]
    pub fn order_key(&self) -> (usize, Side) {
        (self.match_index, self.side)
    }
}

/// A team's accumulated figures within a season, as seen before a given match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub matches_played: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: u32,
    /// Goals scored per match; 0.0 with no matches.
    pub avg_goals_scored: f64,
    /// Goals conceded per match; 0.0 with no matches.
    pub avg_goals_conceded: f64,
    /// Points per match; 0.0 with no matches.
    pub avg_points: f64,
    /// Mean goals scored over the recent window.
    pub recent_goals_scored: f64,
    /// Mean goals conceded over the recent window.
    pub recent_goals_conceded: f64,
    /// Mean points over the recent window.
    pub recent_points: f64,
}

/// All pre-match features attached to one side of a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SideFeatures {
    pub snapshot: TeamSnapshot,
    /// Mean season points over strictly earlier seasons.
    pub historical_avg_points: f64,
    pub is_elite: bool,
}

/// A match with its pre-match features, keyed by team name (before encoding).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchFeatures {
    pub season: Season,
    pub sequence_index: usize,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub home: SideFeatures,
    pub away: SideFeatures,
    pub result: MatchResult,
}

impl MatchFeatures {
    /// Features of the given side.
    pub fn side(&self, side: Side) -> &SideFeatures {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    /// Replace team names with their codes.
    pub fn encode(&self, home_team_enc: TeamCode, away_team_enc: TeamCode) -> FeatureRow {
        FeatureRow {
            home_team_enc,
            away_team_enc,
            home_goals: self.home_goals,
            away_goals: self.away_goals,
            home: self.home,
            away: self.away,
            result: self.result,
        }
    }
}

/// ML-ready row: encoded teams, pre-match features and the result label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub home_team_enc: TeamCode,
    pub away_team_enc: TeamCode,
    pub home_goals: u32,
    pub away_goals: u32,
    pub home: SideFeatures,
    pub away: SideFeatures,
    pub result: MatchResult,
}

impl FeatureRow {
    /// Encoded team on the given side.
    pub fn team(&self, side: Side) -> TeamCode {
        match side {
            Side::Home => self.home_team_enc,
            Side::Away => self.away_team_enc,
        }
    }

    /// Side played by `code`, if it took part.
    pub fn side_of(&self, code: TeamCode) -> Option<Side> {
        if self.home_team_enc == code {
            Some(Side::Home)
        } else if self.away_team_enc == code {
            Some(Side::Away)
        } else {
            None
        }
    }

    /// Features of the given side.
    pub fn side(&self, side: Side) -> &SideFeatures {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    /// Goals scored in this match by the given side.
    pub fn goals_for(&self, side: Side) -> u32 {
        match side {
            Side::Home => self.home_goals,
            Side::Away => self.away_goals,
        }
    }

    /// Goals conceded in this match by the given side.
    pub fn goals_against(&self, side: Side) -> u32 {
        self.goals_for(side.opposite())
    }

    /// Points earned in this match by the given side.
    pub fn points(&self, side: Side) -> u32 {
        self.result.points(side)
    }

    /// Render one cell of the exported table.
    pub fn cell(&self, column: FeatureColumn) -> String {
        use FeatureColumn::*;
        let (h, a) = (&self.home.snapshot, &self.away.snapshot);
        match column {
            HomeTeamEnc => self.home_team_enc.to_string(),
            AwayTeamEnc => self.away_team_enc.to_string(),
            HomeGoals => self.home_goals.to_string(),
            AwayGoals => self.away_goals.to_string(),
            TotalHomeMatches => h.matches_played.to_string(),
            TotalAwayMatches => a.matches_played.to_string(),
            TotalHomeGoals => h.goals_for.to_string(),
            TotalAwayGoals => a.goals_for.to_string(),
            TotalHomeConceded => h.goals_against.to_string(),
            TotalAwayConceded => a.goals_against.to_string(),
            AverageHomeGoalsScored => format_float(h.avg_goals_scored),
            AverageAwayGoalsScored => format_float(a.avg_goals_scored),
            AverageHomeGoalsConceded => format_float(h.avg_goals_conceded),
            AverageAwayGoalsConceded => format_float(a.avg_goals_conceded),
            AverageHomePoints => format_float(h.avg_points),
            AverageAwayPoints => format_float(a.avg_points),
            TotalHomePoints => h.points.to_string(),
            TotalAwayPoints => a.points.to_string(),
            AverageHomeGoalsScoredLastN => format_float(h.recent_goals_scored),
            AverageAwayGoalsScoredLastN => format_float(a.recent_goals_scored),
            AverageHomeGoalsConcededLastN => format_float(h.recent_goals_conceded),
            AverageAwayGoalsConcededLastN => format_float(a.recent_goals_conceded),
            AverageHomePointsLastN => format_float(h.recent_points),
            AverageAwayPointsLastN => format_float(a.recent_points),
            IsItEliteHome => u8::from(self.home.is_elite).to_string(),
            IsItEliteAway => u8::from(self.away.is_elite).to_string(),
            HistoricalAvgHomePoints => format_float(self.home.historical_avg_points),
            HistoricalAvgAwayPoints => format_float(self.away.historical_avg_points),
            Result => self.result.code().to_string(),
        }
    }

    /// Rebuild a row from its cells, as produced by [`FeatureRow::cell`].
    pub fn from_cells<'a, F>(mut get: F) -> Result<Self>
    where
        F: FnMut(FeatureColumn) -> Result<&'a str>,
    {
        use FeatureColumn::*;

        let mut int = |c: FeatureColumn| -> crate::error::Result<u32> { parse_cell(c, get(c)?) };
        let home_team_enc = int(HomeTeamEnc)?;
        let away_team_enc = int(AwayTeamEnc)?;
        let home_goals = int(HomeGoals)?;
        let away_goals = int(AwayGoals)?;
        let home_matches = int(TotalHomeMatches)?;
        let away_matches = int(TotalAwayMatches)?;
        let home_gf = int(TotalHomeGoals)?;
        let away_gf = int(TotalAwayGoals)?;
        let home_ga = int(TotalHomeConceded)?;
        let away_ga = int(TotalAwayConceded)?;
        let home_pts = int(TotalHomePoints)?;
        let away_pts = int(TotalAwayPoints)?;
        let home_elite = int(IsItEliteHome)? != 0;
        let away_elite = int(IsItEliteAway)? != 0;

        let mut float = |c: FeatureColumn| -> crate::error::Result<f64> { parse_cell(c, get(c)?) };
        let home = SideFeatures {
            snapshot: TeamSnapshot {
                matches_played: home_matches,
                goals_for: home_gf,
                goals_against: home_ga,
                points: home_pts,
                avg_goals_scored: float(AverageHomeGoalsScored)?,
                avg_goals_conceded: float(AverageHomeGoalsConceded)?,
                avg_points: float(AverageHomePoints)?,
                recent_goals_scored: float(AverageHomeGoalsScoredLastN)?,
                recent_goals_conceded: float(AverageHomeGoalsConcededLastN)?,
                recent_points: float(AverageHomePointsLastN)?,
            },
            historical_avg_points: float(HistoricalAvgHomePoints)?,
            is_elite: home_elite,
        };
        let away = SideFeatures {
            snapshot: TeamSnapshot {
                matches_played: away_matches,
                goals_for: away_gf,
                goals_against: away_ga,
                points: away_pts,
                avg_goals_scored: float(AverageAwayGoalsScored)?,
                avg_goals_conceded: float(AverageAwayGoalsConceded)?,
                avg_points: float(AverageAwayPoints)?,
                recent_goals_scored: float(AverageAwayGoalsScoredLastN)?,
                recent_goals_conceded: float(AverageAwayGoalsConcededLastN)?,
                recent_points: float(AverageAwayPointsLastN)?,
            },
            historical_avg_points: float(HistoricalAvgAwayPoints)?,
            is_elite: away_elite,
        };

        Ok(Self {
            home_team_enc,
            away_team_enc,
            home_goals,
            away_goals,
            home,
            away,
            result: get(Result)?.parse()?,
        })
    }
}

fn parse_cell<T: FromStr>(column: FeatureColumn, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        Error::data_integrity(format!("column {:?}: cannot parse {:?}", column, raw))
    })
}

/// Render a float so integral values keep a decimal point (`3.0`, not `3`).
pub fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Columns of the exported training table, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureColumn {
    HomeTeamEnc,
    AwayTeamEnc,
    HomeGoals,
    AwayGoals,
    TotalHomeMatches,
    TotalAwayMatches,
    TotalHomeGoals,
    TotalAwayGoals,
    TotalHomeConceded,
    TotalAwayConceded,
    AverageHomeGoalsScored,
    AverageAwayGoalsScored,
    AverageHomeGoalsConceded,
    AverageAwayGoalsConceded,
    AverageHomePoints,
    AverageAwayPoints,
    TotalHomePoints,
    TotalAwayPoints,
    AverageHomeGoalsScoredLastN,
    AverageAwayGoalsScoredLastN,
    AverageHomeGoalsConcededLastN,
    AverageAwayGoalsConcededLastN,
    AverageHomePointsLastN,
    AverageAwayPointsLastN,
    IsItEliteHome,
    IsItEliteAway,
    HistoricalAvgHomePoints,
    HistoricalAvgAwayPoints,
    Result,
}

impl FeatureColumn {
    /// Every column, in export order.
    pub const ALL: [FeatureColumn; 29] = [
        FeatureColumn::HomeTeamEnc,
        FeatureColumn::AwayTeamEnc,
        FeatureColumn::HomeGoals,
        FeatureColumn::AwayGoals,
        FeatureColumn::TotalHomeMatches,
        FeatureColumn::TotalAwayMatches,
        FeatureColumn::TotalHomeGoals,
        FeatureColumn::TotalAwayGoals,
        FeatureColumn::TotalHomeConceded,
        FeatureColumn::TotalAwayConceded,
        FeatureColumn::AverageHomeGoalsScored,
        FeatureColumn::AverageAwayGoalsScored,
        FeatureColumn::AverageHomeGoalsConceded,
        FeatureColumn::AverageAwayGoalsConceded,
        FeatureColumn::AverageHomePoints,
        FeatureColumn::AverageAwayPoints,
        FeatureColumn::TotalHomePoints,
        FeatureColumn::TotalAwayPoints,
        FeatureColumn::AverageHomeGoalsScoredLastN,
        FeatureColumn::AverageAwayGoalsScoredLastN,
        FeatureColumn::AverageHomeGoalsConcededLastN,
        FeatureColumn::AverageAwayGoalsConcededLastN,
        FeatureColumn::AverageHomePointsLastN,
        FeatureColumn::AverageAwayPointsLastN,
        FeatureColumn::IsItEliteHome,
        FeatureColumn::IsItEliteAway,
        FeatureColumn::HistoricalAvgHomePoints,
        FeatureColumn::HistoricalAvgAwayPoints,
        FeatureColumn::Result,
    ];

    /// Column name, without any rolling-window suffix.
    fn base_name(self) -> &'static str {
        use FeatureColumn::*;
        match self {
            HomeTeamEnc => "HomeTeamEnc",
            AwayTeamEnc => "AwayTeamEnc",
            HomeGoals => "FTHG",
            AwayGoals => "FTAG",
            TotalHomeMatches => "TotalHomeMatches",
            TotalAwayMatches => "TotalAwayMatches",
            TotalHomeGoals => "TotalHomeGoals",
            TotalAwayGoals => "TotalAwayGoals",
            TotalHomeConceded => "TotalHomeConceded",
            TotalAwayConceded => "TotalAwayConceded",
            AverageHomeGoalsScored => "AverageHomeGoalsScored",
            AverageAwayGoalsScored => "AverageAwayGoalsScored",
            AverageHomeGoalsConceded => "AverageHomeGoalsConceded",
            AverageAwayGoalsConceded => "AverageAwayGoalsConceded",
            AverageHomePoints => "AverageHomePoints",
            AverageAwayPoints => "AverageAwayPoints",
            TotalHomePoints => "TotalHomePoints",
            TotalAwayPoints => "TotalAwayPoints",
            AverageHomeGoalsScoredLastN => "AverageHomeGoalsScoredLast",
            AverageAwayGoalsScoredLastN => "AverageAwayGoalsScoredLast",
            AverageHomeGoalsConcededLastN => "AverageHomeGoalsConcededLast",
            AverageAwayGoalsConcededLastN => "AverageAwayGoalsConcededLast",
            AverageHomePointsLastN => "AverageHomePointsLast",
            AverageAwayPointsLastN => "AverageAwayPointsLast",
            IsItEliteHome => "IsItEliteHome",
            IsItEliteAway => "IsItEliteAway",
            HistoricalAvgHomePoints => "HistoricalAvgHomePoints",
            HistoricalAvgAwayPoints => "HistoricalAvgAwayPoints",
            Result => "FTR",
        }
    }

    /// Whether the column name carries the rolling-window size.
    pub fn is_windowed(self) -> bool {
        use FeatureColumn::*;
        matches!(
            self,
            AverageHomeGoalsScoredLastN
                | AverageAwayGoalsScoredLastN
                | AverageHomeGoalsConcededLastN
                | AverageAwayGoalsConcededLastN
                | AverageHomePointsLastN
                | AverageAwayPointsLastN
        )
    }

    /// Header name for a table built with the given rolling window.
    pub fn name(self, window: usize) -> String {
        if self.is_windowed() {
            format!("{}{}", self.base_name(), window)
        } else {
            self.base_name().to_string()
        }
    }

    /// Resolve a header name, returning the window size for windowed columns.
    pub fn from_name(name: &str) -> Option<(FeatureColumn, Option<usize>)> {
        let name = name.trim();
        Self::ALL.iter().find_map(|&column| {
            if !column.is_windowed() {
                return (column.base_name() == name).then_some((column, None));
            }
            let suffix = name.strip_prefix(column.base_name())?;
            let window = suffix.parse().ok()?;
            Some((column, Some(window)))
        })
    }
}
