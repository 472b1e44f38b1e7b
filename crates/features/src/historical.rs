//! Historical season-points averages.
//!
//! For a target season, a team's historical average is the mean of its
//! season point totals over all strictly earlier loaded seasons in which it
//! appeared. Teams with no earlier season get 0.0.

use matchday_core::{Season, Side};
use matchday_ingestion::{MatchStore, SeasonTable};
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Season point totals per team, for every loaded season.
#[derive(Debug, Clone, Default)]
pub struct HistoricalAverager {
    totals: BTreeMap<Season, HashMap<String, u32>>,
}

impl HistoricalAverager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every season in the store.
    pub fn from_store(store: &MatchStore) -> Self {
        let mut averager = Self::new();
        for table in store.seasons() {
            averager.record_season(table);
        }
        averager
    }

    /// Record the final point totals of one season, replacing any earlier record.
    pub fn record_season(&mut self, table: &SeasonTable) {
        let mut points: HashMap<String, u32> = HashMap::new();
        for m in table.matches() {
            for side in [Side::Home, Side::Away] {
                *points.entry(m.team(side).to_string()).or_insert(0) += m.points(side);
            }
        }
        debug!(
            season = %table.season(),
            teams = points.len(),
            "recorded season point totals"
        );
        self.totals.insert(table.season(), points);
    }

    /// Final points of `team` in `season`, if it played that season.
    pub fn season_points(&self, team: &str, season: Season) -> Option<u32> {
        self.totals.get(&season)?.get(team).copied()
    }

    /// Mean season points of `team` over seasons strictly before `season`.
    pub fn average_before(&self, team: &str, season: Season) -> f64 {
        let totals: Vec<f64> = self
            .totals
            .range(..season)
            .filter_map(|(_, teams)| teams.get(team))
            .map(|&p| f64::from(p))
            .collect();
        mean_or_zero(&totals)
    }

    /// Historical averages of every team seen before `season`.
    pub fn averages_before(&self, season: Season) -> HashMap<String, f64> {
        let mut per_team: HashMap<&str, Vec<f64>> = HashMap::new();
        for teams in self.totals.range(..season).map(|(_, t)| t) {
            for (team, &points) in teams {
                per_team.entry(team.as_str()).or_default().push(f64::from(points));
            }
        }
        per_team
            .into_iter()
            .map(|(team, totals)| (team.to_string(), mean_or_zero(&totals)))
            .collect()
    }

    /// Number of recorded seasons.
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().mean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use matchday_core::MatchResult;

    fn season(code: &str) -> Season {
        code.parse().unwrap()
    }

    /// A season in which `winner` beats `loser` `wins` times.
    fn season_with_wins(code: &str, winner: &str, loser: &str, wins: usize) -> SeasonTable {
        let rows: Vec<(&str, &str, u32, u32, MatchResult)> = (0..wins)
            .map(|_| (winner, loser, 1, 0, MatchResult::Home))
            .collect();
        SeasonTable::from_results(season(code), rows)
    }

    #[test]
    fn test_average_of_prior_seasons() {
        // One point per draw: 40, 50 and 60 points.
        let mut averager = HistoricalAverager::new();
        averager.record_season(&SeasonTable::from_results(
            season("1112"),
            [("A", "B", 0, 0, MatchResult::Draw)].repeat(40),
        ));
        averager.record_season(&SeasonTable::from_results(
            season("1213"),
            [("A", "B", 0, 0, MatchResult::Draw)].repeat(50),
        ));
        averager.record_season(&SeasonTable::from_results(
            season("1314"),
            [("A", "B", 0, 0, MatchResult::Draw)].repeat(60),
        ));

        assert_abs_diff_eq!(averager.average_before("A", season("1415")), 50.0, epsilon = 1e-9);
        assert_eq!(averager.average_before("Newcomer", season("1415")), 0.0);
    }

    #[test]
    fn test_excludes_target_and_later_seasons() {
        let mut averager = HistoricalAverager::new();
        averager.record_season(&season_with_wins("1213", "A", "B", 10));
        averager.record_season(&season_with_wins("1314", "A", "B", 20));
        averager.record_season(&season_with_wins("1415", "A", "B", 30));

        assert_abs_diff_eq!(averager.average_before("A", season("1314")), 30.0);
        assert_eq!(averager.average_before("A", season("1213")), 0.0);
        assert_eq!(averager.season_points("A", season("1415")), Some(90));
        assert_eq!(averager.season_points("B", season("1415")), Some(0));
    }

    #[test]
    fn test_skips_absent_seasons() {
        let mut averager = HistoricalAverager::new();
        averager.record_season(&season_with_wins("1011", "A", "B", 10));
        averager.record_season(&season_with_wins("1112", "C", "B", 10));
        averager.record_season(&season_with_wins("1213", "A", "B", 20));

        // A was relegated in 1112: mean of 30 and 60 only.
        assert_abs_diff_eq!(averager.average_before("A", season("1314")), 45.0);
        assert!(averager.season_points("A", season("1112")).is_none());
    }

    #[test]
    fn test_averages_before_matches_single_lookup() {
        let mut averager = HistoricalAverager::new();
        averager.record_season(&season_with_wins("1011", "A", "B", 10));
        averager.record_season(&season_with_wins("1112", "C", "A", 7));
        averager.record_season(&season_with_wins("1213", "A", "C", 3));

        let target = season("1314");
        let all = averager.averages_before(target);
        assert_eq!(all.len(), 3);
        for (team, avg) in &all {
            assert_abs_diff_eq!(*avg, averager.average_before(team, target));
        }
        assert!(averager.averages_before(season("1011")).is_empty());
    }

    #[test]
    fn test_from_store() {
        let store = MatchStore::from_tables([
            season_with_wins("1314", "A", "B", 2),
            season_with_wins("1415", "A", "B", 4),
        ]);
        let averager = HistoricalAverager::from_store(&store);

        assert_eq!(averager.len(), 2);
        assert_abs_diff_eq!(averager.average_before("A", season("1516")), 9.0);
    }
}
