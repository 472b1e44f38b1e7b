//! Running per-team aggregation over a season's event stream.
//!
//! For every event the team's state is read *before* the event is applied,
//! so the snapshot attached to a match only reflects strictly earlier matches
//! of the same season.

use matchday_core::{Error, Result, Season, Side, TeamEvent, TeamSnapshot};
use std::collections::HashMap;

use crate::rolling::RollingMean;

/// Accumulated state of one team within one season.
#[derive(Debug, Clone)]
pub struct TeamRunningState {
    pub matches_played: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: u32,
    recent_goals_for: RollingMean,
    recent_goals_against: RollingMean,
    recent_points: RollingMean,
}

impl TeamRunningState {
    /// Create an empty state with the given rolling window.
    pub fn new(window: usize) -> Self {
        Self {
            matches_played: 0,
            goals_for: 0,
            goals_against: 0,
            points: 0,
            recent_goals_for: RollingMean::new(window),
            recent_goals_against: RollingMean::new(window),
            recent_points: RollingMean::new(window),
        }
    }

    /// Current figures, as features for the team's next match.
    pub fn snapshot(&self) -> TeamSnapshot {
        TeamSnapshot {
            matches_played: self.matches_played,
            goals_for: self.goals_for,
            goals_against: self.goals_against,
            points: self.points,
            avg_goals_scored: per_match(self.goals_for, self.matches_played),
            avg_goals_conceded: per_match(self.goals_against, self.matches_played),
            avg_points: per_match(self.points, self.matches_played),
            recent_goals_scored: self.recent_goals_for.mean(),
            recent_goals_conceded: self.recent_goals_against.mean(),
            recent_points: self.recent_points.mean(),
        }
    }

    /// Fold one event into the state.
    pub fn apply(&mut self, event: &TeamEvent) {
        self.matches_played += 1;
        self.goals_for += event.goals_for;
        self.goals_against += event.goals_against;
        self.points += event.points;
        self.recent_goals_for.push(event.goals_for);
        self.recent_goals_against.push(event.goals_against);
        self.recent_points.push(event.points);
    }

    /// Number of events in the rolling window.
    pub fn recent_count(&self) -> usize {
        self.recent_points.count()
    }
}

/// Total divided by matches played; 0.0 before the first match.
#[inline]
fn per_match(total: u32, matches: u32) -> f64 {
    if matches == 0 {
        0.0
    } else {
        f64::from(total) / f64::from(matches)
    }
}

/// Pre-match snapshots of both sides of one match.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PreMatch {
    pub home: TeamSnapshot,
    pub away: TeamSnapshot,
}

/// Running aggregator for a single season.
pub struct RunningAggregator {
    /// Rolling window size.
    window: usize,
    /// Season being aggregated, fixed by the first event.
    season: Option<Season>,
    /// Last processed ordering key.
    last_key: Option<(usize, Side)>,
    /// State per team.
    teams: HashMap<String, TeamRunningState>,
}

impl RunningAggregator {
    /// Create a new aggregator.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            season: None,
            last_key: None,
            teams: HashMap::new(),
        }
    }

    /// Process one event, returning the team's snapshot before the event.
    ///
    /// Events must belong to a single season and arrive in stream order.
    pub fn process_event(&mut self, event: &TeamEvent) -> Result<TeamSnapshot> {
        match self.season {
            Some(season) if season != event.season => {
                return Err(Error::data_integrity(format!(
                    "event from season {} fed to aggregator for season {}",
                    event.season, season
                )));
            }
            Some(_) => {}
            None => self.season = Some(event.season),
        }

        let key = event.order_key();
        if let Some(last) = self.last_key {
            if key <= last {
                return Err(Error::data_integrity(format!(
                    "season {}: event {:?} out of order after {:?}",
                    event.season, key, last
                )));
            }
        }
        self.last_key = Some(key);

        let window = self.window;
        let state = self
            .teams
            .entry(event.team.clone())
            .or_insert_with(|| TeamRunningState::new(window));

        let before = state.snapshot();
        state.apply(event);
        Ok(before)
    }

    /// Process a full season stream.
    ///
    /// Returns one [`PreMatch`] per match, indexed by sequence index.
    pub fn process(&mut self, events: &[TeamEvent]) -> Result<Vec<PreMatch>> {
        let mut slots: Vec<[Option<TeamSnapshot>; 2]> = Vec::new();

        for event in events {
            let snapshot = self.process_event(event)?;
            if slots.len() <= event.match_index {
                slots.resize(event.match_index + 1, [None, None]);
            }
            let slot = match event.side {
                Side::Home => 0,
                Side::Away => 1,
            };
            slots[event.match_index][slot] = Some(snapshot);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| match slot {
                [Some(home), Some(away)] => Ok(PreMatch { home, away }),
                _ => Err(Error::data_integrity(format!(
                    "match {} is missing a home or away event",
                    i
                ))),
            })
            .collect()
    }

    /// State of a team after everything processed so far.
    pub fn state(&self, team: &str) -> Option<&TeamRunningState> {
        self.teams.get(team)
    }

    /// Number of teams seen.
    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    /// Clear all state.
    pub fn clear(&mut self) {
        self.season = None;
        self.last_key = None;
        self.teams.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use matchday_core::{Match, MatchResult};
    use matchday_ingestion::{EventStreamBuilder, SeasonTable};

    fn season() -> Season {
        "1415".parse().unwrap()
    }

    fn run(rows: &[(&str, &str, u32, u32, MatchResult)], window: usize) -> Vec<PreMatch> {
        let table = SeasonTable::from_results(season(), rows.iter().copied());
        let events = EventStreamBuilder::new().build(&table);
        RunningAggregator::new(window).process(&events).unwrap()
    }

    /// Recompute a team's features by brute force over strictly earlier matches.
    fn brute_force(matches: &[Match], upto: usize, team: &str, window: usize) -> TeamSnapshot {
        let history: Vec<(u32, u32, u32)> = matches[..upto]
            .iter()
            .filter_map(|m| {
                m.side_of(team)
                    .map(|s| (m.goals_for(s), m.goals_against(s), m.points(s)))
            })
            .collect();

        let n = history.len() as u32;
        let gf: u32 = history.iter().map(|h| h.0).sum();
        let ga: u32 = history.iter().map(|h| h.1).sum();
        let pts: u32 = history.iter().map(|h| h.2).sum();
        let recent = &history[history.len().saturating_sub(window)..];
        let mean = |f: fn(&(u32, u32, u32)) -> u32| {
            if recent.is_empty() {
                0.0
            } else {
                recent.iter().map(f).sum::<u32>() as f64 / recent.len() as f64
            }
        };

        TeamSnapshot {
            matches_played: n,
            goals_for: gf,
            goals_against: ga,
            points: pts,
            avg_goals_scored: if n == 0 { 0.0 } else { gf as f64 / n as f64 },
            avg_goals_conceded: if n == 0 { 0.0 } else { ga as f64 / n as f64 },
            avg_points: if n == 0 { 0.0 } else { pts as f64 / n as f64 },
            recent_goals_scored: mean(|h| h.0),
            recent_goals_conceded: mean(|h| h.1),
            recent_points: mean(|h| h.2),
        }
    }

    #[test]
    fn test_first_match_is_zero() {
        let pre = run(&[("Arsenal", "Chelsea", 2, 1, MatchResult::Home)], 6);

        assert_eq!(pre.len(), 1);
        assert_eq!(pre[0].home, TeamSnapshot::default());
        assert_eq!(pre[0].away, TeamSnapshot::default());
    }

    #[test]
    fn test_cumulative_excludes_current_match() {
        // Arsenal scores 2, 0, 1 in its first three matches.
        let pre = run(
            &[
                ("Arsenal", "Chelsea", 2, 1, MatchResult::Home),
                ("Everton", "Arsenal", 3, 0, MatchResult::Home),
                ("Arsenal", "Spurs", 1, 1, MatchResult::Draw),
                ("Arsenal", "Everton", 5, 0, MatchResult::Home),
            ],
            6,
        );

        let fourth = &pre[3].home;
        assert_eq!(fourth.goals_for, 3);
        assert_eq!(fourth.goals_against, 5);
        assert_eq!(fourth.matches_played, 3);
        assert_eq!(fourth.points, 4);
        assert_abs_diff_eq!(fourth.avg_goals_scored, 1.0);
        assert_abs_diff_eq!(fourth.avg_points, 4.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fourth.recent_goals_scored, 1.0);
    }

    #[test]
    fn test_rolling_window_bound() {
        let rows: Vec<(&str, &str, u32, u32, MatchResult)> = (0..10)
            .map(|i| ("Arsenal", "Chelsea", i, 0, MatchResult::Home))
            .collect();
        let pre = run(&rows, 3);

        // Match 9: previous goals 6, 7, 8
        assert_abs_diff_eq!(pre[9].home.recent_goals_scored, 7.0);
        // Match 2: previous goals 0, 1
        assert_abs_diff_eq!(pre[2].home.recent_goals_scored, 0.5);
        assert_eq!(pre[9].home.goals_for, 36);
        assert_abs_diff_eq!(pre[9].away.recent_points, 0.0);
    }

    #[test]
    fn test_matches_brute_force_everywhere() {
        let rows = [
            ("A", "B", 1, 0, MatchResult::Home),
            ("C", "D", 2, 2, MatchResult::Draw),
            ("B", "C", 0, 3, MatchResult::Away),
            ("D", "A", 1, 1, MatchResult::Draw),
            ("A", "C", 4, 2, MatchResult::Home),
            ("B", "D", 2, 1, MatchResult::Home),
            ("C", "A", 0, 1, MatchResult::Away),
            ("D", "B", 0, 0, MatchResult::Draw),
            ("A", "B", 2, 3, MatchResult::Away),
            ("C", "D", 1, 0, MatchResult::Home),
        ];
        let window = 2;
        let table = SeasonTable::from_results(season(), rows.iter().copied());
        let pre = run(&rows, window);

        for (i, m) in table.matches().iter().enumerate() {
            let home = brute_force(table.matches(), i, &m.home_team, window);
            let away = brute_force(table.matches(), i, &m.away_team, window);
            assert_eq!(pre[i].home, home, "home snapshot of match {}", i);
            assert_eq!(pre[i].away, away, "away snapshot of match {}", i);
        }
    }

    #[test]
    fn test_zero_matches_never_nan() {
        let pre = run(&[("A", "B", 0, 0, MatchResult::Draw)], 6);
        let s = pre[0].home;
        for v in [
            s.avg_goals_scored,
            s.avg_goals_conceded,
            s.avg_points,
            s.recent_goals_scored,
            s.recent_goals_conceded,
            s.recent_points,
        ] {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn test_rejects_out_of_order_events() {
        let table = SeasonTable::from_results(
            season(),
            [
                ("A", "B", 1, 0, MatchResult::Home),
                ("B", "A", 1, 0, MatchResult::Home),
            ],
        );
        let mut events = EventStreamBuilder::new().build(&table);
        events.swap(1, 2);

        let err = RunningAggregator::new(6).process(&events).unwrap_err();
        assert!(matches!(err, Error::DataIntegrity(_)));
    }

    #[test]
    fn test_rejects_mixed_seasons() {
        let table = SeasonTable::from_results(season(), [("A", "B", 1, 0, MatchResult::Home)]);
        let mut events = EventStreamBuilder::new().build(&table);
        events[1].season = "1516".parse().unwrap();

        assert!(RunningAggregator::new(6).process(&events).is_err());
    }

    #[test]
    fn test_state_after_season() {
        let table = SeasonTable::from_results(
            season(),
            [
                ("A", "B", 1, 0, MatchResult::Home),
                ("B", "A", 2, 2, MatchResult::Draw),
            ],
        );
        let events = EventStreamBuilder::new().build(&table);
        let mut agg = RunningAggregator::new(6);
        agg.process(&events).unwrap();

        let a = agg.state("A").unwrap();
        assert_eq!(a.matches_played, 2);
        assert_eq!(a.points, 4);
        assert_eq!(a.goals_for, 3);
        assert_eq!(a.recent_count(), 2);
        assert_eq!(agg.team_count(), 2);

        agg.clear();
        assert!(agg.state("A").is_none());
    }
}
