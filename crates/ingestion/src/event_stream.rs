//! Per-team event streams.
//!
//! Turns a season's matches into one participation event per side, ordered
//! by match sequence with the home event first.

use matchday_core::{Side, TeamEvent};

use crate::store::SeasonTable;

/// Builder for chronologically ordered team events.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventStreamBuilder;

impl EventStreamBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the event stream for one season.
    ///
    /// Exactly two events per match; the order is stable and places `Home`
    /// before `Away` for the same sequence index.
    pub fn build(&self, table: &SeasonTable) -> Vec<TeamEvent> {
        let mut events: Vec<TeamEvent> = table
            .matches()
            .iter()
            .flat_map(|m| {
                [
                    TeamEvent::from_match(m, Side::Home),
                    TeamEvent::from_match(m, Side::Away),
                ]
            })
            .collect();

        // Already in order for a validated table; the sort pins the contract.
        events.sort_by_key(TeamEvent::order_key);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchday_core::MatchResult;

    fn table() -> SeasonTable {
        SeasonTable::from_results(
            "1415".parse().unwrap(),
            [
                ("Arsenal", "Chelsea", 2, 1, MatchResult::Home),
                ("Everton", "Arsenal", 0, 0, MatchResult::Draw),
                ("Chelsea", "Everton", 1, 3, MatchResult::Away),
            ],
        )
    }

    #[test]
    fn test_two_events_per_match() {
        let events = EventStreamBuilder::new().build(&table());
        assert_eq!(events.len(), 6);
    }

    #[test]
    fn test_home_precedes_away() {
        let events = EventStreamBuilder::new().build(&table());

        for pair in events.chunks(2) {
            assert_eq!(pair[0].match_index, pair[1].match_index);
            assert_eq!(pair[0].side, Side::Home);
            assert_eq!(pair[1].side, Side::Away);
        }
        assert!(events.windows(2).all(|w| w[0].order_key() < w[1].order_key()));
    }

    #[test]
    fn test_event_values() {
        let events = EventStreamBuilder::new().build(&table());

        let everton_away = &events[5];
        assert_eq!(everton_away.team, "Everton");
        assert_eq!(everton_away.goals_for, 3);
        assert_eq!(everton_away.goals_against, 1);
        assert_eq!(everton_away.points, 3);

        let arsenal_draw = &events[3];
        assert_eq!(arsenal_draw.team, "Arsenal");
        assert_eq!(arsenal_draw.side, Side::Away);
        assert_eq!(arsenal_draw.points, 1);
    }

    #[test]
    fn test_empty_season() {
        let rows: Vec<(&str, &str, u32, u32, MatchResult)> = Vec::new();
        let empty = SeasonTable::from_results("1415".parse().unwrap(), rows);
        assert!(EventStreamBuilder::new().build(&empty).is_empty());
    }
}
