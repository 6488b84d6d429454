//! What-if schedule simulation: expected RPI of a hand-built schedule.
//!
//! The user assembles an arbitrary list of (opponent, venue) games; the
//! evaluator approximates the resulting RPI by combining venue-weighted win
//! probabilities with the opponents' precomputed OWP/OOWP.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::models::TeamStats;
use crate::optimize::{Venue, VenueWeights};
use crate::rpi::{OOWP_WEIGHT, OWP_WEIGHT, WP_WEIGHT};

/// One entry of a simulated schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledGame {
    pub opponent: String,
    pub venue: Venue,
}

/// Session-scoped, ordered, user-mutable schedule. Starts empty; grows and
/// shrinks through explicit add/remove calls; never persisted.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSchedule {
    entries: Vec<ScheduledGame>,
}

impl SimulatedSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, opponent: impl Into<String>, venue: Venue) {
        self.entries.push(ScheduledGame {
            opponent: opponent.into(),
            venue,
        });
    }

    /// Remove the entry at `index`, returning it; `None` when out of range
    pub fn remove(&mut self, index: usize) -> Option<ScheduledGame> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[ScheduledGame] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Expected RPI of a simulated schedule, rounded to 4 decimal places.
///
/// WP is approximated by the mean venue-weighted win probability against the
/// reference team; OWP and OOWP are plain means of the opponents' values.
/// Entries whose opponent is missing from the stats table are excluded from
/// every average (inner-join semantics — keeping them as nulls would poison
/// the mean). An empty schedule, or one with no matched opponents, is 0.0.
pub fn expected_rpi(
    schedule: &SimulatedSchedule,
    stats_by_team: &BTreeMap<String, TeamStats>,
    weights: &VenueWeights,
) -> f64 {
    if schedule.is_empty() {
        return 0.0;
    }

    let mut adj_win_sum = 0.0;
    let mut owp_sum = 0.0;
    let mut oowp_sum = 0.0;
    let mut matched = 0usize;

    for game in schedule.entries() {
        let Some(stats) = stats_by_team.get(&game.opponent) else {
            debug!("No stats for opponent '{}', excluded from RPI", game.opponent);
            continue;
        };
        adj_win_sum += stats.win_prob_vs_reference * weights.weight(game.venue);
        owp_sum += stats.owp;
        oowp_sum += stats.oowp;
        matched += 1;
    }

    if matched == 0 {
        return 0.0;
    }

    let n = matched as f64;
    let rpi = WP_WEIGHT * (adj_win_sum / n)
        + OWP_WEIGHT * (owp_sum / n)
        + OOWP_WEIGHT * (oowp_sum / n);
    (rpi * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stats(entries: &[(&str, f64, f64, f64)]) -> BTreeMap<String, TeamStats> {
        entries
            .iter()
            .map(|&(team, win_prob, owp, oowp)| {
                (
                    team.to_string(),
                    TeamStats {
                        team: team.to_string(),
                        wp: 0.5,
                        owp,
                        oowp,
                        rpi: 0.5,
                        win_prob_vs_reference: win_prob,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_schedule_is_zero() {
        let schedule = SimulatedSchedule::new();
        let table = stats(&[("Clemson", 0.6, 0.5, 0.5)]);
        assert_relative_eq!(
            expected_rpi(&schedule, &table, &VenueWeights::default()),
            0.0
        );
    }

    #[test]
    fn test_add_then_remove_returns_to_zero() {
        let table = stats(&[("Clemson", 0.6, 0.5, 0.5)]);
        let weights = VenueWeights::default();
        let mut schedule = SimulatedSchedule::new();

        schedule.add("Clemson", Venue::Home);
        assert!(expected_rpi(&schedule, &table, &weights) > 0.0);

        let removed = schedule.remove(0).unwrap();
        assert_eq!(removed.opponent, "Clemson");
        assert!(schedule.is_empty());
        assert_relative_eq!(expected_rpi(&schedule, &table, &weights), 0.0);
    }

    #[test]
    fn test_single_home_game() {
        // Home venue multiplies the win term by 0.7; OWP/OOWP are unweighted.
        let table = stats(&[("Clemson", 0.6, 0.5, 0.4)]);
        let mut schedule = SimulatedSchedule::new();
        schedule.add("Clemson", Venue::Home);

        let expected: f64 = 0.25 * (0.6 * 0.7) + 0.50 * 0.5 + 0.25 * 0.4;
        let expected = (expected * 10_000.0).round() / 10_000.0;
        assert_relative_eq!(
            expected_rpi(&schedule, &table, &VenueWeights::default()),
            expected
        );
    }

    #[test]
    fn test_venue_weight_applies_to_win_term_only() {
        let table = stats(&[("Clemson", 0.6, 0.5, 0.4)]);
        let weights = VenueWeights::default();

        let mut home = SimulatedSchedule::new();
        home.add("Clemson", Venue::Home);
        let mut away = SimulatedSchedule::new();
        away.add("Clemson", Venue::Away);

        let diff = expected_rpi(&away, &table, &weights) - expected_rpi(&home, &table, &weights);
        // Only the 0.25-weighted WP term moves: 0.25 · 0.6 · (1.3 − 0.7)
        assert_relative_eq!(diff, 0.25 * 0.6 * 0.6, epsilon = 1e-4);
    }

    #[test]
    fn test_unknown_opponents_excluded_from_averages() {
        let table = stats(&[("Clemson", 0.6, 0.5, 0.4)]);
        let weights = VenueWeights::default();

        let mut with_unknown = SimulatedSchedule::new();
        with_unknown.add("Clemson", Venue::Neutral);
        with_unknown.add("Nowhere State", Venue::Home);

        let mut known_only = SimulatedSchedule::new();
        known_only.add("Clemson", Venue::Neutral);

        // The unmatched entry changes neither numerator nor denominator
        assert_relative_eq!(
            expected_rpi(&with_unknown, &table, &weights),
            expected_rpi(&known_only, &table, &weights)
        );
    }

    #[test]
    fn test_all_unknown_opponents_is_zero() {
        let table = stats(&[("Clemson", 0.6, 0.5, 0.4)]);
        let mut schedule = SimulatedSchedule::new();
        schedule.add("Nowhere State", Venue::Home);
        assert_relative_eq!(
            expected_rpi(&schedule, &table, &VenueWeights::default()),
            0.0
        );
    }

    #[test]
    fn test_remove_out_of_range_is_none() {
        let mut schedule = SimulatedSchedule::new();
        schedule.add("Clemson", Venue::Home);
        assert!(schedule.remove(5).is_none());
        assert_eq!(schedule.len(), 1);
    }
}
