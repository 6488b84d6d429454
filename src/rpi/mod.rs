//! Rating Percentage Index computation.
//!
//! RPI ranks a team by its own record and the strength of its schedule:
//!
//! ```text
//! RPI = 0.25·WP + 0.50·OWP + 0.25·OOWP
//! ```
//!
//! - **WP**: the team's win percentage.
//! - **OWP**: the mean win percentage of its opponents, where each opponent's
//!   record is taken *excluding* games against the team being rated (a team's
//!   own results must not inflate its schedule strength).
//! - **OOWP**: the mean OWP of its opponents.
//!
//! OWP and OOWP average over *games played*, not distinct opponents — an
//! opponent faced three times is counted three times. This mirrors the NCAA
//! convention and materially changes rankings for teams with uneven rematch
//! counts.

pub mod win_prob;

use std::collections::BTreeMap;

use crate::db::models::{GameOutcome, GameRecord};

pub const WP_WEIGHT: f64 = 0.25;
pub const OWP_WEIGHT: f64 = 0.50;
pub const OOWP_WEIGHT: f64 = 0.25;

/// The three RPI components and their weighted combination for one team
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RpiComponents {
    pub wp: f64,
    pub owp: f64,
    pub oowp: f64,
    pub rpi: f64,
}

/// Compute WP, OWP, OOWP, and RPI for every team appearing as `team` in the
/// game log. An empty log yields an empty map; a team with no games gets
/// all-zero components.
///
/// The three passes are strictly sequential: OWP reads the finalized WP data
/// (via per-opponent recomputation with exclusions) and OOWP reads the
/// finalized OWP table.
pub fn compute_rpi(games: &[GameRecord]) -> BTreeMap<String, RpiComponents> {
    let mut games_by_team: BTreeMap<&str, Vec<&GameRecord>> = BTreeMap::new();
    for game in games {
        games_by_team.entry(game.team.as_str()).or_default().push(game);
    }

    // Pass 1: plain win percentage
    let mut wp: BTreeMap<&str, f64> = BTreeMap::new();
    for (&team, team_games) in &games_by_team {
        let wins = team_games
            .iter()
            .filter(|g| g.result == GameOutcome::Win)
            .count();
        let total = team_games.len();
        wp.insert(team, if total > 0 { wins as f64 / total as f64 } else { 0.0 });
    }

    // Pass 2: opponents' win percentage, excluding games against the subject.
    // An opponent with zero qualifying games after the exclusion contributes
    // no term at all (skipped, not counted as 0.0).
    let mut owp: BTreeMap<&str, f64> = BTreeMap::new();
    for (&team, team_games) in &games_by_team {
        let mut opp_rates: Vec<f64> = Vec::with_capacity(team_games.len());
        for game in team_games {
            if let Some(rate) = win_rate_excluding(&games_by_team, &game.opponent, team) {
                opp_rates.push(rate);
            }
        }
        let value = if opp_rates.is_empty() {
            0.0
        } else {
            opp_rates.iter().sum::<f64>() / opp_rates.len() as f64
        };
        owp.insert(team, value);
    }

    // Pass 3: opponents' opponents' win percentage, over the finalized OWP
    // table. Game-weighted like pass 2; an opponent missing from the table
    // counts as 0.0 here (cannot happen with symmetric record pairs, but the
    // fallback keeps the pass total).
    let mut oowp: BTreeMap<&str, f64> = BTreeMap::new();
    for (&team, team_games) in &games_by_team {
        let value = if team_games.is_empty() {
            0.0
        } else {
            let sum: f64 = team_games
                .iter()
                .map(|g| owp.get(g.opponent.as_str()).copied().unwrap_or(0.0))
                .sum();
            sum / team_games.len() as f64
        };
        oowp.insert(team, value);
    }

    games_by_team
        .keys()
        .map(|&team| {
            let (wp, owp, oowp) = (wp[team], owp[team], oowp[team]);
            let components = RpiComponents {
                wp,
                owp,
                oowp,
                rpi: WP_WEIGHT * wp + OWP_WEIGHT * owp + OOWP_WEIGHT * oowp,
            };
            (team.to_string(), components)
        })
        .collect()
}

/// Win rate of `team` over its games not played against `excluded`.
/// `None` when no qualifying games remain.
fn win_rate_excluding(
    games_by_team: &BTreeMap<&str, Vec<&GameRecord>>,
    team: &str,
    excluded: &str,
) -> Option<f64> {
    let games = games_by_team.get(team)?;
    let mut wins = 0usize;
    let mut total = 0usize;
    for game in games.iter().filter(|g| g.opponent != excluded) {
        total += 1;
        if game.result == GameOutcome::Win {
            wins += 1;
        }
    }
    if total > 0 {
        Some(wins as f64 / total as f64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Both sides of one final game
    fn series(winner: &str, loser: &str) -> Vec<GameRecord> {
        vec![
            GameRecord {
                team: winner.into(),
                opponent: loser.into(),
                result: GameOutcome::Win,
            },
            GameRecord {
                team: loser.into(),
                opponent: winner.into(),
                result: GameOutcome::Loss,
            },
        ]
    }

    fn log(pairings: &[(&str, &str)]) -> Vec<GameRecord> {
        pairings
            .iter()
            .flat_map(|(w, l)| series(w, l))
            .collect()
    }

    #[test]
    fn test_empty_log_yields_empty_map() {
        assert!(compute_rpi(&[]).is_empty());
    }

    #[test]
    fn test_three_team_round_robin() {
        // A beats B, B beats C, A beats C
        let games = log(&[("A", "B"), ("B", "C"), ("A", "C")]);
        let stats = compute_rpi(&games);

        assert_relative_eq!(stats["A"].wp, 1.0);
        assert_relative_eq!(stats["B"].wp, 0.5);
        assert_relative_eq!(stats["C"].wp, 0.0);

        // OWP(A): B's record without A is 1-0 (beat C) → 1.0; C's record
        // without A is 0-1 (lost to B) → 0.0. Mean over A's two games = 0.5.
        assert_relative_eq!(stats["A"].owp, 0.5);
        // OWP(B): A without B is 1-0 → 1.0; C without B is 0-1 → 0.0.
        assert_relative_eq!(stats["B"].owp, 0.5);
        // OWP(C): B without C is 0-1 → 0.0; A without C is 1-0 → 1.0.
        assert_relative_eq!(stats["C"].owp, 0.5);

        // OOWP averages the finalized OWP table over each game played;
        // every OWP is 0.5 here, so every OOWP is too.
        for s in stats.values() {
            assert_relative_eq!(s.oowp, 0.5);
            assert_relative_eq!(
                s.rpi,
                0.25 * s.wp + 0.50 * s.owp + 0.25 * s.oowp,
                epsilon = 1e-12
            );
        }
        assert_relative_eq!(stats["A"].rpi, 0.625);
        assert_relative_eq!(stats["B"].rpi, 0.5);
        assert_relative_eq!(stats["C"].rpi, 0.375);
    }

    #[test]
    fn test_components_stay_in_unit_interval() {
        let games = log(&[
            ("A", "B"),
            ("B", "C"),
            ("C", "D"),
            ("D", "A"),
            ("A", "C"),
            ("B", "D"),
            ("A", "B"),
        ]);
        for s in compute_rpi(&games).values() {
            assert!((0.0..=1.0).contains(&s.wp));
            assert!((0.0..=1.0).contains(&s.owp));
            assert!((0.0..=1.0).contains(&s.oowp));
            assert!((0.0..=1.0).contains(&s.rpi));
        }
    }

    #[test]
    fn test_mutual_series_contributes_no_owp_term() {
        // Two teams that only ever played each other: after excluding their
        // head-to-head games, neither opponent has a qualifying record.
        let games = log(&[("A", "B"), ("A", "B"), ("B", "A")]);
        let stats = compute_rpi(&games);
        assert_relative_eq!(stats["A"].owp, 0.0);
        assert_relative_eq!(stats["B"].owp, 0.0);
        assert_relative_eq!(stats["A"].oowp, 0.0);
        assert_relative_eq!(stats["B"].oowp, 0.0);
        // WP still reflects the head-to-head results
        assert_relative_eq!(stats["A"].wp, 2.0 / 3.0);
        assert_relative_eq!(stats["B"].wp, 1.0 / 3.0);
    }

    #[test]
    fn test_owp_is_game_weighted_not_opponent_weighted() {
        // D played B twice and C once. B's rate excluding D is 1.0 (beat C),
        // C's rate excluding D is 0.0 (lost to B).
        //   game-weighted:     (1.0 + 1.0 + 0.0) / 3 = 2/3
        //   opponent-weighted: (1.0 + 0.0) / 2       = 1/2
        let games = log(&[("D", "B"), ("B", "D"), ("D", "C"), ("B", "C")]);
        let stats = compute_rpi(&games);
        assert_relative_eq!(stats["D"].owp, 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_oowp_is_game_weighted() {
        let games = log(&[("D", "B"), ("B", "D"), ("D", "C"), ("B", "C")]);
        let stats = compute_rpi(&games);
        let expected = (stats["B"].owp + stats["B"].owp + stats["C"].owp) / 3.0;
        assert_relative_eq!(stats["D"].oowp, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_every_participant_gets_an_entry() {
        let games = log(&[("A", "B")]);
        let stats = compute_rpi(&games);
        assert_eq!(stats.len(), 2);
        assert!(stats.contains_key("A"));
        assert!(stats.contains_key("B"));
    }
}
