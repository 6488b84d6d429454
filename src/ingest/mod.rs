//! Results acquisition and normalization.
//!
//! Providers return raw scoreboard entries; only games flagged final with a
//! strict score difference become `GameRecord` pairs. Malformed entries
//! (missing names, unparseable scores, ties) are skipped, not surfaced — the
//! upstream feed is unreliable and ingestion is best-effort.

pub mod rankings;
pub mod scoreboard;

pub use scoreboard::NcaaApi;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::future::join_all;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::db::models::{GameOutcome, GameRecord, RawGame};

/// Trait that every game-results provider must implement.
#[async_trait]
pub trait ResultsProvider: Send + Sync {
    /// Return the raw scoreboard for one calendar day.
    async fn fetch_scoreboard(&self, date: NaiveDate) -> Result<Vec<RawGame>>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Normalize a team-name cell from an upstream feed: keep the first
/// non-blank line, trim it, and strip surrounding double quotes. Runs once
/// at the ingestion boundary so every internal join is exact-match.
pub fn normalize_team_name(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .trim_matches('"')
        .trim()
        .to_string()
}

/// Convert raw scoreboard entries into symmetric winner/loser record pairs.
/// Non-final games, ties, and entries with missing or unparseable fields are
/// dropped silently.
pub fn game_records_from_raw(raw: &[RawGame]) -> Vec<GameRecord> {
    let mut records = Vec::new();
    for game in raw {
        if game.game_state != "final" {
            continue;
        }
        let (Some(home), Some(away)) = (game.home_team.as_deref(), game.away_team.as_deref())
        else {
            continue;
        };
        let (Some(home_score), Some(away_score)) = (game.home_score, game.away_score) else {
            continue;
        };
        if home_score == away_score {
            continue;
        }
        let home = normalize_team_name(home);
        let away = normalize_team_name(away);
        if home.is_empty() || away.is_empty() {
            continue;
        }
        let (winner, loser) = if home_score > away_score {
            (home, away)
        } else {
            (away, home)
        };
        records.push(GameRecord {
            team: winner.clone(),
            opponent: loser.clone(),
            result: GameOutcome::Win,
        });
        records.push(GameRecord {
            team: loser,
            opponent: winner,
            result: GameOutcome::Loss,
        });
    }
    records
}

/// Fetch every day of a season in week-sized chunks. Days within a chunk are
/// fetched concurrently; a throttle pause (with jitter) separates chunks to
/// stay polite to the public API. Failed days are logged and skipped.
pub async fn fetch_season(
    provider: &dyn ResultsProvider,
    start: NaiveDate,
    end: NaiveDate,
    throttle: Duration,
) -> Result<Vec<GameRecord>> {
    const CHUNK_DAYS: i64 = 7;

    info!(
        "Fetching {} results from {} to {}",
        provider.name(),
        start,
        end
    );

    let mut all_raw: Vec<RawGame> = Vec::new();
    let mut current = start;
    while current <= end {
        let days: Vec<NaiveDate> = (0..CHUNK_DAYS)
            .map(|i| current + chrono::Duration::days(i))
            .filter(|d| *d <= end)
            .collect();

        let fetches = days
            .iter()
            .map(|&date| async move { (date, provider.fetch_scoreboard(date).await) });
        for (date, result) in join_all(fetches).await {
            match result {
                Ok(games) => {
                    debug!("{}: {} scoreboard entries", date, games.len());
                    all_raw.extend(games);
                }
                Err(e) => warn!("Scoreboard fetch for {} failed: {}", date, e),
            }
        }

        current += chrono::Duration::days(CHUNK_DAYS);
        if current <= end {
            let jitter: u64 = rand::thread_rng().gen_range(0..500);
            tokio::time::sleep(throttle + Duration::from_millis(jitter)).await;
        }
    }

    let records = game_records_from_raw(&all_raw);
    info!(
        "Converted {} scoreboard entries into {} game records",
        all_raw.len(),
        records.len()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(state: &str, home: &str, away: &str, hs: i32, aw: i32) -> RawGame {
        RawGame {
            game_state: state.into(),
            home_team: Some(home.into()),
            away_team: Some(away.into()),
            home_score: Some(hs),
            away_score: Some(aw),
        }
    }

    #[test]
    fn test_final_game_produces_symmetric_pair() {
        let records = game_records_from_raw(&[raw("final", "Georgia Tech", "Clemson", 5, 3)]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].team, "Georgia Tech");
        assert_eq!(records[0].opponent, "Clemson");
        assert_eq!(records[0].result, GameOutcome::Win);
        assert_eq!(records[1].team, "Clemson");
        assert_eq!(records[1].result, GameOutcome::Loss);
    }

    #[test]
    fn test_away_winner() {
        let records = game_records_from_raw(&[raw("final", "Duke", "UCLA", 1, 9)]);
        assert_eq!(records[0].team, "UCLA");
        assert_eq!(records[0].result, GameOutcome::Win);
    }

    #[test]
    fn test_non_final_and_tied_games_skipped() {
        let records = game_records_from_raw(&[
            raw("live", "A", "B", 4, 2),
            raw("final", "A", "B", 3, 3),
            raw("", "A", "B", 4, 2),
        ]);
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_fields_skipped() {
        let mut no_score = raw("final", "A", "B", 0, 0);
        no_score.home_score = None;
        let mut no_name = raw("final", "A", "B", 4, 2);
        no_name.away_team = None;
        let records = game_records_from_raw(&[no_score, no_name]);
        assert!(records.is_empty());
    }

    #[test]
    fn test_team_names_normalized() {
        let records = game_records_from_raw(&[raw("final", "\n  Georgia Tech  \n(21-8)", "\"Clemson\"", 2, 1)]);
        assert_eq!(records[0].team, "Georgia Tech");
        assert_eq!(records[0].opponent, "Clemson");
    }

    #[test]
    fn test_normalize_team_name() {
        assert_eq!(normalize_team_name("  Georgia Tech  "), "Georgia Tech");
        assert_eq!(normalize_team_name("\n\nUCLA\nBruins"), "UCLA");
        assert_eq!(normalize_team_name("\"Texas A&M\""), "Texas A&M");
        assert_eq!(normalize_team_name("   \n  "), "");
    }
}
