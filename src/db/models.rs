use serde::{Deserialize, Serialize};

/// Outcome of a single game from one side's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Win,
    Loss,
}

impl GameOutcome {
    /// Single-letter encoding used in the results table ("W"/"L")
    pub fn as_str(&self) -> &'static str {
        match self {
            GameOutcome::Win => "W",
            GameOutcome::Loss => "L",
        }
    }

    pub fn from_str(s: &str) -> Option<GameOutcome> {
        match s {
            "W" => Some(GameOutcome::Win),
            "L" => Some(GameOutcome::Loss),
            _ => None,
        }
    }
}

/// One side of a finalized game. Every final game produces a symmetric pair
/// of these (winner with `Win`, loser with `Loss`), so each participant
/// appears as `team` at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub team: String,
    pub opponent: String,
    pub result: GameOutcome,
}

/// Per-team RPI components plus the derived win probability against the
/// configured reference team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    pub team: String,
    /// Win percentage (wins / games played)
    pub wp: f64,
    /// Opponents' win percentage, games vs this team excluded
    pub owp: f64,
    /// Opponents' opponents' win percentage
    pub oowp: f64,
    /// 0.25·WP + 0.50·OWP + 0.25·OOWP
    pub rpi: f64,
    pub win_prob_vs_reference: f64,
}

/// Cleaned ranking row: external RPI ranking joined with an ELO rating.
/// `elo` stays `None` when the ratings feed has no entry for the team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    pub team: String,
    pub rpi_ranking: f64,
    pub elo: Option<f64>,
}

/// Raw scoreboard entry as fetched from the results provider, before any
/// filtering. Fields are optional because the upstream feed is unreliable.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGame {
    /// Upstream game-state flag; only "final" games are converted
    pub game_state: String,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}
