use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use reqwest::Client;
use tracing::debug;

use super::ResultsProvider;
use crate::db::models::RawGame;

/// Results provider backed by the public NCAA scoreboard API.
/// Docs: <https://github.com/henrygd/ncaa-api>
pub struct NcaaApi {
    http: Client,
    /// Base URL for overriding in tests or when running a local mirror
    base_url: String,
    /// Sport path segment, e.g. "softball/d1"
    sport_path: String,
}

impl NcaaApi {
    pub fn new(base_url: Option<&str>, sport_path: Option<&str>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(NcaaApi {
            http,
            base_url: base_url
                .unwrap_or("https://ncaa-api.henrygd.me")
                .trim_end_matches('/')
                .to_string(),
            sport_path: sport_path.unwrap_or("softball/d1").to_string(),
        })
    }
}

#[async_trait]
impl ResultsProvider for NcaaApi {
    fn name(&self) -> &str {
        "NCAA scoreboard API"
    }

    async fn fetch_scoreboard(&self, date: NaiveDate) -> Result<Vec<RawGame>> {
        let url = format!(
            "{}/scoreboard/{}/{:04}/{:02}/{:02}/all-conf",
            self.base_url,
            self.sport_path,
            date.year(),
            date.month(),
            date.day()
        );
        debug!("Fetching scoreboard from {}", url);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("NCAA scoreboard request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("NCAA scoreboard error: {}", resp.status());
        }

        let raw: serde_json::Value = resp
            .json()
            .await
            .context("Failed to parse scoreboard response")?;

        Ok(parse_scoreboard_response(&raw))
    }
}

/// Pull raw game entries out of a scoreboard payload. Field-level problems
/// are deferred: entries keep `None` where a field is missing so the
/// conversion step can apply the skip policy uniformly.
fn parse_scoreboard_response(raw: &serde_json::Value) -> Vec<RawGame> {
    let games = match raw["games"].as_array() {
        Some(a) => a,
        None => return vec![],
    };

    games
        .iter()
        .map(|item| {
            let game = &item["game"];
            RawGame {
                game_state: game["gameState"].as_str().unwrap_or_default().to_string(),
                home_team: game["home"]["names"]["short"].as_str().map(str::to_string),
                away_team: game["away"]["names"]["short"].as_str().map(str::to_string),
                home_score: parse_score(&game["home"]["score"]),
                away_score: parse_score(&game["away"]["score"]),
            }
        })
        .collect()
}

/// Scores arrive as strings on some days and integers on others
fn parse_score(value: &serde_json::Value) -> Option<i32> {
    value
        .as_str()
        .and_then(|s| s.trim().parse().ok())
        .or_else(|| value.as_i64().map(|n| n as i32))
}
