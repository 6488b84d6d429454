//! Cleaning and merging of external ranking exports.
//!
//! The RPI ranking export arrives with multi-line team cells and repeated
//! header rows; the ELO feed quotes its team names. Both are normalized to
//! the same key space, then left-joined so every ranked team survives even
//! without an ELO rating.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::normalize_team_name;
use crate::db::models::RankingRow;

/// One row of an RPI ranking export
#[derive(Debug, Clone, Deserialize)]
pub struct RpiRankingInput {
    pub team: String,
    pub rpi: f64,
}

/// Load an RPI ranking export: a JSON array of `{"team", "rpi"}` objects
pub fn load_rpi_rankings(path: impl AsRef<Path>) -> Result<Vec<RpiRankingInput>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open RPI rankings file {}", path.display()))?;
    let rows = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse RPI rankings file {}", path.display()))?;
    Ok(rows)
}

/// Load an ELO ratings feed: a JSON object mapping team name to rating
pub fn load_elo_ratings(path: impl AsRef<Path>) -> Result<BTreeMap<String, f64>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open ELO ratings file {}", path.display()))?;
    let ratings = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse ELO ratings file {}", path.display()))?;
    Ok(ratings)
}

/// Merge a ranking export with an ELO ratings map on normalized team names.
/// The join key is additionally case-folded because the two feeds disagree
/// on capitalization; stored names keep the ranking export's casing.
/// Repeated header rows ("Team") and blank names are dropped; teams missing
/// from the ELO feed keep `elo: None`.
pub fn merge_rankings(
    rpi_rankings: &[RpiRankingInput],
    elo_ratings: &BTreeMap<String, f64>,
) -> Vec<RankingRow> {
    let elo_by_name: BTreeMap<String, f64> = elo_ratings
        .iter()
        .map(|(name, &rating)| (normalize_team_name(name).to_lowercase(), rating))
        .collect();

    rpi_rankings
        .iter()
        .filter_map(|row| {
            let team = normalize_team_name(&row.team);
            if team.is_empty() || team == "Team" {
                return None;
            }
            Some(RankingRow {
                elo: elo_by_name.get(&team.to_lowercase()).copied(),
                team,
                rpi_ranking: row.rpi,
            })
        })
        .collect()
}
