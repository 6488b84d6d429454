//! Logistic win-probability model over a strength metric.
//!
//! The same transform serves two strength domains: RPI values in [0,1]
//! (scale 10) and ELO ratings (scale 1/400, the standard logistic ELO
//! expectation). The scale is a parameter so both share one implementation.

use std::collections::BTreeMap;

use thiserror::Error;

/// Scale applied to RPI differences (RPI lives in [0,1], so differences are
/// small and need a steep curve)
pub const RPI_SCALE: f64 = 10.0;

/// Scale applied to ELO rating differences (standard 400-point logistic)
pub const ELO_SCALE: f64 = 1.0 / 400.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// The configured reference team is absent from the strength table.
    /// Callers decide recovery; no default strength is substituted.
    #[error("reference team '{0}' not found in the strength table")]
    MissingReferenceTeam(String),
}

/// Probability that the *reference* team beats a team of the given strength:
/// `1 / (1 + 10^((strength − reference_strength) · scale))`.
///
/// Monotonic decreasing in the strength difference; 0.5 at equal strength.
/// The denominator is at least 1 for any finite exponent, so this never
/// divides by zero.
pub fn win_prob(strength: f64, reference_strength: f64, scale: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((strength - reference_strength) * scale))
}

/// Win probability of the reference team against one opponent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WinProbEntry {
    pub strength: f64,
    pub win_prob_vs_reference: f64,
}

/// Win probabilities for every team in a strength table, computed against a
/// fixed reference team looked up from the same table
#[derive(Debug, Clone, Default)]
pub struct WinProbTable {
    entries: BTreeMap<String, WinProbEntry>,
}

impl WinProbTable {
    pub fn from_strengths(
        strengths: &BTreeMap<String, f64>,
        reference_team: &str,
        scale: f64,
    ) -> Result<Self, ModelError> {
        let reference_strength = *strengths
            .get(reference_team)
            .ok_or_else(|| ModelError::MissingReferenceTeam(reference_team.to_string()))?;
        let entries = strengths
            .iter()
            .map(|(team, &strength)| {
                let entry = WinProbEntry {
                    strength,
                    win_prob_vs_reference: win_prob(strength, reference_strength, scale),
                };
                (team.clone(), entry)
            })
            .collect();
        Ok(WinProbTable { entries })
    }

    pub fn get(&self, team: &str) -> Option<&WinProbEntry> {
        self.entries.get(team)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
