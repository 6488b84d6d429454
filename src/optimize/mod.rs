//! Schedule optimization: pick, per candidate opponent and venue, an integer
//! number of games maximizing a blended strength / win-probability objective.
//!
//! The blend weight `alpha` trades schedule strength against expected wins:
//! `alpha·strength + (1−alpha)·venue_weight·win_prob` per scheduled game,
//! a strict linear combination, never renormalized. NCAA RPI values wins by
//! venue (home wins 0.7, away wins 1.3, neutral 1.0), which is why the venue
//! multiplier applies to the win-probability term only.

pub mod solver;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use solver::{ConstraintSense, IlpModel, IlpOutcome, IlpSolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Venue {
    Home,
    Away,
    Neutral,
}

impl Venue {
    pub const ALL: [Venue; 3] = [Venue::Home, Venue::Away, Venue::Neutral];

    pub fn as_str(self) -> &'static str {
        match self {
            Venue::Home => "home",
            Venue::Away => "away",
            Venue::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Venue {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "home" | "h" => Ok(Venue::Home),
            "away" | "a" => Ok(Venue::Away),
            "neutral" | "n" => Ok(Venue::Neutral),
            other => anyhow::bail!("unknown venue '{other}' (expected home/away/neutral)"),
        }
    }
}

/// NCAA RPI win-value multipliers per venue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VenueWeights {
    pub home: f64,
    pub away: f64,
    pub neutral: f64,
}

impl Default for VenueWeights {
    fn default() -> Self {
        VenueWeights {
            home: 0.7,
            away: 1.3,
            neutral: 1.0,
        }
    }
}

impl VenueWeights {
    pub fn weight(&self, venue: Venue) -> f64 {
        match venue {
            Venue::Home => self.home,
            Venue::Away => self.away,
            Venue::Neutral => self.neutral,
        }
    }
}

/// A candidate opponent's strength metric (RPI or ELO) and the reference
/// team's probability of beating it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub strength: f64,
    pub win_prob: f64,
}

/// Manual scheduling override for one opponent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
    /// Exactly this many games, summed across venues
    ForceCount(u32),
    /// No games at all
    Exclude,
}

/// Session-scoped override state. At most one override per team; setting a
/// force count clears a prior exclusion and vice versa (last write wins).
/// Passed by reference into each optimize call — never a process global.
#[derive(Debug, Clone, Default)]
pub struct OverrideSet {
    entries: BTreeMap<String, Override>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force(&mut self, team: impl Into<String>, count: u32) {
        self.entries.insert(team.into(), Override::ForceCount(count));
    }

    pub fn exclude(&mut self, team: impl Into<String>) {
        self.entries.insert(team.into(), Override::Exclude);
    }

    /// Remove any override for the team
    pub fn clear(&mut self, team: &str) {
        self.entries.remove(team);
    }

    /// Remove all overrides
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, team: &str) -> Option<Override> {
        self.entries.get(team).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Override)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Optimizer invocation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleParams {
    /// The schedule must contain exactly this many games
    pub total_games: u32,
    /// Blend weight: 1.0 = pure strength, 0.0 = pure win probability
    pub alpha: f64,
    /// Maximum games against any single opponent, summed across venues
    pub per_team_cap: u32,
    /// `None` runs the venue-agnostic model (one variable per opponent)
    pub venue_weights: Option<VenueWeights>,
}

/// One row of an optimal schedule; only strictly positive counts are emitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledSeries {
    pub team: String,
    /// `None` in the venue-agnostic model
    pub venue: Option<Venue>,
    pub games: u32,
}

/// First-class solve result. Callers must check for `Infeasible` and may
/// relax constraints and retry; it is never raised as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleOutcome {
    Optimal(Vec<ScheduledSeries>),
    Infeasible,
}

impl ScheduleOutcome {
    pub fn is_infeasible(&self) -> bool {
        matches!(self, ScheduleOutcome::Infeasible)
    }
}

/// Build the schedule ILP and solve it with the given backend.
///
/// One integer variable per (candidate, venue) pair bounded by the per-team
/// cap; total games as an equality constraint; per-team cap across venues;
/// overrides layered on top as additional equalities before solving.
/// Overrides naming teams outside the candidate set are logged and dropped —
/// the team may have been filtered out upstream (the reference team itself is
/// never a candidate).
pub fn optimize(
    candidates: &BTreeMap<String, Candidate>,
    params: &ScheduleParams,
    overrides: &OverrideSet,
    backend: &dyn IlpSolver,
) -> Result<ScheduleOutcome> {
    let venues: Vec<Option<Venue>> = match params.venue_weights {
        Some(_) => Venue::ALL.iter().copied().map(Some).collect(),
        None => vec![None],
    };
    let cap = params.per_team_cap as f64;

    let mut model = IlpModel::default();
    let mut var_meta: Vec<(&str, Option<Venue>)> = Vec::new();
    let mut team_vars: BTreeMap<&str, Vec<usize>> = BTreeMap::new();

    for (team, cand) in candidates {
        for &venue in &venues {
            let venue_weight = match (venue, params.venue_weights) {
                (Some(v), Some(w)) => w.weight(v),
                _ => 1.0,
            };
            let coeff = params.alpha * cand.strength
                + (1.0 - params.alpha) * venue_weight * cand.win_prob;
            let name = match venue {
                Some(v) => format!("{team}:{v}"),
                None => team.clone(),
            };
            let idx = model.add_variable(name, cap, coeff);
            var_meta.push((team.as_str(), venue));
            team_vars.entry(team.as_str()).or_default().push(idx);
        }
    }

    let all_vars: Vec<(usize, f64)> = (0..model.variables.len()).map(|i| (i, 1.0)).collect();
    model.add_constraint(
        "total_games",
        all_vars,
        ConstraintSense::Equal,
        params.total_games as f64,
    );

    for (team, indices) in &team_vars {
        model.add_constraint(
            format!("cap:{team}"),
            indices.iter().map(|&i| (i, 1.0)).collect(),
            ConstraintSense::AtMost,
            cap,
        );
    }

    for (team, &ov) in overrides.iter() {
        let Some(indices) = team_vars.get(team.as_str()) else {
            info!("Ignoring override for '{}': not in the candidate set", team);
            continue;
        };
        let terms: Vec<(usize, f64)> = indices.iter().map(|&i| (i, 1.0)).collect();
        match ov {
            Override::ForceCount(n) => {
                model.add_constraint(
                    format!("force:{team}"),
                    terms,
                    ConstraintSense::Equal,
                    n as f64,
                );
            }
            Override::Exclude => {
                model.add_constraint(format!("exclude:{team}"), terms, ConstraintSense::Equal, 0.0);
            }
        }
    }

    debug!(
        "Solving schedule ILP: {} variables, {} constraints ({})",
        model.variables.len(),
        model.constraints.len(),
        backend.name()
    );

    match backend.solve(&model)? {
        IlpOutcome::Infeasible => Ok(ScheduleOutcome::Infeasible),
        IlpOutcome::Optimal(values) => {
            let mut series: Vec<ScheduledSeries> = var_meta
                .iter()
                .zip(&values)
                .filter(|(_, &v)| v > 0.5)
                .map(|(&(team, venue), &v)| ScheduledSeries {
                    team: team.to_string(),
                    venue,
                    games: v.round() as u32,
                })
                .collect();
            series.sort_by(|a, b| a.team.cmp(&b.team).then(a.venue.cmp(&b.venue)));
            Ok(ScheduleOutcome::Optimal(series))
        }
    }
}
