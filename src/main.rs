use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

mod config;
mod db;
mod ingest;
mod optimize;
mod rpi;
mod whatif;

use config::{Command, Config};
use db::models::TeamStats;
use db::Database;
use ingest::normalize_team_name;
use optimize::solver::MicrolpSolver;
use optimize::{Candidate, OverrideSet, ScheduleOutcome, ScheduleParams, Venue};
use rpi::win_prob::WinProbTable;
use whatif::SimulatedSchedule;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let db = Database::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);

    match config.command.clone() {
        Command::Fetch { refresh } => fetch(&config, &db, refresh).await,
        Command::Rank { use_elo } => rank(&config, &db, use_elo),
        Command::Optimize {
            force,
            exclude,
            venue_agnostic,
        } => run_optimize(&config, &db, &force, &exclude, venue_agnostic),
        Command::Whatif { games } => run_whatif(&config, &db, &games),
        Command::Rankings { rpi_file, elo_file } => run_rankings(&db, &rpi_file, &elo_file),
    }
}

async fn fetch(config: &Config, db: &Database, refresh: bool) -> Result<()> {
    let provider = ingest::NcaaApi::new(Some(&config.api_url), Some(&config.sport_path))?;
    let records = ingest::fetch_season(
        &provider,
        config.season_start,
        config.season_end,
        Duration::from_secs(config.throttle_secs),
    )
    .await?;

    if refresh {
        db.clear_game_records()?;
    }
    db.insert_game_records(&records)?;
    info!(
        "Stored {} game records ({} total in database)",
        records.len(),
        db.game_count()?
    );
    Ok(())
}

fn rank(config: &Config, db: &Database, use_elo: bool) -> Result<()> {
    let games = db.load_game_records()?;
    let components = rpi::compute_rpi(&games);
    if components.is_empty() {
        warn!("No stored game records; stats table is now empty");
        db.replace_team_stats(&[])?;
        return Ok(());
    }

    // Strength metric for the win-probability model: RPI from the game log,
    // or the externally sourced ELO ratings with the standard 400-point scale
    let (strengths, scale): (BTreeMap<String, f64>, f64) = if use_elo {
        let elo = db
            .load_rankings()?
            .into_iter()
            .filter_map(|r| r.elo.map(|rating| (r.team, rating)))
            .collect();
        (elo, rpi::win_prob::ELO_SCALE)
    } else {
        let by_rpi = components
            .iter()
            .map(|(team, c)| (team.clone(), c.rpi))
            .collect();
        (by_rpi, config.strength_scale)
    };
    let reference = normalize_team_name(&config.reference_team);
    let win_probs = WinProbTable::from_strengths(&strengths, &reference, scale)?;

    // Teams absent from the strength table get no win-probability entry and
    // therefore no stats row (only possible in ELO mode)
    let mut stats: Vec<TeamStats> = components
        .iter()
        .filter_map(|(team, c)| {
            let entry = win_probs.get(team)?;
            Some(TeamStats {
                team: team.clone(),
                wp: c.wp,
                owp: c.owp,
                oowp: c.oowp,
                rpi: c.rpi,
                win_prob_vs_reference: entry.win_prob_vs_reference,
            })
        })
        .collect();
    if stats.len() < components.len() {
        warn!(
            "{} teams have no rating entry and were skipped",
            components.len() - stats.len()
        );
    }
    db.replace_team_stats(&stats)?;
    info!("Computed RPI for {} teams (reference: {})", stats.len(), reference);

    stats.sort_by(|a, b| b.rpi.partial_cmp(&a.rpi).unwrap_or(std::cmp::Ordering::Equal));
    println!(
        "{:<4} {:<28} {:>6} {:>6} {:>6} {:>6} {:>8}",
        "#", "Team", "WP", "OWP", "OOWP", "RPI", "WinProb"
    );
    for (i, s) in stats.iter().take(25).enumerate() {
        println!(
            "{:<4} {:<28} {:>6.3} {:>6.3} {:>6.3} {:>6.4} {:>8.3}",
            i + 1,
            s.team,
            s.wp,
            s.owp,
            s.oowp,
            s.rpi,
            s.win_prob_vs_reference
        );
    }
    Ok(())
}

fn run_optimize(
    config: &Config,
    db: &Database,
    force: &[String],
    exclude: &[String],
    venue_agnostic: bool,
) -> Result<()> {
    let stats = db.load_team_stats()?;
    if stats.is_empty() {
        anyhow::bail!("No team stats stored; run `rank` first");
    }

    let reference = normalize_team_name(&config.reference_team);
    let conference: Vec<String> = config
        .conference_teams
        .iter()
        .map(|t| normalize_team_name(t))
        .collect();
    let candidates: BTreeMap<String, Candidate> = stats
        .iter()
        .filter(|s| s.team != reference && !conference.contains(&s.team))
        .map(|s| {
            (
                s.team.clone(),
                Candidate {
                    strength: s.rpi,
                    win_prob: s.win_prob_vs_reference,
                },
            )
        })
        .collect();
    info!(
        "{} candidate opponents ({} teams total, {} conference teams excluded)",
        candidates.len(),
        stats.len(),
        stats.len() - candidates.len()
    );

    let mut overrides = OverrideSet::new();
    for spec in force {
        let (team, count) = parse_force(spec, config.per_team_cap)?;
        overrides.force(team, count);
    }
    for team in exclude {
        overrides.exclude(normalize_team_name(team));
    }

    let params = ScheduleParams {
        total_games: config.total_games,
        alpha: config.alpha,
        per_team_cap: config.per_team_cap,
        venue_weights: (!venue_agnostic).then(|| config.venue_weights()),
    };

    match optimize::optimize(&candidates, &params, &overrides, &MicrolpSolver)? {
        ScheduleOutcome::Infeasible => {
            println!(
                "No feasible schedule: {} games cannot be reached under the current cap ({}) and overrides.",
                config.total_games, config.per_team_cap
            );
            println!("Relax an override or lower --total-games, then retry.");
        }
        ScheduleOutcome::Optimal(series) => {
            println!("{:<28} {:>8} {:>6}", "Team", "Venue", "Games");
            for row in &series {
                println!(
                    "{:<28} {:>8} {:>6}",
                    row.team,
                    row.venue.map(Venue::as_str).unwrap_or("-"),
                    row.games
                );
            }
            let total: u32 = series.iter().map(|s| s.games).sum();
            println!("Total: {} games across {} series", total, series.len());
        }
    }
    Ok(())
}

fn run_whatif(config: &Config, db: &Database, games: &[String]) -> Result<()> {
    let stats_by_team: BTreeMap<String, TeamStats> = db
        .load_team_stats()?
        .into_iter()
        .map(|s| (s.team.clone(), s))
        .collect();

    let mut schedule = SimulatedSchedule::new();
    for spec in games {
        let (opponent, venue) = parse_game(spec)?;
        schedule.add(opponent, venue);
    }
    for game in schedule.entries() {
        if !stats_by_team.contains_key(&game.opponent) {
            warn!(
                "No stats for '{}'; that game is excluded from the estimate",
                game.opponent
            );
        }
    }

    let expected = whatif::expected_rpi(&schedule, &stats_by_team, &config.venue_weights());
    println!(
        "Expected RPI over {} scheduled game(s): {:.4}",
        schedule.len(),
        expected
    );
    Ok(())
}

fn run_rankings(db: &Database, rpi_file: &str, elo_file: &str) -> Result<()> {
    let rankings = ingest::rankings::load_rpi_rankings(rpi_file)?;
    let elo = ingest::rankings::load_elo_ratings(elo_file)?;
    let merged = ingest::rankings::merge_rankings(&rankings, &elo);
    let with_elo = merged.iter().filter(|r| r.elo.is_some()).count();
    db.replace_rankings(&merged)?;
    info!(
        "Stored {} cleaned ranking rows ({} with an ELO rating)",
        merged.len(),
        with_elo
    );
    Ok(())
}

/// Parse a "TEAM=N" force override. Counts above the per-team cap are
/// rejected here with a pointed message rather than surfacing later as
/// blanket model infeasibility.
fn parse_force(spec: &str, cap: u32) -> Result<(String, u32)> {
    let (team, count) = spec
        .rsplit_once('=')
        .ok_or_else(|| anyhow::anyhow!("invalid --force '{spec}', expected TEAM=N"))?;
    let count: u32 = count
        .trim()
        .parse()
        .with_context(|| format!("invalid game count in --force '{spec}'"))?;
    if count > cap {
        anyhow::bail!("--force '{spec}' exceeds the per-team cap of {cap} games");
    }
    Ok((normalize_team_name(team), count))
}

/// Parse a "TEAM@VENUE" scheduled game
fn parse_game(spec: &str) -> Result<(String, Venue)> {
    let (team, venue) = spec
        .rsplit_once('@')
        .ok_or_else(|| anyhow::anyhow!("invalid --game '{spec}', expected TEAM@VENUE"))?;
    Ok((normalize_team_name(team), venue.parse()?))
}
