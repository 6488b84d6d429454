use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::optimize::VenueWeights;

/// NCAA softball RPI calculator and schedule optimizer
#[derive(Parser, Debug, Clone)]
#[command(name = "rpi-scheduler", version, about)]
pub struct Config {
    /// SQLite database path
    #[arg(long, env = "DATABASE_PATH", default_value = "rpi_scheduler.db")]
    pub database_path: String,

    /// NCAA scoreboard API base URL
    #[arg(long, env = "NCAA_API_URL", default_value = "https://ncaa-api.henrygd.me")]
    pub api_url: String,

    /// Sport path segment of the scoreboard endpoint
    #[arg(long, env = "SPORT_PATH", default_value = "softball/d1")]
    pub sport_path: String,

    /// Team that win probabilities and the schedule are built for
    #[arg(long, env = "REFERENCE_TEAM", default_value = "Georgia Tech")]
    pub reference_team: String,

    /// Logistic scale applied to RPI strength differences
    #[arg(long, env = "STRENGTH_SCALE", default_value_t = crate::rpi::win_prob::RPI_SCALE)]
    pub strength_scale: f64,

    /// Blend weight between strength and win probability
    /// (1.0 = pure strength, 0.0 = pure win probability)
    #[arg(long, env = "ALPHA", default_value = "0.75")]
    pub alpha: f64,

    /// Total games the optimized schedule must contain
    #[arg(long, env = "TOTAL_GAMES", default_value = "30")]
    pub total_games: u32,

    /// Maximum games against any single opponent
    #[arg(long, env = "PER_TEAM_CAP", default_value = "3")]
    pub per_team_cap: u32,

    /// RPI win-value multiplier for home games
    #[arg(long, env = "HOME_WEIGHT", default_value = "0.7")]
    pub home_weight: f64,

    /// RPI win-value multiplier for away games
    #[arg(long, env = "AWAY_WEIGHT", default_value = "1.3")]
    pub away_weight: f64,

    /// RPI win-value multiplier for neutral-site games
    #[arg(long, env = "NEUTRAL_WEIGHT", default_value = "1.0")]
    pub neutral_weight: f64,

    /// Conference opponents, comma-separated; scheduled by the conference,
    /// so never candidates for optimization
    #[arg(
        long,
        env = "CONFERENCE_TEAMS",
        value_delimiter = ',',
        default_value = "Duke,Florida State,Clemson,Virginia Tech,Wake Forest,Louisville,North Carolina,Pittsburgh,Syracuse,Virginia,NC State,Miami,Boston College"
    )]
    pub conference_teams: Vec<String>,

    /// First day of the season to fetch (YYYY-MM-DD)
    #[arg(long, env = "SEASON_START", default_value = "2025-02-01")]
    pub season_start: NaiveDate,

    /// Last day of the season to fetch (YYYY-MM-DD)
    #[arg(long, env = "SEASON_END", default_value = "2025-05-15")]
    pub season_end: NaiveDate,

    /// Pause between scoreboard request batches, in seconds
    #[arg(long, env = "THROTTLE_SECS", default_value = "1")]
    pub throttle_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch a season of final scores and store the game records
    Fetch {
        /// Drop previously stored game records first
        #[arg(long)]
        refresh: bool,
    },
    /// Compute RPI components and win probabilities from stored game records
    Rank {
        /// Use ELO ratings from the rankings table as the strength metric
        /// (standard 400-point logistic) instead of RPI
        #[arg(long)]
        use_elo: bool,
    },
    /// Solve for the optimal non-conference schedule
    Optimize {
        /// Force an opponent to an exact game count, e.g. "Stanford=2" (repeatable)
        #[arg(long = "force", value_name = "TEAM=N")]
        force: Vec<String>,
        /// Exclude an opponent entirely (repeatable)
        #[arg(long = "exclude", value_name = "TEAM")]
        exclude: Vec<String>,
        /// Ignore venue splits and weights (one variable per opponent)
        #[arg(long)]
        venue_agnostic: bool,
    },
    /// Evaluate the expected RPI of a hand-built schedule
    Whatif {
        /// A scheduled game as "Opponent@venue" (home|away|neutral), repeatable
        #[arg(long = "game", value_name = "TEAM@VENUE")]
        games: Vec<String>,
    },
    /// Merge an RPI ranking export with an ELO ratings table
    Rankings {
        /// JSON array of {"team", "rpi"} objects
        #[arg(long)]
        rpi_file: String,
        /// JSON object mapping team name to ELO rating
        #[arg(long)]
        elo_file: String,
    },
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.reference_team.trim().is_empty() {
            anyhow::bail!("reference_team must not be empty");
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            anyhow::bail!("alpha must be between 0.0 and 1.0");
        }
        if self.total_games == 0 {
            anyhow::bail!("total_games must be positive");
        }
        if self.per_team_cap == 0 {
            anyhow::bail!("per_team_cap must be positive");
        }
        if !self.strength_scale.is_finite() || self.strength_scale <= 0.0 {
            anyhow::bail!("strength_scale must be finite and positive");
        }
        for (name, w) in [
            ("home_weight", self.home_weight),
            ("away_weight", self.away_weight),
            ("neutral_weight", self.neutral_weight),
        ] {
            if !w.is_finite() || w <= 0.0 {
                anyhow::bail!("{name} must be finite and positive");
            }
        }
        if self.season_start > self.season_end {
            anyhow::bail!("season_start must not be after season_end");
        }
        Ok(())
    }

    pub fn venue_weights(&self) -> VenueWeights {
        VenueWeights {
            home: self.home_weight,
            away: self.away_weight,
            neutral: self.neutral_weight,
        }
    }
}
