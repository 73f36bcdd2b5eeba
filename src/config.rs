use clap::{Args, Parser, Subcommand};

use crate::bot::model::TeamSignals;

/// Pre-match Asian Handicap betting assistant
#[derive(Parser, Debug, Clone)]
#[command(name = "ah-betting-assistant", version, about)]
pub struct Config {
    /// Work on a throwaway in-memory ledger (nothing is persisted)
    #[arg(long, env = "DRY_RUN", default_value = "false")]
    pub dry_run: bool,

    /// SQLite database path holding the bet and bankroll logs
    #[arg(long, env = "DATABASE_PATH", default_value = "ah_betting.db")]
    pub database_path: String,

    /// Seed amount written when the bankroll log is first created
    #[arg(long, env = "STARTING_BANKROLL", default_value = "5000.0")]
    pub starting_bankroll: f64,

    /// football-data.org API base URL
    #[arg(
        long,
        env = "FOOTBALL_DATA_URL",
        default_value = "https://api.football-data.org/v4"
    )]
    pub football_data_url: String,

    /// football-data.org API key (needed for fetch-stats)
    #[arg(long, env = "FOOTBALL_DATA_API_KEY")]
    pub football_data_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Suggest a handicap line and fair odds; optionally price and place the bet
    Analyze {
        #[command(flatten)]
        team_a: TeamAArgs,

        #[command(flatten)]
        team_b: TeamBArgs,

        /// Bookmaker decimal odds for the line, to compute EV and stake
        #[arg(long)]
        odds: Option<f64>,

        /// Price this line instead of the suggested one (e.g. "AH -0.25")
        #[arg(long, allow_hyphen_values = true)]
        line: Option<String>,

        /// Save the bet to the ledger if it is recommended
        #[arg(long, requires = "odds")]
        save: bool,
    },

    /// Expected value of a line at the given odds and probabilities
    Ev {
        /// Handicap label, e.g. "AH +0.25" or "-0.5"
        #[arg(allow_hyphen_values = true)]
        line: String,
        #[arg(long)]
        win: f64,
        #[arg(long)]
        draw: f64,
        #[arg(long)]
        loss: f64,
        #[arg(long)]
        odds: f64,
    },

    /// Fetch normalised team signals from football-data.org
    FetchStats {
        team: String,
        /// Fetch for the away side (home advantage forced to 0)
        #[arg(long)]
        away: bool,
        #[arg(long, default_value = "Premier League")]
        league: String,
    },

    /// Record a bet directly
    Place {
        #[arg(long, allow_hyphen_values = true)]
        line: String,
        #[arg(long)]
        odds: f64,
        #[arg(long)]
        stake: f64,
        #[arg(long)]
        ev: Option<f64>,
        #[arg(long, default_value = "0.0")]
        win: f64,
        #[arg(long, default_value = "0.0")]
        draw: f64,
        #[arg(long, default_value = "0.0")]
        loss: f64,
        #[arg(long)]
        fair_odds: Option<f64>,
    },

    /// Settle the last bet: WIN, "HALF WIN", PUSH, "HALF LOSS" or LOSS
    Settle { result: String },

    /// Show the current bankroll
    Bankroll,

    /// Add money to the bankroll
    Deposit { amount: f64 },

    /// List all bets with a profit summary
    History,
}

#[derive(Args, Debug, Clone)]
pub struct TeamAArgs {
    #[arg(long, default_value = "0.5")]
    pub a_form: f64,
    #[arg(long, default_value = "0.5")]
    pub a_goal_diff: f64,
    #[arg(long, default_value = "0.5")]
    pub a_home: f64,
    #[arg(long, default_value = "0.5")]
    pub a_defense: f64,
}

#[derive(Args, Debug, Clone)]
pub struct TeamBArgs {
    #[arg(long, default_value = "0.5")]
    pub b_form: f64,
    #[arg(long, default_value = "0.5")]
    pub b_goal_diff: f64,
    #[arg(long, default_value = "0.5")]
    pub b_home: f64,
    #[arg(long, default_value = "0.5")]
    pub b_defense: f64,
}

impl From<&TeamAArgs> for TeamSignals {
    fn from(a: &TeamAArgs) -> Self {
        TeamSignals::new(a.a_form, a.a_goal_diff, a.a_home, a.a_defense)
    }
}

impl From<&TeamBArgs> for TeamSignals {
    fn from(b: &TeamBArgs) -> Self {
        TeamSignals::new(b.b_form, b.b_goal_diff, b.b_home, b.b_defense)
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.starting_bankroll <= 0.0 {
            anyhow::bail!("starting_bankroll must be positive");
        }
        match &self.command {
            Command::Analyze {
                team_a,
                team_b,
                odds,
                ..
            } => {
                if !TeamSignals::from(team_a).is_normalised()
                    || !TeamSignals::from(team_b).is_normalised()
                {
                    anyhow::bail!("team signals must be between 0.0 and 1.0");
                }
                if let Some(odds) = odds {
                    validate_odds(*odds)?;
                }
            }
            Command::Ev {
                win,
                draw,
                loss,
                odds,
                ..
            } => {
                if ![win, draw, loss].iter().all(|p| (0.0..=1.0).contains(*p)) {
                    anyhow::bail!("probabilities must be between 0.0 and 1.0");
                }
                validate_odds(*odds)?;
            }
            Command::Place { odds, stake, .. } => {
                validate_odds(*odds)?;
                if *stake <= 0.0 {
                    anyhow::bail!("stake must be positive");
                }
            }
            Command::Deposit { amount } => {
                if *amount <= 0.0 {
                    anyhow::bail!("deposit amount must be positive");
                }
            }
            Command::FetchStats { .. }
            | Command::Settle { .. }
            | Command::Bankroll
            | Command::History => {}
        }
        Ok(())
    }
}

fn validate_odds(odds: f64) -> anyhow::Result<()> {
    if odds <= 1.0 {
        anyhow::bail!("decimal odds must be greater than 1.0, got {}", odds);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["ah-betting-assistant"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_analyze_defaults_to_neutral_signals() {
        let config = parse(&["analyze"]);
        match config.command {
            Command::Analyze { team_a, team_b, odds, save, .. } => {
                assert_eq!(TeamSignals::from(&team_a), TeamSignals::neutral());
                assert_eq!(TeamSignals::from(&team_b), TeamSignals::neutral());
                assert!(odds.is_none());
                assert!(!save);
            }
            other => panic!("Expected Analyze, got {:?}", other),
        }
        assert!(parse(&["analyze"]).validate().is_ok());
    }

    #[test]
    fn test_out_of_range_signal_rejected() {
        assert!(parse(&["analyze", "--a-form", "1.4"]).validate().is_err());
    }

    #[test]
    fn test_save_requires_odds() {
        assert!(Config::try_parse_from(["ah-betting-assistant", "analyze", "--save"]).is_err());
    }

    #[test]
    fn test_ev_accepts_negative_line() {
        let config = parse(&[
            "ev", "-0.5", "--win", "0.5", "--draw", "0.2", "--loss", "0.3", "--odds", "2.0",
        ]);
        match &config.command {
            Command::Ev { line, .. } => assert_eq!(line, "-0.5"),
            other => panic!("Expected Ev, got {:?}", other),
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_odds_must_exceed_one() {
        assert!(parse(&["analyze", "--odds", "1.0"]).validate().is_err());
        assert!(parse(&["deposit", "0"]).validate().is_err());
        assert!(parse(&["--starting-bankroll", "0", "bankroll"]).validate().is_err());
    }
}
