use anyhow::Result;
use clap::Parser;
use tracing::info;

mod bot;
mod config;
mod db;
mod ledger;
mod stats;

use bot::engine::AnalysisResult;
use bot::ev::expected_value_for_label;
use bot::handicap::HandicapLine;
use bot::model::{OutcomeProbabilities, TeamSignals};
use bot::AdvisorEngine;
use config::{Command, Config};
use db::models::BetTicket;
use db::Database;
use ledger::{Ledger, LedgerStore, MemoryStore};
use stats::{FootballData, StatsProvider};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    config.validate()?;

    if config.dry_run {
        info!(
            "🟡 DRY RUN mode – in-memory ledger, nothing persisted (bankroll: {:.2})",
            config.starting_bankroll
        );
        let engine = AdvisorEngine::new(Ledger::new(MemoryStore::seeded(config.starting_bankroll)));
        run(&config, &engine).await
    } else {
        let db = Database::open(&config.database_path, config.starting_bankroll)?;
        info!("Database opened: {}", config.database_path);
        let engine = AdvisorEngine::new(Ledger::new(db));
        run(&config, &engine).await
    }
}

async fn run<S: LedgerStore>(config: &Config, engine: &AdvisorEngine<S>) -> Result<()> {
    match &config.command {
        Command::Analyze {
            team_a,
            team_b,
            odds,
            line,
            save,
        } => {
            let analysis = engine.analyze(&TeamSignals::from(team_a), &TeamSignals::from(team_b));
            print_analysis(&analysis);

            let Some(odds) = odds else {
                return Ok(());
            };
            let line = match line {
                Some(label) => label.parse::<HandicapLine>()?,
                None => analysis.handicap,
            };
            let decision = engine.decide(&analysis, line, *odds)?;
            println!();
            println!("Bookmaker odds:   {:.2}", decision.odds);
            println!("EV:               {:.3}", decision.ev);
            if decision.recommended {
                println!(
                    "✅ BET RECOMMENDED on {} | stake {:.2}",
                    decision.handicap, decision.stake
                );
            } else {
                println!("❌ SKIP BET | EV is negative or too low: {:.3}", decision.ev);
            }

            if *save {
                if decision.recommended {
                    let bet = engine.place_bet(decision.ticket(&analysis))?;
                    println!("Bet saved: {} @ {:.2}, stake {:.2}", bet.handicap, bet.odds, bet.stake);
                } else {
                    println!("Not saved: bet is not recommended.");
                }
            }
        }

        Command::Ev {
            line,
            win,
            draw,
            loss,
            odds,
        } => {
            let probs = OutcomeProbabilities {
                win: *win,
                draw: *draw,
                loss: *loss,
            };
            let ev = expected_value_for_label(line, &probs, *odds)?;
            let bankroll = engine.current_bankroll()?;
            println!("EV:     {:.3}", ev);
            println!("Stake:  {:.2}", engine.recommend_stake(bankroll, Some(ev)));
        }

        Command::FetchStats { team, away, league } => {
            let provider = FootballData::new(
                config.football_data_api_key.as_deref(),
                Some(config.football_data_url.as_str()),
            )?;
            info!("Fetching {} stats from {}", team, provider.name());
            match provider.fetch_team_signals(team, !away, league).await {
                Some(s) => println!(
                    "{}: form {:.2} | goal diff {:.2} | home {:.2} | defense {:.2}",
                    team, s.form, s.goal_diff, s.home_adv, s.defense
                ),
                None => anyhow::bail!(
                    "Could not fetch stats for {} in {}. Check team name or API key.",
                    team,
                    league
                ),
            }
        }

        Command::Place {
            line,
            odds,
            stake,
            ev,
            win,
            draw,
            loss,
            fair_odds,
        } => {
            let handicap: HandicapLine = line.parse()?;
            let bet = engine.place_bet(BetTicket {
                handicap: handicap.label().to_string(),
                odds: *odds,
                stake: *stake,
                ev: *ev,
                win_p: *win,
                draw_p: *draw,
                loss_p: *loss,
                fair_odds: *fair_odds,
            })?;
            println!("Bet saved: {} @ {:.2}, stake {:.2}", bet.handicap, bet.odds, bet.stake);
        }

        Command::Settle { result } => {
            let bankroll = engine.settle(result)?;
            println!("Bet settled. New bankroll: {:.2}", bankroll);
        }

        Command::Bankroll => {
            println!("Bankroll: {:.2}", engine.current_bankroll()?);
        }

        Command::Deposit { amount } => {
            let bankroll = engine.deposit(*amount)?;
            println!("{:.2} added. Bankroll: {:.2}", amount, bankroll);
        }

        Command::History => {
            let bets = engine.history()?;
            if bets.is_empty() {
                println!("No bets yet.");
            }
            for bet in &bets {
                println!(
                    "{}  {:<9} @ {:>5.2}  stake {:>8.2}  ev {:>6}  {:<9}  profit {}",
                    bet.placed_at.format("%Y-%m-%d %H:%M"),
                    bet.handicap,
                    bet.odds,
                    bet.stake,
                    bet.ev.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "-".into()),
                    bet.result.as_deref().unwrap_or("OPEN"),
                    bet.profit.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".into()),
                );
            }
            let summary = engine.summary()?;
            println!();
            println!(
                "Bets: {} ({} settled, {} won) | profit {:.2} | bankroll {:.2}",
                summary.total_bets,
                summary.settled_bets,
                summary.winning_bets,
                summary.total_profit,
                summary.bankroll
            );
            if !summary.cumulative_profit.is_empty() {
                let series: Vec<String> = summary
                    .cumulative_profit
                    .iter()
                    .map(|v| format!("{:.2}", v))
                    .collect();
                println!("Cumulative profit: {}", series.join(" → "));
            }
        }
    }
    Ok(())
}

fn print_analysis(analysis: &AnalysisResult) {
    let p = &analysis.probabilities;
    println!(
        "Expected goals:   A {:.2} vs B {:.2}",
        analysis.expected_goals_a, analysis.expected_goals_b
    );
    println!("Win / Draw / Loss: {:.3} / {:.3} / {:.3}", p.win, p.draw, p.loss);
    println!("Strength diff:    {:+.2}", analysis.differential());
    println!("Suggested line:   {}", analysis.handicap);
    match analysis.fair_odds {
        Some(odds) => println!("Fair odds:        {:.2}", odds),
        None => println!("Fair odds:        undefined"),
    }
    let alternatives: Vec<&str> = analysis
        .handicap
        .alternatives()
        .iter()
        .map(|line| line.label())
        .collect();
    println!("If unavailable:   {}", alternatives.join(", "));
}
