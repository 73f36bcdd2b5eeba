//! Bet ledger and bankroll bookkeeping.
//!
//! Two logs are kept: bets (open → settled) and signed bankroll movements.
//! The bankroll is never stored, only derived as the sum of its log.
//!
//! Only the most recent bet is ever inspected for the single-open-bet rule and
//! for settlement. An older bet left open (e.g. from hand-edited data) is not
//! detected; that is the behaviour historical ledgers were built with.
//!
//! Settlement grading labels are normalised: case is ignored, `_` and `-`
//! read as spaces, and the canonical label (`WIN`, `HALF WIN`, ...) is what
//! gets stored. Anything still unrecognised grades and is stored as `LOSS`.
//!
//! Settling writes the graded bet and its bankroll movement through one
//! [`LedgerStore::commit_settlement`] call, so a failed write never leaves a
//! settled bet without its profit booked.

pub mod store;

pub use store::{LedgerStore, MemoryStore};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

use crate::bot::model::round_to;
use crate::db::models::{BankrollEntry, Bet, BetTicket};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("an open bet already exists; settle it first")]
    OpenBetExists,

    #[error("no bets to settle")]
    NoBetsToSettle,

    #[error("this bet has already been settled")]
    AlreadySettled,

    #[error("amount must be positive, got {0}")]
    InvalidAmount(f64),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// How a bet was graded by the bookmaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementOutcome {
    Win,
    HalfWin,
    Push,
    HalfLoss,
    Loss,
}

impl SettlementOutcome {
    /// Parse a grading label, ignoring case and reading `_`/`-` as spaces, so
    /// `win` and `half_loss` grade as their canonical forms. Anything still
    /// unrecognised grades as a loss.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_uppercase().replace(['_', '-'], " ").as_str() {
            "WIN" => SettlementOutcome::Win,
            "HALF WIN" => SettlementOutcome::HalfWin,
            "PUSH" => SettlementOutcome::Push,
            "HALF LOSS" => SettlementOutcome::HalfLoss,
            _ => SettlementOutcome::Loss,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SettlementOutcome::Win => "WIN",
            SettlementOutcome::HalfWin => "HALF WIN",
            SettlementOutcome::Push => "PUSH",
            SettlementOutcome::HalfLoss => "HALF LOSS",
            SettlementOutcome::Loss => "LOSS",
        }
    }

    /// Profit for a stake at decimal `odds`. Unrounded.
    pub fn profit(self, stake: f64, odds: f64) -> f64 {
        match self {
            SettlementOutcome::Win => stake * (odds - 1.0),
            SettlementOutcome::HalfWin => 0.5 * stake * (odds - 1.0),
            SettlementOutcome::Push => 0.0,
            SettlementOutcome::HalfLoss => -0.5 * stake,
            SettlementOutcome::Loss => -stake,
        }
    }
}

impl fmt::Display for SettlementOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Aggregate view over the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub total_bets: usize,
    pub settled_bets: usize,
    pub winning_bets: usize,
    pub total_profit: f64,
    pub bankroll: f64,
    /// Running profit after each settled bet, in ledger order.
    pub cumulative_profit: Vec<f64>,
}

pub struct Ledger<S> {
    store: S,
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Ledger { store }
    }

    /// Append a new open bet unless the most recent bet is still open.
    pub fn save_bet(&self, ticket: BetTicket) -> Result<Bet, LedgerError> {
        let bets = self.store.read_bets()?;
        if bets.last().is_some_and(Bet::is_open) {
            warn!("Refusing to save bet on {}: an open bet exists", ticket.handicap);
            return Err(LedgerError::OpenBetExists);
        }
        let bet = Bet::open(ticket, Utc::now());
        self.store.append_bet(&bet)?;
        info!(
            "Bet saved: {} @ {:.2}, stake {:.2}, ev {:?}",
            bet.handicap, bet.odds, bet.stake, bet.ev
        );
        Ok(bet)
    }

    /// Grade the most recent bet, book its profit and return the new bankroll.
    pub fn settle_last_bet(&self, label: &str) -> Result<f64, LedgerError> {
        let mut bets = self.store.read_bets()?;
        let last = bets.last_mut().ok_or(LedgerError::NoBetsToSettle)?;
        if !last.is_open() {
            return Err(LedgerError::AlreadySettled);
        }

        let outcome = SettlementOutcome::from_label(label);
        let profit = round_to(outcome.profit(last.stake, last.odds), 2);
        last.result = Some(outcome.label().to_string());
        last.profit = Some(profit);
        last.settled = true;
        let handicap = last.handicap.clone();

        let entry = BankrollEntry {
            recorded_at: Utc::now(),
            amount: profit,
        };
        self.store.commit_settlement(&bets, &entry)?;

        let bankroll = self.bankroll()?;
        info!(
            "Bet on {} settled as {}: profit {:.2}, bankroll {:.2}",
            handicap, outcome, profit, bankroll
        );
        Ok(bankroll)
    }

    /// Sum of every bankroll movement, rounded to 2 decimals.
    pub fn bankroll(&self) -> Result<f64, LedgerError> {
        let total: f64 = self
            .store
            .read_transactions()?
            .iter()
            .map(|entry| entry.amount)
            .sum();
        Ok(round_to(total, 2))
    }

    /// Append a signed bankroll movement, rounded to 2 decimals.
    pub fn update_bankroll(&self, amount: f64) -> Result<(), LedgerError> {
        let entry = BankrollEntry {
            recorded_at: Utc::now(),
            amount: round_to(amount, 2),
        };
        self.store.append_transaction(&entry)?;
        Ok(())
    }

    /// Add funds. Only positive amounts are accepted.
    pub fn deposit(&self, amount: f64) -> Result<f64, LedgerError> {
        if amount.is_nan() || amount <= 0.0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.update_bankroll(amount)?;
        let bankroll = self.bankroll()?;
        info!("Deposited {:.2}, bankroll {:.2}", amount, bankroll);
        Ok(bankroll)
    }

    pub fn bets(&self) -> Result<Vec<Bet>, LedgerError> {
        Ok(self.store.read_bets()?)
    }

    pub fn summary(&self) -> Result<LedgerSummary, LedgerError> {
        let bets = self.store.read_bets()?;
        let mut running = 0.0;
        let cumulative_profit: Vec<f64> = bets
            .iter()
            .filter_map(|bet| bet.profit)
            .map(|profit| {
                running += profit;
                round_to(running, 2)
            })
            .collect();
        Ok(LedgerSummary {
            total_bets: bets.len(),
            settled_bets: bets.iter().filter(|b| b.settled).count(),
            winning_bets: bets
                .iter()
                .filter(|b| b.profit.is_some_and(|p| p > 0.0))
                .count(),
            total_profit: cumulative_profit.last().copied().unwrap_or(0.0),
            bankroll: self.bankroll()?,
            cumulative_profit,
        })
    }
}
