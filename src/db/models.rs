use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything needed to open a bet; produced after analysis and EV sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetTicket {
    /// Line label, e.g. "AH -0.5"
    pub handicap: String,
    /// Bookmaker decimal odds
    pub odds: f64,
    pub stake: f64,
    pub ev: Option<f64>,
    pub win_p: f64,
    pub draw_p: f64,
    pub loss_p: f64,
    pub fair_odds: Option<f64>,
}

/// A persisted bet. Open while `result` is empty; settled exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub placed_at: DateTime<Utc>,
    pub handicap: String,
    pub odds: f64,
    pub stake: f64,
    pub ev: Option<f64>,
    pub win_p: f64,
    pub draw_p: f64,
    pub loss_p: f64,
    pub fair_odds: Option<f64>,
    /// "WIN" | "HALF WIN" | "PUSH" | "HALF LOSS" | "LOSS"; empty while open
    pub result: Option<String>,
    pub profit: Option<f64>,
    pub settled: bool,
}

impl Bet {
    pub fn open(ticket: BetTicket, placed_at: DateTime<Utc>) -> Self {
        Bet {
            placed_at,
            handicap: ticket.handicap,
            odds: ticket.odds,
            stake: ticket.stake,
            ev: ticket.ev,
            win_p: ticket.win_p,
            draw_p: ticket.draw_p,
            loss_p: ticket.loss_p,
            fair_odds: ticket.fair_odds,
            result: None,
            profit: None,
            settled: false,
        }
    }

    /// An empty result field is what marks a bet as open.
    pub fn is_open(&self) -> bool {
        self.result.as_deref().map_or(true, str::is_empty)
    }
}

/// One signed bankroll movement: a deposit, the seed, or a settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankrollEntry {
    pub recorded_at: DateTime<Utc>,
    pub amount: f64,
}
