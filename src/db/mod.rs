use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

use crate::ledger::LedgerStore;

pub mod models;
use models::*;

/// SQLite-backed ledger store (single connection behind a mutex).
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `path`. A freshly created bankroll log
    /// is seeded with `starting_bankroll`; the bet log starts empty.
    pub fn open(path: &str, starting_bankroll: f64) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::bootstrap(conn, starting_bankroll)
    }

    /// Private in-memory database for tests.
    #[cfg(test)]
    pub fn open_in_memory(starting_bankroll: f64) -> Result<Self> {
        Self::bootstrap(Connection::open_in_memory()?, starting_bankroll)
    }

    fn bootstrap(conn: Connection, starting_bankroll: f64) -> Result<Self> {
        let bankroll_exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='bankroll'",
            [],
            |row| row.get(0),
        )?;
        conn.execute_batch(SCHEMA_SQL)?;
        if !bankroll_exists {
            conn.execute(
                "INSERT INTO bankroll (recorded_at, amount) VALUES (?1, ?2)",
                params![Utc::now(), starting_bankroll],
            )?;
            info!("Bankroll log created with starting balance {:.2}", starting_bankroll);
        }
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database mutex poisoned"))
    }
}

impl LedgerStore for Database {
    fn append_bet(&self, bet: &Bet) -> Result<()> {
        let conn = self.conn()?;
        insert_bet(&conn, bet)?;
        Ok(())
    }

    fn read_bets(&self) -> Result<Vec<Bet>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT placed_at, handicap, odds, stake, ev, win_p, draw_p, loss_p,
                    fair_odds, result, profit, settled
             FROM bets ORDER BY seq ASC",
        )?;
        let bets = stmt
            .query_map([], map_bet)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bets)
    }

    fn append_transaction(&self, entry: &BankrollEntry) -> Result<()> {
        let conn = self.conn()?;
        insert_transaction(&conn, entry)?;
        Ok(())
    }

    fn commit_settlement(&self, bets: &[Bet], entry: &BankrollEntry) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM bets", [])?;
        for bet in bets {
            insert_bet(&tx, bet)?;
        }
        insert_transaction(&tx, entry)?;
        tx.commit().context("Failed to commit settlement")?;
        Ok(())
    }

    fn read_transactions(&self) -> Result<Vec<BankrollEntry>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT recorded_at, amount FROM bankroll ORDER BY seq ASC")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(BankrollEntry {
                    recorded_at: row.get(0)?,
                    amount: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

fn insert_bet(conn: &Connection, bet: &Bet) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO bets (
            placed_at, handicap, odds, stake, ev, win_p, draw_p, loss_p,
            fair_odds, result, profit, settled
         ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)",
        params![
            bet.placed_at,
            bet.handicap,
            bet.odds,
            bet.stake,
            bet.ev,
            bet.win_p,
            bet.draw_p,
            bet.loss_p,
            bet.fair_odds,
            bet.result.as_deref().unwrap_or(""),
            bet.profit,
            if bet.settled { "YES" } else { "" },
        ],
    )
}

fn insert_transaction(conn: &Connection, entry: &BankrollEntry) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO bankroll (recorded_at, amount) VALUES (?1, ?2)",
        params![entry.recorded_at, entry.amount],
    )
}

fn map_bet(row: &rusqlite::Row) -> rusqlite::Result<Bet> {
    let result: String = row.get(9)?;
    let settled: String = row.get(11)?;
    Ok(Bet {
        placed_at: row.get(0)?,
        handicap: row.get(1)?,
        odds: row.get(2)?,
        stake: row.get(3)?,
        ev: row.get(4)?,
        win_p: row.get(5)?,
        draw_p: row.get(6)?,
        loss_p: row.get(7)?,
        fair_odds: row.get(8)?,
        result: (!result.is_empty()).then_some(result),
        profit: row.get(10)?,
        settled: settled == "YES",
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS).
/// `result` is '' while a bet is open; `settled` is 'YES' or ''.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS bankroll (
    seq         INTEGER PRIMARY KEY,
    recorded_at TEXT    NOT NULL,
    amount      REAL    NOT NULL
);

CREATE TABLE IF NOT EXISTS bets (
    seq        INTEGER PRIMARY KEY,
    placed_at  TEXT    NOT NULL,
    handicap   TEXT    NOT NULL,
    odds       REAL    NOT NULL,
    stake      REAL    NOT NULL,
    ev         REAL,
    win_p      REAL    NOT NULL,
    draw_p     REAL    NOT NULL,
    loss_p     REAL    NOT NULL,
    fair_odds  REAL,
    result     TEXT    NOT NULL DEFAULT '',
    profit     REAL,
    settled    TEXT    NOT NULL DEFAULT ''
);
"#;
