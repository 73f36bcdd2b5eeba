use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex};

use crate::db::models::{BankrollEntry, Bet};

/// Ordered log storage behind the ledger.
///
/// Bets are read with a full scan and replaced wholesale on settlement; the
/// bankroll log only ever grows. Implementations must return records in
/// insertion order.
pub trait LedgerStore {
    fn append_bet(&self, bet: &Bet) -> Result<()>;

    fn read_bets(&self) -> Result<Vec<Bet>>;

    fn append_transaction(&self, entry: &BankrollEntry) -> Result<()>;

    /// Replace the entire bet log with `bets` (order kept) and append `entry`,
    /// as one unit: either both land or neither does.
    fn commit_settlement(&self, bets: &[Bet], entry: &BankrollEntry) -> Result<()>;

    fn read_transactions(&self) -> Result<Vec<BankrollEntry>>;
}

/// In-process store, used by tests and dry runs.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryLogs>>,
}

#[derive(Default)]
struct MemoryLogs {
    bets: Vec<Bet>,
    transactions: Vec<BankrollEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose bankroll log starts with one seed entry.
    pub fn seeded(starting_bankroll: f64) -> Self {
        let store = Self::new();
        if let Ok(mut logs) = store.inner.lock() {
            logs.transactions.push(BankrollEntry {
                recorded_at: chrono::Utc::now(),
                amount: starting_bankroll,
            });
        }
        store
    }

    fn logs(&self) -> Result<std::sync::MutexGuard<'_, MemoryLogs>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("memory store mutex poisoned"))
    }
}

impl LedgerStore for MemoryStore {
    fn append_bet(&self, bet: &Bet) -> Result<()> {
        self.logs()?.bets.push(bet.clone());
        Ok(())
    }

    fn read_bets(&self) -> Result<Vec<Bet>> {
        Ok(self.logs()?.bets.clone())
    }

    fn append_transaction(&self, entry: &BankrollEntry) -> Result<()> {
        self.logs()?.transactions.push(entry.clone());
        Ok(())
    }

    fn commit_settlement(&self, bets: &[Bet], entry: &BankrollEntry) -> Result<()> {
        let mut logs = self.logs()?;
        logs.bets = bets.to_vec();
        logs.transactions.push(entry.clone());
        Ok(())
    }

    fn read_transactions(&self) -> Result<Vec<BankrollEntry>> {
        Ok(self.logs()?.transactions.clone())
    }
}
