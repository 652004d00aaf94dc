//! Connection ownership and transaction scoping.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{LedgerError, Result};

/// The ledger's database handle.
///
/// Several `Store`s (in one process or many) may share one database file;
/// SQLite's write lock serializes their immediate transactions.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) and migrate the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_connection(stamp_db::open(path)?))
    }

    /// An in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        Ok(Self::from_connection(stamp_db::open_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| LedgerError::Poisoned)
    }

    /// Run `f` inside a `BEGIN IMMEDIATE` transaction. Commits when `f`
    /// succeeds and rolls back otherwise.
    pub fn write<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Run `f` inside a read transaction so it sees one snapshot.
    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}
