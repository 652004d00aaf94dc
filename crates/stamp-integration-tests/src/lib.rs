//! End-to-end tests for the stamp ledger.
//!
//! The tests under `tests/` drive the ledger through its public API
//! against a real database file, with several `Ledger` handles (each with
//! its own connection) racing on the same file the way independent
//! daemon workers would.
//!
//! Run them with:
//! ```sh
//! cargo test -p stamp-integration-tests
//! ```

use std::path::{Path, PathBuf};

use stamp_ledger::params::{EnsureBusiness, EnsureCustomerCard};
use stamp_ledger::{Ledger, LedgerSettings};
use stamp_types::program::BusinessSetup;
use stamp_types::Caller;
use tempfile::TempDir;

pub const OWNER: &str = "owner-1";
pub const CUSTOMER: &str = "customer-1";
pub const STAFF: &str = "staff-1";

/// A migrated database file that lives as long as the value.
pub struct TestDb {
    _dir: TempDir,
    path: PathBuf,
}

impl TestDb {
    /// Create and migrate a fresh database.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("stampd.db");
        // Migrate once up front so racing handles never migrate concurrently.
        drop(stamp_db::open(&path).expect("migrate database"));
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A ledger handle with its own connection to the database.
    pub fn ledger(&self) -> Ledger {
        Ledger::open(&self.path, LedgerSettings::default()).expect("open ledger")
    }

    /// A raw connection for asserting on stored rows.
    pub fn connection(&self) -> rusqlite::Connection {
        rusqlite::Connection::open(&self.path).expect("open connection")
    }

    /// Count rows in `table` matching `filter` (an SQL boolean expression).
    pub fn count(&self, table: &str, filter: &str) -> i64 {
        self.connection()
            .query_row(&format!("SELECT COUNT(*) FROM {table} WHERE {filter}"), [], |row| {
                row.get(0)
            })
            .expect("count rows")
    }
}

impl Default for TestDb {
    fn default() -> Self {
        Self::new()
    }
}

pub fn owner() -> Caller {
    Caller::identified(OWNER)
}

pub fn customer() -> Caller {
    Caller::identified(CUSTOMER)
}

pub fn staff() -> Caller {
    Caller::identified(STAFF)
}

/// Bootstrap the owner's business with its default loyalty card.
pub fn bootstrap(ledger: &Ledger) -> BusinessSetup {
    ledger
        .ensure_business_and_default_card(
            &owner(),
            EnsureBusiness {
                owner_id: OWNER.into(),
                display_name: Some("Harbour Bakery".into()),
            },
        )
        .expect("bootstrap business")
}

/// Enroll the default customer in `setup`'s card. Returns the customer
/// card id.
pub fn enroll(ledger: &Ledger, setup: &BusinessSetup) -> String {
    ledger
        .ensure_customer_card(
            &customer(),
            EnsureCustomerCard {
                customer_id: CUSTOMER.into(),
                loyalty_card_id: setup.loyalty_card_id.clone(),
            },
        )
        .expect("enroll customer")
        .customer_card_id
}
