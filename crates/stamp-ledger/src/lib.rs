//! # stamp-ledger
//!
//! The loyalty ledger engine: access gate, enrollment, wallet passes,
//! stamp accrual, reward issuance and one-time redemption.
//!
//! This crate implements:
//!
//! - [`access`] - Per-request capability resolution against a business
//! - [`enrollment`] - Idempotent business bootstrap and customer enrollment
//! - [`passes`] - Wallet pass issuance, rotation and revocation
//! - [`scans`] - The stamp accrual primitive and both scan entry points
//! - [`redemption`] - Reward claim tokens and single-use consumption
//! - [`admin`] - Staff, promotion and loyalty card administration
//! - [`reads`] - Customer card, reward and event log views
//!
//! ## Consistency
//!
//! Every mutating operation runs inside one `BEGIN IMMEDIATE` transaction,
//! so the capability check, the state change and its audit event commit
//! together or not at all. Duplicate creations are absorbed with
//! `ON CONFLICT DO NOTHING` followed by a re-read; consumptions are
//! conditional updates whose row count decides the winner.

pub mod access;
pub mod admin;
pub mod enrollment;
pub mod journal;
pub mod params;
pub mod passes;
pub mod reads;
pub mod redemption;
pub mod scans;
pub mod store;
pub mod tokens;

use std::path::Path;
use std::sync::Arc;

use stamp_db::DbError;
use stamp_types::events::Event;
use stamp_types::{Coded, ErrorCode, DEFAULT_REWARD_DESCRIPTION, DEFAULT_STAMPS_REQUIRED};

pub use journal::EventSink;
pub use store::Store;

/// Ledger error types.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The operation needs a caller identity and none was supplied.
    #[error("authentication required")]
    AuthRequired,

    /// The caller is known but lacks the capability.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Token unknown, revoked, or bound to another business.
    #[error("invalid token")]
    InvalidToken,

    #[error("reward already redeemed")]
    AlreadyRedeemed,

    #[error("promotion inactive: {0}")]
    PromotionInactive(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage failure other than a missing row.
    #[error("storage error: {0}")]
    Storage(DbError),

    /// A previous holder of the store lock panicked.
    #[error("ledger store unavailable")]
    Poisoned,
}

impl From<DbError> for LedgerError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => LedgerError::NotFound(what),
            other => LedgerError::Storage(other),
        }
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        LedgerError::Storage(DbError::Sqlite(e))
    }
}

impl Coded for LedgerError {
    fn code(&self) -> ErrorCode {
        match self {
            LedgerError::AuthRequired => ErrorCode::AuthRequired,
            LedgerError::Forbidden(_) => ErrorCode::Forbidden,
            LedgerError::NotFound(_) => ErrorCode::NotFound,
            LedgerError::InvalidToken => ErrorCode::InvalidToken,
            LedgerError::AlreadyRedeemed => ErrorCode::AlreadyRedeemed,
            LedgerError::PromotionInactive(_) => ErrorCode::PromotionInactive,
            LedgerError::Conflict(_) => ErrorCode::Conflict,
            LedgerError::Storage(_) | LedgerError::Poisoned => ErrorCode::UnknownError,
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Defaults applied when the ledger creates programme rows on its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSettings {
    pub default_stamps_required: u32,
    pub default_reward_description: String,
    pub default_business_name: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            default_stamps_required: DEFAULT_STAMPS_REQUIRED,
            default_reward_description: DEFAULT_REWARD_DESCRIPTION.to_string(),
            default_business_name: "My business".to_string(),
        }
    }
}

type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// The ledger service. One instance per database connection.
///
/// Operations live in the topical modules as `impl Ledger` blocks.
pub struct Ledger {
    store: Store,
    settings: LedgerSettings,
    clock: Clock,
    sink: Option<Arc<dyn EventSink>>,
}

impl Ledger {
    /// Wrap an already opened store.
    pub fn new(store: Store, settings: LedgerSettings) -> Self {
        Self {
            store,
            settings,
            clock: Arc::new(stamp_types::unix_now),
            sink: None,
        }
    }

    /// Open (or create) the ledger database at `path`.
    pub fn open(path: &Path, settings: LedgerSettings) -> Result<Self> {
        Ok(Self::new(Store::open(path)?, settings))
    }

    /// An in-memory ledger with default settings.
    pub fn open_memory() -> Result<Self> {
        Ok(Self::new(Store::open_memory()?, LedgerSettings::default()))
    }

    /// Replace the wall clock. Timestamps are Unix seconds.
    pub fn with_clock(mut self, clock: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Publish committed events to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    pub(crate) fn now(&self) -> u64 {
        (self.clock)()
    }

    /// Hand events to the sink. Called only after the transaction that
    /// recorded them has committed.
    pub(crate) fn publish(&self, events: Vec<Event>) {
        let Some(sink) = &self.sink else { return };
        for event in &events {
            sink.publish(event);
        }
    }
}
