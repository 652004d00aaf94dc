//! SQL schema definitions.

/// Complete schema for the v1 ledger database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Programme definitions
-- ============================================================

CREATE TABLE IF NOT EXISTS businesses (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    accent_color TEXT,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS loyalty_cards (
    id TEXT PRIMARY KEY,
    business_id TEXT NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    stamps_required INTEGER NOT NULL CHECK (stamps_required > 0),
    reward_description TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    is_default INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_loyalty_cards_business ON loyalty_cards(business_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_loyalty_cards_default
    ON loyalty_cards(business_id) WHERE is_default = 1;

CREATE TABLE IF NOT EXISTS staff_memberships (
    id TEXT PRIMARY KEY,
    business_id TEXT NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    staff_id TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'staff',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    UNIQUE (business_id, staff_id)
);

CREATE TABLE IF NOT EXISTS promotions (
    id TEXT PRIMARY KEY,
    business_id TEXT NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    promo_type TEXT NOT NULL,
    starts_at INTEGER NOT NULL,
    ends_at INTEGER,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    CHECK (ends_at IS NULL OR ends_at > starts_at)
);

CREATE INDEX IF NOT EXISTS idx_promotions_business ON promotions(business_id);

-- ============================================================
-- Enrollment
-- ============================================================

CREATE TABLE IF NOT EXISTS customers (
    id TEXT PRIMARY KEY,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS customer_cards (
    id TEXT PRIMARY KEY,
    customer_id TEXT NOT NULL REFERENCES customers(id),
    loyalty_card_id TEXT NOT NULL REFERENCES loyalty_cards(id),
    current_stamps INTEGER NOT NULL DEFAULT 0 CHECK (current_stamps >= 0),
    total_stamps INTEGER NOT NULL DEFAULT 0,
    total_rewards_earned INTEGER NOT NULL DEFAULT 0,
    last_scan_at INTEGER,
    created_at INTEGER NOT NULL,
    UNIQUE (customer_id, loyalty_card_id)
);

CREATE INDEX IF NOT EXISTS idx_customer_cards_card ON customer_cards(loyalty_card_id);

-- ============================================================
-- Tokens
-- ============================================================

CREATE TABLE IF NOT EXISTS wallet_passes (
    id TEXT PRIMARY KEY,
    customer_card_id TEXT NOT NULL REFERENCES customer_cards(id),
    business_id TEXT NOT NULL REFERENCES businesses(id),
    token TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'revoked')),
    created_at INTEGER NOT NULL,
    revoked_at INTEGER
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_wallet_passes_one_active
    ON wallet_passes(customer_card_id) WHERE status = 'active';

CREATE TABLE IF NOT EXISTS promotion_tokens (
    token TEXT PRIMARY KEY,
    promotion_id TEXT NOT NULL REFERENCES promotions(id) ON DELETE CASCADE,
    customer_card_id TEXT NOT NULL REFERENCES customer_cards(id),
    created_at INTEGER NOT NULL,
    UNIQUE (promotion_id, customer_card_id)
);

CREATE TABLE IF NOT EXISTS rewards (
    id TEXT PRIMARY KEY,
    customer_card_id TEXT NOT NULL REFERENCES customer_cards(id),
    business_id TEXT NOT NULL REFERENCES businesses(id),
    status TEXT NOT NULL DEFAULT 'issued' CHECK (status IN ('issued', 'consumed')),
    issued_at INTEGER NOT NULL,
    consumed_at INTEGER,
    consumed_by TEXT,
    claim_token TEXT UNIQUE
);

CREATE INDEX IF NOT EXISTS idx_rewards_card ON rewards(customer_card_id);
CREATE INDEX IF NOT EXISTS idx_rewards_open ON rewards(customer_card_id) WHERE consumed_at IS NULL;

-- ============================================================
-- Event log (append-only)
-- ============================================================

CREATE TABLE IF NOT EXISTS events (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    business_id TEXT NOT NULL,
    event_type TEXT NOT NULL,
    actor_id TEXT,
    customer_id TEXT,
    created_at INTEGER NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_events_business ON events(business_id, seq);

CREATE TRIGGER IF NOT EXISTS events_no_update BEFORE UPDATE ON events
BEGIN
    SELECT RAISE(ABORT, 'events are append-only');
END;

CREATE TRIGGER IF NOT EXISTS events_no_delete BEFORE DELETE ON events
BEGIN
    SELECT RAISE(ABORT, 'events are append-only');
END;
"#;
