//! The access gate.
//!
//! Capabilities are resolved per request from current rows, inside the
//! caller's transaction. Nothing is cached, so a deactivated staff member
//! loses authority on their very next request.

use rusqlite::Connection;
use stamp_db::queries::{businesses, staff};
use stamp_types::{Caller, Capability};

use crate::{LedgerError, Result};

/// The caller's identity, or `AuthRequired`.
pub fn identity(caller: &Caller) -> Result<&str> {
    caller.id().ok_or(LedgerError::AuthRequired)
}

/// Resolve what `caller` may do relative to `business_id`.
///
/// `card_customer` is the customer owning the card being acted on, if any.
/// Owner wins over staff, staff over customer. Fails with `NotFound` when
/// the business does not exist.
pub fn resolve_capability(
    conn: &Connection,
    business_id: &str,
    caller: &Caller,
    card_customer: Option<&str>,
) -> Result<Capability> {
    let owner = businesses::owner_of(conn, business_id)?
        .ok_or_else(|| LedgerError::NotFound("business".into()))?;

    let Some(id) = caller.id() else {
        return Ok(Capability::None);
    };

    if id == owner {
        return Ok(Capability::Owner);
    }
    if staff::is_active_member(conn, business_id, id)? {
        return Ok(Capability::Staff);
    }
    if card_customer == Some(id) {
        return Ok(Capability::Customer);
    }
    Ok(Capability::None)
}

/// Require one of `allowed`, mapping a miss to `AuthRequired` for anonymous
/// callers and `Forbidden` otherwise.
pub fn require(
    caller: &Caller,
    capability: Capability,
    allowed: &[Capability],
    action: &str,
) -> Result<Capability> {
    if allowed.contains(&capability) {
        return Ok(capability);
    }
    if caller.id().is_none() {
        return Err(LedgerError::AuthRequired);
    }
    tracing::debug!(action, ?capability, "capability check denied");
    Err(LedgerError::Forbidden(action.to_string()))
}

pub const OWNER_ONLY: &[Capability] = &[Capability::Owner];
pub const BUSINESS_SIDE: &[Capability] = &[Capability::Owner, Capability::Staff];
pub const CARD_PARTIES: &[Capability] = &[Capability::Owner, Capability::Staff, Capability::Customer];

#[cfg(test)]
mod tests {
    use super::*;
    use stamp_types::program::StaffRole;

    fn test_db() -> Connection {
        let conn = stamp_db::open_memory().expect("open test db");
        businesses::insert_if_absent(&conn, "b1", "owner", "Shop", 1).expect("business");
        conn
    }

    #[test]
    fn test_owner_staff_customer_none() {
        let conn = test_db();
        staff::upsert(&conn, "m1", "b1", "barista", StaffRole::Staff, 1).expect("staff");

        let cap = |who: &str| {
            resolve_capability(&conn, "b1", &Caller::identified(who), Some("alice")).expect("resolve")
        };
        assert_eq!(cap("owner"), Capability::Owner);
        assert_eq!(cap("barista"), Capability::Staff);
        assert_eq!(cap("alice"), Capability::Customer);
        assert_eq!(cap("mallory"), Capability::None);
    }

    #[test]
    fn test_deactivated_staff_loses_authority() {
        let conn = test_db();
        staff::upsert(&conn, "m1", "b1", "barista", StaffRole::Manager, 1).expect("staff");
        staff::set_active(&conn, "m1", false).expect("deactivate");

        let cap = resolve_capability(&conn, "b1", &Caller::identified("barista"), None).expect("resolve");
        assert_eq!(cap, Capability::None);
    }

    #[test]
    fn test_missing_business() {
        let conn = test_db();
        let result = resolve_capability(&conn, "nope", &Caller::identified("owner"), None);
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
    }

    #[test]
    fn test_require_distinguishes_anonymous() {
        let anon = Caller::anonymous();
        assert!(matches!(
            require(&anon, Capability::None, BUSINESS_SIDE, "redeem"),
            Err(LedgerError::AuthRequired)
        ));
        let known = Caller::identified("alice");
        assert!(matches!(
            require(&known, Capability::Customer, BUSINESS_SIDE, "redeem"),
            Err(LedgerError::Forbidden(_))
        ));
        assert_eq!(
            require(&known, Capability::Customer, CARD_PARTIES, "view").expect("allowed"),
            Capability::Customer
        );
    }
}
