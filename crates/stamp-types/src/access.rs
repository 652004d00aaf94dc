//! Caller identity and capability variants.

use serde::{Deserialize, Serialize};

/// The identity attached to a request by the external identity provider.
///
/// An anonymous caller carries no identity; scanning devices may call the
/// unauthenticated entry points this way.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Caller(Option<String>);

impl Caller {
    /// A caller without an identity.
    pub fn anonymous() -> Self {
        Self(None)
    }

    /// A caller with a stable identity.
    pub fn identified(id: impl Into<String>) -> Self {
        Self(Some(id.into()))
    }

    /// The caller's identity, if any. Empty strings count as anonymous.
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref().filter(|id| !id.is_empty())
    }

    /// Whether the caller is the given identity.
    pub fn is(&self, identity: &str) -> bool {
        self.id() == Some(identity)
    }
}

/// What a caller may do relative to one business.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Owner,
    Staff,
    Customer,
    None,
}

impl Capability {
    /// Owner or active staff.
    pub fn is_business_side(self) -> bool {
        matches!(self, Capability::Owner | Capability::Staff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_identity_is_anonymous() {
        assert_eq!(Caller::identified("").id(), None);
        assert_eq!(Caller::anonymous().id(), None);
        assert!(Caller::identified("alice").is("alice"));
        assert!(!Caller::identified("alice").is("bob"));
    }

    #[test]
    fn test_caller_deserializes_from_optional_string() {
        let caller: Caller = serde_json::from_str("\"alice\"").expect("parse");
        assert_eq!(caller.id(), Some("alice"));
        let caller: Caller = serde_json::from_str("null").expect("parse");
        assert_eq!(caller.id(), None);
    }

    #[test]
    fn test_business_side() {
        assert!(Capability::Owner.is_business_side());
        assert!(Capability::Staff.is_business_side());
        assert!(!Capability::Customer.is_business_side());
        assert!(!Capability::None.is_business_side());
    }
}
