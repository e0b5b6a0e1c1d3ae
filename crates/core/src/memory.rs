//! Conversational memory domain types.
//!
//! Short-term, per-user state: the last query asked and the last entity
//! the conversation resolved. This is what lets a follow-up like
//! "what about him?" be answered without the caller re-stating context.
//!
//! Lifecycle is process uptime only — nothing here persists.

use serde::{Deserialize, Serialize};

/// Opaque key identifying the caller.
///
/// Not validated; collisions across distinct real users are possible and
/// accepted as a known limitation of header-derived identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Sentinel identity for requests that carry no user header.
    pub fn anonymous() -> Self {
        Self("anonymous".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the system remembers about one user.
///
/// Both fields default to absent. `last_query` is written after routing;
/// `last_entity` after routing, or later by backfill when routing left it
/// absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_query: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_entity: Option<String>,
}

/// The conversational store contract.
///
/// All operations are synchronous and infallible. Consistency model:
/// last write wins. Two concurrent requests for the same user may
/// interleave their read-decide-write sequences; there is no atomicity
/// across them and no read-your-own-write guarantee.
pub trait ConversationStore: Send + Sync {
    /// Look up what is remembered for a user (absent fields if unseen).
    fn get(&self, user: &UserId) -> MemoryRecord;

    /// Remember the user's (possibly rewritten) query.
    fn set_query(&self, user: &UserId, query: &str);

    /// Remember the entity the conversation resolved to.
    fn set_entity(&self, user: &UserId, entity: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_sentinel() {
        assert_eq!(UserId::anonymous().as_str(), "anonymous");
    }

    #[test]
    fn record_defaults_absent() {
        let record = MemoryRecord::default();
        assert!(record.last_query.is_none());
        assert!(record.last_entity.is_none());
    }

    #[test]
    fn record_serialization_skips_absent() {
        let record = MemoryRecord {
            last_query: Some("Who is the CFO?".into()),
            last_entity: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("last_query"));
        assert!(!json.contains("last_entity"));
    }
}
