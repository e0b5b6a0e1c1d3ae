//! In-process conversational memory with per-entry TTL.
//!
//! Backs the `ConversationStore` trait with a mutex-guarded map. Entries
//! expire a fixed interval after their last write; expired entries read
//! as empty and are dropped lazily, so a user who walks away does not pin
//! memory forever. Writes refresh the deadline.

use ragline_core::memory::{ConversationStore, MemoryRecord, UserId};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default time-to-live for a user's record: 30 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(1800);

struct Entry {
    record: MemoryRecord,
    expires_at: Instant,
}

/// TTL-bounded, last-write-wins conversational store.
///
/// Concurrent requests for the same user may interleave; the later write
/// wins wholesale. There is deliberately no cross-request locking.
pub struct ConversationMemory {
    ttl: Duration,
    entries: Mutex<HashMap<UserId, Entry>>,
}

impl ConversationMemory {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of live (unexpired) entries. Test and diagnostics helper.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.values().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_entry(&self, user: &UserId, f: impl FnOnce(&mut MemoryRecord)) {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        // Lazy sweep: if the map grows large, evict everything expired.
        if entries.len() > 10_000 {
            entries.retain(|_, e| e.expires_at > now);
        }

        let entry = entries.entry(user.clone()).or_insert_with(|| Entry {
            record: MemoryRecord::default(),
            expires_at: now + self.ttl,
        });
        if entry.expires_at <= now {
            entry.record = MemoryRecord::default();
        }
        f(&mut entry.record);
        entry.expires_at = now + self.ttl;
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ConversationStore for ConversationMemory {
    fn get(&self, user: &UserId) -> MemoryRecord {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(user) {
            Some(entry) if entry.expires_at > now => entry.record.clone(),
            Some(_) => {
                entries.remove(user);
                MemoryRecord::default()
            }
            None => MemoryRecord::default(),
        }
    }

    fn set_query(&self, user: &UserId, query: &str) {
        self.with_entry(user, |record| {
            record.last_query = Some(query.to_string());
        });
    }

    fn set_entity(&self, user: &UserId, entity: &str) {
        self.with_entry(user, |record| {
            record.last_entity = Some(entity.to_string());
        });
    }
}
