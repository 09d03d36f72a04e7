use std::collections::HashSet;
use std::sync::RwLock;

use tracing::debug;

/// Process-wide record of handles seen posting in each chat.
///
/// Entries are written for every observed group message and never evicted;
/// the set only grows for the lifetime of the process. A restart empties it,
/// so mention checks lean on the external lookups until members speak again.
/// Absence of an entry never proves non-membership, it only fails to prove
/// membership.
#[derive(Debug, Default)]
pub struct MembershipCache {
    entries: RwLock<HashSet<(i64, String)>>,
}

impl MembershipCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `handle` as recently active in `chat_id`. Idempotent.
    pub fn record(&self, chat_id: i64, handle: &str) {
        let key = (chat_id, handle.to_lowercase());
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.insert(key) {
            debug!("cached activity: @{} in chat {}", handle, chat_id);
        }
    }

    /// Whether `handle` has posted in `chat_id` since process start.
    pub fn contains(&self, chat_id: i64, handle: &str) -> bool {
        let key = (chat_id, handle.to_lowercase());
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_then_contains() {
        let cache = MembershipCache::new();
        assert!(!cache.contains(1, "alice"));
        cache.record(1, "alice");
        assert!(cache.contains(1, "alice"));
    }

    #[test]
    fn test_record_is_idempotent() {
        let cache = MembershipCache::new();
        cache.record(1, "alice");
        cache.record(1, "alice");
        assert!(cache.contains(1, "alice"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let cache = MembershipCache::new();
        cache.record(1, "Alice_99");
        assert!(cache.contains(1, "alice_99"));
        assert!(cache.contains(1, "ALICE_99"));
    }

    #[test]
    fn test_chats_are_isolated() {
        let cache = MembershipCache::new();
        cache.record(1, "alice");
        assert!(!cache.contains(2, "alice"));
    }
}
