// Per-user warning counts, embedded in the moderation config.
//
// Presence of a key implies a count of at least 1: resetting deletes the key
// and zero counts are dropped when a record is read back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, u32>",
    into = "BTreeMap<String, u32>"
)]
pub struct WarningLedger {
    counts: BTreeMap<String, u32>,
}

impl WarningLedger {
    /// Current count for `user_id`, 0 if the user has never been warned.
    pub fn get(&self, user_id: &str) -> u32 {
        self.counts.get(user_id).copied().unwrap_or(0)
    }

    /// Add one warning and return the new count.
    pub fn increment(&mut self, user_id: &str) -> u32 {
        let count = self.counts.entry(user_id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Forget all warnings for `user_id`. Returns whether an entry existed.
    pub fn reset(&mut self, user_id: &str) -> bool {
        self.counts.remove(user_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl From<BTreeMap<String, u32>> for WarningLedger {
    fn from(mut counts: BTreeMap<String, u32>) -> Self {
        counts.retain(|_, count| *count > 0);
        Self { counts }
    }
}

impl From<WarningLedger> for BTreeMap<String, u32> {
    fn from(ledger: WarningLedger) -> Self {
        ledger.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_is_monotonic() {
        let mut ledger = WarningLedger::default();
        assert_eq!(ledger.get("u"), 0);
        assert_eq!(ledger.increment("u"), 1);
        assert_eq!(ledger.increment("u"), 2);
        assert_eq!(ledger.increment("u"), 3);
        assert_eq!(ledger.get("u"), 3);
    }

    #[test]
    fn reset_removes_the_key() {
        let mut ledger = WarningLedger::default();
        ledger.increment("u");
        assert!(ledger.reset("u"));
        assert_eq!(ledger.get("u"), 0);
        assert!(ledger.is_empty());
        assert!(!ledger.reset("u"));
    }

    #[test]
    fn counts_are_per_user() {
        let mut ledger = WarningLedger::default();
        ledger.increment("a");
        ledger.increment("a");
        ledger.increment("b");
        assert_eq!(ledger.get("a"), 2);
        assert_eq!(ledger.get("b"), 1);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn zero_counts_are_dropped_on_read() {
        let ledger: WarningLedger = serde_json::from_str(r#"{"a": 0, "b": 4}"#).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get("a"), 0);
        assert_eq!(ledger.get("b"), 4);
    }
}
