//! Ordered roster of window records

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::entry::{WindowId, WindowRecord};

/// Ordered collection of every known window
///
/// Order is the order records were written to the shared value. Nothing here
/// sorts, so hosts see a stable order across reads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster(Vec<WindowRecord>);

impl Roster {
    /// Create an empty roster
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the roster has no records
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Records in roster order
    pub fn iter(&self) -> std::slice::Iter<'_, WindowRecord> {
        self.0.iter()
    }

    /// Records as a slice
    pub fn records(&self) -> &[WindowRecord] {
        &self.0
    }

    /// Ids in roster order
    pub fn ids(&self) -> Vec<WindowId> {
        self.0.iter().map(|r| r.id).collect()
    }

    /// Set of ids, used for membership comparison between ticks
    pub fn membership(&self) -> BTreeSet<WindowId> {
        self.0.iter().map(|r| r.id).collect()
    }

    /// First record with the given id
    pub fn get(&self, id: WindowId) -> Option<&WindowRecord> {
        self.0.iter().find(|r| r.id == id)
    }

    /// Index of the first record matching `pred`
    pub fn position(&self, pred: impl Fn(&WindowRecord) -> bool) -> Option<usize> {
        self.0.iter().position(pred)
    }

    /// Mutable access by index
    pub fn get_mut(&mut self, index: usize) -> Option<&mut WindowRecord> {
        self.0.get_mut(index)
    }

    /// Whether any record carries `id`
    pub fn contains(&self, id: WindowId) -> bool {
        self.0.iter().any(|r| r.id == id)
    }

    /// Highest id present
    pub fn max_id(&self) -> Option<WindowId> {
        self.0.iter().map(|r| r.id).max()
    }

    /// Id a joining window should take: one past the highest, or 0 if empty
    pub fn next_id(&self) -> WindowId {
        self.max_id().map_or(WindowId::FIRST, WindowId::next)
    }

    /// Append a record
    pub fn push(&mut self, record: WindowRecord) {
        self.0.push(record);
    }

    /// Remove every record with `id`
    ///
    /// Returns false when nothing matched, so removing an absent id is a no-op.
    pub fn remove(&mut self, id: WindowId) -> bool {
        let before = self.0.len();
        self.0.retain(|r| r.id != id);
        self.0.len() != before
    }

    /// Drop the records matching `pred`, returning how many went
    pub fn remove_where(&mut self, pred: impl Fn(&WindowRecord) -> bool) -> usize {
        let before = self.0.len();
        self.0.retain(|r| !pred(r));
        before - self.0.len()
    }

    /// Remove records whose heartbeat is older than `threshold_ms`
    ///
    /// Survivors keep their relative order. Returns the ids that were removed.
    pub fn prune_stale(&mut self, now: u64, threshold_ms: u64) -> Vec<WindowId> {
        let mut pruned = Vec::new();
        self.0.retain(|r| {
            if r.is_stale(now, threshold_ms) {
                pruned.push(r.id);
                false
            } else {
                true
            }
        });
        pruned
    }
}

impl From<Vec<WindowRecord>> for Roster {
    fn from(records: Vec<WindowRecord>) -> Self {
        Self(records)
    }
}

impl From<Roster> for Vec<WindowRecord> {
    fn from(roster: Roster) -> Self {
        roster.0
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a WindowRecord;
    type IntoIter = std::slice::Iter<'a, WindowRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::registry::entry::WindowShape;

    fn record(id: u64, last_seen: u64) -> WindowRecord {
        WindowRecord::new(
            WindowId(id),
            Uuid::new_v4(),
            WindowShape::default(),
            serde_json::Value::Null,
            last_seen,
        )
    }

    #[test]
    fn test_next_id() {
        let mut roster = Roster::new();
        assert_eq!(roster.next_id(), WindowId(0));

        roster.push(record(0, 0));
        roster.push(record(4, 0));
        roster.push(record(2, 0));
        assert_eq!(roster.max_id(), Some(WindowId(4)));
        assert_eq!(roster.next_id(), WindowId(5));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut roster = Roster::from(vec![record(0, 0), record(1, 0)]);

        assert!(roster.remove(WindowId(0)));
        let after_first = roster.clone();

        assert!(!roster.remove(WindowId(0)));
        assert_eq!(roster, after_first);
        assert_eq!(roster.ids(), vec![WindowId(1)]);
    }

    #[test]
    fn test_prune_keeps_order_of_survivors() {
        let mut roster = Roster::from(vec![
            record(3, 1_000),
            record(0, 9_500),
            record(5, 2_000),
            record(1, 9_900),
        ]);

        let pruned = roster.prune_stale(10_000, 5_000);

        assert_eq!(pruned, vec![WindowId(3), WindowId(5)]);
        assert_eq!(roster.ids(), vec![WindowId(0), WindowId(1)]);

        // A second pass finds nothing more
        assert!(roster.prune_stale(10_000, 5_000).is_empty());
    }

    #[test]
    fn test_membership_ignores_order() {
        let a = Roster::from(vec![record(0, 0), record(1, 0)]);
        let b = Roster::from(vec![record(1, 0), record(0, 0)]);

        assert_ne!(a.ids(), b.ids());
        assert_eq!(a.membership(), b.membership());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let roster = Roster::from(vec![record(0, 1)]);
        let json = serde_json::to_value(&roster).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["id"], 0);
    }
}
