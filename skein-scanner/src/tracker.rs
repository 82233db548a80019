use crate::result::{VisitRecord, VisitState};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// Shared record of every node a traversal has claimed.
///
/// All access goes through one mutex, so [`try_claim`](Self::try_claim) is a
/// single check-and-insert with respect to every other claim or finalize.
/// The lock is never held across an `.await`.
#[derive(Debug)]
pub struct VisitTracker<K> {
    entries: Mutex<HashMap<K, VisitState<K>>>,
}

impl<K> VisitTracker<K>
where
    K: Clone + Eq + Hash + std::fmt::Debug,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    // A panicking fetcher never holds this lock, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<K, VisitState<K>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims `id` for fetching. Returns `false` without touching the map if
    /// any caller, including this one, already claimed it.
    pub fn try_claim(&self, id: &K) -> bool {
        match self.lock().entry(id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(VisitState::Pending);
                true
            }
        }
    }

    /// Stores the final record for `id`. Only the caller that won
    /// [`try_claim`](Self::try_claim) for `id` may call this.
    pub fn finalize(&self, id: K, record: VisitRecord<K>) {
        let mut entries = self.lock();
        match entries.get(&id) {
            Some(VisitState::Pending) => {}
            Some(VisitState::Done(_)) => warn!("{:?} finalized twice", id),
            None => warn!("{:?} finalized without a claim", id),
        }
        entries.insert(id, VisitState::Done(record));
    }

    /// Copies every entry. Only exact once the top-level traversal has joined.
    pub fn snapshot(&self) -> Snapshot<K> {
        Snapshot {
            entries: self.lock().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().values().filter(|state| state.is_pending()).count()
    }
}

impl<K> Default for VisitTracker<K>
where
    K: Clone + Eq + Hash + std::fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of a tracker, keyed by node id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<K: Eq + Hash> {
    entries: HashMap<K, VisitState<K>>,
}

impl<K> Snapshot<K>
where
    K: Eq + Hash,
{
    pub fn get(&self, id: &K) -> Option<&VisitState<K>> {
        self.entries.get(id)
    }

    /// The final record for `id`, if it was claimed and finished.
    pub fn record(&self, id: &K) -> Option<&VisitRecord<K>> {
        self.entries.get(id).and_then(VisitState::record)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &VisitState<K>)> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// True when no entry is still pending.
    pub fn is_complete(&self) -> bool {
        self.entries.values().all(|state| !state.is_pending())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::result::Page;
    use std::sync::Arc;

    #[test]
    fn test_claim_is_exclusive() {
        let tracker = VisitTracker::new();
        assert!(tracker.try_claim(&"a".to_string()));
        assert!(!tracker.try_claim(&"a".to_string()));
        assert!(tracker.try_claim(&"b".to_string()));
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.pending_count(), 2);
    }

    #[test]
    fn test_failed_claim_does_not_mutate() {
        let tracker = VisitTracker::new();
        let id = "a".to_string();
        assert!(tracker.try_claim(&id));
        tracker.finalize(id.clone(), VisitRecord::fetched(Page::new("body", vec![])));
        let before = tracker.snapshot();

        assert!(!tracker.try_claim(&id));
        assert_eq!(tracker.snapshot(), before);
    }

    #[test]
    fn test_finalize_replaces_pending() {
        let tracker = VisitTracker::new();
        let id = "a".to_string();
        tracker.try_claim(&id);
        assert!(tracker.snapshot().get(&id).unwrap().is_pending());

        tracker.finalize(
            id.clone(),
            VisitRecord::failed(FetchError::NotFound("not found: a".to_string())),
        );
        let snapshot = tracker.snapshot();
        assert!(snapshot.is_complete());
        assert!(snapshot.record(&id).unwrap().error.is_some());
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let tracker = VisitTracker::new();
        for id in ["a", "b", "c"] {
            tracker.try_claim(&id);
            tracker.finalize(id, VisitRecord::fetched(Page::new(id, vec![])));
        }
        assert_eq!(tracker.snapshot(), tracker.snapshot());
        assert_eq!(tracker.snapshot().len(), 3);
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        let tracker = Arc::new(VisitTracker::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let tracker = tracker.clone();
                std::thread::spawn(move || {
                    (0..100).filter(|n| tracker.try_claim(n)).count()
                })
            })
            .collect();

        let wins: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(wins, 100);
        assert_eq!(tracker.len(), 100);
    }
}
