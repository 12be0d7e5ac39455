//! Keyed timer queue for delayed and repeating effect tasks.

use std::collections::BTreeMap;

/// Pending tasks ordered by due time, then by scheduling order.
///
/// Keys are chosen by the owning effect (a slot id, a cell id, ...) so a
/// whole group of tasks can be cancelled when the thing they act on goes
/// away. Time is an explicit millisecond clock supplied by the caller.
#[derive(Debug, Clone)]
pub struct Timeline<K> {
    tasks: BTreeMap<(u64, u64), K>,
    next_seq: u64,
}

impl<K> Default for Timeline<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Timeline<K> {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `key` to fire at `due_ms`.
    pub fn schedule(&mut self, due_ms: u64, key: K) {
        self.tasks.insert((due_ms, self.next_seq), key);
        self.next_seq += 1;
    }

    /// Remove and return the earliest task due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, K)> {
        let (&(due_ms, _), _) = self.tasks.first_key_value()?;
        if due_ms > now_ms {
            return None;
        }
        self.tasks.pop_first().map(|((due_ms, _), key)| (due_ms, key))
    }

    /// Cancel every task whose key matches `pred`. Returns how many were dropped.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&K) -> bool) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, key| !pred(key));
        before - self.tasks.len()
    }

    /// Cancel everything.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<u64> {
        self.tasks.first_key_value().map(|(&(due_ms, _), _)| due_ms)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
