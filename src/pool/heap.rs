//! Binary heap with insertion stamps, shared by the pool orderings.
//!
//! Entries are ordered by a caller-chosen key, then by insertion stamp
//! (earlier first). Stamps of one heap always lie in `[low, next)`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::types::Candidate;

struct Entry<K, P> {
    key: K,
    stamp: i64,
    candidate: Candidate<P>,
}

impl<K: Ord, P> PartialEq for Entry<K, P> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: Ord, P> Eq for Entry<K, P> {}

impl<K: Ord, P> PartialOrd for Entry<K, P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, P> Ord for Entry<K, P> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: larger key wins, then the smaller stamp.
        self.key
            .cmp(&other.key)
            .then_with(|| other.stamp.cmp(&self.stamp))
    }
}

pub(crate) struct StampedHeap<K, P> {
    heap: BinaryHeap<Entry<K, P>>,
    low: i64,
    next: i64,
}

impl<K: Ord, P> StampedHeap<K, P> {
    pub(crate) fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            low: 0,
            next: 0,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.heap.clear();
        self.low = 0;
        self.next = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn push(&mut self, key: K, candidate: Candidate<P>) {
        let stamp = self.next;
        self.next += 1;
        self.heap.push(Entry {
            key,
            stamp,
            candidate,
        });
    }

    pub(crate) fn peek(&self) -> Option<&Candidate<P>> {
        self.heap.peek().map(|e| &e.candidate)
    }

    pub(crate) fn pop(&mut self) -> Option<Candidate<P>> {
        let entry = self.heap.pop()?;
        if self.heap.is_empty() {
            self.low = 0;
            self.next = 0;
        }
        Some(entry.candidate)
    }

    /// Moves all of `other` in, ranking it after every entry of `self` with
    /// an equal key. Only the smaller side is restamped.
    pub(crate) fn append(&mut self, other: &mut Self) {
        if other.heap.is_empty() {
            other.clear();
            return;
        }
        if self.heap.is_empty() {
            std::mem::swap(self, other);
            other.clear();
            return;
        }

        if self.heap.len() >= other.heap.len() {
            let shift = self.next - other.low;
            let mut incoming = restamp(std::mem::take(&mut other.heap), shift);
            self.next = other.next + shift;
            self.heap.append(&mut incoming);
        } else {
            let shift = other.low - self.next;
            let mut ours = restamp(std::mem::take(&mut self.heap), shift);
            self.heap = std::mem::take(&mut other.heap);
            self.low += shift;
            self.next = other.next;
            self.heap.append(&mut ours);
        }
        other.clear();
    }

    /// Keeps the entries for which `keep` is true; returns how many were dropped.
    pub(crate) fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Candidate<P>) -> bool,
    {
        let before = self.heap.len();
        self.heap.retain(|e| keep(&e.candidate));
        before - self.heap.len()
    }

    /// Unordered view of all candidates.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Candidate<P>> {
        self.heap.iter().map(|e| &e.candidate)
    }

    /// The candidate maximizing `rank`, earliest stamp on ties.
    pub(crate) fn peek_max_by<R, F>(&self, rank: F) -> Option<&Candidate<P>>
    where
        R: Ord,
        F: Fn(&Candidate<P>) -> R,
    {
        self.heap
            .iter()
            .max_by(|a, b| {
                rank(&a.candidate)
                    .cmp(&rank(&b.candidate))
                    .then_with(|| b.stamp.cmp(&a.stamp))
            })
            .map(|e| &e.candidate)
    }

    /// Removes the candidate [`peek_max_by`](Self::peek_max_by) returns.
    ///
    /// Linear: the heap is rebuilt without that entry.
    pub(crate) fn pop_max_by<R, F>(&mut self, rank: F) -> Option<Candidate<P>>
    where
        R: Ord,
        F: Fn(&Candidate<P>) -> R,
    {
        let mut entries = std::mem::take(&mut self.heap).into_vec();
        let index = entries
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                rank(&a.candidate)
                    .cmp(&rank(&b.candidate))
                    .then_with(|| b.stamp.cmp(&a.stamp))
            })
            .map(|(i, _)| i)?;
        let entry = entries.swap_remove(index);
        self.heap = BinaryHeap::from(entries);
        if self.heap.is_empty() {
            self.low = 0;
            self.next = 0;
        }
        Some(entry.candidate)
    }
}

/// Shifts every stamp by `shift`; relative order is unchanged.
fn restamp<K: Ord, P>(heap: BinaryHeap<Entry<K, P>>, shift: i64) -> BinaryHeap<Entry<K, P>> {
    let mut entries = heap.into_vec();
    for entry in &mut entries {
        entry.stamp += shift;
    }
    BinaryHeap::from(entries)
}
