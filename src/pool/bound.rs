//! Policy pool ordered by heuristic bound.

use std::fmt;

use super::heap::StampedHeap;
use super::summary::PoolSummary;
use super::types::{Bound, Candidate, PolicyPool};
use crate::error::PoolError;
use crate::policy::{PartialPolicy, ProblemContext};

/// Best-first pool: the candidate with the highest bound comes first.
///
/// Backed by a binary heap, so `select` is O(1), `insert` and `pop` are
/// O(log n), `union` is a heap merge and `prune` is one linear pass.
///
/// # Tie-breaking
///
/// Among equal bounds the candidate inserted earliest is selected first.
/// After `a.union(&mut b)`, the candidates from `b` rank behind every
/// equal-bound candidate already in `a` and keep their order from `b`.
/// `init` restarts the insertion count.
///
/// # Examples
///
/// ```
/// use u_policypool::policy::{JointPolicyShape, ProblemContext};
/// use u_policypool::pool::{BoundOrderedPool, Candidate, PolicyPool};
///
/// let shape = JointPolicyShape::open_loop(2, vec![2, 2]).unwrap();
/// let mut pool = BoundOrderedPool::new();
/// pool.insert(Candidate::new(shape.empty_policy(), 5.0).unwrap());
/// pool.insert(Candidate::new(shape.empty_policy(), 9.0).unwrap());
///
/// assert_eq!(pool.select().unwrap().bound().value(), 9.0);
/// pool.pop(None).unwrap();
/// assert_eq!(pool.select().unwrap().bound().value(), 5.0);
/// ```
pub struct BoundOrderedPool<P> {
    heap: StampedHeap<Bound, P>,
}

impl<P> BoundOrderedPool<P> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            heap: StampedHeap::new(),
        }
    }

    /// Unordered view of the held candidates.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate<P>> {
        self.heap.iter()
    }
}

impl<P> Default for BoundOrderedPool<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PartialPolicy> PolicyPool<P> for BoundOrderedPool<P> {
    fn init<C>(&mut self, context: &C)
    where
        C: ProblemContext<Policy = P>,
    {
        self.heap.clear();
        self.insert(Candidate::seed(context.empty_policy()));
    }

    fn select(&self) -> Result<&Candidate<P>, PoolError> {
        self.heap.peek().ok_or(PoolError::EmptyFrontier)
    }

    fn pop(&mut self, expected: Option<&Candidate<P>>) -> Result<Candidate<P>, PoolError> {
        let front = self.select()?;
        if let Some(expected) = expected {
            if !front.is_same(expected) {
                return Err(PoolError::FrontierInconsistency {
                    expected: expected.bound().value(),
                    found: front.bound().value(),
                });
            }
        }
        self.heap.pop().ok_or(PoolError::EmptyFrontier)
    }

    fn insert(&mut self, candidate: Candidate<P>) {
        self.heap.push(candidate.bound(), candidate);
    }

    fn union(&mut self, other: &mut Self) {
        let incoming = other.heap.len();
        self.heap.append(&mut other.heap);
        tracing::debug!(incoming, size = self.heap.len(), "merged policy pools");
    }

    fn prune(&mut self, threshold: f64) -> usize {
        if threshold.is_nan() {
            return 0;
        }
        let removed = self.heap.retain(|c| c.bound().value() > threshold);
        tracing::debug!(threshold, removed, remaining = self.heap.len(), "pruned policy pool");
        removed
    }

    fn size(&self) -> usize {
        self.heap.len()
    }

    fn summary(&self, buckets: usize) -> PoolSummary {
        PoolSummary::from_bounds(self.heap.iter().map(Candidate::bound), buckets)
    }
}

impl<P: PartialPolicy> fmt::Display for BoundOrderedPool<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary(5))
    }
}
