//! Policy pool ordered depth-first.

use std::fmt;

use super::heap::StampedHeap;
use super::summary::PoolSummary;
use super::types::{Bound, Candidate, PolicyPool};
use crate::error::PoolError;
use crate::policy::{PartialPolicy, ProblemContext};

/// Depth-first pool: the deepest policy comes first, highest bound among
/// equally deep ones, earliest insertion among full ties.
///
/// Reaches complete policies quickly, which gives the search an incumbent
/// to prune with early on. Here `select` and `best_ranked` differ:
/// [`best_ranked`](PolicyPool::best_ranked) scans for the highest bound
/// regardless of depth and [`pop_best_ranked`](PolicyPool::pop_best_ranked)
/// rebuilds the heap, both in linear time.
///
/// # Examples
///
/// ```
/// use u_policypool::policy::{JointDecisionRule, JointPolicyShape, ProblemContext};
/// use u_policypool::pool::{Candidate, DepthFirstPool, PolicyPool};
///
/// let shape = JointPolicyShape::open_loop(2, vec![2]).unwrap();
/// let root = shape.empty_policy();
/// let child = root.extend(JointDecisionRule::from_joint_action(&[0])).unwrap();
///
/// let mut pool = DepthFirstPool::new();
/// pool.insert(Candidate::new(root, 9.0).unwrap());
/// pool.insert(Candidate::new(child, 3.0).unwrap());
///
/// assert_eq!(pool.select().unwrap().bound().value(), 3.0);
/// assert_eq!(pool.best_ranked().unwrap().bound().value(), 9.0);
/// ```
pub struct DepthFirstPool<P> {
    heap: StampedHeap<(usize, Bound), P>,
}

impl<P> DepthFirstPool<P> {
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

impl<P> Default for DepthFirstPool<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PartialPolicy> PolicyPool<P> for DepthFirstPool<P> {
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
        self.heap
            .push((candidate.depth(), candidate.bound()), candidate);
    }

    fn union(&mut self, other: &mut Self) {
        let incoming = other.heap.len();
        self.heap.append(&mut other.heap);
        tracing::debug!(incoming, size = self.heap.len(), "merged depth-first pools");
    }

    fn prune(&mut self, threshold: f64) -> usize {
        if threshold.is_nan() {
            return 0;
        }
        let removed = self.heap.retain(|c| c.bound().value() > threshold);
        tracing::debug!(threshold, removed, remaining = self.heap.len(), "pruned depth-first pool");
        removed
    }

    fn size(&self) -> usize {
        self.heap.len()
    }

    fn best_ranked(&self) -> Result<&Candidate<P>, PoolError> {
        self.heap
            .peek_max_by(Candidate::bound)
            .ok_or(PoolError::EmptyFrontier)
    }

    fn pop_best_ranked(&mut self) -> Result<Candidate<P>, PoolError> {
        self.heap
            .pop_max_by(Candidate::bound)
            .ok_or(PoolError::EmptyFrontier)
    }

    fn summary(&self, buckets: usize) -> PoolSummary {
        PoolSummary::from_bounds(self.heap.iter().map(Candidate::bound), buckets)
    }
}

impl<P: PartialPolicy> fmt::Display for DepthFirstPool<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary(5))
    }
}
