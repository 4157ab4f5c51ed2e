//! Candidates, bounds and the policy-pool trait.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::summary::PoolSummary;
use crate::error::PoolError;
use crate::policy::{PartialPolicy, ProblemContext};

/// Heuristic upper bound on the value reachable from a partial policy.
///
/// Larger is better. NaN is never stored, which gives bounds a total
/// order; [`Bound::UNBOUNDED`] (`+inf`) marks a policy not yet evaluated.
#[derive(Clone, Copy)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "f64", into = "f64")
)]
pub struct Bound(f64);

impl Bound {
    /// The `+inf` sentinel carried by the seed candidate.
    pub const UNBOUNDED: Bound = Bound(f64::INFINITY);

    /// Wraps `value`, rejecting NaN.
    ///
    /// `-0.0` is stored as `0.0` so that both zeros compare equal.
    pub fn new(value: f64) -> Result<Self, PoolError> {
        if value.is_nan() {
            return Err(PoolError::InvalidBound { value });
        }
        if value == 0.0 {
            return Ok(Self(0.0));
        }
        Ok(Self(value))
    }

    /// The raw value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether this is the `+inf` sentinel.
    pub fn is_unbounded(self) -> bool {
        self.0 == f64::INFINITY
    }
}

impl TryFrom<f64> for Bound {
    type Error = PoolError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Bound> for f64 {
    fn from(bound: Bound) -> Self {
        bound.0
    }
}

impl PartialEq for Bound {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Bound {}

impl PartialOrd for Bound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Bound {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Debug for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bound({})", self.0)
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            write!(f, "+inf")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A partial policy paired with its heuristic bound.
///
/// The policy lives behind an `Arc` and is never mutated once wrapped, so
/// cloning a candidate is cheap and keeps its identity (see
/// [`is_same`](Self::is_same)).
///
/// # Examples
///
/// ```
/// use u_policypool::policy::{JointPolicyShape, ProblemContext};
/// use u_policypool::pool::Candidate;
///
/// let shape = JointPolicyShape::open_loop(2, vec![2, 2]).unwrap();
/// let seed = Candidate::seed(shape.empty_policy());
/// assert!(seed.bound().is_unbounded());
///
/// let c = Candidate::new(shape.empty_policy(), 4.5).unwrap();
/// assert_eq!(c.bound().value(), 4.5);
/// assert!(c.is_same(&c.clone()));
/// assert!(Candidate::new(shape.empty_policy(), f64::NAN).is_err());
/// ```
pub struct Candidate<P> {
    policy: Arc<P>,
    bound: Bound,
}

impl<P> Candidate<P> {
    /// Wraps `policy` with bound `bound`.
    pub fn new(policy: P, bound: f64) -> Result<Self, PoolError> {
        Self::from_shared(Arc::new(policy), bound)
    }

    /// Like [`new`](Self::new) for a policy that is already shared.
    pub fn from_shared(policy: Arc<P>, bound: f64) -> Result<Self, PoolError> {
        Ok(Self {
            policy,
            bound: Bound::new(bound)?,
        })
    }

    /// The seed candidate: `policy` with the unbounded sentinel.
    pub fn seed(policy: P) -> Self {
        Self {
            policy: Arc::new(policy),
            bound: Bound::UNBOUNDED,
        }
    }

    /// The same policy re-evaluated with another bound.
    ///
    /// The policy is shared, not copied. The result is a different candidate
    /// for [`is_same`](Self::is_same) unless the bound is unchanged.
    pub fn with_bound(&self, bound: f64) -> Result<Self, PoolError> {
        Self::from_shared(Arc::clone(&self.policy), bound)
    }

    /// The wrapped policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Shared handle to the wrapped policy.
    pub fn shared_policy(&self) -> &Arc<P> {
        &self.policy
    }

    /// The heuristic bound.
    pub fn bound(&self) -> Bound {
        self.bound
    }

    /// Whether `other` is a handle to this very candidate.
    ///
    /// True when both share the same policy allocation and bound. Equal
    /// policies built separately are different candidates.
    pub fn is_same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.policy, &other.policy) && self.bound == other.bound
    }
}

impl<P: PartialPolicy> Candidate<P> {
    /// Depth of the wrapped policy.
    pub fn depth(&self) -> usize {
        self.policy.depth()
    }
}

impl<P> Clone for Candidate<P> {
    fn clone(&self) -> Self {
        Self {
            policy: Arc::clone(&self.policy),
            bound: self.bound,
        }
    }
}

impl<P: fmt::Debug> fmt::Debug for Candidate<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("bound", &self.bound)
            .field("policy", &self.policy)
            .finish()
    }
}

/// The working set of a best-first branch-and-bound search.
///
/// Implementations differ only in which candidate they surface first.
/// All share the same contract:
///
/// - [`insert`](Self::insert) accepts every candidate; dominated ones are
///   removed only by an explicit [`prune`](Self::prune).
/// - [`union`](Self::union) moves everything out of `other`, which ends empty.
/// - [`prune`](Self::prune) removes exactly the candidates with
///   `bound <= threshold`.
/// - Between mutations, [`select`](Self::select) always returns the same
///   candidate, and [`pop`](Self::pop) removes that one.
///
/// Pools are plain single-owner values. Parallel searches give each worker
/// its own pool and merge them with `union` through a `&mut` to the
/// destination; a pool shared between threads must be wrapped in a lock
/// by the caller.
pub trait PolicyPool<P: PartialPolicy> {
    /// Clears the pool and inserts the seed candidate built from `context`.
    ///
    /// The seed is the context's empty policy with [`Bound::UNBOUNDED`].
    fn init<C>(&mut self, context: &C)
    where
        C: ProblemContext<Policy = P>;

    /// The candidate to expand next, without removing it.
    fn select(&self) -> Result<&Candidate<P>, PoolError>;

    /// Removes and returns the candidate [`select`](Self::select) returns.
    ///
    /// With `Some(expected)`, fails with
    /// [`PoolError::FrontierInconsistency`] unless the front candidate
    /// [`is_same`](Candidate::is_same) as `expected`; the pool is not
    /// modified in that case.
    fn pop(&mut self, expected: Option<&Candidate<P>>) -> Result<Candidate<P>, PoolError>;

    /// Adds one candidate.
    fn insert(&mut self, candidate: Candidate<P>);

    /// Adds every candidate from `candidates`.
    fn insert_all<I>(&mut self, candidates: I)
    where
        I: IntoIterator<Item = Candidate<P>>,
    {
        for candidate in candidates {
            self.insert(candidate);
        }
    }

    /// Moves every candidate of `other` into `self`, leaving `other` empty.
    fn union(&mut self, other: &mut Self)
    where
        Self: Sized;

    /// Removes every candidate whose bound is `<= threshold`.
    ///
    /// Returns how many were removed. A NaN threshold removes nothing.
    fn prune(&mut self, threshold: f64) -> usize;

    /// Number of candidates held.
    fn size(&self) -> usize;

    /// Whether the pool holds no candidates.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// The candidate with the highest bound.
    ///
    /// Same as [`select`](Self::select) for pools that order by bound.
    fn best_ranked(&self) -> Result<&Candidate<P>, PoolError> {
        self.select()
    }

    /// Removes the candidate [`best_ranked`](Self::best_ranked) returns.
    fn pop_best_ranked(&mut self) -> Result<Candidate<P>, PoolError> {
        self.pop(None)
    }

    /// Count and bound distribution, with `buckets` histogram bins.
    fn summary(&self, buckets: usize) -> PoolSummary;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_rejects_nan() {
        assert!(matches!(
            Bound::new(f64::NAN),
            Err(PoolError::InvalidBound { .. })
        ));
        assert!(Bound::new(f64::NEG_INFINITY).is_ok());
    }

    #[test]
    fn test_bound_total_order() {
        let low = Bound::new(-3.0).unwrap();
        let high = Bound::new(7.5).unwrap();
        assert!(low < high);
        assert!(high < Bound::UNBOUNDED);
        assert_eq!(Bound::new(2.0).unwrap(), Bound::new(2.0).unwrap());
        assert_eq!(Bound::UNBOUNDED.to_string(), "+inf");
        assert_eq!(high.to_string(), "7.5");
    }

    #[test]
    fn test_bound_negative_zero_equals_zero() {
        let neg = Bound::new(-0.0).unwrap();
        let pos = Bound::new(0.0).unwrap();
        assert_eq!(neg, pos);
        assert_eq!(neg.cmp(&pos), Ordering::Equal);
        assert!(neg.value().is_sign_positive());
        assert_eq!(Bound::try_from(-0.0).unwrap(), pos);
        assert!(Bound::try_from(f64::NAN).is_err());
    }

    #[test]
    fn test_candidate_identity() {
        let a = Candidate::new(1_u8, 3.0).unwrap();
        let b = Candidate::new(1_u8, 3.0).unwrap();
        assert!(a.is_same(&a.clone()));
        assert!(!a.is_same(&b), "separately built candidates differ");

        let rebound = a.with_bound(2.0).unwrap();
        assert!(Arc::ptr_eq(a.shared_policy(), rebound.shared_policy()));
        assert!(!a.is_same(&rebound));
        assert!(a.is_same(&a.with_bound(3.0).unwrap()));
    }
}
