//! Core trait for branch-and-bound policy search problems.

use crate::policy::{PartialPolicy, ProblemContext};
use crate::pool::Candidate;

/// A policy search problem, as seen by [`BnbRunner`](super::BnbRunner).
///
/// Users implement this trait to specify:
/// - The context that seeds the search with the empty policy
/// - How to expand a partial policy into its children, each with an
///   admissible upper bound
/// - The exact value of a complete policy
///
/// Values are maximized. A bound must never be lower than the value of any
/// completion of its policy, otherwise the search may prune the optimum.
///
/// # Type Parameters
///
/// * `Policy` — the partial policy representation (`Send + Sync` so
///   candidates can cross rayon workers)
/// * `Context` — the problem description that builds the empty policy
pub trait BnbProblem: Sync {
    /// The policy type.
    type Policy: PartialPolicy + Send + Sync;

    /// The context type seeding the pool.
    type Context: ProblemContext<Policy = Self::Policy>;

    /// The problem description used for `PolicyPool::init`.
    fn context(&self) -> &Self::Context;

    /// Generates the children of `parent`.
    ///
    /// Each child must strictly extend the parent's policy and carry its own
    /// freshly computed bound. An empty result marks a dead end.
    fn expand(&self, parent: &Candidate<Self::Policy>) -> Vec<Candidate<Self::Policy>>;

    /// Exact value of `policy` if it is complete, `None` otherwise.
    fn complete_value(&self, policy: &Self::Policy) -> Option<f64>;
}
