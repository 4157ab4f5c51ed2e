//! Core traits for partial policies and the problems that seed them.

/// A possibly incomplete policy stored in a policy pool.
///
/// Pools never mutate a policy: it sits behind an `Arc` inside a
/// [`Candidate`](crate::pool::Candidate), and derived candidates build new
/// policies that share structure with their parent.
pub trait PartialPolicy {
    /// Number of decision stages already fixed.
    ///
    /// The empty policy has depth 0.
    fn depth(&self) -> usize;
}

/// Static description of a decision problem, as far as pools need it.
///
/// Pools only ask the context for the distinguished empty policy that seeds
/// a search; everything else about the problem stays with the caller.
///
/// # Examples
///
/// ```
/// use u_policypool::policy::{JointPolicyShape, PartialPolicy, ProblemContext};
///
/// let shape = JointPolicyShape::new(2, 3, vec![2, 2], vec![2, 2]).unwrap();
/// let empty = shape.empty_policy();
/// assert_eq!(empty.depth(), 0);
/// ```
pub trait ProblemContext {
    /// The policy type this problem's pools hold.
    type Policy: PartialPolicy;

    /// Builds the policy with no decisions made yet.
    fn empty_policy(&self) -> Self::Policy;
}
