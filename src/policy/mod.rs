//! Partial joint policies.
//!
//! A joint policy for a finite-horizon decentralized problem fixes, for every
//! agent and every decision epoch, the action taken after each of that
//! agent's possible observation histories. Search builds such policies one
//! epoch at a time, so most policies in a pool are *partial*: only the first
//! `depth` epochs are decided.
//!
//! # Key Components
//!
//! - [`PartialPolicy`] / [`ProblemContext`]: the only view pools need of a
//!   policy and of the problem that seeds it
//! - [`JointPolicyShape`]: agents, horizon, action and observation counts
//! - [`JointDecisionRule`]: every agent's choices for one epoch
//! - [`PartialJointPolicy`]: persistent, reference-counted list of decision
//!   rules; extending a policy shares every earlier stage with the parent
//!
//! # References
//!
//! Oliehoek, Spaan & Vlassis (2008), "Optimal and Approximate Q-value
//! Functions for Decentralized POMDPs", *JAIR* 32, 289-353.

mod joint;
mod types;

pub use joint::{JointDecisionRule, JointPolicyShape, PartialJointPolicy};
pub use types::{PartialPolicy, ProblemContext};
