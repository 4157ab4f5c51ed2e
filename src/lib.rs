//! Policy pools for branch-and-bound search over partial joint policies.
//!
//! Provides the frontier ("policy pool") of best-first branch-and-bound
//! planning for decentralized multi-agent problems, plus the pieces around it:
//!
//! - **Pools**: [`pool::PolicyPool`] with a bound-ordered (best-first) and a
//!   depth-first implementation. Both support peek/pop of the front
//!   candidate, heap-merging of pools built by parallel workers, and
//!   threshold pruning against the incumbent.
//! - **Policies**: [`policy::PartialJointPolicy`], a reference-counted
//!   persistent representation whose extensions share structure with their
//!   parents, and [`policy::JointPolicyShape`], which seeds a pool with the
//!   empty policy.
//! - **Search**: [`bnb::BnbRunner`], a generic GMAA*-style driver for any
//!   [`bnb::BnbProblem`] supplying expansion and admissible bounds.
//!
//! # Architecture
//!
//! Pools are sequential, single-owner values. Parallel expansion gives each
//! worker a private pool and merges them with `union`; nothing here is
//! shared across threads without an owner. Heuristics and model
//! semantics stay with the consumer.
//!
//! # Features
//!
//! - `parallel`: expand search batches on rayon workers
//! - `serde`: derive `Serialize`/`Deserialize` for configs, shapes and
//!   summaries

pub mod bnb;
pub mod error;
pub mod policy;
pub mod pool;

pub use error::{PolicyError, PoolError, SearchError};
