//! Policy pools: the frontier of branch-and-bound policy search.
//!
//! A pool holds [`Candidate`]s (a partial policy plus an admissible upper
//! bound on its value) and hands them back in a fixed order. The search
//! driver repeatedly takes the front candidate, expands it, inserts the
//! children and, whenever a better complete policy turns up, prunes every
//! candidate whose bound can no longer beat it.
//!
//! # Key Components
//!
//! - [`PolicyPool`]: the shared capability set (init, select, pop, insert,
//!   union, prune, size, best-ranked access, diagnostics)
//! - [`BoundOrderedPool`]: highest bound first (best-first search)
//! - [`DepthFirstPool`]: deepest policy first, bound as tie-break
//! - [`PoolSummary`]: count and bound distribution for logs and reports
//!
//! # References
//!
//! Szer, Charpillet & Zilberstein (2005), "MAA*: A Heuristic Search Algorithm
//! for Solving Decentralized POMDPs", *UAI*.

mod bound;
mod depth_first;
mod heap;
mod summary;
mod types;

pub use bound::BoundOrderedPool;
pub use depth_first::DepthFirstPool;
pub use summary::PoolSummary;
pub use types::{Bound, Candidate, PolicyPool};
