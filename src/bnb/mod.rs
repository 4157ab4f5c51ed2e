//! Branch-and-bound policy search (GMAA*-style).
//!
//! A generic best-first driver over any [`PolicyPool`](crate::pool::PolicyPool):
//! pop the front candidate, evaluate it if complete, otherwise expand it,
//! and prune the pool each time a better complete policy is found. The
//! expansion logic and the heuristic bounds come from the user's
//! [`BnbProblem`]; the driver only enforces the branch-and-bound rules.
//!
//! # References
//!
//! - Szer, Charpillet & Zilberstein (2005), "MAA*: A Heuristic Search
//!   Algorithm for Solving Decentralized POMDPs", *UAI*.
//! - Oliehoek, Spaan & Vlassis (2008), "Optimal and Approximate Q-value
//!   Functions for Decentralized POMDPs", *JAIR* 32, 289-353.

mod config;
mod runner;
mod types;

pub use config::BnbConfig;
pub use runner::{BnbResult, BnbRunner};
pub use types::BnbProblem;
