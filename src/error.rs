//! Typed errors for pools, policies and the search driver.
//!
//! Every variant is a contract violation reported straight to the caller.
//! Nothing in this crate retries.

use std::fmt;

/// Failure of a policy-pool operation or of candidate construction.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolError {
    /// `select` or `pop` was called on a pool with no candidates.
    EmptyFrontier,
    /// `pop(Some(expected))` found a different best candidate than `expected`.
    ///
    /// The pool is left untouched when this is returned.
    FrontierInconsistency {
        /// Bound of the candidate the caller expected to remove.
        expected: f64,
        /// Bound of the candidate actually at the front of the pool.
        found: f64,
    },
    /// A candidate bound was NaN.
    InvalidBound {
        /// The rejected value.
        value: f64,
    },
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFrontier => write!(f, "policy pool is empty"),
            Self::FrontierInconsistency { expected, found } => write!(
                f,
                "frontier inconsistency: expected to pop candidate with bound {expected}, \
                 front candidate has bound {found}"
            ),
            Self::InvalidBound { value } => write!(f, "invalid candidate bound: {value}"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Failure while describing or extending a partial joint policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The problem shape is unusable (no agents, zero horizon, empty action set, ...).
    InvalidShape { detail: String },
    /// Tried to extend a policy that already covers every decision epoch.
    HorizonExceeded { horizon: usize },
    /// A decision rule does not fit the shape at the epoch it would fill.
    RuleMismatch { epoch: usize, detail: String },
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidShape { detail } => write!(f, "invalid problem shape: {detail}"),
            Self::HorizonExceeded { horizon } => {
                write!(f, "policy already covers the full horizon of {horizon}")
            }
            Self::RuleMismatch { epoch, detail } => {
                write!(f, "decision rule for epoch {epoch} does not fit: {detail}")
            }
        }
    }
}

impl std::error::Error for PolicyError {}

/// Failure of a branch-and-bound run.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    /// The [`BnbConfig`](crate::bnb::BnbConfig) failed validation.
    InvalidConfig(String),
    /// A pool operation reported a contract violation mid-search.
    Pool(PoolError),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(detail) => write!(f, "invalid BnbConfig: {detail}"),
            Self::Pool(err) => write!(f, "pool error during search: {err}"),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidConfig(_) => None,
            Self::Pool(err) => Some(err),
        }
    }
}

impl From<PoolError> for SearchError {
    fn from(err: PoolError) -> Self {
        Self::Pool(err)
    }
}
