//! Branch-and-bound configuration.

/// Configuration parameters for [`BnbRunner`](super::BnbRunner).
///
/// # Examples
///
/// ```
/// use u_policypool::bnb::BnbConfig;
///
/// let config = BnbConfig::default()
///     .with_max_expansions(10_000)
///     .with_slack(0.5)
///     .with_batch_size(8);
/// assert_eq!(config.max_expansions, 10_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BnbConfig {
    /// Maximum number of expanded candidates. 0 = no limit.
    pub max_expansions: usize,

    /// Tolerated loss against the optimum.
    ///
    /// Candidates whose bound is `<= incumbent + slack` are discarded, so the
    /// returned value is within `slack` of optimal. 0 gives exact search.
    pub slack: f64,

    /// Whether to expand each batch on rayon workers, each filling a private
    /// pool that is merged back with `union`.
    ///
    /// Only honoured with the `parallel` feature.
    pub parallel: bool,

    /// Number of candidates popped and expanded per step.
    ///
    /// 1 is plain best-first search; larger batches feed parallel workers.
    pub batch_size: usize,

    /// Histogram bins in the final [`PoolSummary`](crate::pool::PoolSummary).
    pub summary_buckets: usize,
}

impl Default for BnbConfig {
    fn default() -> Self {
        Self {
            max_expansions: 0,
            slack: 0.0,
            parallel: false,
            batch_size: 1,
            summary_buckets: 5,
        }
    }
}

impl BnbConfig {
    /// Sets the expansion budget (0 = unlimited).
    pub fn with_max_expansions(mut self, n: usize) -> Self {
        self.max_expansions = n;
        self
    }

    /// Sets the optimality slack.
    pub fn with_slack(mut self, slack: f64) -> Self {
        self.slack = slack;
        self
    }

    /// Enables or disables parallel batch expansion.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the number of candidates expanded per step.
    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    /// Sets the number of histogram bins in the final pool summary.
    pub fn with_summary_buckets(mut self, n: usize) -> Self {
        self.summary_buckets = n;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.slack.is_finite() || self.slack < 0.0 {
            return Err("slack must be finite and non-negative".into());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".into());
        }
        if self.summary_buckets == 0 {
            return Err("summary_buckets must be at least 1".into());
        }
        Ok(())
    }
}
