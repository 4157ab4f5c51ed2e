//! Human-readable frontier diagnostics.

use std::fmt;

use super::types::Bound;

/// Snapshot of a pool's size and bound distribution.
///
/// Statistics and the histogram cover finite bounds only; the `+inf` seed
/// sentinel is counted in `unbounded`. The `Display` output is meant for
/// people and may change between versions.
///
/// # Examples
///
/// ```
/// use u_policypool::pool::{Bound, PoolSummary};
///
/// let bounds = [2.0, 4.0, 6.0, 8.0].map(|b| Bound::new(b).unwrap());
/// let summary = PoolSummary::from_bounds(bounds, 2);
/// assert_eq!(summary.size, 4);
/// assert_eq!(summary.histogram, vec![2, 2]);
/// assert_eq!(summary.mean_bound, Some(5.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolSummary {
    /// Number of candidates.
    pub size: usize,
    /// Candidates carrying the `+inf` sentinel.
    pub unbounded: usize,
    /// Smallest finite bound.
    pub min_bound: Option<f64>,
    /// Largest finite bound.
    pub max_bound: Option<f64>,
    /// Mean of the finite bounds.
    pub mean_bound: Option<f64>,
    /// Equal-width bins over `[min_bound, max_bound]`.
    pub histogram: Vec<usize>,
}

impl PoolSummary {
    /// Summarizes `bounds` into `buckets` bins (at least one).
    pub fn from_bounds<I>(bounds: I, buckets: usize) -> Self
    where
        I: IntoIterator<Item = Bound>,
    {
        let buckets = buckets.max(1);
        let mut size = 0;
        let mut unbounded = 0;
        let mut finite = Vec::new();
        for bound in bounds {
            size += 1;
            if bound.is_unbounded() {
                unbounded += 1;
            } else if bound.value().is_finite() {
                finite.push(bound.value());
            }
        }

        if finite.is_empty() {
            return Self {
                size,
                unbounded,
                min_bound: None,
                max_bound: None,
                mean_bound: None,
                histogram: vec![0; buckets],
            };
        }

        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let count = finite.len() as f64;
        let sum = finite.iter().sum::<f64>();
        let mean = if sum.is_finite() {
            sum / count
        } else {
            finite.iter().map(|v| v / count).sum()
        };

        let mut histogram = vec![0; buckets];
        // Halved so that `max - min` stays finite across the whole f64 range.
        let half_width = max / 2.0 - min / 2.0;
        for v in &finite {
            let index = if half_width > 0.0 {
                (((v / 2.0 - min / 2.0) / half_width) * buckets as f64) as usize
            } else {
                0
            };
            histogram[index.min(buckets - 1)] += 1;
        }

        Self {
            size,
            unbounded,
            min_bound: Some(min),
            max_bound: Some(max),
            mean_bound: Some(mean),
            histogram,
        }
    }
}

impl fmt::Display for PoolSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "policy pool: {} candidates ({} unbounded)",
            self.size, self.unbounded
        )?;
        let (Some(min), Some(max), Some(mean)) = (self.min_bound, self.max_bound, self.mean_bound)
        else {
            return writeln!(f, "  no finite bounds");
        };
        writeln!(f, "  finite bounds: min {min:.3}, max {max:.3}, mean {mean:.3}")?;
        let bins = self.histogram.len() as f64;
        let width = max / bins - min / bins;
        for (i, count) in self.histogram.iter().enumerate() {
            let lo = min + width * i as f64;
            let hi = if i + 1 == self.histogram.len() {
                max
            } else {
                lo + width
            };
            writeln!(f, "  [{lo:>10.3}, {hi:>10.3}] {count}")?;
        }
        Ok(())
    }
}
