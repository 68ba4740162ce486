use serde::{Deserialize, Serialize};

/// Percentile `p` (0–100) of an ascending-sorted slice, linearly
/// interpolated between order statistics.
///
/// Returns `None` for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    if lower == upper {
        Some(sorted[lower])
    } else {
        Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
    }
}

/// Dispersion summary of a revenue distribution.
///
/// `var_95` is the 5th percentile of revenue: the level revenue stays above
/// with 95% confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub median: f64,
    pub var_95: f64,
    pub min: f64,
    pub max: f64,
}

impl DistributionStats {
    /// Summarise `samples`; `None` if empty or any sample is not finite.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() || samples.iter().any(|s| !s.is_finite()) {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len() as f64;
        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        // Rounding in the sum can push the mean a few ulps outside [min, max].
        let mean = (sorted.iter().sum::<f64>() / n).clamp(min, max);
        let variance = sorted.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            mean,
            std: variance.sqrt(),
            median: percentile(&sorted, 50.0)?,
            var_95: percentile(&sorted, 5.0)?,
            min,
            max,
        })
    }

    /// Revenue at risk relative to the mean (mean minus the 5th percentile).
    pub fn shortfall_from_mean(&self) -> f64 {
        self.mean - self.var_95
    }
}

/// The forward hedge locks in one revenue figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardStats {
    pub revenue: f64,
}

/// Per-strategy summary, serialised as `{unhedged, forward, option}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub unhedged: DistributionStats,
    pub forward: ForwardStats,
    pub option: DistributionStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&sorted, 0.0), Some(1.0));
        assert_eq!(percentile(&sorted, 50.0), Some(3.0));
        assert_eq!(percentile(&sorted, 100.0), Some(5.0));
        assert_relative_eq!(percentile(&sorted, 5.0).unwrap(), 1.2, epsilon = 1e-12);
        assert_relative_eq!(percentile(&[1.0, 2.0], 50.0).unwrap(), 1.5, epsilon = 1e-12);
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_distribution_stats() {
        let stats = DistributionStats::from_samples(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_relative_eq!(stats.mean, 2.5, epsilon = 1e-12);
        assert_relative_eq!(stats.std, 1.25f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(stats.median, 2.5, epsilon = 1e-12);
        assert_relative_eq!(stats.var_95, 1.15, epsilon = 1e-12);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_relative_eq!(stats.shortfall_from_mean(), 1.35, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_distribution() {
        let stats = DistributionStats::from_samples(&[7_000_000.0; 100]).unwrap();
        assert_eq!(stats.mean, 7_000_000.0);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.median, 7_000_000.0);
        assert_eq!(stats.var_95, 7_000_000.0);
    }

    #[test]
    fn test_rejects_empty_and_non_finite() {
        assert!(DistributionStats::from_samples(&[]).is_none());
        assert!(DistributionStats::from_samples(&[1.0, f64::NAN]).is_none());
    }

    #[test]
    fn test_summary_serializes_with_dashboard_names() {
        let d = DistributionStats::from_samples(&[1.0, 2.0]).unwrap();
        let summary = SummaryStatistics {
            unhedged: d,
            forward: ForwardStats { revenue: 7.0 },
            option: d,
        };
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["forward"]["revenue"], 7.0);
        assert!(json["unhedged"]["var_95"].is_number());
        assert!(json["option"]["std"].is_number());
    }
}
