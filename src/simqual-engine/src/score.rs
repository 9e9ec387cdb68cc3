// Copyright 2025 The Simqual Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Weighted composite scoring and badge classification.

use std::collections::HashMap;

use crate::norms::{METRICS, Metric, Norms};

/// Reference averages below this magnitude short-circuit the window score
/// to zero, ahead of every relative-error term.
pub const DEGENERATE_AVERAGE: f64 = 1e-4;

// stands in for a missing/non-positive weight total, making each term's
// contribution effectively vanish instead of dividing by zero
const UNWEIGHTED_SUM: f64 = 999_999.0;

/// Per-metric contribution weights, immutable for the whole run.
///
/// `sum` is the scoring denominator: the total of all configured weights
/// except `Max Difference`, whose separately-normalized bonus term is
/// accounted for by the scorer adding one extra unit. A non-positive
/// `Max Difference` entry disables that term (the legacy convention for a
/// present-but-inactive column).
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    weights: HashMap<Metric, f64>,
    pub sum: f64,
}

impl WeightTable {
    pub fn new(weights: HashMap<Metric, f64>) -> WeightTable {
        let sum = weights
            .iter()
            .filter(|(metric, _)| **metric != Metric::MaxDifference)
            .map(|(_, w)| *w)
            .sum();
        WeightTable { weights, sum }
    }

    pub fn weight(&self, metric: Metric) -> Option<f64> {
        self.weights.get(&metric).copied()
    }

    /// The configured `Max Difference` threshold, if active.
    pub fn max_difference_threshold(&self) -> Option<f64> {
        match self.weights.get(&Metric::MaxDifference) {
            Some(w) if *w > 0.0 => Some(*w),
            _ => None,
        }
    }
}

/// Composite score for one evaluation window, nominally in `[0, 100]` but
/// not clamped: out-of-range weights produce out-of-range scores, which is
/// left to the weight table's author.
pub fn score_window(norms: &Norms, weights: &WeightTable) -> f64 {
    let average = norms.get(Metric::Average).unwrap_or(0.0);
    if average.abs() < DEGENERATE_AVERAGE {
        return 0.0;
    }

    let mut denom = if weights.sum > 0.0 {
        weights.sum
    } else {
        UNWEIGHTED_SUM
    };
    if weights.max_difference_threshold().is_some() {
        denom += 1.0;
    }

    let mut total = 0.0;
    for metric in METRICS {
        if metric == Metric::MaxDifference {
            continue;
        }
        let Some(weight) = weights.weight(metric) else {
            continue;
        };
        let Some(value) = norms.get(metric) else {
            // a failed metric contributes nothing
            continue;
        };
        let penalty = match metric {
            // percentage-scale metrics penalize by their own magnitude
            Metric::Cvrmse
            | Metric::DailyAmplitudeCvrmse
            | Metric::Nmbe
            | Metric::Nrmse
            | Metric::Rmseiqr
            | Metric::Rmsle => value.abs(),
            // dimensionless diagnostics scale by the reference average
            // without percentage conversion
            Metric::RSquared | Metric::StdDev => value / average,
            // absolute-scale metrics are mean-normalized
            _ => 100.0 * value.abs() / average,
        };
        total += weight * (100.0 - penalty);
    }

    // smaller deviations earn a bonus on an 80..100 scale
    if let (Some(threshold), Some(max_diff)) = (
        weights.max_difference_threshold(),
        norms.get(Metric::MaxDifference),
    ) {
        total += 80.0 + 20.0 * (threshold - max_diff.abs()) / threshold;
    }

    total / denom
}

/// A variable's final score: the unweighted mean over its evaluated
/// windows, rounded to two decimals. Unset when no window contributed.
pub fn combine_windows(window_scores: &[f64]) -> Option<f64> {
    if window_scores.is_empty() {
        return None;
    }
    let mean = window_scores.iter().sum::<f64>() / window_scores.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}

/// Discrete quality tier derived from the composite score.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Badge {
    Gold,
    Silver,
    Bronze,
    #[default]
    Failed,
}

impl Badge {
    /// Lower bounds are exclusive: exactly 95.0 is Silver, not Gold.
    pub fn classify(score: f64) -> Badge {
        if score > 95.0 {
            Badge::Gold
        } else if score > 90.0 {
            Badge::Silver
        } else if score > 80.0 {
            Badge::Bronze
        } else {
            Badge::Failed
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Badge::Gold => "Gold",
            Badge::Silver => "Silver",
            Badge::Bronze => "Bronze",
            Badge::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for Badge {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::norms::compute_norms;
    use float_cmp::approx_eq;

    fn weights(entries: &[(Metric, f64)]) -> WeightTable {
        WeightTable::new(entries.iter().copied().collect())
    }

    #[test]
    fn identical_series_score_exactly_100() {
        let t = [0.0, 1.0, 2.0];
        let v = [10.0, 20.0, 30.0];
        let norms = compute_norms(&t, &v, &v);
        let table = weights(&[
            (Metric::Cvrmse, 2.0),
            (Metric::Nmbe, 1.0),
            (Metric::Nrmse, 1.0),
            (Metric::Rmse, 1.0),
            (Metric::Mbe, 1.0),
        ]);
        assert_eq!(6.0, table.sum);
        assert!(approx_eq!(f64, 100.0, score_window(&norms, &table)));
        assert_eq!(Some(100.0), combine_windows(&[score_window(&norms, &table)]));
    }

    #[test]
    fn degenerate_average_forces_zero() {
        let t = [0.0, 1.0];
        let r = [1e-5, -1e-5];
        let c = [500.0, 900.0];
        let norms = compute_norms(&t, &r, &c);
        let table = weights(&[(Metric::Cvrmse, 1.0)]);
        assert_eq!(0.0, score_window(&norms, &table));
    }

    #[test]
    fn non_positive_sum_falls_back_to_sentinel_denominator() {
        let t = [0.0, 1.0, 2.0];
        let v = [10.0, 20.0, 30.0];
        let norms = compute_norms(&t, &v, &v);
        let table = weights(&[]);
        assert_eq!(0.0, score_window(&norms, &table));

        // a negative-only table keeps its terms but contributes next to
        // nothing through the sentinel denominator
        let table = weights(&[(Metric::Mbe, -1.0)]);
        assert_eq!(-1.0, table.sum);
        let score = score_window(&norms, &table);
        assert!(score < 0.0 && score > -1e-3);
    }

    #[test]
    fn max_difference_bonus_is_bounded() {
        let t = [0.0, 1.0, 2.0];
        let v = [10.0, 20.0, 30.0];
        let norms = compute_norms(&t, &v, &v);
        // only the Max Difference term is configured: sum stays 0, so the
        // denominator is the +1 on top of the 999999 fallback
        let table = weights(&[(Metric::MaxDifference, 2.0)]);
        assert_eq!(0.0, table.sum);
        let score = score_window(&norms, &table);
        // zero deviation earns the full 100-point bonus over ~1e6
        assert!(approx_eq!(
            f64,
            100.0 / 1_000_000.0,
            score,
            epsilon = 1e-9
        ));
    }

    #[test]
    fn max_difference_combines_with_weighted_terms() {
        let t = [0.0, 1.0, 2.0];
        let v = [10.0, 20.0, 30.0];
        let norms = compute_norms(&t, &v, &v);
        let table = weights(&[(Metric::Cvrmse, 1.0), (Metric::MaxDifference, 5.0)]);
        assert_eq!(1.0, table.sum);
        // (1*100 + 100) / (1+1)
        assert!(approx_eq!(f64, 100.0, score_window(&norms, &table)));
    }

    #[test]
    fn negative_max_difference_weight_disables_bonus() {
        let table = weights(&[(Metric::Cvrmse, 1.0), (Metric::MaxDifference, -1.0)]);
        assert_eq!(None, table.max_difference_threshold());
        assert_eq!(1.0, table.sum);
    }

    #[test]
    fn window_mean_is_order_independent() {
        let scores = [97.25, 88.5, 93.75];
        let permuted = [93.75, 97.25, 88.5];
        assert_eq!(combine_windows(&scores), combine_windows(&permuted));
        assert!(approx_eq!(
            f64,
            93.17,
            combine_windows(&scores).unwrap(),
            epsilon = 1e-9
        ));
    }

    #[test]
    fn no_windows_leaves_score_unset() {
        assert_eq!(None, combine_windows(&[]));
    }

    #[test]
    fn badge_boundaries() {
        assert_eq!(Badge::Silver, Badge::classify(95.00));
        assert_eq!(Badge::Gold, Badge::classify(95.01));
        assert_eq!(Badge::Bronze, Badge::classify(90.00));
        assert_eq!(Badge::Silver, Badge::classify(90.01));
        assert_eq!(Badge::Failed, Badge::classify(80.00));
        assert_eq!(Badge::Bronze, Badge::classify(80.01));
        assert_eq!(Badge::Gold, Badge::classify(100.0));
        assert_eq!(Badge::Failed, Badge::classify(0.0));
    }
}
