// Copyright 2025 The Simqual Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The fixed catalogue of agreement/error metrics computed per evaluation
//! window.
//!
//! Each metric is computed independently: a numerically undefined metric
//! (log of a non-positive value, zero denominator, empty window) yields an
//! unset entry that serializes as the `-99` sentinel, and never aborts the
//! rest of the window.

/// Sentinel written for a metric that could not be computed.
pub const SENTINEL: f64 = -99.0;

/// Metric identifiers, declared in result-column order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    Average,
    Cvrmse,
    DailyAmplitudeCvrmse,
    Mbe,
    Mse,
    MaxDifference,
    Maximum,
    Minimum,
    Nmbe,
    Nrmse,
    RSquared,
    Rmse,
    Rmseiqr,
    Rmsle,
    StdDev,
}

/// All metrics, in result-column order.
pub const METRICS: [Metric; 15] = [
    Metric::Average,
    Metric::Cvrmse,
    Metric::DailyAmplitudeCvrmse,
    Metric::Mbe,
    Metric::Mse,
    Metric::MaxDifference,
    Metric::Maximum,
    Metric::Minimum,
    Metric::Nmbe,
    Metric::Nrmse,
    Metric::RSquared,
    Metric::Rmse,
    Metric::Rmseiqr,
    Metric::Rmsle,
    Metric::StdDev,
];

impl Metric {
    pub fn name(&self) -> &'static str {
        use Metric::*;
        match self {
            Average => "Average",
            Cvrmse => "CVRMSE",
            DailyAmplitudeCvrmse => "Daily Amplitude CVRMSE",
            Mbe => "MBE",
            Mse => "MSE",
            MaxDifference => "Max Difference",
            Maximum => "Maximum",
            Minimum => "Minimum",
            Nmbe => "NMBE",
            Nrmse => "NRMSE",
            RSquared => "R squared",
            Rmse => "RMSE",
            Rmseiqr => "RMSEIQR",
            Rmsle => "RMSLE",
            StdDev => "std dev",
        }
    }

    pub fn from_name(name: &str) -> Option<Metric> {
        METRICS.iter().find(|m| m.name() == name).copied()
    }

    /// Result-column label, carrying the unit tag of the original format.
    pub fn column_label(&self) -> &'static str {
        use Metric::*;
        match self {
            Average => "Average [-]",
            Cvrmse => "CVRMSE [%]",
            DailyAmplitudeCvrmse => "Daily Amplitude CVRMSE [%]",
            Mbe => "MBE",
            Mse => "MSE [%]",
            MaxDifference => "Max Difference [-]",
            Maximum => "Maximum [-]",
            Minimum => "Minimum [-]",
            Nmbe => "NMBE [%]",
            Nrmse => "NRMSE [%]",
            RSquared => "R squared [-]",
            Rmse => "RMSE [%]",
            Rmseiqr => "RMSEIQR [%]",
            Rmsle => "RMSLE [%]",
            StdDev => "std dev [-]",
        }
    }
}

/// Computed metric values for one window; unset entries failed to compute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Norms {
    values: [Option<f64>; METRICS.len()],
}

impl Norms {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values[metric as usize]
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        self.values[metric as usize] = value;
    }

    /// Value for serialization, with the sentinel standing in for failures.
    pub fn get_or_sentinel(&self, metric: Metric) -> f64 {
        self.get(metric).unwrap_or(SENTINEL)
    }
}

/// Compute the full metric catalogue over one aligned window.
pub fn compute_norms(time: &[f64], reference: &[f64], candidate: &[f64]) -> Norms {
    let mut norms = Norms::default();
    let r = reference;
    let c = candidate;

    let avg_r = mean(r);
    let mse = mean_squared_error(r, c);
    let rmse = mse.map(f64::sqrt);
    let mbe = mean_bias_error(r, c);

    norms.set(Metric::Average, avg_r);
    norms.set(Metric::Maximum, fold_max(c));
    norms.set(Metric::Minimum, fold_min(c));
    norms.set(Metric::Mse, mse);
    norms.set(Metric::Rmse, rmse);
    norms.set(Metric::Mbe, mbe);
    norms.set(Metric::Cvrmse, percent_of(rmse, avg_r));
    norms.set(Metric::Nrmse, percent_of(rmse, avg_r));
    norms.set(Metric::Nmbe, percent_of(mbe, avg_r));
    norms.set(Metric::Rmseiqr, percent_of(rmse, interquartile_range(r)));
    norms.set(Metric::Rmsle, rmsle(r, c));
    norms.set(Metric::RSquared, r_squared(r, c));
    norms.set(Metric::StdDev, error_std_dev(r, c));
    norms.set(Metric::MaxDifference, max_difference(r, c));
    norms.set(
        Metric::DailyAmplitudeCvrmse,
        daily_amplitude_cvrmse(time, r, c),
    );

    norms
}

fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        None
    } else {
        Some(xs.iter().sum::<f64>() / xs.len() as f64)
    }
}

fn fold_max(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        None
    } else {
        Some(xs.iter().fold(f64::NEG_INFINITY, |a, b| a.max(*b)))
    }
}

fn fold_min(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        None
    } else {
        Some(xs.iter().fold(f64::INFINITY, |a, b| a.min(*b)))
    }
}

fn mean_squared_error(r: &[f64], c: &[f64]) -> Option<f64> {
    if r.is_empty() {
        return None;
    }
    let sum: f64 = r.iter().zip(c.iter()).map(|(a, b)| (b - a) * (b - a)).sum();
    Some(sum / r.len() as f64)
}

fn mean_bias_error(r: &[f64], c: &[f64]) -> Option<f64> {
    if r.is_empty() {
        return None;
    }
    let sum: f64 = r.iter().zip(c.iter()).map(|(a, b)| b - a).sum();
    Some(sum / r.len() as f64)
}

/// `100 * value / denom`, unset for a zero denominator.
fn percent_of(value: Option<f64>, denom: Option<f64>) -> Option<f64> {
    let value = value?;
    let denom = denom?;
    if denom == 0.0 {
        None
    } else {
        Some(100.0 * value / denom)
    }
}

/// Interquartile range with linear-interpolated quartiles.
fn interquartile_range(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(percentile(&sorted, 0.75) - percentile(&sorted, 0.25))
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Root-mean-square log error; unset when either series contains a
/// non-positive value.
fn rmsle(r: &[f64], c: &[f64]) -> Option<f64> {
    if r.is_empty() || r.iter().chain(c.iter()).any(|x| *x <= 0.0) {
        return None;
    }
    let sum: f64 = r
        .iter()
        .zip(c.iter())
        .map(|(a, b)| {
            let d = b.ln() - a.ln();
            d * d
        })
        .sum();
    Some((sum / r.len() as f64).sqrt())
}

/// Coefficient of determination of the candidate against the reference.
fn r_squared(r: &[f64], c: &[f64]) -> Option<f64> {
    let avg_r = mean(r)?;
    let ss_res: f64 = r.iter().zip(c.iter()).map(|(a, b)| (b - a) * (b - a)).sum();
    let ss_tot: f64 = r.iter().map(|a| (a - avg_r) * (a - avg_r)).sum();
    if ss_tot == 0.0 {
        None
    } else {
        Some(1.0 - ss_res / ss_tot)
    }
}

/// Population standard deviation of the error series `C - R`.
fn error_std_dev(r: &[f64], c: &[f64]) -> Option<f64> {
    if r.is_empty() {
        return None;
    }
    let errors: Vec<f64> = r.iter().zip(c.iter()).map(|(a, b)| b - a).collect();
    let avg = mean(&errors)?;
    let var: f64 =
        errors.iter().map(|e| (e - avg) * (e - avg)).sum::<f64>() / errors.len() as f64;
    Some(var.sqrt())
}

fn max_difference(r: &[f64], c: &[f64]) -> Option<f64> {
    if r.is_empty() {
        return None;
    }
    Some(
        r.iter()
            .zip(c.iter())
            .map(|(a, b)| (b - a).abs())
            .fold(f64::NEG_INFINITY, f64::max),
    )
}

/// CVRMSE over daily peak-to-trough amplitudes instead of instantaneous
/// values; the time axis is in hours, so day boundaries fall at `t / 24`.
fn daily_amplitude_cvrmse(time: &[f64], r: &[f64], c: &[f64]) -> Option<f64> {
    if time.is_empty() {
        return None;
    }

    let mut ref_amplitudes: Vec<f64> = Vec::new();
    let mut cand_amplitudes: Vec<f64> = Vec::new();
    let mut day = (time[0] / 24.0).floor() as i64;
    let mut start = 0usize;
    for i in 0..=time.len() {
        let next_day = if i < time.len() {
            (time[i] / 24.0).floor() as i64
        } else {
            day + 1
        };
        if next_day != day {
            ref_amplitudes.push(fold_max(&r[start..i])? - fold_min(&r[start..i])?);
            cand_amplitudes.push(fold_max(&c[start..i])? - fold_min(&c[start..i])?);
            day = next_day;
            start = i;
        }
    }

    let rmse = mean_squared_error(&ref_amplitudes, &cand_amplitudes).map(f64::sqrt);
    percent_of(rmse, mean(&ref_amplitudes))
}
