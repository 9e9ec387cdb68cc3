// Copyright 2025 The Simqual Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Time-axis reconciliation between a reference series and a candidate
//! series that may be sampled at a different density or in a different
//! unit (hours vs. minutes).

use std::collections::HashMap;

use crate::common::{Error, ErrorCode, ErrorKind, Result};

/// One evaluation interval, closed on both ends, in reference time units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Window {
    pub start: f64,
    pub end: f64,
}

/// Aligned, window-restricted value sequences for one (tool, variable) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Aligned {
    pub time: Vec<f64>,
    pub reference: Vec<f64>,
    pub candidate: Vec<f64>,
}

/// Scale divisor that maps a time axis in the given unit onto hours.
pub fn time_scale(unit: &str) -> Result<f64> {
    match unit {
        "h" => Ok(1.0),
        "min" => Ok(60.0),
        _ => Err(Error::new(
            ErrorKind::Alignment,
            ErrorCode::TimeAlignment,
            Some(format!("unknown time unit '{unit}'")),
        )),
    }
}

// Timestamps act as lookup keys; keying on a scaled integer sidesteps
// equality comparisons between computed floats.
fn time_key(t: f64) -> i64 {
    (t * 1_000_000.0).round() as i64
}

/// Resample candidate values onto the reference time axis.
///
/// `divisor` converts the candidate axis into reference units. Every
/// reference timestamp must have an exactly matching candidate sample; a
/// single miss fails the whole pair (no partial windows are constructed).
pub fn resample(
    ref_time: &[f64],
    cand_time: &[f64],
    cand_values: &[f64],
    divisor: f64,
) -> Result<Vec<f64>> {
    let identical = divisor == 1.0
        && ref_time.len() == cand_time.len()
        && ref_time
            .iter()
            .zip(cand_time.iter())
            .all(|(a, b)| time_key(*a) == time_key(*b));
    if identical {
        return Ok(cand_values.to_vec());
    }

    let lookup: HashMap<i64, f64> = cand_time
        .iter()
        .zip(cand_values.iter())
        .map(|(t, v)| (time_key(t / divisor), *v))
        .collect();

    let mut resampled = Vec::with_capacity(ref_time.len());
    for t in ref_time {
        match lookup.get(&time_key(*t)) {
            Some(v) => resampled.push(*v),
            None => {
                return Err(Error::new(
                    ErrorKind::Alignment,
                    ErrorCode::TimeAlignment,
                    Some(format!("no candidate sample at reference time {t}")),
                ));
            }
        }
    }
    Ok(resampled)
}

/// Window validation, applied before any slicing: reversed bounds or bounds
/// outside the reference time extent skip this window only.
pub fn window_in_range(window: &Window, ref_time: &[f64]) -> bool {
    let (Some(first), Some(last)) = (ref_time.first(), ref_time.last()) else {
        return false;
    };
    window.end >= window.start && window.start >= *first && window.end <= *last
}

/// Restrict aligned sequences to `[start, end]`, both bounds inclusive.
pub fn slice_window(
    window: &Window,
    time: &[f64],
    reference: &[f64],
    candidate: &[f64],
) -> Result<Aligned> {
    if time.len() != reference.len() || time.len() != candidate.len() {
        return Err(Error::new(
            ErrorKind::Alignment,
            ErrorCode::PostCheckMismatch,
            Some(format!(
                "aligned lengths diverge: {} time, {} reference, {} candidate",
                time.len(),
                reference.len(),
                candidate.len()
            )),
        ));
    }

    let mut out = Aligned {
        time: Vec::new(),
        reference: Vec::new(),
        candidate: Vec::new(),
    };
    for (i, t) in time.iter().enumerate() {
        if *t >= window.start && *t <= window.end {
            out.time.push(*t);
            out.reference.push(reference[i]);
            out.candidate.push(candidate[i]);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_axes_pass_through() {
        let t = [0.0, 1.0, 2.0];
        let v = [10.0, 20.0, 30.0];
        assert_eq!(v.to_vec(), resample(&t, &t, &v, 1.0).unwrap());
    }

    #[test]
    fn minute_axis_resamples_onto_hours() {
        let ref_time = [0.0, 1.0, 2.0];
        let cand_time: Vec<f64> = (0..=120).map(|m| m as f64).collect();
        let cand_values: Vec<f64> = cand_time.iter().map(|m| m * 2.0).collect();
        let resampled = resample(&ref_time, &cand_time, &cand_values, 60.0).unwrap();
        assert_eq!(vec![0.0, 120.0, 240.0], resampled);
    }

    #[test]
    fn missing_sample_fails_alignment() {
        let ref_time = [0.0, 1.0, 2.0, 3.0];
        let cand_time = [0.0, 1.0, 2.0];
        let cand_values = [1.0, 2.0, 3.0];
        let err = resample(&ref_time, &cand_time, &cand_values, 1.0).unwrap_err();
        assert_eq!(ErrorCode::TimeAlignment, err.code);
    }

    #[test]
    fn reversed_and_out_of_range_windows_rejected() {
        let t = [0.0, 1.0, 2.0, 3.0];
        assert!(window_in_range(&Window { start: 1.0, end: 2.0 }, &t));
        assert!(window_in_range(&Window { start: 0.0, end: 3.0 }, &t));
        assert!(!window_in_range(&Window { start: 2.0, end: 1.0 }, &t));
        assert!(!window_in_range(&Window { start: -1.0, end: 2.0 }, &t));
        assert!(!window_in_range(&Window { start: 1.0, end: 4.0 }, &t));
        assert!(!window_in_range(&Window { start: 0.0, end: 1.0 }, &[]));
    }

    #[test]
    fn slice_is_closed_interval() {
        let t = [0.0, 1.0, 2.0, 3.0];
        let r = [10.0, 20.0, 30.0, 40.0];
        let c = [11.0, 21.0, 31.0, 41.0];
        let aligned = slice_window(&Window { start: 1.0, end: 2.0 }, &t, &r, &c).unwrap();
        assert_eq!(vec![1.0, 2.0], aligned.time);
        assert_eq!(vec![20.0, 30.0], aligned.reference);
        assert_eq!(vec![21.0, 31.0], aligned.candidate);
    }
}
