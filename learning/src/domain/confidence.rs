// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Confidence scoring shared by patterns, strategies and the selector.
//!
//! `confidence = clamp01(success_rate * sqrt(usage_count) / 10)`
//!
//! Grows with both the observed success rate and the sample size, slowly
//! enough that a handful of successes stays well under the selection and
//! sharing thresholds.

/// Force `value` into `[0, 1]`. NaN maps to 0.
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// `success_count / usage_count`, or 0 when unused.
pub fn success_rate(success_count: u64, usage_count: u64) -> f64 {
    if usage_count == 0 {
        0.0
    } else {
        success_count as f64 / usage_count as f64
    }
}

pub fn compute_confidence(success_count: u64, usage_count: u64) -> f64 {
    if usage_count == 0 {
        return 0.0;
    }
    let rate = success_rate(success_count, usage_count);
    clamp01(rate * (usage_count as f64).sqrt() / 10.0)
}

/// Incremental mean: `avg + (sample - avg) / n`.
pub fn fold_average(average: f64, sample: f64, count: u64) -> f64 {
    if count == 0 {
        return sample;
    }
    average + (sample - average) / count as f64
}
