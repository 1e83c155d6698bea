//! Exponential time decay of incident severity.
//!
//! A record's weight shrinks geometrically with age: after every
//! `half_life_seconds` only `scale_factor` of it remains. The per-second
//! retention rate is `scale_factor ^ (1 / half_life_seconds)`.

use chrono::{DateTime, TimeDelta, Utc};
use incident_map_analytics_models::DecayParameters;

/// Per-second multiplicative retention rate.
#[must_use]
pub fn decay_factor(params: &DecayParameters) -> f64 {
    params.scale_factor().powf(params.half_life_seconds().recip())
}

/// Severity left after `age_seconds`.
///
/// Ages below zero (a record stamped after the reference time) are treated
/// as zero, so a record never weighs more than its base severity.
#[must_use]
pub fn decayed_severity(base_severity: f64, age_seconds: f64, params: &DecayParameters) -> f64 {
    let age = age_seconds.max(0.0);
    base_severity * decay_factor(params).powf(age)
}

/// Age in seconds after which even a record of `max_initial_severity`
/// decays below the significance threshold.
///
/// Zero when `max_initial_severity` is already at or below the threshold.
#[must_use]
pub fn maximum_relevant_age(params: &DecayParameters, max_initial_severity: f64) -> f64 {
    if max_initial_severity <= params.min_significance() {
        return 0.0;
    }

    params.half_life_seconds()
        * (params.min_significance().ln() - max_initial_severity.ln())
        / params.scale_factor().ln()
}

/// Oldest creation time still worth reading for a decayed aggregate at
/// `reference`.
///
/// Callers pass this to their store so the historical scan stops at the
/// first record that can no longer contribute.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn relevance_cutoff(
    params: &DecayParameters,
    max_initial_severity: f64,
    reference: DateTime<Utc>,
) -> DateTime<Utc> {
    let age_ms = (maximum_relevant_age(params, max_initial_severity) * 1000.0).ceil();
    // Saturates for absurd ages; an unbounded lookback is the right answer
    // there anyway.
    let lookback = TimeDelta::try_milliseconds(age_ms as i64).unwrap_or(TimeDelta::MAX);
    reference
        .checked_sub_signed(lookback)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
