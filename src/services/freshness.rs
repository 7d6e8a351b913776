//! Freshness scoring: how much an observation made at `valid_from` is still worth.
//!
//! The score is an exponential decay renormalized so that it starts at exactly 1.0
//! and reaches exactly 0.0 at the horizon:
//!
//! ```text
//! score(a) = (2^(-a/h) - 2^(-H/h)) / (1 - 2^(-H/h))   for a < H
//! score(a) = 0                                        for a >= H
//! ```
//!
//! with `h` the half-life and `H` the horizon, both in days.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

use crate::config::FreshnessConfig;
use crate::context::Context;
use crate::di::FromContext;
use crate::models::{FiscalPeriod, FreshnessBucket, Temporal, TemporalAnchor, TemporalMetadata};

/// Why a raw timestamp could not be used as `valid_from`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("timestamp is empty")]
    Empty,
    #[error("timestamp has no timezone offset")]
    Naive,
    #[error("timestamp is not RFC 3339 or RFC 2822")]
    Unparseable,
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses an offset-carrying timestamp into UTC.
///
/// Accepts RFC 3339 / ISO-8601 with offset (`2024-01-01T09:30:00-05:00`, `...Z`) and
/// RFC 2822 as found in email `Date:` headers. A zone-less timestamp is rejected
/// with [`TimestampError::Naive`] rather than assumed to be UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TimestampError::Empty);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(raw, format) {
            return Ok(ts.with_timezone(&Utc));
        }
    }

    let naive = NAIVE_FORMATS
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(raw, format).is_ok())
        || NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok();
    if naive {
        Err(TimestampError::Naive)
    } else {
        Err(TimestampError::Unparseable)
    }
}

/// Whole days between `valid_from` and `as_of`, floored. Future timestamps give 0.
pub fn age_days(valid_from: DateTime<Utc>, as_of: DateTime<Utc>) -> u32 {
    let days = (as_of - valid_from).num_days().max(0);
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// Scores observations by age. Pure; safe to clone and share.
#[derive(FromContext, Clone)]
pub struct FreshnessScorer {
    config: Arc<FreshnessConfig>,
}

impl FreshnessScorer {
    pub fn new(config: FreshnessConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn half_life_days(&self) -> f64 {
        self.config.half_life_days
    }

    pub fn horizon_days(&self) -> u32 {
        self.config.horizon_days
    }

    /// Freshness in `[0, 1]` for an age in days.
    ///
    /// Non-increasing in `age_days`; exactly 1.0 at age 0 and exactly 0.0 from the
    /// horizon on.
    pub fn score(&self, age_days: u32) -> f64 {
        let horizon = self.config.horizon_days;
        if age_days == 0 {
            return 1.0;
        }
        if age_days >= horizon {
            return 0.0;
        }

        let h = self.config.half_life_days.max(f64::MIN_POSITIVE);
        let decay = |days: f64| (-days / h).exp2();
        let floor = decay(f64::from(horizon));
        let score = (decay(f64::from(age_days)) - floor) / (1.0 - floor);

        if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Full temporal metadata for an observation anchored at `valid_from`.
    pub fn metadata(
        &self,
        valid_from: DateTime<Utc>,
        anchor: TemporalAnchor,
        period: Option<FiscalPeriod>,
        as_of: Option<DateTime<Utc>>,
    ) -> TemporalMetadata {
        let age_days = age_days(valid_from, as_of.unwrap_or_else(Utc::now));
        TemporalMetadata {
            valid_from,
            age_days,
            freshness_score: self.score(age_days),
            freshness_bucket: FreshnessBucket::from_age_days(age_days),
            anchor,
            period,
        }
    }

    /// Scores a raw document timestamp, degrading to [`Temporal::Unknown`] when it is
    /// missing or unusable.
    pub fn assess(&self, raw: Option<&str>, as_of: Option<DateTime<Utc>>) -> Temporal {
        match raw.map(parse_timestamp) {
            Some(Ok(valid_from)) => Temporal::Known(self.metadata(
                valid_from,
                TemporalAnchor::Document,
                None,
                as_of,
            )),
            Some(Err(e)) => {
                tracing::debug!(error = %e, "timestamp unusable, freshness unknown");
                Temporal::Unknown
            }
            None => Temporal::Unknown,
        }
    }
}

impl Default for FreshnessScorer {
    fn default() -> Self {
        Self::new(FreshnessConfig::default())
    }
}
