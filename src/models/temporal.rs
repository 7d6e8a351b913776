//! Temporal metadata attached to entities and edges.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Coarse freshness label derived from age in days.
///
/// Cutoffs are fixed day counts, independent of the decay curve:
/// `≤14` very fresh, `≤45` fresh, `≤120` moderate, `≤400` stale, otherwise very stale.
/// If the decay formula changes, these stay put unless changed on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessBucket {
    VeryFresh,
    Fresh,
    Moderate,
    Stale,
    VeryStale,
}

impl FreshnessBucket {
    /// Inclusive upper age bound of each bounded bucket, in order.
    pub const CUTOFFS: [(u32, FreshnessBucket); 4] = [
        (14, FreshnessBucket::VeryFresh),
        (45, FreshnessBucket::Fresh),
        (120, FreshnessBucket::Moderate),
        (400, FreshnessBucket::Stale),
    ];

    /// Maps an age to its bucket. Total over all `u32`.
    pub fn from_age_days(age_days: u32) -> Self {
        Self::CUTOFFS
            .iter()
            .find(|(max, _)| age_days <= *max)
            .map(|(_, bucket)| *bucket)
            .unwrap_or(FreshnessBucket::VeryStale)
    }

    /// Inclusive age range `(min, max)`; `max` is `None` for the open-ended bucket.
    pub fn age_range(&self) -> (u32, Option<u32>) {
        let mut lower = 0;
        for (max, bucket) in Self::CUTOFFS {
            if bucket == *self {
                return (lower, Some(max));
            }
            lower = max + 1;
        }
        (lower, None)
    }

    /// All buckets from freshest to stalest.
    pub fn all() -> &'static [FreshnessBucket] {
        &[
            FreshnessBucket::VeryFresh,
            FreshnessBucket::Fresh,
            FreshnessBucket::Moderate,
            FreshnessBucket::Stale,
            FreshnessBucket::VeryStale,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FreshnessBucket::VeryFresh => "very_fresh",
            FreshnessBucket::Fresh => "fresh",
            FreshnessBucket::Moderate => "moderate",
            FreshnessBucket::Stale => "stale",
            FreshnessBucket::VeryStale => "very_stale",
        }
    }
}

impl std::fmt::Display for FreshnessBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FreshnessBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid freshness bucket '{}'. Valid values: very_fresh, fresh, moderate, stale, very_stale",
                    s
                )
            })
    }
}

/// A fiscal quarter referenced in free text ("Q3 2024", "Q3'24").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiscalQuarter {
    /// Quarter number, 1-4.
    pub quarter: u8,
    /// Four-digit year.
    pub year: i32,
}

impl FiscalQuarter {
    /// Returns `None` unless `quarter` is 1-4.
    pub fn new(quarter: u8, year: i32) -> Option<Self> {
        (1..=4).contains(&quarter).then_some(Self { quarter, year })
    }

    /// Quarter label, e.g. "Q3".
    pub fn label(&self) -> String {
        format!("Q{}", self.quarter)
    }

    /// Last calendar day of the quarter at 00:00 UTC.
    ///
    /// Used as `valid_from` when a document carries no usable timestamp: figures for a
    /// period are not observable before that period closes.
    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        let (month, day) = match self.quarter {
            1 => (3, 31),
            2 => (6, 30),
            3 => (9, 30),
            _ => (12, 31),
        };
        let date = NaiveDate::from_ymd_opt(self.year, month, day)?;
        Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
    }

    pub fn period(&self) -> FiscalPeriod {
        FiscalPeriod {
            quarter_reference: self.to_string(),
            extracted_quarter: self.label(),
            extracted_year: self.year,
        }
    }
}

impl std::fmt::Display for FiscalQuarter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Q{} {}", self.quarter, self.year)
    }
}

/// Serialized form of a fiscal quarter inside a temporal block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalPeriod {
    pub quarter_reference: String,
    pub extracted_quarter: String,
    pub extracted_year: i32,
}

/// Where `valid_from` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalAnchor {
    /// The source document's own timestamp.
    Document,
    /// The end of a quarter referenced in the context text.
    Quarter,
}

/// Temporal metadata for an entity or edge with a known `valid_from`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalMetadata {
    pub valid_from: DateTime<Utc>,
    pub age_days: u32,
    pub freshness_score: f64,
    pub freshness_bucket: FreshnessBucket,
    pub anchor: TemporalAnchor,
    #[serde(flatten)]
    pub period: Option<FiscalPeriod>,
}

/// The `metadata.temporal` block.
///
/// Serialized with a `freshness` tag: `"known"` carries the full metadata, `"unknown"`
/// carries nothing, and in particular no `age_days`, so it can never be read as stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "freshness", rename_all = "snake_case")]
pub enum Temporal {
    Known(TemporalMetadata),
    Unknown,
}

impl Temporal {
    pub fn is_known(&self) -> bool {
        matches!(self, Temporal::Known(_))
    }

    pub fn metadata(&self) -> Option<&TemporalMetadata> {
        match self {
            Temporal::Known(meta) => Some(meta),
            Temporal::Unknown => None,
        }
    }

    pub fn valid_from(&self) -> Option<DateTime<Utc>> {
        self.metadata().map(|m| m.valid_from)
    }

    pub fn freshness_score(&self) -> Option<f64> {
        self.metadata().map(|m| m.freshness_score)
    }

    pub fn bucket(&self) -> Option<FreshnessBucket> {
        self.metadata().map(|m| m.freshness_bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_cutoffs() {
        assert_eq!(FreshnessBucket::from_age_days(0), FreshnessBucket::VeryFresh);
        assert_eq!(FreshnessBucket::from_age_days(14), FreshnessBucket::VeryFresh);
        assert_eq!(FreshnessBucket::from_age_days(15), FreshnessBucket::Fresh);
        assert_eq!(FreshnessBucket::from_age_days(45), FreshnessBucket::Fresh);
        assert_eq!(FreshnessBucket::from_age_days(46), FreshnessBucket::Moderate);
        assert_eq!(FreshnessBucket::from_age_days(120), FreshnessBucket::Moderate);
        assert_eq!(FreshnessBucket::from_age_days(121), FreshnessBucket::Stale);
        assert_eq!(FreshnessBucket::from_age_days(400), FreshnessBucket::Stale);
        assert_eq!(FreshnessBucket::from_age_days(401), FreshnessBucket::VeryStale);
        assert_eq!(
            FreshnessBucket::from_age_days(u32::MAX),
            FreshnessBucket::VeryStale
        );
    }

    #[test]
    fn test_bucket_ranges_partition_ages() {
        // Ranges are contiguous, start at 0 and end open-ended.
        let mut expected_lower = 0;
        for (i, bucket) in FreshnessBucket::all().iter().enumerate() {
            let (lower, upper) = bucket.age_range();
            assert_eq!(lower, expected_lower, "gap or overlap before {bucket}");
            match upper {
                Some(max) => {
                    assert!(max >= lower);
                    expected_lower = max + 1;
                }
                None => assert_eq!(i, FreshnessBucket::all().len() - 1),
            }
        }

        // Every age lands in exactly one range, and it is the one from_age_days picks.
        for age in 0..=1_000u32 {
            let containing: Vec<_> = FreshnessBucket::all()
                .iter()
                .filter(|b| {
                    let (lo, hi) = b.age_range();
                    age >= lo && hi.map_or(true, |h| age <= h)
                })
                .collect();
            assert_eq!(containing.len(), 1, "age {age}");
            assert_eq!(*containing[0], FreshnessBucket::from_age_days(age));
        }
    }

    #[test]
    fn test_bucket_from_str() {
        assert_eq!("stale".parse::<FreshnessBucket>(), Ok(FreshnessBucket::Stale));
        assert!("ancient".parse::<FreshnessBucket>().is_err());
    }

    #[test]
    fn test_quarter_period_end() {
        let q = FiscalQuarter::new(1, 2024).unwrap();
        assert_eq!(q.period_end().unwrap().to_rfc3339(), "2024-03-31T00:00:00+00:00");
        let q = FiscalQuarter::new(4, 2023).unwrap();
        assert_eq!(q.period_end().unwrap().to_rfc3339(), "2023-12-31T00:00:00+00:00");
        assert!(FiscalQuarter::new(5, 2023).is_none());
    }

    #[test]
    fn test_unknown_serializes_without_age() {
        let json = serde_json::to_value(Temporal::Unknown).unwrap();
        assert_eq!(json, serde_json::json!({ "freshness": "unknown" }));
    }

    #[test]
    fn test_known_serializes_flat_period() {
        let valid_from = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let temporal = Temporal::Known(TemporalMetadata {
            valid_from,
            age_days: 10,
            freshness_score: 0.8,
            freshness_bucket: FreshnessBucket::VeryFresh,
            anchor: TemporalAnchor::Quarter,
            period: Some(FiscalQuarter::new(2, 2024).unwrap().period()),
        });

        let json = serde_json::to_value(&temporal).unwrap();
        assert_eq!(json["freshness"], "known");
        assert_eq!(json["age_days"], 10);
        assert_eq!(json["freshness_bucket"], "very_fresh");
        assert_eq!(json["quarter_reference"], "Q2 2024");
        assert_eq!(json["extracted_quarter"], "Q2");
        assert_eq!(json["extracted_year"], 2024);

        let back: Temporal = serde_json::from_value(json).unwrap();
        assert_eq!(back, temporal);
    }
}
