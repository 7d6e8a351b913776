//! Fiscal quarter references in free text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::FiscalQuarter;

/// `Q3 2024`, `Q3'24`, `Q3 ’24`, `Q3 FY2024`, `Q3 FY24`, any case.
///
/// A two-digit year needs an apostrophe or `FY` in front: in "Q4 12 new stores" the
/// number is a count, not a year.
static QUARTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bQ([1-4])\s*(?:(?:FY\s*|['’]\s*)?(\d{4})|(?:FY\s*|['’]\s*)(\d{2}))\b")
        .expect("Invalid quarter regex")
});

/// Returns the first quarter reference in `text`, if any.
///
/// Two-digit years are read as 20YY.
pub fn extract_quarter(text: &str) -> Option<FiscalQuarter> {
    let caps = QUARTER.captures(text)?;
    let quarter: u8 = caps.get(1)?.as_str().parse().ok()?;
    let digits = caps.get(2).or_else(|| caps.get(3))?.as_str();
    let year: i32 = digits.parse().ok()?;
    let year = if digits.len() == 2 { 2000 + year } else { year };
    FiscalQuarter::new(quarter, year)
}
