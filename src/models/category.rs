//! Category vocabulary and classification labels.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed vocabulary of domain categories an entity can be classified into.
///
/// The same vocabulary constrains the LLM: an answer that does not parse into
/// one of these variants is treated as a failed classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Company")]
    Company,
    #[serde(rename = "Financial Metric")]
    FinancialMetric,
    #[serde(rename = "Industry/Sector")]
    IndustrySector,
    #[serde(rename = "Technology/Product")]
    TechnologyProduct,
    #[serde(rename = "Geographic")]
    Geographic,
    #[serde(rename = "Person")]
    Person,
    #[serde(rename = "Market Event")]
    MarketEvent,
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    /// The full vocabulary in display order.
    pub fn all() -> &'static [Category] {
        &[
            Category::Company,
            Category::FinancialMetric,
            Category::IndustrySector,
            Category::TechnologyProduct,
            Category::Geographic,
            Category::Person,
            Category::MarketEvent,
            Category::Other,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Company => "Company",
            Category::FinancialMetric => "Financial Metric",
            Category::IndustrySector => "Industry/Sector",
            Category::TechnologyProduct => "Technology/Product",
            Category::Geographic => "Geographic",
            Category::Person => "Person",
            Category::MarketEvent => "Market Event",
            Category::Other => "Other",
        }
    }

    /// Returns a short description, used to brief the LLM.
    pub fn description(&self) -> &'static str {
        match self {
            Category::Company => "A company, issuer, or stock ticker",
            Category::FinancialMetric => "A reported or forecast financial figure",
            Category::IndustrySector => "An industry, sector, or market segment",
            Category::TechnologyProduct => "A product line, platform, or technology",
            Category::Geographic => "A country, region, or city",
            Category::Person => "An executive, analyst, or other individual",
            Category::MarketEvent => "An earnings call, deal, launch, or other dated event",
            Category::Other => "Anything that fits none of the above",
        }
    }

    /// Lowercase alphanumerics only, so "industry / sector" matches "Industry/Sector".
    fn normalize(s: &str) -> String {
        s.chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = Self::normalize(s);
        Self::all()
            .iter()
            .copied()
            .find(|c| !wanted.is_empty() && Self::normalize(c.as_str()) == wanted)
            .ok_or_else(|| {
                let valid: Vec<_> = Self::all().iter().map(|c| c.as_str()).collect();
                format!(
                    "Invalid category '{}'. Valid values: {}",
                    s,
                    valid.join(", ")
                )
            })
    }
}

/// How a category label was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// A keyword rule matched at or above the threshold.
    Keyword,
    /// The LLM answered within the vocabulary.
    LlmEscalated,
    /// The LLM was needed but failed; the best keyword guess is reported instead.
    KeywordFallback,
}

/// Result of classifying an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLabel {
    pub category: Category,
    pub confidence: f32,
    pub provenance: Provenance,
}

impl CategoryLabel {
    /// True when downstream consumers should treat the label with suspicion.
    pub fn is_low_confidence(&self) -> bool {
        self.provenance == Provenance::KeywordFallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str_is_lenient_on_shape() {
        assert_eq!("Company".parse::<Category>(), Ok(Category::Company));
        assert_eq!(
            "financial metric".parse::<Category>(),
            Ok(Category::FinancialMetric)
        );
        assert_eq!(
            "Industry / Sector".parse::<Category>(),
            Ok(Category::IndustrySector)
        );
        assert_eq!(
            "TECHNOLOGY/PRODUCT".parse::<Category>(),
            Ok(Category::TechnologyProduct)
        );
    }

    #[test]
    fn test_category_from_str_rejects_outside_vocabulary() {
        assert!("Startup Hub".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
        assert!("Industry".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde_uses_display_names() {
        let json = serde_json::to_string(&Category::IndustrySector).unwrap();
        assert_eq!(json, "\"Industry/Sector\"");
        for category in Category::all() {
            let json = serde_json::to_string(category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn test_label_low_confidence_flag() {
        let label = CategoryLabel {
            category: Category::Other,
            confidence: 0.0,
            provenance: Provenance::KeywordFallback,
        };
        assert!(label.is_low_confidence());
        let json = serde_json::to_value(&label).unwrap();
        assert_eq!(json["provenance"], "keyword_fallback");
    }
}
