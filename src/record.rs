use std::fmt;

use serde::{Serialize, Serializer};

/// Source-name prefix carried by records extracted from deep-dive documents.
pub const DEEP_DIVE_PREFIX: &str = "deep-dive:";

/// Relevance as stated in the source text.
///
/// Numeric scores are kept as written; only `"4"` and `"5"` count as high.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Relevance {
    High,
    Medium,
    Low,
    Score(String),
    #[default]
    Unknown,
}

impl Relevance {
    pub fn parse(value: &str) -> Self {
        let lower = value.trim().to_ascii_lowercase();
        match lower.as_str() {
            "high" => Relevance::High,
            "medium" => Relevance::Medium,
            "low" => Relevance::Low,
            s if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) => {
                Relevance::Score(lower)
            }
            _ => Relevance::Unknown,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Relevance::High => "high",
            Relevance::Medium => "medium",
            Relevance::Low => "low",
            Relevance::Score(s) => s,
            Relevance::Unknown => "unknown",
        }
    }

    pub fn is_high(&self) -> bool {
        match self {
            Relevance::High => true,
            Relevance::Score(s) => s == "4" || s == "5",
            _ => false,
        }
    }
}

impl fmt::Display for Relevance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Relevance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One parsed finding. Never mutated once the parser hands it over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub source: String,
    pub title: String,
    pub url: Option<String>,
    pub relevance: Relevance,
    pub excerpts: Vec<String>,
    pub topics: Vec<String>,
    pub raw: String,
}

impl Record {
    pub fn is_high_relevance(&self) -> bool {
        self.relevance.is_high()
    }

    pub fn is_deep_dive(&self) -> bool {
        self.source.starts_with(DEEP_DIVE_PREFIX)
    }

    /// Non-empty URL, if any.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}
