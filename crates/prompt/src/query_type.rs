//! Query classification used to pick a prompt template.

use serde::{Deserialize, Serialize};

const COMPARISON_WORDS: &[&str] = &[
    "compare",
    "difference",
    "versus",
    "vs",
    "contrast",
    "better",
    "worse",
];

const SUMMARY_WORDS: &[&str] = &[
    "summarize",
    "overview",
    "summary",
    "explain",
    "describe",
    "what are all",
];

const FACTUAL_WORDS: &[&str] = &["when", "where", "who", "how many", "how much", "what is the"];

/// Kind of question being asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Comparison,
    Summary,
    Factual,
    General,
}

impl QueryType {
    /// All query types, in detection priority order.
    pub const ALL: [QueryType; 4] = [
        QueryType::Comparison,
        QueryType::Summary,
        QueryType::Factual,
        QueryType::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comparison => "comparison",
            Self::Summary => "summary",
            Self::Factual => "factual",
            Self::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a query by keyword.
///
/// Matching is substring-based on the lower-cased query, so "vs" also fires
/// inside longer words. The first matching category wins.
pub fn detect_query_type(query: &str) -> QueryType {
    let lower = query.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if has_any(COMPARISON_WORDS) {
        QueryType::Comparison
    } else if has_any(SUMMARY_WORDS) {
        QueryType::Summary
    } else if has_any(FACTUAL_WORDS) {
        QueryType::Factual
    } else {
        QueryType::General
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_each_type() {
        assert_eq!(
            detect_query_type("Compare Q3 and Q4 revenue"),
            QueryType::Comparison
        );
        assert_eq!(
            detect_query_type("Give me an overview of onboarding"),
            QueryType::Summary
        );
        assert_eq!(
            detect_query_type("When is the next payroll run?"),
            QueryType::Factual
        );
        assert_eq!(detect_query_type("Tell me about leave"), QueryType::General);
    }

    #[test]
    fn test_comparison_beats_summary() {
        assert_eq!(
            detect_query_type("Summarize the difference between plans"),
            QueryType::Comparison
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(detect_query_type("HOW MUCH is the budget"), QueryType::Factual);
    }

    #[test]
    fn test_parse_round_trip() {
        for t in QueryType::ALL {
            assert_eq!(QueryType::parse(t.as_str()), Some(t));
        }
        assert_eq!(QueryType::parse("poem"), None);
    }
}
