//! Confidence scoring and source attribution.
//!
//! Distances are cosine distances, so relevance is `1 - distance`. The
//! same [`ConfidenceThresholds`] drive both the overall level and the
//! per-source quality labels.

use crate::types::ChunkMetadata;
use docgate_core::ConfidenceThresholds;
use serde::{Deserialize, Serialize};

/// Coarse confidence bucket reported with every answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    VeryLow,
    None,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::VeryLow => "VERY_LOW",
            Self::None => "NONE",
        }
    }

    fn reasoning(&self) -> &'static str {
        match self {
            Self::High => "Multiple highly relevant documents found",
            Self::Medium => "Relevant documents found with moderate similarity",
            Self::Low => "Limited relevant information available",
            Self::VeryLow => "Weak relevance to query",
            Self::None => "No relevant documents found",
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceDetails {
    pub avg_relevance: f64,
    pub top_relevance: f64,
    pub result_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceResult {
    /// Usually in [0, 1]; rounded to 6 decimal places
    pub score: f64,
    pub level: ConfidenceLevel,
    pub reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ConfidenceDetails>,
}

impl ConfidenceResult {
    /// Result for a query that retrieved nothing.
    pub fn none() -> Self {
        Self {
            score: 0.0,
            level: ConfidenceLevel::None,
            reasoning: ConfidenceLevel::None.reasoning().to_string(),
            details: None,
        }
    }

    /// Score as a percentage with one decimal, e.g. "72.5%".
    pub fn percent(&self) -> String {
        format!("{:.1}%", self.score * 100.0)
    }
}

/// One entry of the source list attached to an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAttribution {
    /// 1-based position in the answer context
    pub rank: usize,
    pub source: String,
    pub section: String,
    pub relevance_score: f64,
    pub relevance_percent: String,
    pub quality: String,
}

const LOW_CONFIDENCE_NOTE: &str = "\n\nNote: This answer has limited supporting evidence in the available documents. Please verify with additional sources.";
const MEDIUM_CONFIDENCE_NOTE: &str =
    "\n\nNote: This answer is based on available documents but may not be complete.";

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Scores retrieval quality against a set of thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceScorer {
    thresholds: ConfidenceThresholds,
}

impl ConfidenceScorer {
    pub fn new(thresholds: ConfidenceThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ConfidenceThresholds {
        &self.thresholds
    }

    fn level_for(&self, score: f64) -> ConfidenceLevel {
        if score >= self.thresholds.high {
            ConfidenceLevel::High
        } else if score >= self.thresholds.medium {
            ConfidenceLevel::Medium
        } else if score >= self.thresholds.low {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }

    /// Confidence of an answer built from results at `distances`.
    ///
    /// The mean relevance is scaled down when `result_count` is below
    /// `min_expected_results`. The score is not clamped: distances above 1
    /// give a negative relevance and pull the score under zero.
    pub fn score(&self, distances: &[f32], result_count: usize) -> ConfidenceResult {
        if distances.is_empty() {
            return ConfidenceResult::none();
        }

        let relevances: Vec<f64> = distances.iter().map(|d| 1.0 - f64::from(*d)).collect();
        let avg = relevances.iter().sum::<f64>() / relevances.len() as f64;
        let top = relevances.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let min_expected = self.thresholds.min_expected_results.max(1);
        let penalty = (result_count as f64 / min_expected as f64).min(1.0);

        // Rounded so that inputs exactly on a threshold land on it
        let score = round_to(avg * penalty, 6);
        let level = self.level_for(score);

        ConfidenceResult {
            score,
            level,
            reasoning: level.reasoning().to_string(),
            details: Some(ConfidenceDetails {
                avg_relevance: round_to(avg, 3),
                top_relevance: round_to(top, 3),
                result_count,
            }),
        }
    }

    /// Quality label for a single relevance value.
    pub fn quality_label(&self, relevance: f64) -> &'static str {
        let relevance = round_to(relevance, 6);
        if relevance >= self.thresholds.high {
            "Highly Relevant"
        } else if relevance >= self.thresholds.medium {
            "Moderately Relevant"
        } else if relevance >= self.thresholds.low {
            "Somewhat Relevant"
        } else {
            "Weakly Relevant"
        }
    }

    /// Attribution entries in input order, ranked from 1.
    pub fn source_scores(
        &self,
        distances: &[f32],
        metadatas: &[ChunkMetadata],
    ) -> Vec<SourceAttribution> {
        distances
            .iter()
            .zip(metadatas)
            .enumerate()
            .map(|(i, (distance, metadata))| {
                let relevance = 1.0 - f64::from(*distance);
                SourceAttribution {
                    rank: i + 1,
                    source: metadata.source_document.clone(),
                    section: metadata.section_title.clone(),
                    relevance_score: round_to(relevance, 3),
                    relevance_percent: format!("{:.1}%", relevance * 100.0),
                    quality: self.quality_label(relevance).to_string(),
                }
            })
            .collect()
    }
}

/// Append the caution note matching `level` to `answer`.
///
/// HIGH and NONE leave the answer unchanged.
pub fn add_disclaimer(answer: &str, level: ConfidenceLevel) -> String {
    match level {
        ConfidenceLevel::Low | ConfidenceLevel::VeryLow => {
            format!("{}{}", answer, LOW_CONFIDENCE_NOTE)
        }
        ConfidenceLevel::Medium => format!("{}{}", answer, MEDIUM_CONFIDENCE_NOTE),
        ConfidenceLevel::High | ConfidenceLevel::None => answer.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> ConfidenceScorer {
        ConfidenceScorer::default()
    }

    #[test]
    fn test_empty_is_none() {
        let result = scorer().score(&[], 0);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.level, ConfidenceLevel::None);
        assert_eq!(result.reasoning, "No relevant documents found");
        assert!(result.details.is_none());
    }

    #[test]
    fn test_boundary_lands_on_high() {
        let result = scorer().score(&[0.3, 0.3, 0.3], 3);
        assert_eq!(result.score, 0.7);
        assert_eq!(result.level, ConfidenceLevel::High);
        assert_eq!(result.reasoning, "Multiple highly relevant documents found");
    }

    #[test]
    fn test_just_below_boundary_is_medium() {
        let scorer = scorer();
        assert_eq!(scorer.level_for(0.699_99), ConfidenceLevel::Medium);
        assert_eq!(scorer.level_for(0.5), ConfidenceLevel::Medium);
        assert_eq!(scorer.level_for(0.3), ConfidenceLevel::Low);
        assert_eq!(scorer.level_for(0.299_999), ConfidenceLevel::VeryLow);
    }

    #[test]
    fn test_few_results_are_penalized() {
        // One perfect match: avg 1.0, penalty 1/3
        let result = scorer().score(&[0.0], 1);
        assert_eq!(result.score, 0.333333);
        assert_eq!(result.level, ConfidenceLevel::Low);

        let details = result.details.unwrap();
        assert_eq!(details.result_count, 1);
        assert_eq!(details.top_relevance, 1.0);
    }

    #[test]
    fn test_more_results_than_expected_not_boosted() {
        let result = scorer().score(&[0.2, 0.2, 0.2, 0.2, 0.2], 5);
        assert_eq!(result.score, 0.8);
        assert_eq!(result.level, ConfidenceLevel::High);
    }

    #[test]
    fn test_details_rounded() {
        let result = scorer().score(&[0.1, 0.25, 0.4], 3);
        let details = result.details.unwrap();
        assert_eq!(details.avg_relevance, 0.75);
        assert_eq!(details.top_relevance, 0.9);
        assert_eq!(result.level, ConfidenceLevel::High);
    }

    #[test]
    fn test_custom_thresholds() {
        let scorer = ConfidenceScorer::new(ConfidenceThresholds {
            high: 0.9,
            medium: 0.8,
            low: 0.1,
            min_expected_results: 1,
        });
        let result = scorer.score(&[0.15], 1);
        assert_eq!(result.score, 0.85);
        assert_eq!(result.level, ConfidenceLevel::Medium);
    }

    #[test]
    fn test_penalty_uses_given_count() {
        // Two candidates scored, but only one came back from the store
        let result = scorer().score(&[0.1, 0.1], 1);
        assert_eq!(result.score, 0.3);
        assert_eq!(result.level, ConfidenceLevel::Low);
        assert_eq!(result.details.unwrap().result_count, 1);
    }

    #[test]
    fn test_score_is_not_clamped() {
        // Opposite vectors sit at cosine distance 2
        let result = scorer().score(&[2.0, 1.5, 1.5], 3);
        assert_eq!(result.score, -0.666667);
        assert_eq!(result.level, ConfidenceLevel::VeryLow);
    }

    #[test]
    fn test_disclaimers() {
        assert_eq!(add_disclaimer("A", ConfidenceLevel::High), "A");
        assert_eq!(add_disclaimer("A", ConfidenceLevel::None), "A");
        assert_eq!(
            add_disclaimer("A", ConfidenceLevel::Medium),
            "A\n\nNote: This answer is based on available documents but may not be complete."
        );

        let low = add_disclaimer("A", ConfidenceLevel::Low);
        assert!(low.starts_with("A\n\nNote: This answer has limited supporting evidence"));
        assert_eq!(low, add_disclaimer("A", ConfidenceLevel::VeryLow));
    }

    #[test]
    fn test_source_scores() {
        let metadatas = vec![
            ChunkMetadata::new("a.md", "Intro", "general", vec!["employee".to_string()]),
            ChunkMetadata::new("b.md", "Body", "general", vec!["employee".to_string()]),
            ChunkMetadata::new("c.md", "End", "general", vec!["employee".to_string()]),
        ];
        let sources = scorer().source_scores(&[0.1, 0.4, 0.8], &metadatas);

        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].rank, 1);
        assert_eq!(sources[0].source, "a.md");
        assert_eq!(sources[0].section, "Intro");
        assert_eq!(sources[0].relevance_score, 0.9);
        assert_eq!(sources[0].relevance_percent, "90.0%");
        assert_eq!(sources[0].quality, "Highly Relevant");
        assert_eq!(sources[1].quality, "Moderately Relevant");
        assert_eq!(sources[2].rank, 3);
        assert_eq!(sources[2].quality, "Weakly Relevant");
    }

    #[test]
    fn test_level_serializes_uppercase() {
        let json = serde_json::to_string(&ConfidenceLevel::VeryLow).unwrap();
        assert_eq!(json, "\"VERY_LOW\"");
    }
}
