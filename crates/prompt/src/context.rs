//! Formatting retrieved chunks into prompt context.

use serde::{Deserialize, Serialize};

/// One retrieved chunk as it appears in the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBlock {
    pub text: String,
    pub source: String,
    pub section: String,
    /// Cosine distance from the query (0 = identical)
    pub distance: f32,
}

impl ContextBlock {
    /// Relevance as a percentage, `(1 - distance) * 100`.
    pub fn relevance_percent(&self) -> f64 {
        (1.0 - f64::from(self.distance)) * 100.0
    }
}

/// Render blocks as numbered sources separated by blank lines.
///
/// Each block reads `[Source i: <source> - <section>] (Relevance: NN.N%)`
/// followed by the chunk text on the next line. Numbering starts at 1.
pub fn format_context(blocks: &[ContextBlock]) -> String {
    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            format!(
                "[Source {}: {} - {}] (Relevance: {:.1}%)\n{}",
                i + 1,
                block.source,
                block.section,
                block.relevance_percent(),
                block.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(source: &str, distance: f32) -> ContextBlock {
        ContextBlock {
            text: format!("{} body", source),
            source: source.to_string(),
            section: "Overview".to_string(),
            distance,
        }
    }

    #[test]
    fn test_format_numbering_and_relevance() {
        let rendered = format_context(&[block("handbook.md", 0.25), block("payroll.md", 0.5)]);

        assert!(rendered.starts_with("[Source 1: handbook.md - Overview] (Relevance: 75.0%)\nhandbook.md body"));
        assert!(rendered.contains("\n\n[Source 2: payroll.md - Overview] (Relevance: 50.0%)\npayroll.md body"));
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_context(&[]), "");
    }
}
