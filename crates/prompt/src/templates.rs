//! Built-in prompt templates.
//!
//! Every template receives `system`, `context`, `query` and
//! `include_citations`. Output is rendered without HTML escaping.

use crate::query_type::QueryType;

/// Preamble shared by every template.
pub const SYSTEM_PROMPT: &str = "You are an AI assistant for a company internal chatbot system.
Your role is to provide accurate, helpful answers based ONLY on the company documents provided.

Key Guidelines:
- Answer questions using only the information from the provided documents
- If information is not in the documents, clearly state \"I don't have that information in the available documents\"
- Be concise and professional
- Cite sources when making specific claims
- If documents are contradictory, acknowledge this
- Do not make up or infer information not present in the documents
";

const GENERAL: &str = "{{system}}

CONTEXT DOCUMENTS:
{{context}}

USER QUESTION: {{query}}

INSTRUCTIONS:
- Answer the question based on the context documents above
- Be clear, concise, and professional
- If the answer is not in the documents, say so{{#if include_citations}}
When referencing specific information, cite the source number (e.g., [Source 1]).{{/if}}

ANSWER:";

const COMPARISON: &str = "{{system}}

CONTEXT DOCUMENTS:
{{context}}

USER QUESTION: {{query}}

INSTRUCTIONS:
- Compare the relevant information from the documents
- Present key similarities and differences
- Use a structured format (bullet points or table if appropriate)
- Cite sources for each point

COMPARISON:";

const SUMMARY: &str = "{{system}}

CONTEXT DOCUMENTS:
{{context}}

USER QUESTION: {{query}}

INSTRUCTIONS:
- Provide a comprehensive summary of the relevant information
- Organize information logically
- Highlight key points
- Include important details from the documents

SUMMARY:";

const FACTUAL: &str = "{{system}}

CONTEXT DOCUMENTS:
{{context}}

USER QUESTION: {{query}}

INSTRUCTIONS:
- Provide a direct, factual answer
- Include specific numbers, dates, or names if present
- Cite the source of the information
- Keep the answer focused and precise

ANSWER:";

/// Built-in Handlebars template for a query type.
pub fn builtin_template(query_type: QueryType) -> &'static str {
    match query_type {
        QueryType::Comparison => COMPARISON,
        QueryType::Summary => SUMMARY,
        QueryType::Factual => FACTUAL,
        QueryType::General => GENERAL,
    }
}
