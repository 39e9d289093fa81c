//! Prompt system for docgate.
//!
//! Turns a question and its retrieved context into the text sent to the
//! generation model:
//! - Query-type detection (comparison, summary, factual, general)
//! - Numbered context blocks with relevance percentages
//! - Handlebars templates, one per query type
//! - Optional YAML overrides under `.docgate/prompts/`

pub mod builder;
pub mod context;
pub mod loader;
pub mod query_type;
pub mod templates;
pub mod types;

// Re-export main types
pub use builder::{build_prompt, PromptBuilder};
pub use context::{format_context, ContextBlock};
pub use loader::{list_prompts, load_prompt};
pub use query_type::{detect_query_type, QueryType};
pub use types::{BuiltPrompt, PromptDefinition, TemplateSource};
