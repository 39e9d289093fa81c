//! Prompt builder for rendering templates with retrieved context.

use crate::loader::{list_prompts, load_prompt};
use crate::query_type::{detect_query_type, QueryType};
use crate::templates::{builtin_template, SYSTEM_PROMPT};
use crate::types::{BuiltPrompt, TemplateSource};
use docgate_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Variables exposed to every template.
#[derive(Debug, Serialize)]
struct TemplateData<'a> {
    system: &'a str,
    context: &'a str,
    query: &'a str,
    include_citations: bool,
}

/// Renders prompts for each query type.
///
/// Templates are compiled once; the builder is shared read-only across
/// concurrent queries.
pub struct PromptBuilder {
    registry: Handlebars<'static>,
    systems: HashMap<QueryType, String>,
    sources: HashMap<QueryType, TemplateSource>,
}

impl PromptBuilder {
    /// Builder with only the built-in templates.
    pub fn new() -> AppResult<Self> {
        let mut registry = Handlebars::new();

        // Disable HTML escaping for plain text
        registry.register_escape_fn(handlebars::no_escape);

        let mut builder = Self {
            registry,
            systems: HashMap::new(),
            sources: HashMap::new(),
        };

        for query_type in QueryType::ALL {
            builder.register(
                query_type,
                builtin_template(query_type),
                SYSTEM_PROMPT.to_string(),
                TemplateSource::Builtin,
            )?;
        }

        Ok(builder)
    }

    /// Builder with built-ins replaced by any overrides found in `prompts_dir`.
    pub fn with_overrides(prompts_dir: &Path) -> AppResult<Self> {
        let mut builder = Self::new()?;

        for query_type in list_prompts(prompts_dir)? {
            let def = load_prompt(prompts_dir, query_type)?;
            let system = def.system.unwrap_or_else(|| SYSTEM_PROMPT.to_string());
            builder.register(query_type, &def.template, system, TemplateSource::Workspace)?;
        }

        Ok(builder)
    }

    fn register(
        &mut self,
        query_type: QueryType,
        template: &str,
        system: String,
        source: TemplateSource,
    ) -> AppResult<()> {
        self.registry
            .register_template_string(query_type.as_str(), template)
            .map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to register template '{}': {}",
                    query_type, e
                ))
            })?;
        self.systems.insert(query_type, system);
        self.sources.insert(query_type, source);
        Ok(())
    }

    /// Where the template for `query_type` came from.
    pub fn template_source(&self, query_type: QueryType) -> TemplateSource {
        self.sources
            .get(&query_type)
            .copied()
            .unwrap_or(TemplateSource::Builtin)
    }

    /// Render the prompt for `query`, choosing the template by query type.
    ///
    /// `include_citations` only affects templates that reference it; the
    /// built-in general template adds a citation instruction.
    pub fn build(
        &self,
        query: &str,
        context: &str,
        include_citations: bool,
    ) -> AppResult<BuiltPrompt> {
        let query_type = detect_query_type(query);
        tracing::debug!(query_type = %query_type, "Building prompt");

        let system = self
            .systems
            .get(&query_type)
            .map(String::as_str)
            .unwrap_or(SYSTEM_PROMPT);

        let data = TemplateData {
            system,
            context,
            query,
            include_citations,
        };

        let text = self
            .registry
            .render(query_type.as_str(), &data)
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

        Ok(BuiltPrompt {
            text,
            query_type,
            source: self.template_source(query_type),
        })
    }
}

/// Render a prompt with the built-in templates.
///
/// # Example
/// ```no_run
/// use docgate_prompt::build_prompt;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let built = build_prompt("When is payday?", "[Source 1: payroll.md - Dates] ...", true)?;
/// println!("{}", built.text);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(query: &str, context: &str, include_citations: bool) -> AppResult<BuiltPrompt> {
    PromptBuilder::new()?.build(query, context, include_citations)
}
