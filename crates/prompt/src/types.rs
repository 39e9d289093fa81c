//! Prompt types for docgate.

use crate::query_type::QueryType;
use serde::{Deserialize, Serialize};

/// A workspace template override loaded from YAML.
///
/// The file name (`<query type>.yml`) selects which built-in it replaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Query type this template serves ("comparison", "summary", "factual", "general")
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Replace the shared preamble for this template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Template string with Handlebars syntax
    pub template: String,
}

/// Where a rendered template came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateSource {
    Builtin,
    Workspace,
}

/// A fully rendered prompt ready for the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// Prompt text
    pub text: String,

    /// Detected query type that selected the template
    #[serde(rename = "queryType")]
    pub query_type: QueryType,

    /// Built-in or workspace override
    pub source: TemplateSource,
}
