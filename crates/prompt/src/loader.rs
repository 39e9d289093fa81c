//! Loader for workspace prompt overrides.

use crate::query_type::QueryType;
use crate::types::PromptDefinition;
use docgate_core::{AppError, AppResult};
use std::path::Path;

/// Load a template override for a query type from `prompts_dir`.
///
/// Looks for `<prompts_dir>/<query type>.yml`.
///
/// # Example
/// ```no_run
/// use docgate_prompt::{load_prompt, QueryType};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = load_prompt(Path::new(".docgate/prompts"), QueryType::Summary)?;
/// println!("Loaded prompt: {}", def.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: &Path, query_type: QueryType) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir.join(format!("{}.yml", query_type.as_str()));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition, query_type)?;

    tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// List the query types that have an override file in `prompts_dir`.
pub fn list_prompts(prompts_dir: &Path) -> AppResult<Vec<QueryType>> {
    if !prompts_dir.exists() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();

    for entry in walkdir::WalkDir::new(prompts_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            match path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(QueryType::parse)
            {
                Some(query_type) => found.push(query_type),
                None => tracing::warn!("Ignoring prompt file with unknown type: {:?}", path),
            }
        }
    }

    found.sort_by_key(|t| QueryType::ALL.iter().position(|a| a == t));
    Ok(found)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition, expected: QueryType) -> AppResult<()> {
    if def.id != expected.as_str() {
        return Err(AppError::Prompt(format!(
            "Prompt id '{}' does not match file for '{}'",
            def.id, expected
        )));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if !def.template.contains("{{context}}") || !def.template.contains("{{query}}") {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' must reference both {{{{context}}}} and {{{{query}}}}",
            def.id
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(format!("{}.yml", id)), body).unwrap();
    }

    fn valid_yaml(id: &str) -> String {
        format!(
            r#"
id: {}
title: "Custom"
apiVersion: "1.0"
template: "{{{{system}}}}\n{{{{context}}}}\nQ: {{{{query}}}}"
"#,
            id
        )
    }

    #[test]
    fn test_load_valid_prompt() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "summary", &valid_yaml("summary"));

        let def = load_prompt(temp_dir.path(), QueryType::Summary).unwrap();
        assert_eq!(def.id, "summary");
        assert_eq!(def.title, "Custom");
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_prompt(temp_dir.path(), QueryType::Factual).is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "general", "invalid: yaml: content:");
        assert!(load_prompt(temp_dir.path(), QueryType::General).is_err());
    }

    #[test]
    fn test_template_must_reference_query() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "general",
            "id: general\ntitle: Bad\napiVersion: \"1.0\"\ntemplate: \"{{context}}\"\n",
        );
        let err = load_prompt(temp_dir.path(), QueryType::General).unwrap_err();
        assert!(err.to_string().contains("must reference"));
    }

    #[test]
    fn test_list_prompts_skips_unknown() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "factual", &valid_yaml("factual"));
        write_prompt(temp_dir.path(), "comparison", &valid_yaml("comparison"));
        write_prompt(temp_dir.path(), "haiku", &valid_yaml("haiku"));

        let found = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(found, vec![QueryType::Comparison, QueryType::Factual]);
    }
}
