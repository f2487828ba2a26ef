//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use docintel_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Renders both the system and the user template with the same variables.
///
/// # Example
/// ```no_run
/// use docintel_prompt::{build_prompt, grounded_answer_prompt};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "What was the revenue in 2023?".to_string());
/// vars.insert("context".to_string(), "Revenue reached 4,034 million.".to_string());
///
/// let built = build_prompt(&grounded_answer_prompt(), &vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: &HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let system = render_template(&definition.system, variables)?;
    let user = render_template(&definition.template, variables)?;

    Ok(BuiltPrompt { system, user })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::grounded_answer_prompt;

    fn vars(query: &str, context: &str) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        vars.insert("context".to_string(), context.to_string());
        vars
    }

    #[test]
    fn test_render_simple_template() {
        let result = render_template("Question: {{query}}", &vars("Hello, world!", ""));
        assert_eq!(result.unwrap(), "Question: Hello, world!");
    }

    #[test]
    fn test_render_does_not_escape() {
        let result = render_template("{{context}}", &vars("", "R&D <costs> \"rose\""));
        assert_eq!(result.unwrap(), "R&D <costs> \"rose\"");
    }

    #[test]
    fn test_build_grounded_prompt() {
        let built = build_prompt(
            &grounded_answer_prompt(),
            &vars("What was the revenue?", "Revenue was 4,034."),
        )
        .unwrap();

        assert!(built.user.contains("'What was the revenue?'"));
        assert!(built.user.ends_with("Revenue was 4,034."));
        assert!(built.system.contains("Source:"));
    }

    #[test]
    fn test_render_template_missing_variable() {
        // Handlebars renders missing variables as empty string
        let result = render_template("Question: {{missing}}", &HashMap::new());
        assert_eq!(result.unwrap(), "Question: ");
    }

    #[test]
    fn test_render_invalid_template() {
        let result = render_template("{{#if}}", &HashMap::new());
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }
}
