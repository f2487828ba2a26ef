//! Built-in prompt definitions.

use crate::types::PromptDefinition;

/// Identifier of the grounded-answer prompt.
pub const GROUNDED_ANSWER_PROMPT_ID: &str = "rag.answer.grounded";

const GROUNDED_SYSTEM: &str = "You are an assistant answering questions strictly from the document \
excerpts provided by the user. \
Every excerpt starts with a header naming its source document and page. \
After each fact you state, cite where it came from on its own line, formatted exactly as \
(Source: <file name>, Page: <page number>). \
Do not guess and do not include anything that is not explicitly stated in the excerpts. \
Do not summarize documents that are unrelated to the question. \
If the excerpts do not contain the answer, say that the documents do not cover it.";

const GROUNDED_TEMPLATE: &str =
    "Answer the question: '{{query}}' using the context below:\n\n{{context}}";

/// The prompt used when the workspace does not override it.
///
/// Variables: `query` (literal user question) and `context` (delimited excerpts).
pub fn grounded_answer_prompt() -> PromptDefinition {
    PromptDefinition {
        id: GROUNDED_ANSWER_PROMPT_ID.to_string(),
        title: "Grounded answer with page citations".to_string(),
        api_version: "1.0".to_string(),
        system: GROUNDED_SYSTEM.to_string(),
        template: GROUNDED_TEMPLATE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grounded_prompt_mentions_citation_format() {
        let def = grounded_answer_prompt();
        assert_eq!(def.id, GROUNDED_ANSWER_PROMPT_ID);
        assert!(def.system.contains("(Source: <file name>, Page: <page number>)"));
        assert!(def.template.contains("{{query}}"));
        assert!(def.template.contains("{{context}}"));
    }
}
