use super::AppConfig;
use super::catalog::{ServerConfig, ToolConfig};
use super::mappings::FieldMapping;
use super::rules::{ActivationPredicate, DependencyRule};
use crate::domain::ToolRef;

fn tool(
    name: &str,
    description: &str,
    inputs: &[&str],
    outputs: &[&str],
    independent: bool,
) -> ToolConfig {
    ToolConfig {
        name: name.to_string(),
        description: Some(description.to_string()),
        inputs: inputs.iter().map(|s| s.to_string()).collect(),
        outputs: outputs.iter().map(|s| s.to_string()).collect(),
        independent,
    }
}

/// The built-in demo catalog: three servers, the rule table that chains
/// translation and summarization in front of their consumers, and the
/// OTN-to-OSB field renames.
pub(super) fn demo_config() -> AppConfig {
    let servers = vec![
        ServerConfig {
            name: "MCP-OTN".to_string(),
            tools: vec![
                tool(
                    "translate_to_english",
                    "Translate non-English text to English.",
                    &["text"],
                    &["text", "model_id", "product_type", "lang_code"],
                    true,
                ),
                tool(
                    "summarize_text",
                    "Summarize a document.",
                    &["text"],
                    &["summary"],
                    true,
                ),
                tool(
                    "extract_keywords",
                    "Extract keywords from the input.",
                    &["text"],
                    &["keywords"],
                    true,
                ),
            ],
        },
        ServerConfig {
            name: "MCP-OSB".to_string(),
            tools: vec![
                tool(
                    "score_summary",
                    "Score the relevance of a summary.",
                    &["summary"],
                    &["score"],
                    false,
                ),
                tool(
                    "validate_input",
                    "Validate user input against business rules.",
                    &["description"],
                    &["valid"],
                    false,
                ),
                tool(
                    "price_checker",
                    "Estimate price based on product attributes.",
                    &["description", "mdlid"],
                    &["price"],
                    false,
                ),
            ],
        },
        ServerConfig {
            name: "MCP-XYZ".to_string(),
            tools: vec![
                tool(
                    "classify_feedback",
                    "Analyze user sentiment.",
                    &["text"],
                    &["sentiment"],
                    true,
                ),
                tool(
                    "generate_response",
                    "Create a response from structured input.",
                    &["text"],
                    &["text"],
                    true,
                ),
                tool(
                    "detect_intent",
                    "Determine the intent of a user message.",
                    &["text"],
                    &["intent"],
                    true,
                ),
            ],
        },
    ];

    let translate = ToolRef::new("MCP-OTN", "translate_to_english");
    let rules = vec![
        DependencyRule {
            tool: ToolRef::new("MCP-OSB", "price_checker"),
            requires: translate.clone(),
            when: ActivationPredicate::InputNotEnglish,
        },
        DependencyRule {
            tool: ToolRef::new("MCP-OSB", "validate_input"),
            requires: translate,
            when: ActivationPredicate::InputNotEnglish,
        },
        DependencyRule {
            tool: ToolRef::new("MCP-OSB", "score_summary"),
            requires: ToolRef::new("MCP-OTN", "summarize_text"),
            when: ActivationPredicate::FieldAbsent("summary".to_string()),
        },
    ];

    let mapping = |source_field: &str, dest_field: &str| FieldMapping {
        source_server: "MCP-OTN".to_string(),
        source_field: source_field.to_string(),
        dest_server: "MCP-OSB".to_string(),
        dest_field: dest_field.to_string(),
    };
    let mappings = vec![
        mapping("model_id", "mdlid"),
        mapping("product_type", "ptype"),
        mapping("lang_code", "language"),
    ];

    match super::loader::validate_and_build(servers, rules, mappings) {
        Ok(config) => config,
        // The demo tables are static and covered by tests; validation
        // cannot fail here at runtime.
        Err(err) => unreachable!("built-in demo catalog failed validation: {err}"),
    }
}
