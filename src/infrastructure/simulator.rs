use crate::application::tooling::{ToolInvokeError, ToolServerInterface};
use crate::config::Catalog;
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

/// Deterministic stand-in for real tool servers: every tool in the catalog
/// answers with a canned observation derived from its input. Lets the CLI
/// exercise full orchestration runs with no external processes.
pub struct SimulatedServers {
    catalog: Catalog,
}

impl SimulatedServers {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl ToolServerInterface for SimulatedServers {
    async fn invoke(
        &self,
        server: &str,
        tool: &str,
        input: Value,
    ) -> Result<Value, ToolInvokeError> {
        let Some(host) = self.catalog.server(server) else {
            return Err(ToolInvokeError::Unavailable {
                server: server.to_string(),
            });
        };
        if !host.tools.iter().any(|t| t.name == tool) {
            return Err(ToolInvokeError::Rejected {
                server: server.to_string(),
                tool: tool.to_string(),
                message: "tool is not hosted by this server".to_string(),
            });
        }

        debug!(server, tool, "Simulated tool invocation");
        let text = input_text(&input);
        Ok(canned_observation(tool, &text))
    }
}

fn input_text(input: &Value) -> String {
    match input {
        Value::String(text) => text.clone(),
        Value::Object(map) => map
            .get("text")
            .or_else(|| map.get("query"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| input.to_string()),
        other => other.to_string(),
    }
}

fn canned_observation(tool: &str, text: &str) -> Value {
    match tool {
        "translate_to_english" => json!({
            "text": format!("{text} (translated to English)"),
            "model_id": "abc123",
            "product_type": "gadget",
            "lang_code": "es",
        }),
        "summarize_text" => json!({ "summary": format!("Summary of: {text}") }),
        "extract_keywords" => json!({ "keywords": keywords(text) }),
        "score_summary" => json!({ "score": 0.87, "result": "The summary scores 0.87 for relevance" }),
        "validate_input" => json!({ "valid": true, "result": "Input passes all business rules" }),
        "price_checker" => json!("The estimated price is $59.99"),
        "classify_feedback" => json!({ "sentiment": "positive" }),
        "generate_response" => json!({ "text": format!("Response to: {text}") }),
        "detect_intent" => json!({ "intent": "product_inquiry" }),
        other => json!({ "result": format!("{other} processed the input") }),
    }
}

fn keywords(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|word| word.len() > 4)
        .take(5)
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .collect()
}
