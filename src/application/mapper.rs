use crate::config::{FieldMappings, ToolConfig};
use serde_json::{Map, Value};

/// Result of translating one observation across a server boundary: the
/// remapped fields plus the destination-required fields still absent
/// afterwards (a non-fatal condition the planner logs per step).
#[derive(Debug, Clone)]
pub struct Translated {
    pub fields: Map<String, Value>,
    pub missing: Vec<String>,
}

/// Translates output field names produced by one server into the names a
/// consumer on another server expects. Fields with no registered mapping
/// pass through unchanged; the destination tool may ignore fields it does
/// not recognize.
pub struct FieldMapper<'a> {
    mappings: &'a FieldMappings,
}

impl<'a> FieldMapper<'a> {
    pub fn new(mappings: &'a FieldMappings) -> Self {
        Self { mappings }
    }

    pub fn translate(
        &self,
        source_server: &str,
        observation: &Map<String, Value>,
        dest_server: &str,
        dest_tool: &ToolConfig,
    ) -> Translated {
        let mut fields = Map::new();

        // Pass-through first, mapped names second: a registered mapping may
        // never be shadowed by an unmapped field of the same name.
        for (name, value) in observation {
            if self
                .mappings
                .destination(source_server, name, dest_server)
                .is_none()
            {
                fields.insert(name.clone(), value.clone());
            }
        }
        for (name, value) in observation {
            if let Some(dest_field) = self.mappings.destination(source_server, name, dest_server) {
                fields.insert(dest_field.to_string(), value.clone());
            }
        }

        let missing = dest_tool
            .inputs
            .iter()
            .filter(|required| !fields.contains_key(*required))
            .cloned()
            .collect();

        Translated { fields, missing }
    }
}

/// Observations are opaque structured values - a string, an object, or
/// anything else a tool returns. Translation works on named fields, so
/// non-object values are wrapped under a conventional key first.
pub fn normalize_observation(observation: &Value) -> Map<String, Value> {
    match observation {
        Value::Object(map) => map.clone(),
        Value::String(text) => {
            let mut map = Map::new();
            map.insert("text".to_string(), Value::String(text.clone()));
            map
        }
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other.clone());
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::domain::ToolRef;
    use serde_json::json;

    fn translated_for_price_checker(observation: Value) -> Translated {
        let config = AppConfig::demo();
        let mapper = FieldMapper::new(&config.mappings);
        let dest = config
            .catalog
            .lookup(&ToolRef::new("MCP-OSB", "price_checker"), "test")
            .expect("demo tool");
        mapper.translate(
            "MCP-OTN",
            &normalize_observation(&observation),
            "MCP-OSB",
            dest,
        )
    }

    #[test]
    fn mapped_fields_are_renamed_and_unmapped_fields_pass_through() {
        let result = translated_for_price_checker(json!({
            "text": "What is the model of this product?",
            "model_id": "abc123",
        }));
        assert_eq!(result.fields.get("mdlid"), Some(&json!("abc123")));
        assert_eq!(
            result.fields.get("text"),
            Some(&json!("What is the model of this product?"))
        );
        assert!(!result.fields.contains_key("model_id"));
    }

    #[test]
    fn mapping_wins_over_a_passthrough_field_with_the_destination_name() {
        let result = translated_for_price_checker(json!({
            "model_id": "abc123",
            "mdlid": "stale",
        }));
        // The source also carried a literal "mdlid"; the registered mapping
        // must not be dropped in its favor.
        assert_eq!(result.fields.get("mdlid"), Some(&json!("abc123")));
    }

    #[test]
    fn absent_required_fields_are_reported_not_fatal() {
        let result = translated_for_price_checker(json!({"model_id": "abc123"}));
        assert_eq!(result.missing, vec!["description".to_string()]);
        assert_eq!(result.fields.get("mdlid"), Some(&json!("abc123")));
    }

    #[test]
    fn string_observations_normalize_under_text() {
        let map = normalize_observation(&json!("plain response"));
        assert_eq!(map.get("text"), Some(&json!("plain response")));
    }
}
