use super::error::ConfigError;
use crate::domain::ToolRef;
use serde::{Deserialize, Serialize};

/// A tool hosted by a server: declared input and output field names plus
/// whether it may run with no prerequisite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub independent: bool,
}

/// A named grouping of related tools. Tool order within a server is the
/// declaration order and is significant for tie-breaking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub tools: Vec<ToolConfig>,
}

/// Static registry of servers and their tools. Missing references surface
/// as errors, never as silent no-ops: a dangling tool makes the whole chain
/// unsatisfiable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    servers: Vec<ServerConfig>,
}

impl Catalog {
    pub(super) fn new(servers: Vec<ServerConfig>) -> Self {
        Self { servers }
    }

    pub fn servers(&self) -> &[ServerConfig] {
        &self.servers
    }

    pub fn server(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.iter().find(|server| server.name == name)
    }

    /// Resolve a tool reference, surfacing the precise missing identifier.
    /// `context` names the caller for the error message.
    pub fn lookup(&self, tool: &ToolRef, context: &str) -> Result<&ToolConfig, ConfigError> {
        let server = self
            .server(&tool.server)
            .ok_or_else(|| ConfigError::UnknownServer {
                server: tool.server.clone(),
                context: context.to_string(),
            })?;
        server
            .tools
            .iter()
            .find(|candidate| candidate.name == tool.name)
            .ok_or_else(|| ConfigError::UnknownTool {
                server: tool.server.clone(),
                tool: tool.name.clone(),
                context: context.to_string(),
            })
    }

    /// Tools flagged as usable with no prerequisite, in catalog order.
    pub fn independent_tools(&self) -> impl Iterator<Item = ToolRef> + '_ {
        self.servers.iter().flat_map(|server| {
            server
                .tools
                .iter()
                .filter(|tool| tool.independent)
                .map(|tool| ToolRef::new(server.name.clone(), tool.name.clone()))
        })
    }

    /// Catalog-order position of a tool, used as the deterministic
    /// tie-break when several tools could satisfy the same need.
    pub fn position(&self, tool: &ToolRef) -> Option<usize> {
        let mut index = 0usize;
        for server in &self.servers {
            for candidate in &server.tools {
                if server.name == tool.server && candidate.name == tool.name {
                    return Some(index);
                }
                index += 1;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> Catalog {
        Catalog::new(vec![ServerConfig {
            name: "MCP-OTN".into(),
            tools: vec![
                ToolConfig {
                    name: "translate_to_english".into(),
                    description: None,
                    inputs: vec!["text".into()],
                    outputs: vec!["text".into(), "model_id".into()],
                    independent: true,
                },
                ToolConfig {
                    name: "extract_keywords".into(),
                    description: None,
                    inputs: vec![],
                    outputs: vec!["keywords".into()],
                    independent: true,
                },
            ],
        }])
    }

    #[test]
    fn lookup_surfaces_missing_identifiers() {
        let catalog = sample_catalog();
        let missing_server = ToolRef::new("MCP-NOPE", "translate_to_english");
        assert!(matches!(
            catalog.lookup(&missing_server, "test"),
            Err(ConfigError::UnknownServer { .. })
        ));
        let missing_tool = ToolRef::new("MCP-OTN", "does_not_exist");
        assert!(matches!(
            catalog.lookup(&missing_tool, "test"),
            Err(ConfigError::UnknownTool { .. })
        ));
    }

    #[test]
    fn independent_tools_follow_catalog_order() {
        let catalog = sample_catalog();
        let independent: Vec<ToolRef> = catalog.independent_tools().collect();
        assert_eq!(independent.len(), 2);
        assert_eq!(independent[0].name, "translate_to_english");
        assert_eq!(independent[1].name, "extract_keywords");
    }
}
