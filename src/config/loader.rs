use super::AppConfig;
use super::catalog::{Catalog, ServerConfig};
use super::error::ConfigError;
use super::mappings::{FieldMapping, FieldMappings};
use super::rules::DependencyRule;
use crate::domain::ToolRef;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Raw configuration structure for deserialization from TOML.
#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    servers: Vec<ServerConfig>,
    #[serde(default)]
    rules: Vec<DependencyRule>,
    #[serde(default)]
    mappings: Vec<FieldMapping>,
}

/// Load and validate configuration from a TOML file.
pub(super) fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading orchestration configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_and_build(parsed.servers, parsed.rules, parsed.mappings)
}

/// Static validation shared by file loading and the built-in defaults:
/// duplicate identifiers, dangling references, rule conflicts and cycles,
/// mapping injectivity. Everything here fails fast, before any query runs.
pub(super) fn validate_and_build(
    servers: Vec<ServerConfig>,
    rules: Vec<DependencyRule>,
    mappings: Vec<FieldMapping>,
) -> Result<AppConfig, ConfigError> {
    if servers.is_empty() {
        return Err(ConfigError::NoServersConfigured);
    }

    let mut seen_servers = HashSet::new();
    for server in &servers {
        if !seen_servers.insert(server.name.clone()) {
            return Err(ConfigError::DuplicateServer {
                server: server.name.clone(),
            });
        }
        let mut seen_tools = HashSet::new();
        for tool in &server.tools {
            if !seen_tools.insert(tool.name.clone()) {
                return Err(ConfigError::DuplicateTool {
                    server: server.name.clone(),
                    tool: tool.name.clone(),
                });
            }
        }
    }

    let catalog = Catalog::new(servers);

    for rule in &rules {
        catalog.lookup(&rule.tool, "dependency rule target")?;
        catalog.lookup(&rule.requires, "dependency rule prerequisite")?;
    }
    check_rule_conflicts(&rules)?;
    check_cycles(&rules)?;

    let mut seen_destinations = HashSet::new();
    for mapping in &mappings {
        if catalog.server(&mapping.source_server).is_none() {
            return Err(ConfigError::UnknownServer {
                server: mapping.source_server.clone(),
                context: "field mapping source".to_string(),
            });
        }
        if catalog.server(&mapping.dest_server).is_none() {
            return Err(ConfigError::UnknownServer {
                server: mapping.dest_server.clone(),
                context: "field mapping destination".to_string(),
            });
        }
        let key = (mapping.dest_server.clone(), mapping.dest_field.clone());
        if !seen_destinations.insert(key) {
            return Err(ConfigError::DuplicateMapping {
                server: mapping.dest_server.clone(),
                field: mapping.dest_field.clone(),
            });
        }
    }

    Ok(AppConfig {
        catalog,
        rules,
        mappings: FieldMappings::new(mappings),
    })
}

/// None of the expressible predicates exclude one another, so two rules
/// for one tool could both activate on the same input and demand two
/// prerequisites at once. The single-prerequisite chain model forbids
/// that: each tool gets at most one rule.
fn check_rule_conflicts(rules: &[DependencyRule]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(&rule.tool) {
            return Err(ConfigError::ConflictingRules {
                tool: rule.tool.to_string(),
            });
        }
    }
    Ok(())
}

/// Depth-first walk over every prerequisite edge. Predicates are ignored
/// here because a cycle is illegal no matter which inputs would activate
/// it; cycles surface at load time, never at resolution time.
fn check_cycles(rules: &[DependencyRule]) -> Result<(), ConfigError> {
    fn walk(
        node: &ToolRef,
        rules: &[DependencyRule],
        chain: &mut Vec<ToolRef>,
    ) -> Result<(), ConfigError> {
        if chain.contains(node) {
            chain.push(node.clone());
            let rendered = chain
                .iter()
                .map(ToolRef::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ConfigError::DependencyCycle { chain: rendered });
        }
        chain.push(node.clone());
        for edge in rules.iter().filter(|rule| &rule.tool == node) {
            walk(&edge.requires, rules, chain)?;
        }
        chain.pop();
        Ok(())
    }

    for rule in rules {
        let mut chain = Vec::new();
        walk(&rule.tool, rules, &mut chain)?;
    }
    Ok(())
}
