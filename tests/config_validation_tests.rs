// File-level configuration loading: TOML parsing plus the load-time
// validation pass, exercised through real files.

use mcp_toolchain::{AppConfig, ConfigError, ToolRef};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("toolchain.toml");
    fs::write(&path, content).expect("write config file");
    path
}

#[test]
fn shipped_sample_config_matches_the_builtin_demo() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(&dir, include_str!("../config/toolchain.toml"));
    let loaded = AppConfig::load(Some(path.as_path())).expect("sample config loads");
    let demo = AppConfig::demo();

    assert_eq!(loaded.catalog.servers().len(), demo.catalog.servers().len());
    assert_eq!(loaded.rules.len(), demo.rules.len());
    assert_eq!(
        loaded.mappings.entries().len(),
        demo.mappings.entries().len()
    );
    assert!(loaded
        .catalog
        .lookup(&ToolRef::new("MCP-OSB", "price_checker"), "test")
        .is_ok());
}

#[test]
fn missing_file_is_reported_as_not_found() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("absent.toml");
    let result = AppConfig::load(Some(path.as_path()));
    assert!(matches!(result, Err(ConfigError::NotFound { .. })));
}

#[test]
fn malformed_toml_is_reported_as_a_parse_error() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(&dir, "[[servers]\nname = broken");
    let result = AppConfig::load(Some(path.as_path()));
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
fn empty_catalog_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(&dir, "servers = []");
    let result = AppConfig::load(Some(path.as_path()));
    assert!(matches!(result, Err(ConfigError::NoServersConfigured)));
}

#[test]
fn rule_cycle_in_a_file_is_rejected_at_load() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(
        &dir,
        r#"
[[servers]]
name = "MCP-A"

[[servers.tools]]
name = "first"

[[servers.tools]]
name = "second"

[[rules]]
tool = { server = "MCP-A", name = "first" }
requires = { server = "MCP-A", name = "second" }
when = "always"

[[rules]]
tool = { server = "MCP-A", name = "second" }
requires = { server = "MCP-A", name = "first" }
when = "always"
"#,
    );
    let result = AppConfig::load(Some(path.as_path()));
    match result {
        Err(ConfigError::DependencyCycle { chain }) => {
            assert!(chain.contains("MCP-A/first"), "got chain: {chain}");
        }
        other => panic!("expected a dependency cycle error, got {other:?}"),
    }
}

#[test]
fn two_rules_for_one_tool_are_rejected_at_load() {
    // A non-English query with no summary field would satisfy both
    // predicates at once, demanding two prerequisites for the same tool.
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(
        &dir,
        r#"
[[servers]]
name = "MCP-A"

[[servers.tools]]
name = "target"

[[servers.tools]]
name = "translate"

[[servers.tools]]
name = "summarize"

[[rules]]
tool = { server = "MCP-A", name = "target" }
requires = { server = "MCP-A", name = "translate" }
when = "input_not_english"

[[rules]]
tool = { server = "MCP-A", name = "target" }
requires = { server = "MCP-A", name = "summarize" }
when = { field_absent = "summary" }
"#,
    );
    let result = AppConfig::load(Some(path.as_path()));
    assert!(matches!(
        result,
        Err(ConfigError::ConflictingRules { tool }) if tool == "MCP-A/target"
    ));
}

#[test]
fn mapping_to_an_unknown_server_is_rejected_at_load() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(
        &dir,
        r#"
[[servers]]
name = "MCP-A"

[[servers.tools]]
name = "first"

[[mappings]]
source_server = "MCP-A"
source_field = "model_id"
dest_server = "MCP-GONE"
dest_field = "mdlid"
"#,
    );
    let result = AppConfig::load(Some(path.as_path()));
    assert!(matches!(
        result,
        Err(ConfigError::UnknownServer { context, .. }) if context == "field mapping destination"
    ));
}
