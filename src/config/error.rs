use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating orchestration configuration.
/// All of these are fatal: they abort startup before any query is accepted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no servers configured - at least one [[servers]] entry is required")]
    NoServersConfigured,

    #[error("duplicate server '{server}' in catalog")]
    DuplicateServer { server: String },

    #[error("duplicate tool '{tool}' on server '{server}'")]
    DuplicateTool { server: String, tool: String },

    #[error("unknown server '{server}' referenced by {context}")]
    UnknownServer { server: String, context: String },

    #[error("unknown tool '{server}/{tool}' referenced by {context}")]
    UnknownTool {
        server: String,
        tool: String,
        context: String,
    },

    #[error("dependency rules form a cycle: {chain}")]
    DependencyCycle { chain: String },

    #[error(
        "conflicting dependency rules for '{tool}': more than one prerequisite could activate at once"
    )]
    ConflictingRules { tool: String },

    #[error(
        "field mappings for server '{server}' are not injective: two sources map to '{field}'"
    )]
    DuplicateMapping { server: String, field: String },
}
