mod catalog;
mod defaults;
mod error;
mod loader;
mod mappings;
mod rules;

pub use catalog::{Catalog, ServerConfig, ToolConfig};
pub use error::ConfigError;
pub use mappings::{FieldMapping, FieldMappings};
pub use rules::{ActivationPredicate, DependencyRule};

use std::path::Path;
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "config/toolchain.toml";

/// Process-wide orchestration configuration: the server/tool catalog, the
/// dependency rule table, and the cross-server field mappings. Loaded and
/// validated once at startup, immutable afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog: Catalog,
    pub rules: Vec<DependencyRule>,
    pub mappings: FieldMappings,
}

impl AppConfig {
    /// Load configuration from a TOML file, or fall back to the built-in
    /// demo catalog when no path is given and the default file is absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return loader::load_config(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            loader::load_config(default_path)
        } else {
            info!("Configuration file not found; using built-in demo catalog");
            Ok(Self::demo())
        }
    }

    /// The built-in three-server demo catalog with its rule table and field
    /// mappings, validated by construction (covered by tests).
    pub fn demo() -> Self {
        defaults::demo_config()
    }
}
