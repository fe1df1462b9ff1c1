pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod render;

pub use application::{
    DependencyResolver, FieldMapper, Orchestrator, OrchestratorError, OrchestratorOptions,
    ToolInvokeError, ToolServerInterface,
};
pub use config::{AppConfig, ConfigError};
pub use domain::{QuerySignals, Seal, Step, Strategy, ToolRef, Trace, TraceRecord};
pub use render::{RenderMode, render};
