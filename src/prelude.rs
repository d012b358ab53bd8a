//! Common imports.

pub use crate::agent::{build_agent_system, Agent, AgentSystem, Supervisor, ThreadStore};
pub use crate::config::AgentsConfig;
pub use crate::error::{AgentsError, Result};
pub use crate::generation::generate_text;
pub use crate::models::LanguageModel;
pub use crate::provider::ModelProvider;
pub use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolArguments};
pub use crate::types::{GenerationSettings, ModelMessage, Role};
