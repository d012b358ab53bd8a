//! Tools the agents can call: Celo chain queries and web search.

pub mod arguments;
pub mod blockchain;
pub mod search;
pub mod tool;
pub mod types;

pub use arguments::ToolArguments;
pub use blockchain::{blockchain_tools, CeloRpcClient};
pub use search::{search_tools, TavilyClient};
pub use tool::{tool_definitions, AgentTool, Tool};
pub use types::AgentToolParameters;
