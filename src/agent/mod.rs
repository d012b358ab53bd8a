//! Agents, the supervisor that routes between them, and thread storage.

pub mod agent;
pub mod session;
pub mod supervisor;

pub use agent::{blockchain_expert, search_expert, Agent, BLOCKCHAIN_EXPERT, SEARCH_EXPERT};
pub use session::ThreadStore;
pub use supervisor::{build_agent_system, AgentSystem, Supervisor, MAX_HANDOFFS, SUPERVISOR_NAME};
