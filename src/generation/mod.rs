//! Text generation with a tool-calling loop.

pub mod text;

pub use text::{generate_text, MAX_TOOL_ITERATIONS};
