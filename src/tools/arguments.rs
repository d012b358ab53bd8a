//! Typed access to tool call arguments.

use serde_json::Value;

use crate::error::AgentsError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: Value,
}

impl ToolArguments {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, AgentsError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| AgentsError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional non-negative integer argument.
    ///
    /// Models often send integers as floats (`5.0`) or strings (`"5"`);
    /// both are accepted. A present but unusable value is an error.
    pub fn get_u64_opt(&self, key: &str) -> Result<Option<u64>, AgentsError> {
        let value = match self.value.get(key) {
            None | Some(Value::Null) => return Ok(None),
            Some(v) => v,
        };
        let parsed = match value {
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .map(|f| f as u64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.map(Some).ok_or_else(|| {
            AgentsError::InvalidArgument(format!(
                "Argument '{key}' must be a non-negative integer, got {value}"
            ))
        })
    }
}
