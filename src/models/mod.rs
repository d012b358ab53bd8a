//! Model selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AgentsError;

/// A language model, selected with a `provider:model_id` string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "provider", content = "model")]
pub enum LanguageModel {
    /// Google Gemini, e.g. `google:gemini-2.5-flash`.
    Google(String),
    /// Any other provider; no built-in transport.
    Custom { provider: String, model_id: String },
}

impl LanguageModel {
    /// The model's API identifier string.
    pub fn model_id(&self) -> &str {
        match self {
            Self::Google(m) => m,
            Self::Custom { model_id, .. } => model_id,
        }
    }

    /// The provider name.
    pub fn provider_name(&self) -> &str {
        match self {
            Self::Google(_) => "google",
            Self::Custom { provider, .. } => provider,
        }
    }
}

impl FromStr for LanguageModel {
    type Err = AgentsError;

    /// Examples: `google:gemini-2.5-flash`, `gemini:gemini-2.0-flash`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (provider, model_id) = s.split_once(':').ok_or_else(|| {
            AgentsError::InvalidArgument(format!(
                "Invalid model selector '{s}': expected 'provider:model_id'"
            ))
        })?;
        if model_id.is_empty() {
            return Err(AgentsError::InvalidArgument(format!(
                "Invalid model selector '{s}': empty model id"
            )));
        }

        match provider {
            "google" | "gemini" => Ok(Self::Google(model_id.to_string())),
            other => Ok(Self::Custom {
                provider: other.to_string(),
                model_id: model_id.to_string(),
            }),
        }
    }
}

impl fmt::Display for LanguageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider_name(), self.model_id())
    }
}
