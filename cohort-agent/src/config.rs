//! Session and consolidator configuration.

use cohort_types::SessionError;
use serde::{Deserialize, Serialize};

/// Model used for both decisions and memory unless configured otherwise.
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";

/// How non-mapping tool arguments are handled before dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentPolicy {
    /// `null` becomes `{}`, any other non-mapping value becomes
    /// `{"input": value}`. The agent id is then injected, so every peer
    /// tool call carries it.
    #[default]
    Wrap,
    /// Non-mapping values are forwarded unchanged and without the agent id.
    PassThrough,
}

/// Per-agent loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Model for the decision loop.
    pub model: String,
    /// Sampling temperature for the decision loop.
    pub temperature: f64,
    /// Max output tokens per model request.
    pub max_tokens: u32,
    /// Hard cap on model round trips per turn.
    pub max_round_trips: u32,
    /// Handling of non-mapping tool arguments.
    pub argument_policy: ArgumentPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            temperature: 0.7,
            max_tokens: 2048,
            max_round_trips: 4,
            argument_policy: ArgumentPolicy::Wrap,
        }
    }
}

impl SessionConfig {
    /// Check the values a session cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] for a zero round-trip cap, a zero
    /// token budget, or a negative or non-finite temperature.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.max_round_trips == 0 {
            return Err(SessionError::Config("max_round_trips must be greater than zero".into()));
        }
        if self.max_tokens == 0 {
            return Err(SessionError::Config("max_tokens must be greater than zero".into()));
        }
        validate_temperature(self.temperature)
    }
}

/// Memory-consolidation model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidatorConfig {
    /// Model used to summarize turns; may differ from the decision model.
    pub model: String,
    /// Sampling temperature for summaries.
    pub temperature: f64,
    /// Max output tokens for a summary.
    pub max_tokens: u32,
}

impl Default for ConsolidatorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

impl ConsolidatorConfig {
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] for a zero token budget or a
    /// negative or non-finite temperature.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.max_tokens == 0 {
            return Err(SessionError::Config("memory max_tokens must be greater than zero".into()));
        }
        validate_temperature(self.temperature)
    }
}

fn validate_temperature(temperature: f64) -> Result<(), SessionError> {
    if !temperature.is_finite() || temperature < 0.0 {
        return Err(SessionError::Config(format!(
            "temperature must be a non-negative number, got {temperature}"
        )));
    }
    Ok(())
}
