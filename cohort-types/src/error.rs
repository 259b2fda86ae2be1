//! Error types for each layer.
//!
//! Errors that cross a task boundary or end up in a serialized turn
//! result carry strings, not source errors, so they stay `Clone` and
//! `Serialize`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort one agent's turn.
///
/// Tool-dispatch failures and rejected decisions are not here: the loop
/// recovers from both by reporting them back to the model.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SessionError {
    /// The language-model backend failed.
    #[error("model error: {0}")]
    Model(String),

    /// The protocol peer failed outside of a tool call (e.g. listing tools).
    #[error("peer error: {0}")]
    Peer(String),

    /// Summarizing the turn into memory failed.
    #[error("memory consolidation failed: {0}")]
    Consolidation(String),

    /// The session configuration is unusable.
    #[error("invalid session config: {0}")]
    Config(String),
}

/// Failure marker occupying an agent's slot in a turn result.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AgentFailure {
    /// The agent's session returned an error.
    #[error("session failed: {0}")]
    Session(String),

    /// The turn timeout expired before the agent finished.
    #[error("timed out before the turn deadline")]
    TimedOut,

    /// The agent's task panicked or was cancelled unexpectedly.
    #[error("agent task aborted: {0}")]
    Panicked(String),
}

impl From<SessionError> for AgentFailure {
    fn from(err: SessionError) -> Self {
        AgentFailure::Session(err.to_string())
    }
}

/// Turn-level errors. These affect every agent and propagate to the caller.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum OrchError {
    /// Fetching the shared turn context failed.
    #[error("failed to fetch turn context: {0}")]
    ContextFetch(String),

    /// No population has been initialized.
    #[error("no agents initialized")]
    EmptyPopulation,
}

/// Population setup errors. Always fatal: there is nothing to run.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum InitError {
    /// The protocol peer could not be reached or answered with an error.
    #[error("peer error during initialization: {0}")]
    Peer(String),

    /// The demographic specification or option set is malformed.
    #[error("invalid population spec: {0}")]
    InvalidSpec(String),

    /// The orchestrator configuration is unusable.
    #[error("invalid config: {0}")]
    Config(String),
}
