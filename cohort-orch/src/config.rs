//! Orchestrator configuration.

use cohort_agent::{ConsolidatorConfig, SessionConfig};
use cohort_types::InitError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchConfig {
    /// Applied to every agent's session.
    pub session: SessionConfig,
    /// Applied to every agent's memory consolidation.
    pub consolidator: ConsolidatorConfig,
    /// Resource holding the population spec.
    pub init_uri: String,
    /// Resource holding each turn's context.
    pub next_turn_uri: String,
    /// Deadline for all agents in a turn. `None` waits for every agent.
    pub turn_timeout: Option<Duration>,
    /// Seed for feature sampling. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for OrchConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            consolidator: ConsolidatorConfig::default(),
            init_uri: "resource://init".into(),
            next_turn_uri: "resource://next_timestep".into(),
            turn_timeout: None,
            seed: None,
        }
    }
}

impl OrchConfig {
    /// # Errors
    ///
    /// Returns [`InitError::Config`] if a session or consolidator setting
    /// is unusable, or the turn timeout is zero.
    pub fn validate(&self) -> Result<(), InitError> {
        self.session
            .validate()
            .and_then(|()| self.consolidator.validate())
            .map_err(|e| InitError::Config(e.to_string()))?;
        if self.turn_timeout == Some(Duration::ZERO) {
            return Err(InitError::Config("turn_timeout must be non-zero".into()));
        }
        Ok(())
    }
}
