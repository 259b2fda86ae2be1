//! The simulated individual.

use crate::memory::MemoryLog;
use cohort_types::{AgentId, Decision, DecisionRejected, OptionSet};

/// One simulated individual.
///
/// Identity, features, system prompt and options are fixed at
/// construction. The decision changes only through [`Agent::decide`],
/// which validates against the option set; memory only grows.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    features: Vec<String>,
    system_prompt: String,
    memory: MemoryLog,
    decision: Decision,
    options: OptionSet,
}

impl Agent {
    /// Create an undecided agent with empty memory.
    pub fn new(
        id: AgentId,
        features: Vec<String>,
        system_prompt: impl Into<String>,
        options: OptionSet,
    ) -> Self {
        Self {
            id,
            features,
            system_prompt: system_prompt.into(),
            memory: MemoryLog::new(),
            decision: Decision::Undecided,
            options,
        }
    }

    /// The agent's id.
    pub fn id(&self) -> &AgentId {
        &self.id
    }

    /// Sampled feature names, in category order.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// The fixed system prompt.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Everything the agent remembers.
    pub fn memory(&self) -> &MemoryLog {
        &self.memory
    }

    /// The current decision.
    pub fn decision(&self) -> &Decision {
        &self.decision
    }

    /// The choices this agent may make.
    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    /// Record a decision if it is one of the agent's options.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionRejected`] and leaves the decision unchanged when
    /// `proposed` is not an option.
    pub fn decide(&mut self, proposed: &str) -> Result<&Decision, DecisionRejected> {
        self.decision = self.options.validate(proposed)?;
        Ok(&self.decision)
    }

    pub(crate) fn memory_mut(&mut self) -> &mut MemoryLog {
        &mut self.memory
    }
}
