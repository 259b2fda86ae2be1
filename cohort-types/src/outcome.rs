//! Per-agent and per-turn results.

use crate::decision::Decision;
use crate::error::AgentFailure;
use crate::id::AgentId;
use serde::{Deserialize, Serialize};

/// Why an agent's tool-call loop stopped.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopExit {
    /// The model answered without requesting a tool.
    Completed,
    /// The round-trip cap was hit while the model still wanted tools.
    LoopLimitReached,
}

/// What one agent produced in a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentUpdate {
    /// Decision at loop end (possibly unchanged from the previous turn).
    pub decision: Decision,
    /// The memory fragment consolidated from this turn.
    pub fragment: String,
    /// How the loop ended.
    pub exit: LoopExit,
}

/// One slot of a turn result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutcome {
    /// Which agent this slot belongs to.
    pub agent: AgentId,
    /// The update, or the reason the agent produced none this turn.
    pub result: Result<AgentUpdate, AgentFailure>,
}

impl AgentOutcome {
    /// The update, if the agent's turn succeeded.
    pub fn update(&self) -> Option<&AgentUpdate> {
        self.result.as_ref().ok()
    }

    /// Whether the agent's turn failed.
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

/// Results of one simulation turn, in population order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResults {
    /// Zero-based index of the turn that produced these results.
    pub turn: u64,
    /// One outcome per agent, in initialization order.
    pub outcomes: Vec<AgentOutcome>,
}

impl TurnResults {
    /// Number of agents whose turn failed.
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    /// `(id, decision, fragment)` for every agent that succeeded.
    pub fn updates(&self) -> impl Iterator<Item = (&AgentId, &Decision, &str)> {
        self.outcomes.iter().filter_map(|o| {
            o.update()
                .map(|u| (&o.agent, &u.decision, u.fragment.as_str()))
        })
    }
}
