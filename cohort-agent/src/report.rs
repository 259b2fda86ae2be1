//! Per-turn report returned by [`AgentSession::run_turn`](crate::AgentSession::run_turn).

use cohort_peer::ToolErrorKind;
use cohort_turn::TokenUsage;
use cohort_types::{AgentId, AgentUpdate, Decision, LoopExit};

/// How one tool call in the loop ended.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCallOutcome {
    /// A peer tool returned a result.
    Succeeded,
    /// A peer tool failed; the failure was reported to the model.
    Failed(ToolErrorKind),
    /// The decision tool accepted the proposed value.
    DecisionAccepted,
    /// The decision tool rejected the proposed value.
    DecisionRejected,
}

/// One tool call made during a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRecord {
    /// Tool name.
    pub name: String,
    /// Arguments as dispatched, after id injection.
    pub arguments: serde_json::Value,
    /// What happened.
    pub outcome: ToolCallOutcome,
}

/// Everything one agent's turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    /// The agent that ran.
    pub agent: AgentId,
    /// Decision at loop end.
    pub decision: Decision,
    /// Memory fragment appended this turn.
    pub fragment: String,
    /// How the loop ended.
    pub exit: LoopExit,
    /// Model requests made by the loop (consolidation excluded).
    pub round_trips: u32,
    /// Tool calls in the order they ran.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Tokens used by every model request in the turn, consolidation
    /// included.
    pub usage: TokenUsage,
}

impl TurnReport {
    /// The part of the report that goes into turn results.
    pub fn into_update(self) -> AgentUpdate {
        AgentUpdate {
            decision: self.decision,
            fragment: self.fragment,
            exit: self.exit,
        }
    }
}
