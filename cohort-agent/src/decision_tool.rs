//! The synthetic tool agents use to record their choice.

use crate::agent::Agent;
use cohort_turn::ToolSchema;
use cohort_types::{Decision, DecisionRejected, OptionSet};
use serde_json::{Value, json};

/// Reserved name of the decision tool. Peer tools with this name are hidden.
pub const DECISION_TOOL_NAME: &str = "make_decision";

/// Schema for the decision tool, listing `options` as the allowed values.
pub fn decision_tool_schema(options: &OptionSet) -> ToolSchema {
    let allowed: Vec<&str> = options.iter().collect();
    ToolSchema {
        name: DECISION_TOOL_NAME.into(),
        description: "Make or change your decision based on the available options.".into(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "decision": {
                    "type": "string",
                    "enum": allowed,
                    "description": format!("One of: {options}"),
                }
            },
            "required": ["decision"],
        }),
    }
}

/// Apply a decision-tool call to `agent`.
///
/// A missing or non-string `decision` argument is rejected like any other
/// value outside the option set; the rejection quotes it as JSON.
pub(crate) fn apply(agent: &mut Agent, input: &Value) -> Result<Decision, DecisionRejected> {
    match input.get("decision") {
        Some(Value::String(proposed)) => agent.decide(proposed).cloned(),
        other => Err(DecisionRejected {
            proposed: other.map(Value::to_string).unwrap_or_default(),
            valid: agent.options().clone(),
        }),
    }
}

/// Tool-result text for an accepted decision.
pub(crate) fn accepted_message(decision: &Decision) -> String {
    format!("Decision made: {decision}")
}
