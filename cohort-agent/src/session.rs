//! The per-turn tool-call loop.

use std::sync::Arc;

use cohort_peer::ProtocolPeer;
use cohort_turn::{
    ContentPart, Provider, ProviderMessage, ProviderRequest, Role, TokenUsage, ToolSchema,
};
use cohort_types::{AgentId, LoopExit, SessionError, TurnContext};
use serde_json::{Map, Value};

use crate::agent::Agent;
use crate::config::{ArgumentPolicy, ConsolidatorConfig, SessionConfig};
use crate::decision_tool::{self, DECISION_TOOL_NAME, decision_tool_schema};
use crate::memory::MemoryConsolidator;
use crate::report::{ToolCallOutcome, ToolCallRecord, TurnReport};

/// Owns one agent and runs its turns.
///
/// Generic over `P: Provider` (not object-safe). The provider and peer
/// are shared handles, so cloning a session copies only the agent's own
/// state. The orchestrator relies on that to run a turn on a copy and
/// commit it back.
pub struct AgentSession<P: Provider> {
    agent: Agent,
    provider: Arc<P>,
    peer: Arc<dyn ProtocolPeer>,
    consolidator: MemoryConsolidator<P>,
    config: SessionConfig,
}

impl<P: Provider> Clone for AgentSession<P> {
    fn clone(&self) -> Self {
        Self {
            agent: self.agent.clone(),
            provider: Arc::clone(&self.provider),
            peer: Arc::clone(&self.peer),
            consolidator: self.consolidator.clone(),
            config: self.config.clone(),
        }
    }
}

/// Result text and bookkeeping for one handled tool call.
struct Dispatched {
    content: String,
    is_error: bool,
    record: ToolCallRecord,
}

impl<P: Provider> AgentSession<P> {
    /// Create a session. Memory is summarized with the same provider.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] if either config fails validation.
    pub fn new(
        agent: Agent,
        provider: Arc<P>,
        peer: Arc<dyn ProtocolPeer>,
        config: SessionConfig,
        consolidator_config: ConsolidatorConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        consolidator_config.validate()?;
        let consolidator = MemoryConsolidator::new(Arc::clone(&provider), consolidator_config);
        Ok(Self {
            agent,
            provider,
            peer,
            consolidator,
            config,
        })
    }

    /// The agent this session drives.
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// The agent's id.
    pub fn id(&self) -> &AgentId {
        self.agent.id()
    }

    /// The loop configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run one turn against `ctx`.
    ///
    /// Loops until the model stops requesting tools or the round-trip cap
    /// is hit, then consolidates the transcript into memory.
    ///
    /// # Errors
    ///
    /// [`SessionError::Peer`] if the peer's tools cannot be listed,
    /// [`SessionError::Model`] if a model request fails, and
    /// [`SessionError::Consolidation`] if summarizing fails. A decision
    /// accepted before the failure stays recorded on the agent.
    pub async fn run_turn(&mut self, ctx: &TurnContext) -> Result<TurnReport, SessionError> {
        // 1. Assemble the opening message and the tool list
        let mut messages = vec![ProviderMessage::user_text(self.opening_prompt(ctx))];
        let tools = self.tool_schemas().await?;

        let mut round_trips: u32 = 0;
        let mut usage = TokenUsage::default();
        let mut tool_calls = Vec::new();

        let exit = loop {
            round_trips += 1;

            // 2. Ask the model
            let request = ProviderRequest {
                model: Some(self.config.model.clone()),
                messages: messages.clone(),
                tools: tools.clone(),
                max_tokens: Some(self.config.max_tokens),
                temperature: Some(self.config.temperature),
                system: None,
            };
            tracing::debug!(
                agent = %self.agent.id(),
                round_trip = round_trips,
                messages = messages.len(),
                "sending model request"
            );
            let response = self
                .provider
                .complete(request)
                .await
                .map_err(|e| SessionError::Model(e.to_string()))?;
            usage.accumulate(response.usage);

            // 3. No tool requested: the turn is over
            let Some((index, tool_use_id, name, input)) = first_tool_use(&response.content) else {
                messages.push(ProviderMessage {
                    role: Role::Assistant,
                    content: response.content,
                });
                break LoopExit::Completed;
            };

            // 4. Keep the assistant message up to its first tool use; later
            //    tool uses are dropped so each recorded use has one result.
            let mut content = response.content;
            content.truncate(index + 1);
            messages.push(ProviderMessage {
                role: Role::Assistant,
                content,
            });

            // 5. Handle the call and report back
            let dispatched = self.dispatch(&name, input).await;
            messages.push(ProviderMessage {
                role: Role::User,
                content: vec![ContentPart::ToolResult {
                    tool_use_id,
                    content: dispatched.content,
                    is_error: dispatched.is_error,
                }],
            });
            tool_calls.push(dispatched.record);

            // 6. Check the cap
            if round_trips >= self.config.max_round_trips {
                tracing::warn!(
                    agent = %self.agent.id(),
                    round_trips,
                    "round-trip cap reached while the model still wanted tools"
                );
                break LoopExit::LoopLimitReached;
            }
        };

        // 7. Summarize into memory
        let consolidation = self
            .consolidator
            .consolidate(&messages, self.agent.memory_mut())
            .await
            .map_err(|e| SessionError::Consolidation(e.to_string()))?;
        usage.accumulate(consolidation.usage);

        Ok(TurnReport {
            agent: self.agent.id().clone(),
            decision: self.agent.decision().clone(),
            fragment: consolidation.fragment,
            exit,
            round_trips,
            tool_calls,
            usage,
        })
    }

    fn opening_prompt(&self, ctx: &TurnContext) -> String {
        format!(
            "{}\n\nHere's all the memories you've retained up to this point.\n\n{}\n\nHere's some updated context\n\n{}",
            self.agent.system_prompt(),
            self.agent.memory().render(),
            ctx.as_text(),
        )
    }

    async fn tool_schemas(&self) -> Result<Vec<ToolSchema>, SessionError> {
        let mut tools: Vec<ToolSchema> = self
            .peer
            .list_tools()
            .await
            .map_err(|e| SessionError::Peer(e.to_string()))?
            .into_iter()
            .filter(|tool| {
                let shadows = tool.name == DECISION_TOOL_NAME;
                if shadows {
                    tracing::warn!(
                        tool = %tool.name,
                        "peer tool shadows the decision tool; hiding it"
                    );
                }
                !shadows
            })
            .collect();
        tools.push(decision_tool_schema(self.agent.options()));
        Ok(tools)
    }

    async fn dispatch(&mut self, name: &str, input: Value) -> Dispatched {
        if name == DECISION_TOOL_NAME {
            return match decision_tool::apply(&mut self.agent, &input) {
                Ok(decision) => {
                    tracing::debug!(agent = %self.agent.id(), %decision, "decision recorded");
                    Dispatched {
                        content: decision_tool::accepted_message(&decision),
                        is_error: false,
                        record: ToolCallRecord {
                            name: name.to_string(),
                            arguments: input,
                            outcome: ToolCallOutcome::DecisionAccepted,
                        },
                    }
                }
                Err(rejection) => {
                    tracing::info!(
                        agent = %self.agent.id(),
                        proposed = %rejection.proposed,
                        "decision rejected"
                    );
                    Dispatched {
                        content: rejection.to_string(),
                        is_error: true,
                        record: ToolCallRecord {
                            name: name.to_string(),
                            arguments: input,
                            outcome: ToolCallOutcome::DecisionRejected,
                        },
                    }
                }
            };
        }

        let arguments = prepare_arguments(self.config.argument_policy, input, self.agent.id());
        match self.peer.call_tool(name, arguments.clone()).await {
            Ok(outcome) => Dispatched {
                content: outcome.content,
                is_error: false,
                record: ToolCallRecord {
                    name: name.to_string(),
                    arguments,
                    outcome: ToolCallOutcome::Succeeded,
                },
            },
            Err(err) => {
                tracing::warn!(
                    agent = %self.agent.id(),
                    tool = name,
                    error = %err,
                    "tool call failed"
                );
                Dispatched {
                    content: format!(
                        "Tool call failed ({}): {}. Don't retry this tool call.",
                        err.kind, err.message
                    ),
                    is_error: true,
                    record: ToolCallRecord {
                        name: name.to_string(),
                        arguments,
                        outcome: ToolCallOutcome::Failed(err.kind),
                    },
                }
            }
        }
    }
}

/// Position and fields of the first tool use in `content`.
fn first_tool_use(content: &[ContentPart]) -> Option<(usize, String, String, Value)> {
    for (index, part) in content.iter().enumerate() {
        if let ContentPart::ToolUse { id, name, input } = part {
            return Some((index, id.clone(), name.clone(), input.clone()));
        }
    }
    None
}

/// Normalize model-supplied arguments and inject the agent id.
///
/// The id is inserted after the model's keys, replacing any `"id"` the
/// model supplied.
fn prepare_arguments(policy: ArgumentPolicy, input: Value, id: &AgentId) -> Value {
    let mut map = match (input, policy) {
        (Value::Object(map), _) => map,
        (Value::Null, ArgumentPolicy::Wrap) => Map::new(),
        (other, ArgumentPolicy::Wrap) => {
            let mut map = Map::new();
            map.insert("input".into(), other);
            map
        }
        (other, ArgumentPolicy::PassThrough) => {
            tracing::debug!(agent = %id, "non-mapping tool arguments forwarded without agent id");
            return other;
        }
    };
    map.insert("id".into(), Value::String(id.as_str().to_string()));
    Value::Object(map)
}
