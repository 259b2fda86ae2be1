#![deny(missing_docs)]
//! Simulated agents and the per-turn tool-call loop.
//!
//! An [`AgentSession`] owns one [`Agent`] and runs its turn: build the
//! prompt from the system prompt, memory and turn context, loop against the
//! model with the peer's tools plus the decision tool, then summarize the
//! transcript into a memory fragment with [`MemoryConsolidator`].
//!
//! The loop is bounded by [`SessionConfig::max_round_trips`]. Tool failures
//! and rejected decisions are reported back to the model inline; only
//! model, tool-listing, and consolidation failures end the turn early.

pub mod agent;
pub mod config;
pub mod decision_tool;
pub mod memory;
pub mod report;
pub mod session;

pub use agent::Agent;
pub use config::{ArgumentPolicy, ConsolidatorConfig, SessionConfig};
pub use decision_tool::DECISION_TOOL_NAME;
pub use memory::{Consolidation, MemoryConsolidator, MemoryLog, flatten_transcript};
pub use report::{ToolCallOutcome, ToolCallRecord, TurnReport};
pub use session::AgentSession;
