//! # cohort-types: shared vocabulary for population simulations
//!
//! Every other cohort crate speaks in these types. They carry no behavior
//! beyond validation and rendering, so the agent loop, the orchestrator,
//! and any outer API layer can share them without pulling in a runtime.
//!
//! | Type | What it is |
//! |------|------------|
//! | [`AgentId`] | Opaque, immutable agent identity |
//! | [`Decision`] | An agent's current choice, or [`Decision::Undecided`] |
//! | [`OptionSet`] | The fixed set of choices an agent may make |
//! | [`TurnContext`] | The shared, read-only payload for one turn |
//! | [`AgentOutcome`] | One agent's slot in a turn result |
//!
//! Errors for each layer live in [`error`].

#![deny(missing_docs)]

pub mod context;
pub mod decision;
pub mod error;
pub mod id;
pub mod outcome;

pub use context::TurnContext;
pub use decision::{Decision, DecisionRejected, OptionSet};
pub use error::{AgentFailure, InitError, OrchError, SessionError};
pub use id::AgentId;
pub use outcome::{AgentOutcome, AgentUpdate, LoopExit, TurnResults};
