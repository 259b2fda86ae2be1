#![deny(missing_docs)]
//! # cohort: umbrella crate
//!
//! A single import surface for running population simulations: a set of
//! LLM-driven agents, each with sampled features and a private memory,
//! deciding between fixed options as a scenario server feeds them context
//! one turn at a time. Re-exports the member crates behind feature flags,
//! plus a `prelude` for the happy path.

#[cfg(feature = "agent")]
pub use cohort_agent;
#[cfg(feature = "orch")]
pub use cohort_orch;
#[cfg(feature = "core")]
pub use cohort_peer;
#[cfg(feature = "core")]
pub use cohort_turn;
#[cfg(feature = "core")]
pub use cohort_types;

/// The Anthropic Messages API backend.
#[cfg(feature = "provider-anthropic")]
pub mod anthropic {
    pub use cohort_provider_anthropic::*;
}

/// Happy-path imports for running a simulation.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use cohort_types::{
        AgentFailure, AgentId, AgentOutcome, AgentUpdate, Decision, InitError, LoopExit, OptionSet,
        OrchError, SessionError, TurnContext, TurnResults,
    };

    #[cfg(feature = "core")]
    pub use cohort_turn::{Provider, ProviderError};

    #[cfg(feature = "core")]
    pub use cohort_peer::{McpPeer, PeerError, ProtocolPeer};

    #[cfg(feature = "agent")]
    pub use cohort_agent::{Agent, AgentSession, ConsolidatorConfig, SessionConfig, TurnReport};

    #[cfg(feature = "orch")]
    pub use cohort_orch::{InitReport, OrchConfig, TurnOrchestrator};

    #[cfg(feature = "provider-anthropic")]
    pub use cohort_provider_anthropic::Anthropic;
}
