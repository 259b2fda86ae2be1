#![deny(missing_docs)]
//! Turn orchestration for cohort simulations.
//!
//! [`TurnOrchestrator::initialize`] reads the population spec from the
//! peer, samples each agent's features, and builds their system prompts.
//! [`TurnOrchestrator::run_turn`] fetches the turn context once and runs
//! every agent concurrently on it, returning results in population order.
//! One agent failing never hides the others' results.

pub mod config;
pub mod orchestrator;
pub mod population;
pub mod sampling;

pub use config::OrchConfig;
pub use orchestrator::TurnOrchestrator;
pub use population::{InitReport, Population};
pub use sampling::FeatureCategory;
