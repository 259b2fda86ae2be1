#![deny(missing_docs)]
//! Anthropic Messages API provider for cohort agents.
//!
//! [`Anthropic`] implements [`cohort_turn::Provider`]. Responses are
//! converted into [`cohort_turn::ContentPart`]s at this boundary.

mod client;
mod error;
pub mod mapping;

pub use client::Anthropic;
