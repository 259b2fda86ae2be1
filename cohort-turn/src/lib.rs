#![deny(missing_docs)]
//! Language-model backend contract for cohort agents.
//!
//! Provides the [`Provider`] trait for making model calls, the
//! [`ContentPart`] tagged union every backend response is converted into,
//! and the request/response types the agent loop builds on.

pub mod convert;
pub mod provider;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-exports
pub use convert::{parts_from_value, text_of};
pub use provider::{Provider, ProviderError};
pub use types::*;
