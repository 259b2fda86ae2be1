//! In-memory providers for testing.
//!
//! Available behind the `test-utils` feature flag. Neither touches the
//! network; both record every request they receive.

mod fn_provider;
mod scripted;

pub use fn_provider::FnProvider;
pub use scripted::ScriptedProvider;
