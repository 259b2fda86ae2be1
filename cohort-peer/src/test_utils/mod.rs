//! In-memory protocol peers for testing.
//!
//! Available behind the `test-utils` feature flag.

mod static_peer;

pub use static_peer::{StaticPeer, ToolCallLog, ToolHandler};
