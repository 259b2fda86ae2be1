#![deny(missing_docs)]
//! Protocol peer contract for cohort simulations.
//!
//! The peer is the external service that owns the scenario: it publishes
//! resources (the init spec, each turn's context), prompt fragments keyed
//! by feature name, and the tools agents may call. The core depends only
//! on the [`ProtocolPeer`] trait.
//!
//! - [`McpPeer`] speaks the Model Context Protocol through `rmcp`.
//! - `StaticPeer` (behind the `test-utils` feature) serves fixed data.
//!
//! Implementations are shared by every agent task in a turn and must
//! tolerate concurrent, interleaved calls.

pub mod error;
pub mod init;
pub mod mcp;
pub mod peer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{PeerError, ToolError, ToolErrorKind};
pub use init::InitResource;
pub use mcp::McpPeer;
pub use peer::{ProtocolPeer, ToolOutcome};
