//! The protocol peer trait.

use crate::error::{PeerError, ToolError};
use async_trait::async_trait;
use cohort_turn::ToolSchema;
use cohort_types::TurnContext;
use serde::{Deserialize, Serialize};

/// Successful result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Result content, as text the model will read.
    pub content: String,
}

impl ToolOutcome {
    /// Create an outcome from text.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// The external service that owns the scenario.
///
/// One instance is shared (`Arc<dyn ProtocolPeer>`) by every agent task,
/// so implementations must be safe under concurrent interleaved calls.
#[async_trait]
pub trait ProtocolPeer: Send + Sync {
    /// Read a named resource (the init spec, the next turn's context).
    async fn read_resource(&self, uri: &str) -> Result<TurnContext, PeerError>;

    /// Fetch the prompt fragment that describes a feature.
    async fn get_prompt_fragment(&self, feature: &str) -> Result<String, PeerError>;

    /// The tools currently advertised by the peer.
    async fn list_tools(&self) -> Result<Vec<ToolSchema>, PeerError>;

    /// Invoke a tool.
    ///
    /// For every tool other than the agent's reserved decision tool,
    /// `args["id"]` carries the calling agent's id.
    async fn call_tool(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> Result<ToolOutcome, ToolError>;
}
