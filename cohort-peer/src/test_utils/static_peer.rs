//! StaticPeer: serves fixed resources, prompts and tools.

use crate::error::{PeerError, ToolError};
use crate::peer::{ProtocolPeer, ToolOutcome};
use async_trait::async_trait;
use cohort_turn::ToolSchema;
use cohort_types::TurnContext;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Computes a tool's result from its arguments.
pub type ToolHandler = Arc<dyn Fn(&Value) -> Result<ToolOutcome, ToolError> + Send + Sync>;

/// One recorded tool invocation: the tool name and the arguments it received.
pub type ToolCallLog = (String, Value);

/// A peer backed by in-memory maps.
///
/// Resources may be replaced between turns with [`StaticPeer::set_resource`].
/// Every tool call and resource read is recorded.
#[derive(Default)]
pub struct StaticPeer {
    resources: Mutex<HashMap<String, TurnContext>>,
    prompts: HashMap<String, String>,
    tools: Vec<(ToolSchema, ToolHandler)>,
    calls: Mutex<Vec<ToolCallLog>>,
    reads: Mutex<HashMap<String, usize>>,
    prompt_fetches: Mutex<usize>,
}

impl StaticPeer {
    /// An empty peer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `context` at `uri`.
    pub fn with_resource(self, uri: impl Into<String>, context: impl Into<TurnContext>) -> Self {
        self.set_resource(uri, context);
        self
    }

    /// Serve `fragment` as the prompt for `feature`.
    pub fn with_prompt(mut self, feature: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.prompts.insert(feature.into(), fragment.into());
        self
    }

    /// Advertise a tool answered by `handler`.
    pub fn with_tool<F>(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Self
    where
        F: Fn(&Value) -> Result<ToolOutcome, ToolError> + Send + Sync + 'static,
    {
        let schema = ToolSchema {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({"type": "object", "properties": {}}),
        };
        self.tools.push((schema, Arc::new(handler)));
        self
    }

    /// Replace (or add) the resource at `uri`.
    pub fn set_resource(&self, uri: impl Into<String>, context: impl Into<TurnContext>) {
        self.resources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(uri.into(), context.into());
    }

    /// Every tool call received so far, in arrival order.
    pub fn calls(&self) -> Vec<ToolCallLog> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// How many times `uri` has been read.
    pub fn read_count(&self, uri: &str) -> usize {
        self.reads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(uri)
            .copied()
            .unwrap_or(0)
    }

    /// How many prompt fragments have been fetched.
    pub fn prompt_fetch_count(&self) -> usize {
        *self
            .prompt_fetches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ProtocolPeer for StaticPeer {
    async fn read_resource(&self, uri: &str) -> Result<TurnContext, PeerError> {
        *self
            .reads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(uri.to_string())
            .or_default() += 1;
        self.resources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(uri)
            .cloned()
            .ok_or_else(|| PeerError::NotFound(uri.to_string()))
    }

    async fn get_prompt_fragment(&self, feature: &str) -> Result<String, PeerError> {
        *self
            .prompt_fetches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) += 1;
        self.prompts
            .get(feature)
            .cloned()
            .ok_or_else(|| PeerError::NotFound(format!("prompt {feature}")))
    }

    async fn list_tools(&self) -> Result<Vec<ToolSchema>, PeerError> {
        Ok(self.tools.iter().map(|(tool, _)| tool.clone()).collect())
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<ToolOutcome, ToolError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((name.to_string(), args.clone()));
        let handler = self
            .tools
            .iter()
            .find(|(schema, _)| schema.name == name)
            .map(|(_, handler)| Arc::clone(handler))
            .ok_or_else(|| ToolError::not_found(name))?;
        handler(&args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolErrorKind;
    use crate::init::InitResource;
    use serde_json::json;

    fn election_peer() -> StaticPeer {
        StaticPeer::new()
            .with_resource(
                "resource://init",
                TurnContext::Structured(json!({
                    "context": "A small election.",
                    "demographic_info": [[["Republican", 25], ["Democrat", 75]]],
                    "options": ["X", "Y"]
                })),
            )
            .with_resource("resource://next_timestep", "Day 1")
            .with_prompt("Republican", "You lean Republican.")
            .with_tool("read_news", "Read the news", |args| {
                Ok(ToolOutcome::new(format!("news for {}", args["id"])))
            })
            .with_tool("broken", "Always fails", |_| Err(ToolError::other("boom")))
    }

    #[tokio::test]
    async fn serves_init_resource() {
        let peer = election_peer();
        let payload = peer.read_resource("resource://init").await.unwrap();
        let init = InitResource::from_payload(&payload).unwrap();
        assert_eq!(init.options, vec!["X", "Y"]);
        assert_eq!(peer.read_count("resource://init"), 1);
    }

    #[tokio::test]
    async fn missing_resource_is_not_found() {
        let peer = election_peer();
        let err = peer.read_resource("resource://nope").await.unwrap_err();
        assert!(matches!(err, PeerError::NotFound(_)));
    }

    #[tokio::test]
    async fn resources_can_change_between_turns() {
        let peer = election_peer();
        peer.set_resource("resource://next_timestep", "Day 2");
        let ctx = peer
            .read_resource("resource://next_timestep")
            .await
            .unwrap();
        assert_eq!(ctx.as_text(), "Day 2");
    }

    #[tokio::test]
    async fn tool_calls_are_recorded_and_dispatched() {
        let peer = election_peer();
        let out = peer
            .call_tool("read_news", json!({"id": "agent-1"}))
            .await
            .unwrap();
        assert_eq!(out.content, "news for \"agent-1\"");

        let err = peer.call_tool("broken", json!({})).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Other);

        let err = peer.call_tool("vote", json!({})).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::NotFound);

        let names: Vec<String> = peer.calls().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["read_news", "broken", "vote"]);
    }

    #[tokio::test]
    async fn concurrent_calls_through_shared_peer() {
        let peer: Arc<dyn ProtocolPeer> = Arc::new(election_peer());
        let mut handles = Vec::new();
        for i in 0..8 {
            let peer = Arc::clone(&peer);
            handles.push(tokio::spawn(async move {
                peer.call_tool("read_news", json!({"id": format!("agent-{i}")}))
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn lists_advertised_tools() {
        let peer = election_peer();
        let tools = peer.list_tools().await.unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["read_news", "broken"]);
        assert_eq!(
            peer.get_prompt_fragment("Republican").await.unwrap(),
            "You lean Republican."
        );
    }
}
