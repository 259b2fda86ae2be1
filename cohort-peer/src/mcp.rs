//! MCP-backed protocol peer.
//!
//! [`McpPeer`] wraps an rmcp client session. rmcp's `Peer` multiplexes
//! requests over one connection, so a single `McpPeer` behind an `Arc`
//! serves every agent task in a turn.

use std::borrow::Cow;

use async_trait::async_trait;
use cohort_turn::ToolSchema;
use cohort_types::TurnContext;
use rmcp::ServiceExt;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ErrorCode, GetPromptRequestParams,
    PromptMessageContent, RawContent, ReadResourceRequestParams, ResourceContents, Tool as McpTool,
};
use rmcp::service::{Peer, RoleClient, RunningService};
use rmcp::transport::TokioChildProcess;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransport;

use crate::error::{PeerError, ToolError};
use crate::peer::{ProtocolPeer, ToolOutcome};

/// A protocol peer reached over the Model Context Protocol.
pub struct McpPeer {
    /// Keeps the connection alive; requests go through `peer`.
    service: RunningService<RoleClient, ()>,
    peer: Peer<RoleClient>,
}

impl McpPeer {
    /// Spawn an MCP server as a child process and connect over stdio.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::Connection`] if the process cannot be spawned
    /// or the MCP handshake fails.
    pub async fn connect_stdio(command: tokio::process::Command) -> Result<Self, PeerError> {
        let transport = TokioChildProcess::new(command).map_err(connection_error)?;
        let service = ().serve(transport).await.map_err(connection_error)?;
        tracing::info!("connected to MCP peer over stdio");
        Ok(Self::from_service(service))
    }

    /// Connect to an MCP server's streamable HTTP endpoint
    /// (e.g. `http://127.0.0.1:8000/mcp`).
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::Connection`] if the connection or handshake fails.
    pub async fn connect_http(url: &str) -> Result<Self, PeerError> {
        let transport = StreamableHttpClientTransport::from_uri(url);
        let service = ().serve(transport).await.map_err(connection_error)?;
        tracing::info!(url, "connected to MCP peer over HTTP");
        Ok(Self::from_service(service))
    }

    fn from_service(service: RunningService<RoleClient, ()>) -> Self {
        let peer = service.peer().clone();
        Self { service, peer }
    }

    /// Shut down the connection.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::Connection`] if the shutdown fails.
    pub async fn close(self) -> Result<(), PeerError> {
        self.service.cancel().await.map_err(connection_error)?;
        Ok(())
    }
}

fn connection_error(err: impl std::fmt::Display) -> PeerError {
    PeerError::Connection(err.to_string())
}

#[async_trait]
impl ProtocolPeer for McpPeer {
    async fn read_resource(&self, uri: &str) -> Result<TurnContext, PeerError> {
        let params = ReadResourceRequestParams {
            uri: uri.to_string(),
            meta: None,
        };
        let result = self
            .peer
            .read_resource(params)
            .await
            .map_err(|e| PeerError::Protocol(e.to_string()))?;

        let texts: Vec<String> = result
            .contents
            .into_iter()
            .filter_map(|c| match c {
                ResourceContents::TextResourceContents { text, .. } => Some(text),
                ResourceContents::BlobResourceContents { .. } => None,
            })
            .collect();
        resource_texts_to_context(uri, texts)
    }

    async fn get_prompt_fragment(&self, feature: &str) -> Result<String, PeerError> {
        let params = GetPromptRequestParams {
            name: feature.to_string(),
            arguments: None,
            meta: None,
        };
        let result = self
            .peer
            .get_prompt(params)
            .await
            .map_err(|e| PeerError::Protocol(e.to_string()))?;

        result
            .messages
            .into_iter()
            .find_map(|m| match m.content {
                PromptMessageContent::Text { text } => Some(text),
                _ => None,
            })
            .ok_or_else(|| PeerError::Malformed(format!("prompt {feature} has no text message")))
    }

    async fn list_tools(&self) -> Result<Vec<ToolSchema>, PeerError> {
        let tools = self
            .peer
            .list_all_tools()
            .await
            .map_err(|e| PeerError::Protocol(e.to_string()))?;
        Ok(tools.into_iter().map(mcp_tool_to_schema).collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> Result<ToolOutcome, ToolError> {
        // MCP carries arguments as a JSON object or nothing at all.
        let arguments = match args {
            serde_json::Value::Object(map) => Some(map),
            serde_json::Value::Null => None,
            other => {
                return Err(ToolError::invalid_args(format!(
                    "expected object or null, got {other}"
                )));
            }
        };

        let params = CallToolRequestParams {
            meta: None,
            name: Cow::Owned(name.to_string()),
            arguments,
            task: None,
        };
        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| tool_error_from_service(name, e))?;
        call_result_to_outcome(result)
    }
}

/// Convert an rmcp tool into the schema handed to the model.
pub(crate) fn mcp_tool_to_schema(tool: McpTool) -> ToolSchema {
    ToolSchema {
        name: tool.name.into_owned(),
        description: tool.description.map(Cow::into_owned).unwrap_or_default(),
        input_schema: serde_json::Value::Object(tool.input_schema.as_ref().clone()),
    }
}

/// A single text resource becomes text; several become a JSON array of strings.
fn resource_texts_to_context(uri: &str, mut texts: Vec<String>) -> Result<TurnContext, PeerError> {
    match texts.len() {
        0 => Err(PeerError::Malformed(format!("resource {uri} has no text content"))),
        1 => Ok(TurnContext::Text(texts.remove(0))),
        _ => Ok(TurnContext::Structured(serde_json::json!(texts))),
    }
}

fn call_result_to_outcome(result: CallToolResult) -> Result<ToolOutcome, ToolError> {
    let text = extract_text_from_content(&result.content);
    if result.is_error == Some(true) {
        return Err(ToolError::other(text));
    }
    if let Some(structured) = result.structured_content {
        return Ok(ToolOutcome::new(structured.to_string()));
    }
    Ok(ToolOutcome::new(text))
}

fn tool_error_from_service(name: &str, err: rmcp::ServiceError) -> ToolError {
    match &err {
        rmcp::ServiceError::McpError(data) if data.message.contains("not found") => {
            ToolError::not_found(name)
        }
        rmcp::ServiceError::McpError(data) if data.code == ErrorCode::METHOD_NOT_FOUND => {
            ToolError::not_found(name)
        }
        rmcp::ServiceError::McpError(data) if data.code == ErrorCode::INVALID_PARAMS => {
            ToolError::invalid_args(data.message.to_string())
        }
        rmcp::ServiceError::McpError(data) => ToolError::other(data.message.to_string()),
        _ => ToolError::transport(err.to_string()),
    }
}

/// Extract text from MCP content blocks.
fn extract_text_from_content(content: &[Content]) -> String {
    content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
