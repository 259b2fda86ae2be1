//! Request/response mapping between cohort-turn and the Anthropic Messages API.
//!
//! Reference: <https://docs.anthropic.com/en/api/messages>

use cohort_turn::{
    ContentPart, ProviderError, ProviderMessage, ProviderRequest, ProviderResponse, Role,
    StopReason, TokenUsage, ToolSchema, parts_from_value,
};

/// Used when the request leaves `max_tokens` unset; the API requires it.
const DEFAULT_MAX_TOKENS: u32 = 4096;

// ─── Request mapping ─────────────────────────────────────────────────────────

/// Convert a [`ProviderRequest`] into the Messages API JSON body.
#[must_use]
pub fn to_api_request(req: &ProviderRequest, default_model: &str) -> serde_json::Value {
    let model = req.model.as_deref().unwrap_or(default_model);

    let mut body = serde_json::json!({
        "model": model,
        "messages": map_messages(&req.messages),
        "max_tokens": req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
    });

    if let Some(system) = &req.system {
        body["system"] = serde_json::Value::String(system.clone());
    }

    if let Some(temp) = req.temperature {
        body["temperature"] = serde_json::Value::from(temp);
    }

    if !req.tools.is_empty() {
        body["tools"] = serde_json::Value::Array(req.tools.iter().map(map_tool).collect());
    }

    body
}

fn map_messages(messages: &[ProviderMessage]) -> serde_json::Value {
    messages
        .iter()
        .map(|msg| {
            let role = match msg.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            let content: Vec<serde_json::Value> = msg.content.iter().map(map_part).collect();
            serde_json::json!({ "role": role, "content": content })
        })
        .collect()
}

fn map_part(part: &ContentPart) -> serde_json::Value {
    match part {
        ContentPart::Text { text } => serde_json::json!({
            "type": "text",
            "text": text,
        }),
        ContentPart::ToolUse { id, name, input } => serde_json::json!({
            "type": "tool_use",
            "id": id,
            "name": name,
            "input": input,
        }),
        ContentPart::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => serde_json::json!({
            "type": "tool_result",
            "tool_use_id": tool_use_id,
            "content": content,
            "is_error": is_error,
        }),
    }
}

fn map_tool(tool: &ToolSchema) -> serde_json::Value {
    serde_json::json!({
        "name": tool.name,
        "description": tool.description,
        "input_schema": tool.input_schema,
    })
}

// ─── Response mapping ────────────────────────────────────────────────────────

/// Convert a Messages API response body into a [`ProviderResponse`].
///
/// # Errors
///
/// Returns [`ProviderError::InvalidResponse`] if `content` is missing.
pub fn from_api_response(body: &serde_json::Value) -> Result<ProviderResponse, ProviderError> {
    let content = body
        .get("content")
        .ok_or_else(|| ProviderError::InvalidResponse("missing content".into()))?;

    let stop_reason = match body.get("stop_reason").and_then(|v| v.as_str()) {
        Some("tool_use") => StopReason::ToolUse,
        Some("max_tokens") => StopReason::MaxTokens,
        Some("stop_sequence") => StopReason::StopSequence,
        _ => StopReason::EndTurn,
    };

    let usage = body
        .get("usage")
        .map(|u| TokenUsage {
            input_tokens: u.get("input_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
            output_tokens: u.get("output_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
        })
        .unwrap_or_default();

    Ok(ProviderResponse {
        content: parts_from_value(content),
        stop_reason,
        usage,
        model: body
            .get("model")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
    })
}
