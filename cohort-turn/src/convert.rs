//! Conversion from raw JSON content blocks into [`ContentPart`]s.
//!
//! Backends and peers hand back content either as a bare string or as a
//! list of `{"type": ...}` mappings. This module is the one place those
//! shapes are inspected; everything past it matches on [`ContentPart`].

use crate::types::ContentPart;
use serde_json::Value;

impl ContentPart {
    /// Convert one raw block mapping.
    ///
    /// Returns `None` for block types the core does not use (images,
    /// thinking blocks) and for mappings missing required fields.
    pub fn from_value(value: &Value) -> Option<ContentPart> {
        match value.get("type")?.as_str()? {
            "text" => Some(ContentPart::Text {
                text: value.get("text")?.as_str()?.to_string(),
            }),
            "tool_use" => Some(ContentPart::ToolUse {
                id: value.get("id")?.as_str()?.to_string(),
                name: value.get("name")?.as_str()?.to_string(),
                input: value.get("input").cloned().unwrap_or(Value::Null),
            }),
            "tool_result" => Some(ContentPart::ToolResult {
                tool_use_id: value
                    .get("tool_use_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                content: value.get("content").map(flatten_result).unwrap_or_default(),
                is_error: value
                    .get("is_error")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            }),
            _ => None,
        }
    }
}

/// Convert message content given as a string or a list of block mappings.
pub fn parts_from_value(content: &Value) -> Vec<ContentPart> {
    match content {
        Value::String(text) => vec![ContentPart::text(text.clone())],
        Value::Array(blocks) => blocks.iter().filter_map(ContentPart::from_value).collect(),
        Value::Null => vec![],
        other => ContentPart::from_value(other).into_iter().collect(),
    }
}

/// Concatenate the text parts, ignoring tool blocks.
pub fn text_of(parts: &[ContentPart]) -> String {
    parts
        .iter()
        .filter_map(|part| match part {
            ContentPart::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tool-result content may be a string or a list of text blocks.
fn flatten_result(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                other => other
                    .get("text")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
