//! The shared per-turn context payload.

use serde::{Deserialize, Serialize};

/// Payload the protocol peer publishes for a turn.
///
/// Opaque to the core. Every agent in a turn receives the same snapshot,
/// and [`TurnContext::as_text`] renders it the same way each time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContext {
    /// Plain text context.
    Text(String),
    /// Structured context (rendered as compact JSON).
    Structured(serde_json::Value),
}

impl TurnContext {
    /// Create a text context.
    pub fn text(s: impl Into<String>) -> Self {
        TurnContext::Text(s.into())
    }

    /// Render the context as prompt text.
    ///
    /// Text is returned verbatim. Structured values render through
    /// `serde_json`, whose object key order is stable, so two renders of
    /// the same value are byte-identical.
    pub fn as_text(&self) -> String {
        match self {
            TurnContext::Text(text) => text.clone(),
            TurnContext::Structured(serde_json::Value::String(s)) => s.clone(),
            TurnContext::Structured(value) => value.to_string(),
        }
    }
}

impl From<String> for TurnContext {
    fn from(s: String) -> Self {
        TurnContext::Text(s)
    }
}

impl From<&str> for TurnContext {
    fn from(s: &str) -> Self {
        TurnContext::Text(s.to_owned())
    }
}

impl From<serde_json::Value> for TurnContext {
    fn from(value: serde_json::Value) -> Self {
        TurnContext::Structured(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_renders_verbatim() {
        assert_eq!(TurnContext::text("Hello world").as_text(), "Hello world");
    }

    #[test]
    fn structured_renders_deterministically() {
        let ctx = TurnContext::from(json!({"b": 1, "a": [1, 2]}));
        let first = ctx.as_text();
        assert_eq!(first, ctx.clone().as_text());
        assert!(first.contains("\"a\":[1,2]"));
    }

    #[test]
    fn structured_string_is_unquoted() {
        let ctx = TurnContext::Structured(json!("polls open"));
        assert_eq!(ctx.as_text(), "polls open");
    }
}
