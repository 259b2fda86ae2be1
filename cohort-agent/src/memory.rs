//! Agent memory: the append-only log and the consolidator that feeds it.

use cohort_turn::{
    ContentPart, Provider, ProviderError, ProviderMessage, ProviderRequest, TokenUsage, text_of,
};
use std::sync::Arc;

use crate::config::ConsolidatorConfig;

/// Instruction sent with every transcript to be summarized.
const MEMORY_TEMPLATE: &str = "You are a memory formation system for an AI assistant. \
Your job is to convert conversations into concise, meaningful memories.

Review the following conversation:

{conversation}

Based on this conversation, create a brief, meaningful memory that captures the key information, insights, or decisions.
Write in first person perspective as if you are the assistant remembering this interaction.
Focus only on what's important to remember for future reference, and keep this concise - under 100 words, but even shorter
is better. Avoid outputting any other text than the memory.";

/// Append-only sequence of memory fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLog {
    fragments: Vec<String>,
}

impl MemoryLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment at the end.
    pub fn append(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    /// Fragments in the order they were added.
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether nothing has been remembered yet.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// The log as prompt text: each fragment preceded by a blank line.
    pub fn render(&self) -> String {
        self.fragments
            .iter()
            .map(|fragment| format!("\n\n{fragment}"))
            .collect()
    }
}

/// Render a transcript as role-labelled plain text.
pub fn flatten_transcript(transcript: &[ProviderMessage]) -> String {
    let mut text = String::new();
    for message in transcript {
        let role = message.role.label();
        for part in &message.content {
            match part {
                ContentPart::Text { text: body } => {
                    text.push_str(&format!("{role}: {body}\n\n"));
                }
                ContentPart::ToolUse { name, .. } => {
                    text.push_str(&format!("{role} used tool: {name}\n"));
                }
                ContentPart::ToolResult { content, .. } => {
                    text.push_str(&format!("Tool result: {content}\n\n"));
                }
            }
        }
    }
    text
}

/// What one consolidation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consolidation {
    /// The fragment appended to the log.
    pub fragment: String,
    /// Tokens the summary request used.
    pub usage: TokenUsage,
}

/// Summarizes a finished turn into one memory fragment.
pub struct MemoryConsolidator<P: Provider> {
    provider: Arc<P>,
    config: ConsolidatorConfig,
}

impl<P: Provider> Clone for MemoryConsolidator<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            config: self.config.clone(),
        }
    }
}

impl<P: Provider> MemoryConsolidator<P> {
    /// Create a consolidator backed by `provider`.
    pub fn new(provider: Arc<P>, config: ConsolidatorConfig) -> Self {
        Self { provider, config }
    }

    /// The consolidator's settings.
    pub fn config(&self) -> &ConsolidatorConfig {
        &self.config
    }

    /// Summarize `transcript`, append the summary to `log`, and return it
    /// with the request's token usage.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error. An empty summary is reported as
    /// [`ProviderError::InvalidResponse`] and nothing is appended.
    pub async fn consolidate(
        &self,
        transcript: &[ProviderMessage],
        log: &mut MemoryLog,
    ) -> Result<Consolidation, ProviderError> {
        let conversation = flatten_transcript(transcript);
        let request = ProviderRequest {
            model: Some(self.config.model.clone()),
            messages: vec![ProviderMessage::user_text(memory_prompt(&conversation))],
            tools: vec![],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            system: None,
        };

        tracing::debug!(
            model = %self.config.model,
            chars = conversation.len(),
            "consolidating turn into memory"
        );
        let response = self.provider.complete(request).await?;

        let fragment = text_of(&response.content).trim().to_string();
        if fragment.is_empty() {
            return Err(ProviderError::InvalidResponse("memory summary was empty".into()));
        }
        log.append(fragment.clone());
        Ok(Consolidation {
            fragment,
            usage: response.usage,
        })
    }
}

fn memory_prompt(conversation: &str) -> String {
    MEMORY_TEMPLATE.replace("{conversation}", conversation)
}
