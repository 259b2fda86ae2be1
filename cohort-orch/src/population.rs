//! The agent registry and how it is built.

use std::collections::HashMap;
use std::sync::Arc;

use cohort_agent::{Agent, AgentSession, ConsolidatorConfig, SessionConfig};
use cohort_peer::ProtocolPeer;
use cohort_turn::Provider;
use cohort_types::{AgentId, InitError, OptionSet};
use rand::Rng;
use serde::Serialize;

use crate::sampling::{FeatureCategory, sample_features};

/// Who was created by an initialization, in population order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitReport {
    /// Each agent's id and sampled features.
    pub agents: Vec<(AgentId, Vec<String>)>,
}

/// Ordered registry of agent sessions, owned by the orchestrator.
///
/// Order is fixed at construction and is the order of every turn result.
pub struct Population<P: Provider> {
    sessions: Vec<AgentSession<P>>,
}

impl<P: Provider> Population<P> {
    /// Wrap already-built sessions.
    pub fn from_sessions(sessions: Vec<AgentSession<P>>) -> Self {
        Self { sessions }
    }

    /// Sample features and build the prompt for `count` agents.
    ///
    /// Each feature's prompt fragment is fetched from the peer once and
    /// reused for every agent that drew it.
    ///
    /// # Errors
    ///
    /// [`InitError::InvalidSpec`] if `count` is zero, [`InitError::Peer`] if
    /// a prompt fragment cannot be fetched, and [`InitError::Config`] if
    /// the session settings are unusable.
    #[allow(clippy::too_many_arguments)]
    pub async fn build<R: Rng + Send>(
        peer: &Arc<dyn ProtocolPeer>,
        provider: &Arc<P>,
        categories: &[FeatureCategory],
        options: &OptionSet,
        context: &str,
        count: usize,
        session_config: &SessionConfig,
        consolidator_config: &ConsolidatorConfig,
        rng: &mut R,
    ) -> Result<(Self, InitReport), InitError> {
        if count == 0 {
            return Err(InitError::InvalidSpec("sample count must be positive".into()));
        }

        let base = base_prompt(context, options);
        let mut fragments: HashMap<String, String> = HashMap::new();
        let mut sessions = Vec::with_capacity(count);
        let mut report = Vec::with_capacity(count);

        for _ in 0..count {
            let features = sample_features(categories, rng);

            let mut prompt = base.clone();
            for feature in &features {
                if !fragments.contains_key(feature) {
                    let fragment = peer
                        .get_prompt_fragment(feature)
                        .await
                        .map_err(|e| InitError::Peer(e.to_string()))?;
                    fragments.insert(feature.clone(), fragment);
                }
                if let Some(fragment) = fragments.get(feature) {
                    prompt.push_str(fragment);
                    prompt.push('\n');
                }
            }

            let id = AgentId::generate();
            let agent = Agent::new(id.clone(), features.clone(), prompt, options.clone());
            let session = AgentSession::new(
                agent,
                Arc::clone(provider),
                Arc::clone(peer),
                session_config.clone(),
                consolidator_config.clone(),
            )
            .map_err(|e| InitError::Config(e.to_string()))?;

            sessions.push(session);
            report.push((id, features));
        }

        Ok((Self { sessions }, InitReport { agents: report }))
    }

    /// Number of agents.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether there are no agents.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Agents in population order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.sessions.iter().map(AgentSession::agent)
    }

    /// Look up an agent by id.
    pub fn get(&self, id: &AgentId) -> Option<&Agent> {
        self.agents().find(|agent| agent.id() == id)
    }

    pub(crate) fn sessions(&self) -> &[AgentSession<P>] {
        &self.sessions
    }

    /// Commit a session that finished its turn back into its slot.
    pub(crate) fn commit(&mut self, index: usize, session: AgentSession<P>) {
        if let Some(slot) = self.sessions.get_mut(index) {
            *slot = session;
        }
    }
}

/// Shared head of every system prompt.
pub(crate) fn base_prompt(context: &str, options: &OptionSet) -> String {
    format!("You are helpful. {context}\n\nYour options are: {options}.\n\n")
}
