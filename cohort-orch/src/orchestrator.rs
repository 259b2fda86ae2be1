//! Runs simulation turns across the whole population.

use std::collections::HashMap;
use std::sync::Arc;

use cohort_agent::{AgentSession, TurnReport};
use cohort_peer::{InitResource, ProtocolPeer};
use cohort_turn::Provider;
use cohort_types::{
    AgentFailure, AgentOutcome, InitError, OptionSet, OrchError, SessionError, TurnContext,
    TurnResults,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::task::{Id as TaskId, JoinSet};
use tracing::Instrument;

use crate::config::OrchConfig;
use crate::population::{InitReport, Population};
use crate::sampling::FeatureCategory;

type TaskOutput<P> = (usize, AgentSession<P>, Result<TurnReport, SessionError>);

/// Drives turns for one simulation run.
///
/// Holds the population registry, the shared peer and provider, and the
/// turn counter. `run_turn` takes `&mut self`, so turns never overlap.
pub struct TurnOrchestrator<P: Provider + 'static> {
    peer: Arc<dyn ProtocolPeer>,
    provider: Arc<P>,
    config: OrchConfig,
    population: Population<P>,
    turn: u64,
}

impl<P: Provider + 'static> TurnOrchestrator<P> {
    /// Read the population spec from the peer and build `sample_count` agents.
    ///
    /// # Errors
    ///
    /// Any [`InitError`]: an unreachable peer, a malformed spec, missing
    /// prompt fragments, or unusable configuration. Nothing is built on
    /// failure.
    pub async fn initialize(
        peer: Arc<dyn ProtocolPeer>,
        provider: Arc<P>,
        config: OrchConfig,
        sample_count: usize,
    ) -> Result<(Self, InitReport), InitError> {
        config.validate()?;
        let population = Population::from_sessions(Vec::new());
        let mut orch = Self::from_population(peer, provider, config, population);
        let report = orch.reinitialize(sample_count).await?;
        Ok((orch, report))
    }

    /// Wrap an existing population. The turn counter starts at zero.
    pub fn from_population(
        peer: Arc<dyn ProtocolPeer>,
        provider: Arc<P>,
        config: OrchConfig,
        population: Population<P>,
    ) -> Self {
        Self {
            peer,
            provider,
            config,
            population,
            turn: 0,
        }
    }

    /// Replace the whole population with a freshly sampled one and reset
    /// the turn counter. On failure the current population is kept.
    ///
    /// # Errors
    ///
    /// Same as [`TurnOrchestrator::initialize`].
    pub async fn reinitialize(&mut self, sample_count: usize) -> Result<InitReport, InitError> {
        let payload = self
            .peer
            .read_resource(&self.config.init_uri)
            .await
            .map_err(|e| InitError::Peer(e.to_string()))?;
        let init = InitResource::from_payload(&payload)
            .map_err(|e| InitError::InvalidSpec(e.to_string()))?;

        let categories = init
            .demographic_info
            .into_iter()
            .map(FeatureCategory::new)
            .collect::<Result<Vec<_>, _>>()?;
        let options = OptionSet::new(init.options)?;

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let (population, report) = Population::build(
            &self.peer,
            &self.provider,
            &categories,
            &options,
            &init.context,
            sample_count,
            &self.config.session,
            &self.config.consolidator,
            &mut rng,
        )
        .await?;

        tracing::info!(
            agents = population.len(),
            categories = categories.len(),
            options = %options,
            "population initialized"
        );
        self.population = population;
        self.turn = 0;
        Ok(report)
    }

    /// The agent registry.
    pub fn population(&self) -> &Population<P> {
        &self.population
    }

    /// Number of turns completed so far.
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// The run's configuration.
    pub fn config(&self) -> &OrchConfig {
        &self.config
    }

    /// Run one turn for every agent.
    ///
    /// The turn context is read once and shared unchanged by all agents.
    /// Each agent runs on its own task against a copy of its session; the
    /// copy is committed back when the task returns, even if the turn
    /// failed part-way. Agents cut off by the turn timeout keep their
    /// state from before the turn.
    ///
    /// # Errors
    ///
    /// [`OrchError::EmptyPopulation`] before initialization and
    /// [`OrchError::ContextFetch`] if the turn context cannot be read.
    /// Per-agent failures are reported in the results instead.
    pub async fn run_turn(&mut self) -> Result<TurnResults, OrchError> {
        if self.population.is_empty() {
            return Err(OrchError::EmptyPopulation);
        }

        // 1. One context snapshot for everyone
        let ctx: TurnContext = self
            .peer
            .read_resource(&self.config.next_turn_uri)
            .await
            .map_err(|e| OrchError::ContextFetch(e.to_string()))?;
        let ctx = Arc::new(ctx);
        let turn = self.turn;
        let agent_count = self.population.len();
        tracing::info!(turn, agents = agent_count, "turn started");

        // 2. Fan out
        let mut set: JoinSet<TaskOutput<P>> = JoinSet::new();
        let mut task_slots: HashMap<TaskId, usize> = HashMap::with_capacity(agent_count);
        for (index, session) in self.population.sessions().iter().enumerate() {
            let mut session = session.clone();
            let ctx = Arc::clone(&ctx);
            let span = tracing::info_span!("agent_turn", agent = %session.id(), turn);
            let handle = set.spawn(
                async move {
                    let result = session.run_turn(&ctx).await;
                    (index, session, result)
                }
                .instrument(span),
            );
            task_slots.insert(handle.id(), index);
        }

        // 3. Collect, committing sessions as they finish
        let mut slots: Vec<Option<Result<TurnReport, AgentFailure>>> =
            (0..agent_count).map(|_| None).collect();
        let drain = collect(&mut set, &task_slots, &mut self.population, &mut slots);
        let settled = match self.config.turn_timeout {
            Some(limit) => tokio::time::timeout(limit, drain).await.is_ok(),
            None => {
                drain.await;
                true
            }
        };
        if !settled {
            tracing::warn!(
                turn,
                unfinished = set.len(),
                "turn timeout expired; aborting remaining agents"
            );
            set.abort_all();
            while set.join_next().await.is_some() {}
        }

        // 4. Results in population order
        let outcomes: Vec<AgentOutcome> = self
            .population
            .sessions()
            .iter()
            .zip(slots)
            .map(|(session, slot)| {
                let result = match slot.unwrap_or(Err(AgentFailure::TimedOut)) {
                    Ok(report) => Ok(report.into_update()),
                    Err(failure) => {
                        tracing::error!(
                            agent = %session.id(),
                            turn,
                            error = %failure,
                            "agent turn failed"
                        );
                        Err(failure)
                    }
                };
                AgentOutcome {
                    agent: session.id().clone(),
                    result,
                }
            })
            .collect();

        self.turn += 1;
        let results = TurnResults { turn, outcomes };
        tracing::info!(
            turn,
            agents = agent_count,
            failures = results.failure_count(),
            "turn finished"
        );
        Ok(results)
    }
}

/// Drain the task set into `slots`. Sessions are committed whether or not
/// their turn succeeded; panicked tasks leave their registry entry alone.
async fn collect<P: Provider + 'static>(
    set: &mut JoinSet<TaskOutput<P>>,
    task_slots: &HashMap<TaskId, usize>,
    population: &mut Population<P>,
    slots: &mut [Option<Result<TurnReport, AgentFailure>>],
) {
    while let Some(joined) = set.join_next_with_id().await {
        match joined {
            Ok((_, (index, session, result))) => {
                population.commit(index, session);
                slots[index] = Some(result.map_err(AgentFailure::from));
            }
            Err(err) => {
                if let Some(&index) = task_slots.get(&err.id()) {
                    let reason = if err.is_panic() {
                        "agent task panicked".to_string()
                    } else {
                        err.to_string()
                    };
                    slots[index] = Some(Err(AgentFailure::Panicked(reason)));
                }
            }
        }
    }
}
