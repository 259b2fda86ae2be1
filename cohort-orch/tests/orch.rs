//! Turn orchestration against in-memory peers and scripted models.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cohort_agent::{Agent, AgentSession, ConsolidatorConfig, SessionConfig};
use cohort_orch::{OrchConfig, Population, TurnOrchestrator};
use cohort_peer::ProtocolPeer;
use cohort_peer::test_utils::StaticPeer;
use cohort_turn::test_utils::FnProvider;
use cohort_turn::{Provider, ProviderError, ProviderRequest, ProviderResponse, text_of};
use cohort_types::{
    AgentFailure, AgentId, Decision, InitError, LoopExit, OptionSet, OrchError, TurnContext,
};
use serde_json::json;

const NY_INIT: &str = r#"{
    "context": "This is a simulation of the New York state elections.",
    "demographic_info": [
        [["Republican", 25], ["Democrat", 45], ["Independent", 30]],
        [["Upstate", 40], ["City", 60]]
    ],
    "options": ["X", "Y"]
}"#;

fn ny_peer() -> StaticPeer {
    StaticPeer::new()
        .with_resource("resource://init", NY_INIT)
        .with_resource("resource://next_timestep", "Day 1: debate tonight.")
        .with_prompt("Republican", "You usually vote Republican.")
        .with_prompt("Democrat", "You usually vote Democrat.")
        .with_prompt("Independent", "You vote for whoever convinces you.")
        .with_prompt("Upstate", "You live upstate.")
        .with_prompt("City", "You live in the city.")
}

fn opening(req: &ProviderRequest) -> String {
    text_of(&req.messages[0].content)
}

/// Each agent picks the option named in its prompt ("You prefer X"), then
/// stops; the memory records what the decision tool answered.
fn preference_model(req: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
    let prompt = opening(req);
    if req.tools.is_empty() {
        let choice = if prompt.contains("Decision made: X") {
            "X"
        } else {
            "Y"
        };
        return Ok(ProviderResponse::text(format!("I remember choosing {choice}.")));
    }
    if req.messages.len() == 1 {
        let choice = if prompt.contains("You prefer X") {
            "X"
        } else {
            "Y"
        };
        return Ok(ProviderResponse::tool_use(
            "tu_1",
            "make_decision",
            json!({ "decision": choice }),
        ));
    }
    Ok(ProviderResponse::text("Done for today."))
}

fn hand_built<P: Provider>(
    provider: &Arc<P>,
    peer: &Arc<dyn ProtocolPeer>,
    agents: &[(&str, &str)],
) -> Population<P> {
    let options = OptionSet::new(["X", "Y"]).unwrap();
    let sessions = agents
        .iter()
        .map(|(name, preference)| {
            let agent = Agent::new(
                AgentId::new(*name),
                vec![],
                format!("You are {name}. You prefer {preference}."),
                options.clone(),
            );
            AgentSession::new(
                agent,
                Arc::clone(provider),
                Arc::clone(peer),
                SessionConfig::default(),
                ConsolidatorConfig::default(),
            )
            .unwrap()
        })
        .collect();
    Population::from_sessions(sessions)
}

#[tokio::test]
async fn initialize_samples_the_requested_population() {
    let peer: Arc<dyn ProtocolPeer> = Arc::new(ny_peer());
    let provider = Arc::new(FnProvider::new(preference_model));
    let config = OrchConfig {
        seed: Some(42),
        ..OrchConfig::default()
    };

    let (orch, report) = TurnOrchestrator::initialize(peer, provider, config, 25)
        .await
        .unwrap();

    assert_eq!(report.agents.len(), 25);
    assert_eq!(orch.population().len(), 25);
    assert_eq!(orch.turn(), 0);
    let head = "You are helpful. This is a simulation of the New York state elections.";
    for (agent, (id, features)) in orch.population().agents().zip(&report.agents) {
        assert_eq!(agent.id(), id);
        assert_eq!(features.len(), 2);
        assert!(["Republican", "Democrat", "Independent"].contains(&features[0].as_str()));
        assert!(["Upstate", "City"].contains(&features[1].as_str()));
        assert!(agent.system_prompt().starts_with(head));
        assert!(agent.system_prompt().contains("Your options are: X, Y."));
        assert_eq!(agent.options(), &OptionSet::new(["X", "Y"]).unwrap());
    }
}

#[tokio::test]
async fn same_seed_samples_the_same_features() {
    let provider = Arc::new(FnProvider::new(preference_model));
    let config = OrchConfig {
        seed: Some(7),
        ..OrchConfig::default()
    };
    let (_, first) = TurnOrchestrator::initialize(
        Arc::new(ny_peer()),
        Arc::clone(&provider),
        config.clone(),
        20,
    )
    .await
    .unwrap();
    let (_, second) = TurnOrchestrator::initialize(Arc::new(ny_peer()), provider, config, 20)
        .await
        .unwrap();

    let features = |report: &cohort_orch::InitReport| -> Vec<Vec<String>> {
        report.agents.iter().map(|(_, f)| f.clone()).collect()
    };
    assert_eq!(features(&first), features(&second));
    assert_ne!(first.agents[0].0, second.agents[0].0);
}

#[tokio::test]
async fn invalid_init_specs_are_fatal() {
    let provider = Arc::new(FnProvider::new(preference_model));

    let malformed = StaticPeer::new().with_resource("resource://init", "not json");
    let err = TurnOrchestrator::initialize(
        Arc::new(malformed),
        Arc::clone(&provider),
        OrchConfig::default(),
        3,
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(err, InitError::InvalidSpec(_)));

    let zero_weights = StaticPeer::new().with_resource(
        "resource://init",
        TurnContext::Structured(json!({
            "context": "c",
            "demographic_info": [[["A", 0], ["B", 0]]],
            "options": ["X"]
        })),
    );
    let err = TurnOrchestrator::initialize(
        Arc::new(zero_weights),
        Arc::clone(&provider),
        OrchConfig::default(),
        3,
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(err, InitError::InvalidSpec(_)));

    let unreachable = StaticPeer::new();
    let err = TurnOrchestrator::initialize(
        Arc::new(unreachable),
        Arc::clone(&provider),
        OrchConfig::default(),
        3,
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(err, InitError::Peer(_)));

    let err = TurnOrchestrator::initialize(Arc::new(ny_peer()), provider, OrchConfig::default(), 0)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, InitError::InvalidSpec(_)));
}

#[tokio::test]
async fn turn_results_follow_population_order_and_context_is_read_once() {
    let static_peer = Arc::new(ny_peer());
    let peer: Arc<dyn ProtocolPeer> = static_peer.clone();
    let provider = Arc::new(FnProvider::new(preference_model));
    let population = hand_built(&provider, &peer, &[("a", "X"), ("b", "Y"), ("c", "X")]);
    let mut orch = TurnOrchestrator::from_population(
        peer,
        Arc::clone(&provider),
        OrchConfig::default(),
        population,
    );

    let results = orch.run_turn().await.unwrap();

    assert_eq!(results.turn, 0);
    assert_eq!(orch.turn(), 1);
    assert_eq!(static_peer.read_count("resource://next_timestep"), 1);
    let ids: Vec<&str> = results.outcomes.iter().map(|o| o.agent.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    let decisions: Vec<Decision> = results
        .outcomes
        .iter()
        .map(|o| o.update().unwrap().decision.clone())
        .collect();
    assert_eq!(
        decisions,
        vec![
            Decision::Chosen("X".into()),
            Decision::Chosen("Y".into()),
            Decision::Chosen("X".into()),
        ]
    );
    assert_eq!(
        results.outcomes[1].update().unwrap().fragment,
        "I remember choosing Y."
    );
    for outcome in &results.outcomes {
        assert_eq!(outcome.update().unwrap().exit, LoopExit::Completed);
    }

    // Every agent saw the same context.
    let contexts = provider
        .requests()
        .iter()
        .filter(|r| !r.tools.is_empty() && r.messages.len() == 1)
        .filter(|r| opening(r).ends_with("Day 1: debate tonight."))
        .count();
    assert_eq!(contexts, 3);
}

#[tokio::test]
async fn agents_never_see_each_others_state() {
    let static_peer = Arc::new(ny_peer());
    let peer: Arc<dyn ProtocolPeer> = static_peer.clone();
    let provider = Arc::new(FnProvider::new(preference_model));
    let population = hand_built(&provider, &peer, &[("a", "X"), ("b", "Y")]);
    let mut orch = TurnOrchestrator::from_population(
        peer,
        Arc::clone(&provider),
        OrchConfig::default(),
        population,
    );

    orch.run_turn().await.unwrap();
    static_peer.set_resource("resource://next_timestep", "Day 2: polls close.");
    orch.run_turn().await.unwrap();

    let second_turn_openings: Vec<String> = provider
        .requests()
        .iter()
        .filter(|r| !r.tools.is_empty() && r.messages.len() == 1)
        .map(opening)
        .filter(|p| p.ends_with("Day 2: polls close."))
        .collect();
    assert_eq!(second_turn_openings.len(), 2);
    for prompt in &second_turn_openings {
        if prompt.contains("You are a.") {
            assert!(prompt.contains("I remember choosing X."));
            assert!(!prompt.contains("I remember choosing Y."));
        } else {
            assert!(prompt.contains("I remember choosing Y."));
            assert!(!prompt.contains("I remember choosing X."));
        }
    }

    assert_eq!(orch.population().len(), 2);
    for agent in orch.population().agents() {
        assert_eq!(agent.memory().len(), 2);
    }
}

#[tokio::test]
async fn one_failing_agent_does_not_hide_the_others() {
    let peer: Arc<dyn ProtocolPeer> = Arc::new(ny_peer());
    // Agent b decides, then its model goes away before the turn finishes.
    let provider = Arc::new(FnProvider::new(|req: &ProviderRequest| {
        if opening(req).contains("You are b.") && req.messages.len() > 1 {
            return Err(ProviderError::RequestFailed("connection refused".into()));
        }
        preference_model(req)
    }));
    let population = hand_built(&provider, &peer, &[("a", "X"), ("b", "Y"), ("c", "X")]);
    let mut orch =
        TurnOrchestrator::from_population(peer, provider, OrchConfig::default(), population);

    let results = orch.run_turn().await.unwrap();

    assert_eq!(results.failure_count(), 1);
    assert!(results.outcomes[0].update().is_some());
    assert!(matches!(results.outcomes[1].result, Err(AgentFailure::Session(_))));
    assert!(results.outcomes[2].update().is_some());
    assert_eq!(results.updates().count(), 2);

    // The decision b made before failing was committed.
    let b = orch.population().get(&AgentId::new("b")).unwrap();
    assert_eq!(b.decision(), &Decision::Chosen("Y".into()));
    assert!(b.memory().is_empty());
}

#[tokio::test]
async fn a_panicking_agent_is_reported_and_keeps_its_state() {
    let static_peer = Arc::new(ny_peer());
    let peer: Arc<dyn ProtocolPeer> = static_peer.clone();
    // Agent b's model client crashes on the second day.
    let provider = Arc::new(FnProvider::new(|req: &ProviderRequest| {
        let prompt = opening(req);
        if prompt.contains("You are b.") && prompt.contains("Day 2") {
            panic!("model client crashed");
        }
        preference_model(req)
    }));
    let population = hand_built(&provider, &peer, &[("a", "X"), ("b", "Y"), ("c", "X")]);
    let mut orch =
        TurnOrchestrator::from_population(peer, provider, OrchConfig::default(), population);

    orch.run_turn().await.unwrap();
    static_peer.set_resource("resource://next_timestep", "Day 2: polls close.");
    let results = orch.run_turn().await.unwrap();

    assert_eq!(results.failure_count(), 1);
    assert!(results.outcomes[0].update().is_some());
    assert!(matches!(results.outcomes[1].result, Err(AgentFailure::Panicked(_))));
    assert!(results.outcomes[2].update().is_some());
    assert_eq!(orch.turn(), 2);

    // b still holds what it had after the first day.
    let b = orch.population().get(&AgentId::new("b")).unwrap();
    assert_eq!(b.decision(), &Decision::Chosen("Y".into()));
    assert_eq!(b.memory().fragments(), ["I remember choosing Y."]);
    let a = orch.population().get(&AgentId::new("a")).unwrap();
    assert_eq!(a.memory().len(), 2);
}

/// Answers like `preference_model`, but agents named "slow" hang.
struct SlowFor {
    name: &'static str,
}

impl Provider for SlowFor {
    fn complete(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send {
        let stall = opening(&request).contains(&format!("You are {}.", self.name));
        async move {
            if stall {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            preference_model(&request)
        }
    }
}

#[tokio::test]
async fn timed_out_agents_keep_their_previous_state() {
    let peer: Arc<dyn ProtocolPeer> = Arc::new(ny_peer());
    let provider = Arc::new(SlowFor { name: "slow" });
    let population = hand_built(&provider, &peer, &[("fast", "X"), ("slow", "Y")]);
    let config = OrchConfig {
        turn_timeout: Some(Duration::from_millis(300)),
        ..OrchConfig::default()
    };
    let mut orch = TurnOrchestrator::from_population(peer, provider, config, population);

    let results = orch.run_turn().await.unwrap();

    assert!(results.outcomes[0].update().is_some());
    assert_eq!(results.outcomes[1].result, Err(AgentFailure::TimedOut));
    assert_eq!(orch.turn(), 1);

    let slow = orch.population().get(&AgentId::new("slow")).unwrap();
    assert_eq!(slow.decision(), &Decision::Undecided);
    assert!(slow.memory().is_empty());
    let fast = orch.population().get(&AgentId::new("fast")).unwrap();
    assert_eq!(fast.memory().len(), 1);
}

#[tokio::test]
async fn turn_before_initialization_is_rejected() {
    let peer: Arc<dyn ProtocolPeer> = Arc::new(ny_peer());
    let provider = Arc::new(FnProvider::new(preference_model));
    let mut orch = TurnOrchestrator::from_population(
        peer,
        provider,
        OrchConfig::default(),
        Population::from_sessions(Vec::new()),
    );
    assert!(matches!(orch.run_turn().await, Err(OrchError::EmptyPopulation)));
}

#[tokio::test]
async fn missing_turn_context_is_fatal() {
    let peer: Arc<dyn ProtocolPeer> = Arc::new(StaticPeer::new());
    let provider = Arc::new(FnProvider::new(preference_model));
    let population = hand_built(&provider, &peer, &[("a", "X")]);
    let mut orch =
        TurnOrchestrator::from_population(peer, provider, OrchConfig::default(), population);

    assert!(matches!(orch.run_turn().await, Err(OrchError::ContextFetch(_))));
    assert_eq!(orch.turn(), 0);
}

#[tokio::test]
async fn reinitialize_replaces_the_population() {
    let provider = Arc::new(FnProvider::new(preference_model));
    let config = OrchConfig {
        seed: Some(3),
        ..OrchConfig::default()
    };
    let (mut orch, first) = TurnOrchestrator::initialize(Arc::new(ny_peer()), provider, config, 4)
        .await
        .unwrap();
    orch.run_turn().await.unwrap();
    assert_eq!(orch.turn(), 1);

    let second = orch.reinitialize(6).await.unwrap();

    assert_eq!(orch.population().len(), 6);
    assert_eq!(orch.turn(), 0);
    assert!(orch.population().get(&first.agents[0].0).is_none());
    assert!(orch.population().get(&second.agents[0].0).is_some());
    assert!(orch.population().agents().all(|a| a.memory().is_empty()));
}
