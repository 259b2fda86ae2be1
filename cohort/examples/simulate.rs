//! Run a population simulation against an MCP scenario server.
//!
//! Connects to the server (spawned as a child process, or at a streamable
//! HTTP endpoint when given a URL), samples the population from its init
//! resource, and runs a number of turns with Anthropic as the model. Each
//! turn's results are printed as one JSON line.
//!
//! Run with:
//!
//! ```sh
//! ANTHROPIC_API_KEY=sk-ant-... cargo run --example simulate -p cohort --features full -- \
//!     25 3 python scenario_server.py
//! ANTHROPIC_API_KEY=sk-ant-... cargo run --example simulate -p cohort --features full -- \
//!     25 3 http://127.0.0.1:8000/mcp
//! ```

use std::sync::Arc;
use std::time::Duration;

use cohort::anthropic::Anthropic;
use cohort::prelude::*;

const USAGE: &str = "usage: simulate AGENTS TURNS (URL | CMD [ARGS..])";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let agents: usize = args.next().ok_or(USAGE)?.parse()?;
    let turns: u64 = args.next().ok_or(USAGE)?.parse()?;
    let target = args.next().ok_or(USAGE)?;

    let peer = if target.starts_with("http://") || target.starts_with("https://") {
        McpPeer::connect_http(&target).await?
    } else {
        let mut command = tokio::process::Command::new(target);
        command.args(args);
        McpPeer::connect_stdio(command).await?
    };
    let provider = Arc::new(Anthropic::from_env()?);

    let config = OrchConfig {
        turn_timeout: Some(Duration::from_secs(120)),
        ..OrchConfig::default()
    };
    let (mut orch, report) =
        TurnOrchestrator::initialize(Arc::new(peer), provider, config, agents).await?;
    println!("{}", serde_json::to_string(&report)?);

    for _ in 0..turns {
        let results = orch.run_turn().await?;
        println!("{}", serde_json::to_string(&results)?);
    }
    Ok(())
}
