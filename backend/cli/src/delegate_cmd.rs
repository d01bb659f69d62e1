//! `omra delegate` — run one delegation from the command line.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use omra_core::Task;
use omra_delegation::{DelegationExecutor, RetryHandler, RetryPolicy};
use omra_registry::AgentRegistry;
use omra_routing::Router;
use omra_tools::HttpTaskHandler;

pub async fn run(
    registry: &AgentRegistry,
    agent_name: &str,
    input: &str,
    skill: Option<&str>,
    retries: u32,
) -> Result<()> {
    let parent_id = registry
        .find_by_name(agent_name)
        .await
        .with_context(|| format!("no agent named '{agent_name}'"))?;

    let mut task = Task::new(input);
    if let Some(tag) = skill {
        task = task.with_skill(tag);
    }

    let mut executor = DelegationExecutor::new(
        registry.clone(),
        Arc::new(Router::new()),
        Arc::new(HttpTaskHandler::new()),
    );
    if retries > 0 {
        executor = executor.with_failure_handler(Arc::new(RetryHandler::new(RetryPolicy {
            max_attempts: retries + 1,
            ..Default::default()
        })));
    }

    info!(agent = agent_name, task = %task.id, "Delegating");
    let result = executor.delegate(parent_id, &task).await?;

    let handled_by = registry.get(result.handled_by).await?;
    println!("handled by: {}", handled_by.name);
    println!("attempts:   {}", result.attempts);
    println!("{}", result.output);
    if !result.payload.is_null() {
        println!("{}", serde_json::to_string_pretty(&result.payload)?);
    }
    Ok(())
}
