//! HTTP task handler — dispatch a delegated task to a child agent's endpoint.
//!
//! The child is expected to answer `{"output": "...", "payload": {...}}`;
//! a child without a configured endpoint cannot be dispatched to.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use omra_core::{AgentDefinition, Task, TaskHandler, TaskResult};

#[derive(Debug, Deserialize)]
struct DispatchResponse {
    output: String,
    #[serde(default)]
    payload: serde_json::Value,
}

pub struct HttpTaskHandler {
    http: Client,
}

impl HttpTaskHandler {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }
}

impl Default for HttpTaskHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskHandler for HttpTaskHandler {
    fn name(&self) -> &str {
        "http"
    }

    async fn run(&self, agent: &AgentDefinition, task: &Task) -> Result<TaskResult> {
        let Some(endpoint) = agent.endpoint.as_deref() else {
            bail!("agent {} has no endpoint configured", agent.name);
        };

        debug!(agent = %agent.name, endpoint = %endpoint, task = %task.id, "Dispatching task");
        let resp: DispatchResponse = self
            .http
            .post(endpoint)
            .json(task)
            .send()
            .await
            .with_context(|| format!("dispatch to {endpoint} failed"))?
            .error_for_status()
            .with_context(|| format!("{} rejected the task", agent.name))?
            .json()
            .await
            .context("malformed dispatch response")?;

        let mut result = TaskResult::new(task.id, agent.id, resp.output);
        result.payload = resp.payload;
        Ok(result)
    }
}
