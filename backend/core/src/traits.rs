use anyhow::Result;
use async_trait::async_trait;

use crate::types::{AgentDefinition, Task, TaskResult};

/// A capability an agent can invoke (CRM lookups, ticket creation, ...).
///
/// Concrete bindings live in `omra-tools`; the core only knows the shape.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name of the tool (e.g., "customer_lookup").
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's arguments.
    fn parameters(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: serde_json::Value) -> Result<String>;
}

/// Dispatches a task to a single child agent and awaits its result.
///
/// The delegation executor stays agnostic of how a child actually runs;
/// production uses an HTTP handler, tests use in-memory fakes.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Name of this handler, for logs.
    fn name(&self) -> &str;

    /// Run the task on the given child agent.
    async fn run(&self, agent: &AgentDefinition, task: &Task) -> Result<TaskResult>;
}
