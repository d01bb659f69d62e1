//! Delegation executor — the one entry point for "parent handles a task".
//!
//! Looks up the parent, asks the router for a child, dispatches through the
//! task handler, and consults the failure handler on errors. Each call is
//! synchronous request/response; calls for independent parents may run
//! concurrently (the only shared state is the router's cursor map).

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use omra_core::event::emit;
use omra_core::{Event, EventKind, EventSink, OmraError, Task, TaskHandler, TaskResult};
use omra_registry::AgentRegistry;
use omra_routing::Router;

use crate::failure::{FailureDecision, FailureHandler, PropagateFailure};

pub struct DelegationExecutor {
    registry: AgentRegistry,
    router: Arc<Router>,
    handler: Arc<dyn TaskHandler>,
    failure: Arc<dyn FailureHandler>,
    events: Option<EventSink>,
}

impl DelegationExecutor {
    /// Build an executor with the default propagate-on-failure strategy.
    pub fn new(
        registry: AgentRegistry,
        router: Arc<Router>,
        handler: Arc<dyn TaskHandler>,
    ) -> Self {
        Self {
            registry,
            router,
            handler,
            failure: Arc::new(PropagateFailure),
            events: None,
        }
    }

    pub fn with_failure_handler(mut self, failure: Arc<dyn FailureHandler>) -> Self {
        self.failure = failure;
        self
    }

    pub fn with_event_sink(mut self, sink: EventSink) -> Self {
        self.events = Some(sink);
        self
    }

    fn emit(&self, agent_id: Uuid, kind: EventKind, payload: serde_json::Value) {
        emit(self.events.as_ref(), Event::new(agent_id, kind, payload));
    }

    /// Delegate `task` from the parent agent to exactly one of its children
    /// and return the child's result.
    #[instrument(skip(self, task), fields(task_id = %task.id))]
    pub async fn delegate(
        &self,
        parent_id: Uuid,
        task: &Task,
    ) -> Result<TaskResult, OmraError> {
        let parent = self.registry.get(parent_id).await?;
        self.emit(
            parent_id,
            EventKind::DelegationStarted,
            serde_json::json!({"task": task.id, "strategy": parent.routing_strategy.to_string()}),
        );

        let mut excluded: HashSet<Uuid> = HashSet::new();
        let mut attempts: u32 = 0;

        'select: loop {
            let child_id = match self
                .router
                .select_child_excluding(&parent, task, &excluded)
            {
                Ok(id) => id,
                Err(err) => {
                    self.emit(
                        parent_id,
                        EventKind::DelegationFailed,
                        serde_json::json!({"task": task.id, "error": err.to_string()}),
                    );
                    return Err(err);
                }
            };
            self.emit(
                parent_id,
                EventKind::ChildSelected,
                serde_json::json!({"task": task.id, "child": child_id}),
            );
            // The child can vanish between selection and dispatch.
            let child = match self.registry.get(child_id).await {
                Ok(child) => child,
                Err(err) => {
                    self.emit(
                        parent_id,
                        EventKind::DelegationFailed,
                        serde_json::json!({"task": task.id, "child": child_id, "error": err.to_string()}),
                    );
                    return Err(err);
                }
            };

            loop {
                attempts += 1;
                match self.handler.run(&child, task).await {
                    Ok(mut result) => {
                        result.handled_by = child_id;
                        result.attempts = attempts;
                        info!(
                            parent = %parent.name,
                            child = %child.name,
                            attempts,
                            "Delegation completed"
                        );
                        self.emit(
                            parent_id,
                            EventKind::DelegationCompleted,
                            serde_json::json!({"task": task.id, "child": child_id, "attempts": attempts}),
                        );
                        return Ok(result);
                    }
                    Err(err) => {
                        match self.failure.on_failure(task, child_id, attempts, &err) {
                            FailureDecision::Retry { delay } => {
                                tokio::time::sleep(delay).await;
                            }
                            FailureDecision::Reroute => {
                                excluded.insert(child_id);
                                continue 'select;
                            }
                            FailureDecision::Propagate => {
                                warn!(
                                    parent = %parent.name,
                                    child = %child.name,
                                    attempts,
                                    error = %err,
                                    "Delegation failed"
                                );
                                self.emit(
                                    parent_id,
                                    EventKind::DelegationFailed,
                                    serde_json::json!({"task": task.id, "child": child_id, "error": err.to_string()}),
                                );
                                return Err(OmraError::Delegation {
                                    child: child_id,
                                    source: err,
                                });
                            }
                        }
                    }
                }
            }
        }
    }
}
