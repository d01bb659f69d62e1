use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// An immutable record of something that happened in the agent core.
/// Registry changes, hierarchy edits, and delegation lifecycle all land here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub payload: serde_json::Value,
}

/// Categories of events emitted by the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// An agent was added to the registry
    AgentRegistered,
    /// An agent was removed (children detached)
    AgentRemoved,
    /// Parent/children/strategy/skills changed
    HierarchyChanged,
    /// A delegation began for a parent agent
    DelegationStarted,
    /// The router picked a child for a task
    ChildSelected,
    /// A delegated task returned a result
    DelegationCompleted,
    /// A delegation was abandoned with an error
    DelegationFailed,
}

impl Event {
    pub fn new(agent_id: Uuid, kind: EventKind, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id,
            timestamp: Utc::now(),
            kind,
            payload,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{:?}", self));
        write!(f, "{}", s)
    }
}

/// Sending half of the event log. Unbounded so emitters never block;
/// a dropped receiver just means nobody is listening.
pub type EventSink = mpsc::UnboundedSender<Event>;

/// Create an event channel pair.
pub fn event_channel() -> (EventSink, mpsc::UnboundedReceiver<Event>) {
    mpsc::unbounded_channel()
}

/// Emit an event through an optional sink, ignoring closed receivers.
pub fn emit(sink: Option<&EventSink>, event: Event) {
    if let Some(tx) = sink {
        let _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_creation() {
        let agent_id = Uuid::new_v4();
        let event = Event::new(
            agent_id,
            EventKind::DelegationStarted,
            serde_json::json!({"task": "t-1"}),
        );
        assert_eq!(event.agent_id, agent_id);
        assert_eq!(event.kind, EventKind::DelegationStarted);
    }

    #[test]
    fn event_kind_display() {
        assert_eq!(EventKind::ChildSelected.to_string(), "child_selected");
        assert_eq!(EventKind::AgentRemoved.to_string(), "agent_removed");
    }

    #[tokio::test]
    async fn channel_delivers_in_order() {
        let (tx, mut rx) = event_channel();
        let agent_id = Uuid::new_v4();
        emit(Some(&tx), Event::new(agent_id, EventKind::DelegationStarted, serde_json::Value::Null));
        emit(Some(&tx), Event::new(agent_id, EventKind::ChildSelected, serde_json::Value::Null));

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::DelegationStarted);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::ChildSelected);
    }

    #[test]
    fn emit_without_sink_is_noop() {
        emit(
            None,
            Event::new(Uuid::new_v4(), EventKind::AgentRegistered, serde_json::Value::Null),
        );
    }
}
