//! Agent registry — the single owner of agent records.
//!
//! All hierarchy mutations go through [`AgentRegistry::with_write`], which
//! holds one write lock across a whole edit so multi-agent changes either
//! apply completely or not at all.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use omra_core::event::emit;
use omra_core::{AgentDefinition, Event, EventKind, EventSink, OmraError};

/// Thread-safe, in-memory store of agent definitions.
#[derive(Clone, Default)]
pub struct AgentRegistry {
    agents: Arc<RwLock<HashMap<Uuid, AgentDefinition>>>,
    events: Option<EventSink>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an event sink; registry and hierarchy changes are reported there.
    pub fn with_event_sink(mut self, sink: EventSink) -> Self {
        self.events = Some(sink);
        self
    }

    /// Report an event for `agent_id` through the attached sink, if any.
    pub fn emit(&self, agent_id: Uuid, kind: EventKind, payload: serde_json::Value) {
        emit(self.events.as_ref(), Event::new(agent_id, kind, payload));
    }

    /// Add an agent. Fails if the id is already registered.
    pub async fn insert(&self, agent: AgentDefinition) -> Result<(), OmraError> {
        let mut agents = self.agents.write().await;
        if agents.contains_key(&agent.id) {
            return Err(OmraError::Config(format!(
                "agent {} ({}) already registered",
                agent.name, agent.id
            )));
        }
        info!(agent = %agent.name, id = %agent.id, "Registered agent");
        self.emit(
            agent.id,
            EventKind::AgentRegistered,
            serde_json::json!({"name": agent.name}),
        );
        agents.insert(agent.id, agent);
        Ok(())
    }

    /// Snapshot of a single agent.
    pub async fn get(&self, id: Uuid) -> Result<AgentDefinition, OmraError> {
        self.agents
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(OmraError::UnknownAgent(id))
    }

    /// Find an agent id by exact name.
    pub async fn find_by_name(&self, name: &str) -> Option<Uuid> {
        self.agents
            .read()
            .await
            .values()
            .find(|a| a.name == name)
            .map(|a| a.id)
    }

    /// Snapshot of all agents, sorted by name for stable output.
    pub async fn list(&self) -> Vec<AgentDefinition> {
        let mut all: Vec<AgentDefinition> = self.agents.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.agents.read().await.is_empty()
    }

    /// Remove an agent, detaching every record that referenced it:
    /// children lose their `parent_id`, the parent drops it from
    /// `children_ids` and `skill_mapping`. Roles are re-derived on every
    /// touched agent.
    pub async fn remove(&self, id: Uuid) -> Result<AgentDefinition, OmraError> {
        let mut agents = self.agents.write().await;
        let removed = agents.remove(&id).ok_or(OmraError::UnknownAgent(id))?;

        for child_id in &removed.children_ids {
            if let Some(child) = agents.get_mut(child_id) {
                if child.parent_id == Some(id) {
                    child.parent_id = None;
                    child.recompute_role();
                }
            }
        }
        if let Some(parent_id) = removed.parent_id {
            if let Some(parent) = agents.get_mut(&parent_id) {
                parent.children_ids.retain(|c| *c != id);
                parent.skill_mapping.remove(&id);
                parent.recompute_role();
            }
        }

        info!(agent = %removed.name, id = %id, "Removed agent");
        self.emit(
            id,
            EventKind::AgentRemoved,
            serde_json::json!({"name": removed.name, "detached_children": removed.children_ids.len()}),
        );
        Ok(removed)
    }

    /// Mutate a single agent in place; `role` is re-derived afterwards.
    pub async fn update<F>(&self, id: Uuid, f: F) -> Result<(), OmraError>
    where
        F: FnOnce(&mut AgentDefinition),
    {
        let mut agents = self.agents.write().await;
        let agent = agents.get_mut(&id).ok_or(OmraError::UnknownAgent(id))?;
        f(agent);
        agent.recompute_role();
        debug!(id = %id, role = ?agent.role, "Updated agent");
        Ok(())
    }

    /// Run a multi-agent edit under one write lock.
    ///
    /// The closure must validate before mutating so a returned error leaves
    /// the map untouched; the hierarchy resolver relies on this.
    pub async fn with_write<R, F>(&self, f: F) -> Result<R, OmraError>
    where
        F: FnOnce(&mut HashMap<Uuid, AgentDefinition>) -> Result<R, OmraError>,
    {
        let mut agents = self.agents.write().await;
        f(&mut agents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omra_core::AgentRole;

    #[tokio::test]
    async fn insert_get_and_duplicate() {
        let registry = AgentRegistry::new();
        let agent = AgentDefinition::new("dispatcher");
        let id = agent.id;
        registry.insert(agent.clone()).await.unwrap();

        assert_eq!(registry.get(id).await.unwrap().name, "dispatcher");
        assert!(matches!(
            registry.insert(agent).await,
            Err(OmraError::Config(_))
        ));
    }

    #[tokio::test]
    async fn get_unknown_agent() {
        let registry = AgentRegistry::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            registry.get(id).await,
            Err(OmraError::UnknownAgent(u)) if u == id
        ));
    }

    #[tokio::test]
    async fn find_by_name_and_list_order() {
        let registry = AgentRegistry::new();
        registry.insert(AgentDefinition::new("zeta")).await.unwrap();
        let alpha = AgentDefinition::new("alpha");
        let alpha_id = alpha.id;
        registry.insert(alpha).await.unwrap();

        assert_eq!(registry.find_by_name("alpha").await, Some(alpha_id));
        assert_eq!(registry.find_by_name("missing").await, None);

        let names: Vec<String> = registry.list().await.into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn remove_detaches_children_and_parent() {
        let registry = AgentRegistry::new();
        let mut parent = AgentDefinition::new("parent");
        let mut child = AgentDefinition::new("child");
        child.parent_id = Some(parent.id);
        child.recompute_role();
        parent.children_ids.push(child.id);
        parent.recompute_role();
        let (parent_id, child_id) = (parent.id, child.id);

        registry.insert(parent).await.unwrap();
        registry.insert(child).await.unwrap();

        registry.remove(parent_id).await.unwrap();
        let orphan = registry.get(child_id).await.unwrap();
        assert_eq!(orphan.parent_id, None);
        assert_eq!(orphan.role, AgentRole::Standalone);
    }

    #[tokio::test]
    async fn remove_child_updates_parent_record() {
        let registry = AgentRegistry::new();
        let mut parent = AgentDefinition::new("parent");
        let mut child = AgentDefinition::new("child");
        child.parent_id = Some(parent.id);
        child.recompute_role();
        parent.children_ids.push(child.id);
        parent
            .skill_mapping
            .insert(child.id, std::collections::BTreeSet::from(["billing".to_string()]));
        parent.recompute_role();
        let (parent_id, child_id) = (parent.id, child.id);

        registry.insert(parent).await.unwrap();
        registry.insert(child).await.unwrap();

        registry.remove(child_id).await.unwrap();
        let parent = registry.get(parent_id).await.unwrap();
        assert!(parent.children_ids.is_empty());
        assert!(parent.skill_mapping.is_empty());
        assert_eq!(parent.role, AgentRole::Standalone);
    }

    #[tokio::test]
    async fn update_recomputes_role() {
        let registry = AgentRegistry::new();
        let agent = AgentDefinition::new("solo");
        let id = agent.id;
        registry.insert(agent).await.unwrap();

        let other = Uuid::new_v4();
        registry
            .update(id, |a| a.children_ids.push(other))
            .await
            .unwrap();
        assert_eq!(registry.get(id).await.unwrap().role, AgentRole::Parent);
    }

    #[tokio::test]
    async fn events_emitted_on_insert_and_remove() {
        let (tx, mut rx) = omra_core::event_channel();
        let registry = AgentRegistry::new().with_event_sink(tx);
        let agent = AgentDefinition::new("observed");
        let id = agent.id;
        registry.insert(agent).await.unwrap();
        registry.remove(id).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::AgentRegistered);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::AgentRemoved);
    }
}
