//! Hierarchy resolver — validated mutations of the parent/child graph.
//!
//! Every edit runs under a single registry write lock, validates before
//! touching anything, and re-derives `role` on each agent it changed. The
//! graph invariants enforced here: no cycles, symmetric parent/child links,
//! and a child list that never contains the agent itself or its parent.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info};
use uuid::Uuid;

use omra_core::{
    AgentDefinition, EventKind, OmraError, ReorderDirection, RoutingStrategy,
};
use omra_registry::AgentRegistry;

/// Validated mutations on the agent hierarchy stored in a registry.
#[derive(Clone)]
pub struct HierarchyResolver {
    registry: AgentRegistry,
}

impl HierarchyResolver {
    pub fn new(registry: AgentRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Set or clear an agent's parent.
    ///
    /// Fails with [`OmraError::Cycle`] when the candidate parent is the
    /// agent itself or one of its descendants; the graph is untouched on
    /// failure. On success the old parent (if any) drops the agent from its
    /// child list and the new parent gains it.
    pub async fn set_parent(
        &self,
        agent_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<(), OmraError> {
        self.registry
            .with_write(|agents| {
                ensure_exists(agents, agent_id)?;
                if let Some(pid) = parent_id {
                    ensure_exists(agents, pid)?;
                    if pid == agent_id || is_descendant(agents, agent_id, pid) {
                        return Err(OmraError::Cycle {
                            agent: agent_id,
                            parent: pid,
                        });
                    }
                }

                // Re-asserting the current parent must not demote the agent
                // in the child order or drop its skill entry.
                let old_parent = agents[&agent_id].parent_id;
                if old_parent != parent_id {
                    if let Some(old) = old_parent {
                        if let Some(p) = agents.get_mut(&old) {
                            p.children_ids.retain(|c| *c != agent_id);
                            p.skill_mapping.remove(&agent_id);
                            p.recompute_role();
                        }
                    }
                }
                if let Some(pid) = parent_id {
                    let parent = agents.get_mut(&pid).expect("checked above");
                    if !parent.children_ids.contains(&agent_id) {
                        parent.children_ids.push(agent_id);
                    }
                    parent.recompute_role();
                }
                let agent = agents.get_mut(&agent_id).expect("checked above");
                agent.parent_id = parent_id;
                agent.recompute_role();
                Ok(())
            })
            .await?;

        info!(agent = %agent_id, parent = ?parent_id, "Set parent");
        self.registry.emit(
            agent_id,
            EventKind::HierarchyChanged,
            serde_json::json!({"op": "set_parent", "parent": parent_id}),
        );
        Ok(())
    }

    /// Attach `child_id` under `agent_id`, re-parenting it if needed.
    /// Appends at the end of the child list (lowest priority).
    pub async fn add_child(&self, agent_id: Uuid, child_id: Uuid) -> Result<(), OmraError> {
        self.registry
            .with_write(|agents| {
                ensure_exists(agents, agent_id)?;
                ensure_exists(agents, child_id)?;
                // Self-links, links to the agent's own parent, and any edge
                // that makes the agent reachable from the child are cycles.
                if child_id == agent_id
                    || agents[&agent_id].parent_id == Some(child_id)
                    || is_descendant(agents, child_id, agent_id)
                {
                    return Err(OmraError::Cycle {
                        agent: agent_id,
                        parent: child_id,
                    });
                }

                let old_parent = agents[&child_id].parent_id;
                if let Some(old) = old_parent {
                    if old != agent_id {
                        if let Some(p) = agents.get_mut(&old) {
                            p.children_ids.retain(|c| *c != child_id);
                            p.skill_mapping.remove(&child_id);
                            p.recompute_role();
                        }
                    }
                }
                let parent = agents.get_mut(&agent_id).expect("checked above");
                if !parent.children_ids.contains(&child_id) {
                    parent.children_ids.push(child_id);
                }
                parent.recompute_role();
                let child = agents.get_mut(&child_id).expect("checked above");
                child.parent_id = Some(agent_id);
                child.recompute_role();
                Ok(())
            })
            .await?;

        debug!(parent = %agent_id, child = %child_id, "Added child");
        self.registry.emit(
            agent_id,
            EventKind::HierarchyChanged,
            serde_json::json!({"op": "add_child", "child": child_id}),
        );
        Ok(())
    }

    /// Detach `child_id` from `agent_id`, dropping its skill entry and
    /// clearing the child's back-reference.
    pub async fn remove_child(&self, agent_id: Uuid, child_id: Uuid) -> Result<(), OmraError> {
        self.registry
            .with_write(|agents| {
                ensure_exists(agents, agent_id)?;
                if !agents[&agent_id].children_ids.contains(&child_id) {
                    return Err(OmraError::NotAChild {
                        parent: agent_id,
                        child: child_id,
                    });
                }

                let parent = agents.get_mut(&agent_id).expect("checked above");
                parent.children_ids.retain(|c| *c != child_id);
                parent.skill_mapping.remove(&child_id);
                parent.recompute_role();
                if let Some(child) = agents.get_mut(&child_id) {
                    if child.parent_id == Some(agent_id) {
                        child.parent_id = None;
                        child.recompute_role();
                    }
                }
                Ok(())
            })
            .await?;

        debug!(parent = %agent_id, child = %child_id, "Removed child");
        self.registry.emit(
            agent_id,
            EventKind::HierarchyChanged,
            serde_json::json!({"op": "remove_child", "child": child_id}),
        );
        Ok(())
    }

    /// Change the routing strategy of a parent agent.
    pub async fn set_routing_strategy(
        &self,
        agent_id: Uuid,
        strategy: RoutingStrategy,
    ) -> Result<(), OmraError> {
        self.registry
            .update(agent_id, |agent| agent.routing_strategy = strategy)
            .await?;
        self.registry.emit(
            agent_id,
            EventKind::HierarchyChanged,
            serde_json::json!({"op": "set_routing_strategy", "strategy": strategy.to_string()}),
        );
        Ok(())
    }

    /// Replace the skill tags recorded for a child. An empty set removes
    /// the entry entirely.
    pub async fn set_skills(
        &self,
        agent_id: Uuid,
        child_id: Uuid,
        skills: BTreeSet<String>,
    ) -> Result<(), OmraError> {
        self.registry
            .with_write(|agents| {
                ensure_exists(agents, agent_id)?;
                if !agents[&agent_id].children_ids.contains(&child_id) {
                    return Err(OmraError::NotAChild {
                        parent: agent_id,
                        child: child_id,
                    });
                }
                let parent = agents.get_mut(&agent_id).expect("checked above");
                if skills.is_empty() {
                    parent.skill_mapping.remove(&child_id);
                } else {
                    parent.skill_mapping.insert(child_id, skills);
                }
                Ok(())
            })
            .await?;
        self.registry.emit(
            agent_id,
            EventKind::HierarchyChanged,
            serde_json::json!({"op": "set_skills", "child": child_id}),
        );
        Ok(())
    }

    /// Swap a child with its immediate neighbor in the priority order.
    /// A no-op when the child is already at the boundary.
    pub async fn reorder_child(
        &self,
        agent_id: Uuid,
        child_id: Uuid,
        direction: ReorderDirection,
    ) -> Result<(), OmraError> {
        self.registry
            .with_write(|agents| {
                ensure_exists(agents, agent_id)?;
                let parent = agents.get_mut(&agent_id).expect("checked above");
                let pos = parent
                    .children_ids
                    .iter()
                    .position(|c| *c == child_id)
                    .ok_or(OmraError::NotAChild {
                        parent: agent_id,
                        child: child_id,
                    })?;
                match direction {
                    ReorderDirection::Up if pos > 0 => {
                        parent.children_ids.swap(pos, pos - 1);
                    }
                    ReorderDirection::Down if pos + 1 < parent.children_ids.len() => {
                        parent.children_ids.swap(pos, pos + 1);
                    }
                    _ => {} // boundary: nothing to do
                }
                Ok(())
            })
            .await?;
        self.registry.emit(
            agent_id,
            EventKind::HierarchyChanged,
            serde_json::json!({"op": "reorder_child", "child": child_id, "direction": direction}),
        );
        Ok(())
    }

    /// Turn hierarchical mode off for an agent: clears the parent link,
    /// detaches every child, and resets strategy and skills. A full reset,
    /// regardless of prior state.
    pub async fn disable_hierarchy(&self, agent_id: Uuid) -> Result<(), OmraError> {
        self.registry
            .with_write(|agents| {
                ensure_exists(agents, agent_id)?;

                let old_parent = agents[&agent_id].parent_id;
                let children = agents[&agent_id].children_ids.clone();

                if let Some(pid) = old_parent {
                    if let Some(p) = agents.get_mut(&pid) {
                        p.children_ids.retain(|c| *c != agent_id);
                        p.skill_mapping.remove(&agent_id);
                        p.recompute_role();
                    }
                }
                for child_id in children {
                    if let Some(child) = agents.get_mut(&child_id) {
                        if child.parent_id == Some(agent_id) {
                            child.parent_id = None;
                            child.recompute_role();
                        }
                    }
                }

                let agent = agents.get_mut(&agent_id).expect("checked above");
                agent.parent_id = None;
                agent.children_ids.clear();
                agent.routing_strategy = RoutingStrategy::RoundRobin;
                agent.skill_mapping.clear();
                agent.recompute_role();
                Ok(())
            })
            .await?;

        info!(agent = %agent_id, "Disabled hierarchical mode");
        self.registry.emit(
            agent_id,
            EventKind::HierarchyChanged,
            serde_json::json!({"op": "disable_hierarchy"}),
        );
        Ok(())
    }
}

fn ensure_exists(
    agents: &HashMap<Uuid, AgentDefinition>,
    id: Uuid,
) -> Result<(), OmraError> {
    if agents.contains_key(&id) {
        Ok(())
    } else {
        Err(OmraError::UnknownAgent(id))
    }
}

/// Whether `candidate` sits anywhere in the subtree rooted at `root`.
fn is_descendant(
    agents: &HashMap<Uuid, AgentDefinition>,
    root: Uuid,
    candidate: Uuid,
) -> bool {
    let mut stack: Vec<Uuid> = agents
        .get(&root)
        .map(|a| a.children_ids.clone())
        .unwrap_or_default();
    while let Some(id) = stack.pop() {
        if id == candidate {
            return true;
        }
        if let Some(agent) = agents.get(&id) {
            stack.extend(agent.children_ids.iter().copied());
        }
    }
    false
}
