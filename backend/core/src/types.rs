use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role an agent plays in the hierarchy.
///
/// Always derived from the presence of a parent link and the child list;
/// never set independently of them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    #[default]
    Standalone,
    Parent,
    Child,
    Hybrid,
}

impl AgentRole {
    /// Pure role derivation: parent link + children ⇒ Hybrid, parent link
    /// only ⇒ Child, children only ⇒ Parent, neither ⇒ Standalone.
    pub fn derive(has_parent: bool, has_children: bool) -> Self {
        match (has_parent, has_children) {
            (true, true) => AgentRole::Hybrid,
            (true, false) => AgentRole::Child,
            (false, true) => AgentRole::Parent,
            (false, false) => AgentRole::Standalone,
        }
    }
}

/// How a parent agent picks which child handles an inbound task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingStrategy {
    #[default]
    RoundRobin,
    SkillBased,
    Priority,
}

impl fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingStrategy::RoundRobin => write!(f, "round-robin"),
            RoutingStrategy::SkillBased => write!(f, "skill-based"),
            RoutingStrategy::Priority => write!(f, "priority"),
        }
    }
}

/// Direction for moving a child within its parent's priority order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReorderDirection {
    Up,
    Down,
}

/// A configured unit of task-handling capability.
///
/// Parent/child links are kept symmetric by the hierarchy resolver: a
/// child's `parent_id` always has the child listed in its `children_ids`,
/// and `children_ids` never contains the agent itself or its own parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefinition {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub role: AgentRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    /// Ordered child list; order doubles as descending priority.
    #[serde(default)]
    pub children_ids: Vec<Uuid>,
    #[serde(default)]
    pub routing_strategy: RoutingStrategy,
    /// Skill tags per child; consulted only under skill-based routing.
    #[serde(default)]
    pub skill_mapping: HashMap<Uuid, BTreeSet<String>>,
    /// HTTP dispatch target for this agent when it runs as a child.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            role: AgentRole::Standalone,
            parent_id: None,
            children_ids: Vec::new(),
            routing_strategy: RoutingStrategy::default(),
            skill_mapping: HashMap::new(),
            endpoint: None,
        }
    }

    /// The role this agent should currently hold.
    pub fn derived_role(&self) -> AgentRole {
        AgentRole::derive(self.parent_id.is_some(), !self.children_ids.is_empty())
    }

    /// Re-derive `role` from the current parent/children state.
    pub fn recompute_role(&mut self) {
        self.role = self.derived_role();
    }

    /// Skill tags recorded for the given child (empty when none).
    pub fn skills_of(&self, child_id: Uuid) -> BTreeSet<String> {
        self.skill_mapping.get(&child_id).cloned().unwrap_or_default()
    }
}

/// An inbound request, routed to exactly one child per delegation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_skill: Option<String>,
    /// Free-form context forwarded to the child (e.g. customer record).
    #[serde(default)]
    pub context: serde_json::Value,
}

impl Task {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            input: input.into(),
            required_skill: None,
            context: serde_json::Value::Null,
        }
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.required_skill = Some(skill.into());
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }
}

/// Result of a delegated task, returned by the child that handled it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub task_id: Uuid,
    /// Child agent that produced the result.
    pub handled_by: Uuid,
    pub output: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Dispatch attempts consumed, including the successful one.
    pub attempts: u32,
}

impl TaskResult {
    pub fn new(task_id: Uuid, handled_by: Uuid, output: impl Into<String>) -> Self {
        Self {
            task_id,
            handled_by,
            output: output.into(),
            payload: serde_json::Value::Null,
            attempts: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_derivation_covers_all_states() {
        assert_eq!(AgentRole::derive(false, false), AgentRole::Standalone);
        assert_eq!(AgentRole::derive(true, false), AgentRole::Child);
        assert_eq!(AgentRole::derive(false, true), AgentRole::Parent);
        assert_eq!(AgentRole::derive(true, true), AgentRole::Hybrid);
    }

    #[test]
    fn recompute_role_follows_links() {
        let mut agent = AgentDefinition::new("dispatcher");
        assert_eq!(agent.role, AgentRole::Standalone);

        agent.children_ids.push(Uuid::new_v4());
        agent.recompute_role();
        assert_eq!(agent.role, AgentRole::Parent);

        agent.parent_id = Some(Uuid::new_v4());
        agent.recompute_role();
        assert_eq!(agent.role, AgentRole::Hybrid);

        agent.children_ids.clear();
        agent.recompute_role();
        assert_eq!(agent.role, AgentRole::Child);
    }

    #[test]
    fn agent_definition_serialization() {
        let mut agent = AgentDefinition::new("customer-relations");
        agent.routing_strategy = RoutingStrategy::SkillBased;
        let child = Uuid::new_v4();
        agent.children_ids.push(child);
        agent
            .skill_mapping
            .insert(child, BTreeSet::from(["billing".to_string()]));
        agent.recompute_role();

        let json = serde_json::to_string(&agent).unwrap();
        let back: AgentDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "customer-relations");
        assert_eq!(back.role, AgentRole::Parent);
        assert_eq!(back.routing_strategy, RoutingStrategy::SkillBased);
        assert!(back.skills_of(child).contains("billing"));
    }

    #[test]
    fn strategy_display_and_serde_tags() {
        assert_eq!(RoutingStrategy::RoundRobin.to_string(), "round-robin");
        assert_eq!(
            serde_json::to_value(RoutingStrategy::SkillBased).unwrap(),
            serde_json::json!("skill-based")
        );
    }

    #[test]
    fn task_builder() {
        let task = Task::new("refund for order 41").with_skill("billing");
        assert_eq!(task.required_skill.as_deref(), Some("billing"));
        assert!(task.context.is_null());
    }
}
