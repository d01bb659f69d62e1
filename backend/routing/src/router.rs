//! Router — pick one child of a parent agent for an inbound task.
//!
//! Three strategies: round-robin (persistent per-parent cursor), priority
//! (child list order, first wins), and skill-based (first child whose skill
//! tags contain the task's required tag). When no child carries a matching
//! tag the router refuses with `NoSkillMatch` rather than guessing.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use tracing::debug;
use uuid::Uuid;

use omra_core::{AgentDefinition, OmraError, RoutingStrategy, Task};

/// Stateless apart from the round-robin cursors, which are keyed per parent
/// agent and guarded by one mutex (the per-agent exclusive-access rule).
#[derive(Default)]
pub struct Router {
    cursors: Mutex<HashMap<Uuid, usize>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the child of `parent` that should handle `task`.
    pub fn select_child(
        &self,
        parent: &AgentDefinition,
        task: &Task,
    ) -> Result<Uuid, OmraError> {
        self.select_child_excluding(parent, task, &HashSet::new())
    }

    /// Like [`select_child`](Self::select_child), skipping children in
    /// `excluded` (used when rerouting after a failure). All candidates
    /// excluded reads as an empty child list.
    pub fn select_child_excluding(
        &self,
        parent: &AgentDefinition,
        task: &Task,
        excluded: &HashSet<Uuid>,
    ) -> Result<Uuid, OmraError> {
        if parent.children_ids.is_empty() {
            return Err(OmraError::NoChildren(parent.id));
        }

        let selected = match parent.routing_strategy {
            RoutingStrategy::RoundRobin => self.round_robin(parent, excluded),
            RoutingStrategy::Priority => parent
                .children_ids
                .iter()
                .find(|c| !excluded.contains(c))
                .copied()
                .ok_or(OmraError::NoChildren(parent.id)),
            RoutingStrategy::SkillBased => skill_match(parent, task, excluded),
        }?;

        debug!(
            parent = %parent.name,
            child = %selected,
            strategy = %parent.routing_strategy,
            "Selected child"
        );
        Ok(selected)
    }

    /// Advance the parent's cursor until a non-excluded child turns up.
    fn round_robin(
        &self,
        parent: &AgentDefinition,
        excluded: &HashSet<Uuid>,
    ) -> Result<Uuid, OmraError> {
        let len = parent.children_ids.len();
        let mut cursors = self.cursors.lock().expect("cursor lock poisoned");
        let cursor = cursors.entry(parent.id).or_insert(0);
        for _ in 0..len {
            // Modulo on read so a shrunken child list cannot go out of bounds.
            let candidate = parent.children_ids[*cursor % len];
            *cursor = (*cursor + 1) % len;
            if !excluded.contains(&candidate) {
                return Ok(candidate);
            }
        }
        Err(OmraError::NoChildren(parent.id))
    }

    /// Forget the cursor for a parent (e.g. after its children changed).
    pub fn reset_cursor(&self, parent_id: Uuid) {
        self.cursors
            .lock()
            .expect("cursor lock poisoned")
            .remove(&parent_id);
    }
}

/// First child (list order breaks ties) whose skill set contains the task's
/// required tag. A child with no tags is never eligible. A task without a
/// required tag cannot be skill-routed.
fn skill_match(
    parent: &AgentDefinition,
    task: &Task,
    excluded: &HashSet<Uuid>,
) -> Result<Uuid, OmraError> {
    let Some(skill) = task.required_skill.as_deref() else {
        return Err(OmraError::NoSkillMatch {
            parent: parent.id,
            skill: None,
        });
    };
    parent
        .children_ids
        .iter()
        .filter(|c| !excluded.contains(c))
        .find(|c| {
            parent
                .skill_mapping
                .get(c)
                .is_some_and(|tags| tags.contains(skill))
        })
        .copied()
        .ok_or_else(|| OmraError::NoSkillMatch {
            parent: parent.id,
            skill: Some(skill.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn parent_with_children(strategy: RoutingStrategy, n: usize) -> (AgentDefinition, Vec<Uuid>) {
        let mut parent = AgentDefinition::new("dispatcher");
        parent.routing_strategy = strategy;
        let children: Vec<Uuid> = (0..n).map(|_| Uuid::new_v4()).collect();
        parent.children_ids = children.clone();
        parent.recompute_role();
        (parent, children)
    }

    #[test]
    fn no_children_fails_for_every_strategy() {
        let router = Router::new();
        let task = Task::new("hello");
        for strategy in [
            RoutingStrategy::RoundRobin,
            RoutingStrategy::Priority,
            RoutingStrategy::SkillBased,
        ] {
            let (parent, _) = parent_with_children(strategy, 0);
            assert!(matches!(
                router.select_child(&parent, &task),
                Err(OmraError::NoChildren(_))
            ));
        }
    }

    #[test]
    fn round_robin_cycles_in_order() {
        let router = Router::new();
        let (parent, children) = parent_with_children(RoutingStrategy::RoundRobin, 3);
        let task = Task::new("t");

        // b, c, d, b for children [b, c, d].
        let picks: Vec<Uuid> = (0..4)
            .map(|_| router.select_child(&parent, &task).unwrap())
            .collect();
        assert_eq!(picks, vec![children[0], children[1], children[2], children[0]]);
    }

    #[test]
    fn round_robin_is_fair_over_many_calls() {
        let router = Router::new();
        let (parent, children) = parent_with_children(RoutingStrategy::RoundRobin, 3);
        let task = Task::new("t");

        let mut counts: HashMap<Uuid, usize> = HashMap::new();
        for _ in 0..31 {
            *counts
                .entry(router.select_child(&parent, &task).unwrap())
                .or_insert(0) += 1;
        }
        for child in &children {
            let n = counts[child];
            assert!((10..=11).contains(&n), "uneven distribution: {n}");
        }
    }

    #[test]
    fn round_robin_cursor_is_per_parent() {
        let router = Router::new();
        let (a, a_children) = parent_with_children(RoutingStrategy::RoundRobin, 2);
        let (b, b_children) = parent_with_children(RoutingStrategy::RoundRobin, 2);
        let task = Task::new("t");

        assert_eq!(router.select_child(&a, &task).unwrap(), a_children[0]);
        assert_eq!(router.select_child(&b, &task).unwrap(), b_children[0]);
        assert_eq!(router.select_child(&a, &task).unwrap(), a_children[1]);
    }

    #[test]
    fn priority_returns_first_child() {
        let router = Router::new();
        let (parent, children) = parent_with_children(RoutingStrategy::Priority, 3);
        let task = Task::new("t");

        for _ in 0..3 {
            assert_eq!(router.select_child(&parent, &task).unwrap(), children[0]);
        }
    }

    #[test]
    fn priority_skips_excluded() {
        let router = Router::new();
        let (parent, children) = parent_with_children(RoutingStrategy::Priority, 3);
        let task = Task::new("t");

        let excluded = HashSet::from([children[0]]);
        assert_eq!(
            router
                .select_child_excluding(&parent, &task, &excluded)
                .unwrap(),
            children[1]
        );

        let all: HashSet<Uuid> = children.iter().copied().collect();
        assert!(matches!(
            router.select_child_excluding(&parent, &task, &all),
            Err(OmraError::NoChildren(_))
        ));
    }

    #[test]
    fn skill_based_routes_by_tag() {
        let router = Router::new();
        let (mut parent, children) = parent_with_children(RoutingStrategy::SkillBased, 2);
        parent
            .skill_mapping
            .insert(children[0], BTreeSet::from(["billing".to_string()]));
        parent
            .skill_mapping
            .insert(children[1], BTreeSet::from(["technical".to_string()]));

        let task = Task::new("dishwasher leaking").with_skill("technical");
        assert_eq!(router.select_child(&parent, &task).unwrap(), children[1]);
    }

    #[test]
    fn skill_based_ties_break_by_list_order() {
        let router = Router::new();
        let (mut parent, children) = parent_with_children(RoutingStrategy::SkillBased, 3);
        for child in &children[1..] {
            parent
                .skill_mapping
                .insert(*child, BTreeSet::from(["billing".to_string()]));
        }

        let task = Task::new("t").with_skill("billing");
        assert_eq!(router.select_child(&parent, &task).unwrap(), children[1]);
    }

    #[test]
    fn skill_based_rejects_unmatched_and_untagged() {
        let router = Router::new();
        let (mut parent, children) = parent_with_children(RoutingStrategy::SkillBased, 2);
        parent
            .skill_mapping
            .insert(children[0], BTreeSet::from(["billing".to_string()]));

        // No child has "scheduling"; the zero-tag child must not win either.
        let task = Task::new("t").with_skill("scheduling");
        assert!(matches!(
            router.select_child(&parent, &task),
            Err(OmraError::NoSkillMatch { skill: Some(s), .. }) if s == "scheduling"
        ));

        // A task without a required skill cannot be skill-routed.
        let untagged = Task::new("t");
        assert!(matches!(
            router.select_child(&parent, &untagged),
            Err(OmraError::NoSkillMatch { skill: None, .. })
        ));
    }

    #[test]
    fn reset_cursor_restarts_the_cycle() {
        let router = Router::new();
        let (parent, children) = parent_with_children(RoutingStrategy::RoundRobin, 3);
        let task = Task::new("t");

        router.select_child(&parent, &task).unwrap();
        router.select_child(&parent, &task).unwrap();
        router.reset_cursor(parent.id);
        assert_eq!(router.select_child(&parent, &task).unwrap(), children[0]);
    }
}
