//! Build a live agent registry from the declarative config.
//!
//! Every link goes through the hierarchy resolver so the configured graph
//! is subject to the same cycle and symmetry checks as runtime edits.

use std::collections::BTreeSet;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use omra_config::OmraConfig;
use omra_core::AgentDefinition;
use omra_hierarchy::HierarchyResolver;
use omra_registry::AgentRegistry;

/// Instantiate all configured agents and wire up their hierarchies.
pub async fn build_registry(config: &OmraConfig) -> Result<AgentRegistry> {
    let report = omra_config::validate(config);
    if !report.is_valid() {
        let summary: Vec<String> = report.errors.iter().map(|e| e.to_string()).collect();
        bail!("invalid config:\n{}", summary.join("\n"));
    }

    let registry = AgentRegistry::new();
    let resolver = HierarchyResolver::new(registry.clone());

    // First pass: create every agent so child references resolve.
    for entry in &config.agents {
        let mut agent = AgentDefinition::new(&entry.name);
        agent.description = entry.description.clone();
        agent.endpoint = entry.endpoint.clone();
        registry.insert(agent).await?;
    }

    // Second pass: link children, skills, and strategies.
    for entry in &config.agents {
        let parent_id = lookup(&registry, &entry.name).await?;
        for child in &entry.children {
            let child_id = lookup(&registry, &child.name).await?;
            resolver.add_child(parent_id, child_id).await?;
            if !child.skills.is_empty() {
                let skills: BTreeSet<String> = child.skills.iter().cloned().collect();
                resolver.set_skills(parent_id, child_id, skills).await?;
            }
        }
        resolver
            .set_routing_strategy(parent_id, entry.routing)
            .await?;
    }

    Ok(registry)
}

async fn lookup(registry: &AgentRegistry, name: &str) -> Result<Uuid> {
    registry
        .find_by_name(name)
        .await
        .with_context(|| format!("agent '{name}' not found in registry"))
}
