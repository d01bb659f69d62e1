//! `omra agents` subcommands — inspect the configured hierarchy.

use anyhow::Result;
use clap::Subcommand;
use uuid::Uuid;

use omra_core::AgentDefinition;
use omra_registry::AgentRegistry;

#[derive(Subcommand)]
pub enum AgentCommands {
    /// List all configured agents
    List,
    /// Print the parent/child hierarchy as a tree
    Tree,
    /// Show one agent's full definition as JSON
    Show {
        /// Agent name
        name: String,
    },
}

pub async fn run(cmd: AgentCommands, registry: &AgentRegistry) -> Result<()> {
    match cmd {
        AgentCommands::List => {
            for agent in registry.list().await {
                println!(
                    "{:<28} {:<11} {:<12} children: {}",
                    agent.name,
                    format!("{:?}", agent.role).to_lowercase(),
                    agent.routing_strategy.to_string(),
                    agent.children_ids.len()
                );
            }
        }
        AgentCommands::Tree => {
            let agents = registry.list().await;
            for agent in agents.iter().filter(|a| a.parent_id.is_none()) {
                print_subtree(&agents, agent, 0);
            }
        }
        AgentCommands::Show { name } => {
            let Some(id) = registry.find_by_name(&name).await else {
                anyhow::bail!("no agent named '{name}'");
            };
            let agent = registry.get(id).await?;
            println!("{}", serde_json::to_string_pretty(&agent)?);
        }
    }
    Ok(())
}

fn print_subtree(agents: &[AgentDefinition], agent: &AgentDefinition, depth: usize) {
    let skills = agent
        .parent_id
        .and_then(|pid| find(agents, pid))
        .map(|parent| parent.skills_of(agent.id))
        .filter(|tags| !tags.is_empty())
        .map(|tags| format!(" [{}]", tags.into_iter().collect::<Vec<_>>().join(", ")))
        .unwrap_or_default();

    println!(
        "{}{} ({}){}",
        "  ".repeat(depth),
        agent.name,
        agent.routing_strategy,
        skills
    );
    for child_id in &agent.children_ids {
        if let Some(child) = find(agents, *child_id) {
            print_subtree(agents, child, depth + 1);
        }
    }
}

fn find(agents: &[AgentDefinition], id: Uuid) -> Option<&AgentDefinition> {
    agents.iter().find(|a| a.id == id)
}
