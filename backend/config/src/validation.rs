//! Config validation: graph-level checks with field paths in messages.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::schema::OmraConfig;

/// A validation finding with the config path it concerns.
#[derive(Debug, Error)]
#[error("config validation error at '{path}': {message}")]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

/// All findings from one validation pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return every error and warning found.
pub fn validate(config: &OmraConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_names(config, &mut report);
    validate_children(config, &mut report);
    validate_acyclic(config, &mut report);
    validate_crm(config, &mut report);
    report
}

/// Agent names must be present and unique; they are the reference keys.
fn validate_names(config: &OmraConfig, report: &mut ValidationReport) {
    let mut seen = HashSet::new();
    for (i, agent) in config.agents.iter().enumerate() {
        let path = format!("agents[{i}]");
        if agent.name.trim().is_empty() {
            report.error(&path, "agent name cannot be empty");
            continue;
        }
        if !seen.insert(agent.name.as_str()) {
            report.error(&path, format!("duplicate agent name '{}'", agent.name));
        }
    }
}

/// Child references must resolve, and no agent may serve two parents.
fn validate_children(config: &OmraConfig, report: &mut ValidationReport) {
    let known: HashSet<&str> = config.agents.iter().map(|a| a.name.as_str()).collect();
    let mut claimed: HashMap<&str, &str> = HashMap::new();

    for agent in &config.agents {
        for (j, child) in agent.children.iter().enumerate() {
            let path = format!("agents.{}.children[{j}]", agent.name);
            if child.name == agent.name {
                report.error(&path, "agent cannot be its own child");
                continue;
            }
            if !known.contains(child.name.as_str()) {
                report.error(&path, format!("unknown child agent '{}'", child.name));
                continue;
            }
            if let Some(other) = claimed.insert(child.name.as_str(), agent.name.as_str()) {
                report.error(
                    &path,
                    format!("'{}' already a child of '{}'", child.name, other),
                );
            }
            if agent.routing == omra_core::RoutingStrategy::SkillBased && child.skills.is_empty() {
                report.warn(
                    &path,
                    format!(
                        "'{}' has no skills; it is unreachable under skill-based routing",
                        child.name
                    ),
                );
            }
        }
    }
}

/// The declared child graph must not loop back on itself.
fn validate_acyclic(config: &OmraConfig, report: &mut ValidationReport) {
    let children: HashMap<&str, Vec<&str>> = config
        .agents
        .iter()
        .map(|a| {
            (
                a.name.as_str(),
                a.children.iter().map(|c| c.name.as_str()).collect(),
            )
        })
        .collect();

    for agent in &config.agents {
        let mut stack: Vec<&str> = children
            .get(agent.name.as_str())
            .cloned()
            .unwrap_or_default();
        let mut visited = HashSet::new();
        while let Some(name) = stack.pop() {
            if name == agent.name {
                report.error(
                    format!("agents.{}", agent.name),
                    "cycle in child hierarchy",
                );
                break;
            }
            if visited.insert(name) {
                if let Some(next) = children.get(name) {
                    stack.extend(next.iter().copied());
                }
            }
        }
    }
}

fn validate_crm(config: &OmraConfig, report: &mut ValidationReport) {
    let Some(crm) = &config.crm else {
        if config
            .agents
            .iter()
            .any(|a| a.endpoint.is_none() && a.children.is_empty())
        {
            report.warn("crm", "no CRM configured; tool calls will fail");
        }
        return;
    };
    if !crm.base_url.starts_with("http://") && !crm.base_url.starts_with("https://") {
        report.error("crm.baseUrl", "must be an http(s) URL");
    }
    if crm.email.trim().is_empty() {
        report.error("crm.email", "email cannot be empty");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AgentEntry, ChildEntry, CrmConfig};
    use omra_core::RoutingStrategy;

    fn agent(name: &str, children: &[&str]) -> AgentEntry {
        AgentEntry {
            name: name.into(),
            description: String::new(),
            routing: RoutingStrategy::RoundRobin,
            children: children
                .iter()
                .map(|c| ChildEntry {
                    name: (*c).into(),
                    skills: vec!["general".into()],
                })
                .collect(),
            endpoint: Some("http://agents.local".into()),
        }
    }

    #[test]
    fn valid_config_passes() {
        let config = OmraConfig {
            agents: vec![agent("parent", &["a", "b"]), agent("a", &[]), agent("b", &[])],
            crm: Some(CrmConfig {
                base_url: "http://crm.local".into(),
                email: "admin@example.com".into(),
                password: "pw".into(),
            }),
            logging: Default::default(),
        };
        let report = validate(&config);
        assert!(report.is_valid(), "unexpected errors: {:?}", report.errors);
    }

    #[test]
    fn duplicate_names_rejected() {
        let config = OmraConfig {
            agents: vec![agent("twin", &[]), agent("twin", &[])],
            ..Default::default()
        };
        assert!(!validate(&config).is_valid());
    }

    #[test]
    fn unknown_child_rejected() {
        let config = OmraConfig {
            agents: vec![agent("parent", &["ghost"])],
            ..Default::default()
        };
        let report = validate(&config);
        assert!(report.errors.iter().any(|e| e.message.contains("ghost")));
    }

    #[test]
    fn child_of_two_parents_rejected() {
        let config = OmraConfig {
            agents: vec![
                agent("p1", &["kid"]),
                agent("p2", &["kid"]),
                agent("kid", &[]),
            ],
            ..Default::default()
        };
        assert!(!validate(&config).is_valid());
    }

    #[test]
    fn self_child_and_cycles_rejected() {
        let config = OmraConfig {
            agents: vec![agent("ouro", &["ouro"])],
            ..Default::default()
        };
        assert!(!validate(&config).is_valid());

        let config = OmraConfig {
            agents: vec![agent("a", &["b"]), agent("b", &["a"])],
            ..Default::default()
        };
        let report = validate(&config);
        assert!(report.errors.iter().any(|e| e.message.contains("cycle")));
    }

    #[test]
    fn skillless_child_under_skill_routing_warns() {
        let mut parent = agent("parent", &[]);
        parent.routing = RoutingStrategy::SkillBased;
        parent.children.push(ChildEntry {
            name: "kid".into(),
            skills: vec![],
        });
        let config = OmraConfig {
            agents: vec![parent, agent("kid", &[])],
            ..Default::default()
        };
        let report = validate(&config);
        assert!(report.is_valid());
        assert!(!report.warnings.is_empty());
    }

    #[test]
    fn bad_crm_url_rejected() {
        let config = OmraConfig {
            agents: vec![],
            crm: Some(CrmConfig {
                base_url: "crm.local".into(),
                email: "admin@example.com".into(),
                password: "pw".into(),
            }),
            logging: Default::default(),
        };
        assert!(!validate(&config).is_valid());
    }
}
