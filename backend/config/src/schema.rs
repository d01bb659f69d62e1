//! OMRA runtime configuration schema, typed for serde YAML deserialization.
//!
//! Hierarchies are declared by nesting child names under a parent entry;
//! the bootstrap turns them into registry records through the resolver so
//! every graph invariant is enforced at load time.

use serde::{Deserialize, Serialize};

use omra_core::RoutingStrategy;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OmraConfig {
    /// Agent definitions; parents list their children inline.
    #[serde(default)]
    pub agents: Vec<AgentEntry>,

    /// CRM backend the tools talk to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crm: Option<CrmConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One configured agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentEntry {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Strategy used when this agent delegates to its children.
    #[serde(default)]
    pub routing: RoutingStrategy,

    /// Children in priority order, each with its skill tags.
    #[serde(default)]
    pub children: Vec<ChildEntry>,

    /// HTTP dispatch target when this agent runs as a child.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Reference to a child agent, by name, with its skill tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildEntry {
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmConfig {
    pub base_url: String,
    pub email: String,
    /// Usually supplied as `${OMRA_CRM_PASSWORD}`.
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for the rolling NDJSON log file; console-only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let yaml = "agents: []\n";
        let config: OmraConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.agents.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parses_hierarchy_with_skills() {
        let yaml = r#"
agents:
  - name: customer-relations
    routing: skill-based
    children:
      - name: billing-agent
        skills: [billing, refunds]
      - name: diagnostics-agent
        skills: [technical]
  - name: billing-agent
    endpoint: http://agents.local/billing
  - name: diagnostics-agent
    endpoint: http://agents.local/diagnostics
crm:
  baseUrl: http://crm.local
  email: admin@example.com
  password: ${OMRA_CRM_PASSWORD}
"#;
        let config: OmraConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.agents.len(), 3);
        let parent = &config.agents[0];
        assert_eq!(parent.routing, RoutingStrategy::SkillBased);
        assert_eq!(parent.children[0].skills, vec!["billing", "refunds"]);
        assert_eq!(
            config.crm.as_ref().unwrap().password,
            "${OMRA_CRM_PASSWORD}"
        );
    }

    #[test]
    fn round_trips_through_yaml() {
        let config = OmraConfig {
            agents: vec![AgentEntry {
                name: "dispatcher".into(),
                description: "routes inbound work".into(),
                routing: RoutingStrategy::Priority,
                children: vec![ChildEntry {
                    name: "scheduler".into(),
                    skills: vec!["scheduling".into()],
                }],
                endpoint: None,
            }],
            crm: None,
            logging: LoggingConfig::default(),
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: OmraConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.agents[0].children[0].name, "scheduler");
    }
}
