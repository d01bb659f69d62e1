use thiserror::Error;
use uuid::Uuid;

/// Top-level error type for the OMRA agent core.
#[derive(Debug, Error)]
pub enum OmraError {
    #[error("cycle: {parent} is already a descendant of {agent}")]
    Cycle { agent: Uuid, parent: Uuid },

    #[error("agent {0} has no children configured")]
    NoChildren(Uuid),

    #[error("no child of {parent} matches required skill {skill:?}")]
    NoSkillMatch {
        parent: Uuid,
        skill: Option<String>,
    },

    #[error("unknown agent: {0}")]
    UnknownAgent(Uuid),

    #[error("agent {child} is not a child of {parent}")]
    NotAChild { parent: Uuid, child: Uuid },

    #[error("delegation to child {child} failed: {source}")]
    Delegation {
        child: Uuid,
        #[source]
        source: anyhow::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}
