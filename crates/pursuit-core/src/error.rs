use crate::config::ConfigError;
use crate::model::entity::Entity;
use crate::model::graph::NodeId;
use std::fmt;

/// Fatal numerical inconsistencies detected after a belief or matrix mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    BeliefSum {
        entity: Entity,
        sum: f64,
    },
    NegativeBelief {
        entity: Entity,
        node: NodeId,
        value: f64,
    },
    TransitionColumn {
        entity: Entity,
        column: NodeId,
        sum: f64,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::BeliefSum { entity, sum } => {
                write!(f, "{entity} belief sums to {sum} instead of 1")
            }
            InvariantViolation::NegativeBelief {
                entity,
                node,
                value,
            } => write!(f, "{entity} belief at node {node} is negative ({value})"),
            InvariantViolation::TransitionColumn {
                entity,
                column,
                sum,
            } => write!(
                f,
                "{entity} transition matrix column {column} sums to {sum} instead of 1"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameError {
    InvariantViolation(InvariantViolation),
    Config(ConfigError),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::InvariantViolation(violation) => {
                write!(f, "invariant violation: {violation}")
            }
            GameError::Config(err) => write!(f, "invalid configuration: {err}"),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::Config(err) => Some(err),
            GameError::InvariantViolation(_) => None,
        }
    }
}

impl From<InvariantViolation> for GameError {
    fn from(violation: InvariantViolation) -> Self {
        GameError::InvariantViolation(violation)
    }
}

impl From<ConfigError> for GameError {
    fn from(err: ConfigError) -> Self {
        GameError::Config(err)
    }
}
