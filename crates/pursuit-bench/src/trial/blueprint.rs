use pursuit_bot::AgentVariant;
use pursuit_bot::engine::GameSetup;
use pursuit_bot::policy::{MovementPolicy, NeighborPredicate, PolicyParams};
use pursuit_core::GameConfig;
use thiserror::Error;

use crate::config::AgentConfig;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid variant for agent '{name}': {message}")]
    InvalidVariant { name: String, message: String },
    #[error("invalid policy parameter for agent '{name}': {message}")]
    InvalidPolicyParam { name: String, message: String },
}

/// A configured agent, ready to spawn a fresh policy for every run.
pub(super) struct AgentBlueprint {
    pub(super) name: String,
    pub(super) variant: AgentVariant,
    params: Option<PolicyParams>,
}

impl AgentBlueprint {
    pub(super) fn from_configs(configs: &[AgentConfig]) -> Result<Vec<Self>, AgentError> {
        configs.iter().map(Self::from_config).collect()
    }

    fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let variant = config
            .variant
            .parse::<AgentVariant>()
            .map_err(|err| AgentError::InvalidVariant {
                name: config.name.clone(),
                message: err.to_string(),
            })?;
        let defaults = variant.default_policy().params().clone();
        let params = policy_params(&config.name, &config.params, defaults)?;

        Ok(Self {
            name: config.name.clone(),
            variant,
            params,
        })
    }

    fn spawn_policy(&self) -> Box<dyn MovementPolicy> {
        match &self.params {
            Some(params) => Box::new(self.variant.policy_with(params.clone())),
            None => Box::new(self.variant.default_policy()),
        }
    }

    pub(super) fn setup(&self, game: GameConfig, seed: u64) -> GameSetup {
        GameSetup::new(game, self.variant, seed).with_policy(self.spawn_policy())
    }
}

/// Reads the optional policy overrides. `None` keeps the variant's own policy.
fn policy_params(
    name: &str,
    params: &serde_yaml::Value,
    defaults: PolicyParams,
) -> Result<Option<PolicyParams>, AgentError> {
    let invalid = |message: String| AgentError::InvalidPolicyParam {
        name: name.to_string(),
        message,
    };

    if params.is_null() {
        return Ok(None);
    }
    let mapping = params
        .as_mapping()
        .ok_or_else(|| invalid("expected mapping for policy params".to_string()))?;
    if mapping.is_empty() {
        return Ok(None);
    }

    let mut resolved = defaults;
    for (key, value) in mapping {
        match key.as_str() {
            Some("predicates") => {
                let entries = value
                    .as_sequence()
                    .ok_or_else(|| invalid("predicates must be a list".to_string()))?;
                resolved.predicates = entries
                    .iter()
                    .map(|entry| {
                        let text = entry
                            .as_str()
                            .ok_or_else(|| invalid("predicate names must be strings".to_string()))?;
                        text.parse::<NeighborPredicate>()
                            .map_err(|err| invalid(err.to_string()))
                    })
                    .collect::<Result<_, _>>()?;
            }
            Some("route_around_predator") => {
                resolved.route_around_predator = value
                    .as_bool()
                    .ok_or_else(|| invalid("route_around_predator must be a boolean".to_string()))?;
            }
            Some(other) => return Err(invalid(format!("unknown key '{other}'"))),
            None => return Err(invalid("keys must be strings".to_string())),
        }
    }

    Ok(Some(resolved))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(variant: &str, params: &str) -> Result<AgentBlueprint, AgentError> {
        AgentBlueprint::from_config(&AgentConfig {
            name: "bot".to_string(),
            variant: variant.to_string(),
            params: serde_yaml::from_str(params).unwrap(),
        })
    }

    #[test]
    fn empty_params_keep_variant_policy() {
        let blueprint = agent("agent2", "{}").unwrap();
        assert!(blueprint.params.is_none());
        assert_eq!(blueprint.spawn_policy().name(), "improved");
    }

    #[test]
    fn overrides_start_from_variant_defaults() {
        let blueprint = agent("agent8", "predicates: [farther_predator]").unwrap();
        let params = blueprint.params.as_ref().unwrap();
        assert_eq!(params.predicates, vec![NeighborPredicate::FartherPredator]);
        assert!(params.route_around_predator);
        assert_eq!(blueprint.spawn_policy().name(), "agent8");
    }

    #[test]
    fn rejects_unknown_predicate() {
        let err = agent("agent7", "predicates: [sideways]").err().unwrap();
        assert!(matches!(err, AgentError::InvalidPolicyParam { .. }));
    }

    #[test]
    fn rejects_unknown_key() {
        let err = agent("agent7", "speed: 3").err().unwrap();
        assert!(err.to_string().contains("unknown key 'speed'"));
    }

    #[test]
    fn rejects_bad_variant() {
        let err = agent("agent0", "{}").err().unwrap();
        assert!(matches!(err, AgentError::InvalidVariant { .. }));
    }
}
