use super::vector::BeliefVector;
use crate::model::entity::Entity;
use serde::{Deserialize, Serialize};

/// Summary statistics of one belief vector, captured for logging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeliefMetrics {
    pub entity: Entity,
    pub entropy: f64,
    pub max_probability: f64,
    pub support: usize,
    pub certain: bool,
}

impl BeliefMetrics {
    pub fn from_belief(belief: &BeliefVector, tolerance: f64) -> Self {
        let mut entropy = 0.0;
        let mut support = 0;
        for &p in belief.probs() {
            if p > 0.0 {
                entropy -= p * p.ln();
                support += 1;
            }
        }

        Self {
            entity: belief.entity(),
            entropy,
            max_probability: belief.max_prob(),
            support,
            certain: belief.certain_node(tolerance).is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_belief_has_maximal_entropy() {
        let belief = BeliefVector::uniform_excluding(Entity::Prey, 5, 0);
        let metrics = BeliefMetrics::from_belief(&belief, 1e-6);
        assert!((metrics.entropy - 4f64.ln()).abs() < 1e-12);
        assert_eq!(metrics.support, 4);
        assert!(!metrics.certain);
    }

    #[test]
    fn certain_belief_has_zero_entropy() {
        let mut belief = BeliefVector::uniform_excluding(Entity::Predator, 5, 0);
        belief.concentrate(2);
        let metrics = BeliefMetrics::from_belief(&belief, 1e-6);
        assert_eq!(metrics.entropy, 0.0);
        assert_eq!(metrics.support, 1);
        assert!(metrics.certain);
        assert_eq!(metrics.max_probability, 1.0);
    }
}
