//! Probability vector over graph nodes for one tracked entity.

use super::transition::TransitionMatrix;
use crate::error::InvariantViolation;
use crate::model::entity::Entity;
use crate::model::graph::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub struct BeliefVector {
    entity: Entity,
    probs: Vec<f64>,
}

impl BeliefVector {
    /// Uniform mass over every node except `excluded`, which holds zero.
    pub fn uniform_excluding(entity: Entity, node_count: usize, excluded: NodeId) -> Self {
        let share = 1.0 / (node_count - 1) as f64;
        let probs = (0..node_count)
            .map(|node| if node == excluded { 0.0 } else { share })
            .collect();
        Self { entity, probs }
    }

    /// Wraps raw probabilities without checking them; call [`Self::verify`] afterwards.
    pub fn from_probs(entity: Entity, probs: Vec<f64>) -> Self {
        Self { entity, probs }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    pub fn prob(&self, node: NodeId) -> f64 {
        self.probs[node]
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.probs.iter().sum()
    }

    /// First node whose mass equals one within `tolerance`.
    pub fn certain_node(&self, tolerance: f64) -> Option<NodeId> {
        self.probs
            .iter()
            .position(|&p| (p - 1.0).abs() <= tolerance)
    }

    pub fn max_prob(&self) -> f64 {
        self.probs.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Every node attaining the maximum value exactly.
    pub fn argmax_nodes(&self) -> Vec<NodeId> {
        let max = self.max_prob();
        self.probs
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == max)
            .map(|(node, _)| node)
            .collect()
    }

    /// The maximum-probability node when no other node ties with it.
    pub fn unique_argmax(&self) -> Option<NodeId> {
        match self.argmax_nodes().as_slice() {
            [node] => Some(*node),
            _ => None,
        }
    }

    /// All mass on `node`.
    pub fn concentrate(&mut self, node: NodeId) {
        self.probs.fill(0.0);
        self.probs[node] = 1.0;
    }

    /// Replaces the vector by `residual` at `origin` and `(1 - residual) * weight`
    /// at each listed node. The weights are expected to sum to one.
    pub fn spread_from<I>(&mut self, origin: NodeId, weights: I, residual: f64)
    where
        I: IntoIterator<Item = (NodeId, f64)>,
    {
        self.probs.fill(0.0);
        for (node, weight) in weights {
            self.probs[node] = (1.0 - residual) * weight;
        }
        self.probs[origin] = residual;
    }

    /// Leaves `residual` at `node` and rescales the remaining nodes to carry `1 - residual`.
    pub fn rule_out(&mut self, node: NodeId, residual: f64) {
        let scale = (1.0 - residual) / (1.0 - self.probs[node]);
        for (index, p) in self.probs.iter_mut().enumerate() {
            if index != node {
                *p *= scale;
            }
        }
        self.probs[node] = residual;
    }

    /// Forces zero mass at `node`, renormalising the rest. No-op when already zero.
    pub fn exclude(&mut self, node: NodeId) {
        let mass = self.probs[node];
        if mass == 0.0 {
            return;
        }
        let scale = 1.0 / (1.0 - mass);
        for (index, p) in self.probs.iter_mut().enumerate() {
            if index != node {
                *p *= scale;
            }
        }
        self.probs[node] = 0.0;
    }

    /// `belief <- matrix * belief`.
    pub fn propagate(&mut self, matrix: &TransitionMatrix) {
        self.probs = matrix.apply(&self.probs);
    }

    /// Checks non-negativity and that the mass sums to one within `tolerance`.
    pub fn verify(&self, tolerance: f64) -> Result<(), InvariantViolation> {
        if let Some((node, value)) = self
            .probs
            .iter()
            .copied()
            .enumerate()
            .find(|(_, p)| *p < 0.0 || p.is_nan())
        {
            return Err(InvariantViolation::NegativeBelief {
                entity: self.entity,
                node,
                value,
            });
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > tolerance {
            return Err(InvariantViolation::BeliefSum {
                entity: self.entity,
                sum,
            });
        }
        Ok(())
    }
}
