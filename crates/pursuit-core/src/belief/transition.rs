//! Column-stochastic transition matrices used to propagate beliefs one round.
//!
//! Column `i` holds `P(next node | current node = i)`.

use crate::error::InvariantViolation;
use crate::model::entity::Entity;
use crate::model::graph::{Graph, NodeId};

/// Share of the predator's move the belief model attributes to pursuit.
/// The remainder is spread evenly over all neighbors.
pub const PREDATOR_PURSUIT_BIAS: f64 = 0.6;

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    entity: Entity,
    size: usize,
    cells: Vec<f64>,
}

impl TransitionMatrix {
    fn zeroed(entity: Entity, size: usize) -> Self {
        Self {
            entity,
            size,
            cells: vec![0.0; size * size],
        }
    }

    /// Prey model: stay or move to any neighbor with equal probability.
    pub fn prey(graph: &Graph) -> Self {
        let n = graph.node_count();
        let mut matrix = Self::zeroed(Entity::Prey, n);
        for col in 0..n {
            let neighbors = graph.neighbors(col);
            let p = 1.0 / (neighbors.len() + 1) as f64;
            matrix.set(col, col, p);
            for &row in neighbors {
                matrix.set(row, col, p);
            }
        }
        matrix
    }

    /// Predator model biased toward the agent standing at `agent`.
    pub fn predator(graph: &Graph, agent: NodeId) -> Self {
        let mut matrix = Self::zeroed(Entity::Predator, graph.node_count());
        matrix.recompute_pursuit(graph, agent);
        matrix
    }

    /// Rebuilds every column for the agent's current position.
    ///
    /// Neighbors at minimum distance to the agent split [`PREDATOR_PURSUIT_BIAS`];
    /// every neighbor also receives an equal share of the remaining mass.
    pub fn recompute_pursuit(&mut self, graph: &Graph, agent: NodeId) {
        let to_agent = graph.distances_from(agent);
        self.cells.fill(0.0);
        for col in 0..self.size {
            let neighbors = graph.neighbors(col);
            if neighbors.is_empty() {
                continue;
            }
            let nearest = neighbors
                .iter()
                .map(|&n| to_agent[n])
                .min()
                .unwrap_or(u32::MAX);
            let closest = neighbors
                .iter()
                .filter(|&&n| to_agent[n] == nearest)
                .count();
            let background = (1.0 - PREDATOR_PURSUIT_BIAS) / neighbors.len() as f64;
            let pursuit = PREDATOR_PURSUIT_BIAS / closest as f64;
            for &row in neighbors {
                let p = if to_agent[row] == nearest {
                    pursuit + background
                } else {
                    background
                };
                self.set(row, col, p);
            }
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// `P(next = row | current = col)`.
    pub fn get(&self, row: NodeId, col: NodeId) -> f64 {
        self.cells[row * self.size + col]
    }

    fn set(&mut self, row: NodeId, col: NodeId, value: f64) {
        self.cells[row * self.size + col] = value;
    }

    pub fn column_sum(&self, col: NodeId) -> f64 {
        (0..self.size).map(|row| self.get(row, col)).sum()
    }

    /// Matrix-vector product `self * belief`.
    pub fn apply(&self, belief: &[f64]) -> Vec<f64> {
        let mut next = vec![0.0; self.size];
        for (col, &mass) in belief.iter().enumerate() {
            if mass == 0.0 {
                continue;
            }
            for (row, slot) in next.iter_mut().enumerate() {
                *slot += self.get(row, col) * mass;
            }
        }
        next
    }

    /// Every column must sum to one within `tolerance`.
    pub fn verify(&self, tolerance: f64) -> Result<(), InvariantViolation> {
        for col in 0..self.size {
            let sum = self.column_sum(col);
            if (sum - 1.0).abs() > tolerance {
                return Err(InvariantViolation::TransitionColumn {
                    entity: self.entity,
                    column: col,
                    sum,
                });
            }
        }
        Ok(())
    }
}
