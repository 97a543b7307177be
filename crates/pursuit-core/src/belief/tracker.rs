//! Belief tracking for one opponent: observation, transition and estimate operators.
//!
//! Observation update for a survey of node `s`:
//!
//! | prior             | found | new belief                                                   |
//! |-------------------|-------|--------------------------------------------------------------|
//! | any               | yes   | 1 at `s`, 0 elsewhere                                        |
//! | certain at `s`    | no    | `p` at `s`, `(1 - p) * spread(s)` on neighbors of `s`        |
//! | uncertain at `s`  | no    | `p` at `s`, others scaled by `(1 - p) / (1 - belief[s])`     |
//!
//! `p` is the sensor's false-negative probability (zero for a perfect sensor). The
//! spread is uniform over neighbors for the prey and follows the pursuit transition
//! column for the predator. Defective trackers additionally clear the agent's node
//! after every observation. With `p = 1` the sensor cannot detect anything, so a miss
//! leaves the belief as it was instead of piling all mass onto the surveyed node.

use super::sensor::Sensor;
use super::transition::TransitionMatrix;
use super::vector::BeliefVector;
use crate::config::GameConfig;
use crate::error::GameError;
use crate::model::entity::Entity;
use crate::model::graph::{Graph, NodeId};
use rand::Rng;

/// How the tracked entity is assumed to move between rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionModel {
    /// Uniform over staying and every neighbor; the matrix never changes.
    Wandering,
    /// Biased toward the agent; the matrix is rebuilt for each agent position.
    Pursuing,
}

/// A survey performed while estimating a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurveyRecord {
    pub node: NodeId,
    pub found: bool,
}

/// Result of [`BeliefTracker::estimate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    pub node: NodeId,
    pub survey: Option<SurveyRecord>,
}

#[derive(Debug, Clone)]
pub struct BeliefTracker {
    belief: BeliefVector,
    transition: TransitionMatrix,
    motion: MotionModel,
    sensor: Sensor,
    tolerance: f64,
}

impl BeliefTracker {
    /// Tracker for the randomly wandering prey.
    pub fn for_prey(
        config: &GameConfig,
        graph: &Graph,
        agent: NodeId,
        sensor: Sensor,
    ) -> Result<Self, GameError> {
        Self::new(
            config,
            graph,
            agent,
            sensor,
            MotionModel::Wandering,
            TransitionMatrix::prey(graph),
        )
    }

    /// Tracker for the predator chasing the agent.
    pub fn for_predator(
        config: &GameConfig,
        graph: &Graph,
        agent: NodeId,
        sensor: Sensor,
    ) -> Result<Self, GameError> {
        Self::new(
            config,
            graph,
            agent,
            sensor,
            MotionModel::Pursuing,
            TransitionMatrix::predator(graph, agent),
        )
    }

    fn new(
        config: &GameConfig,
        graph: &Graph,
        agent: NodeId,
        sensor: Sensor,
        motion: MotionModel,
        transition: TransitionMatrix,
    ) -> Result<Self, GameError> {
        let belief =
            BeliefVector::uniform_excluding(transition.entity(), graph.node_count(), agent);
        let tracker = Self {
            belief,
            transition,
            motion,
            sensor,
            tolerance: config.tolerance,
        };
        tracker.transition.verify(tracker.tolerance)?;
        tracker.belief.verify(tracker.tolerance)?;
        Ok(tracker)
    }

    pub fn target(&self) -> Entity {
        self.belief.entity()
    }

    pub fn belief(&self) -> &BeliefVector {
        &self.belief
    }

    pub fn transition(&self) -> &TransitionMatrix {
        &self.transition
    }

    pub fn motion(&self) -> MotionModel {
        self.motion
    }

    pub fn sensor(&self) -> Sensor {
        self.sensor
    }

    /// The node holding (numerically) all of the mass, if any.
    pub fn certain_node(&self) -> Option<NodeId> {
        self.belief.certain_node(self.tolerance)
    }

    /// Uniform choice among maximum-belief nodes.
    ///
    /// For the predator the candidates are first narrowed to those nearest the agent.
    pub fn highest_probability_node<R: Rng + ?Sized>(
        &self,
        graph: &Graph,
        agent: NodeId,
        rng: &mut R,
    ) -> NodeId {
        let mut candidates = self.belief.argmax_nodes();
        if self.motion == MotionModel::Pursuing && candidates.len() > 1 {
            let to_agent = graph.distances_from(agent);
            let nearest = candidates
                .iter()
                .map(|&node| to_agent[node])
                .min()
                .unwrap_or(u32::MAX);
            candidates.retain(|&node| to_agent[node] == nearest);
        }
        pick_uniform(&candidates, rng)
    }

    /// Queries the sensor about `node` against the board's occupancy flags.
    pub fn survey<R: Rng + ?Sized>(&self, graph: &Graph, node: NodeId, rng: &mut R) -> bool {
        let occupied = graph.is_occupied_by(node, self.target());
        self.sensor.survey(occupied, rng)
    }

    /// Applies the result of a sensor reading at `node`.
    pub fn observe(
        &mut self,
        graph: &Graph,
        agent: NodeId,
        node: NodeId,
        found: bool,
    ) -> Result<(), GameError> {
        let residual = self.sensor.residual();
        // A sensor that never detects learns nothing from a miss.
        if found || residual < 1.0 {
            self.apply_observation(graph, agent, node, found, residual)?;
        }
        if self.sensor.is_defective() {
            self.belief.exclude(agent);
        }
        self.belief.verify(self.tolerance)?;
        Ok(())
    }

    /// Records that the target is not on the agent's own node.
    ///
    /// The agent sees its own node directly, so no false-negative residual applies.
    pub fn rule_out_agent_node(&mut self, graph: &Graph, agent: NodeId) -> Result<(), GameError> {
        self.apply_observation(graph, agent, agent, false, 0.0)?;
        self.belief.verify(self.tolerance)?;
        Ok(())
    }

    /// Propagates the belief one round through the motion model.
    pub fn transition_update(&mut self, graph: &Graph, agent: NodeId) -> Result<(), GameError> {
        self.refresh_transition(graph, agent)?;
        self.belief.propagate(&self.transition);
        self.belief.verify(self.tolerance)?;
        Ok(())
    }

    /// Best guess of the target's node, surveying first unless already certain.
    pub fn estimate<R: Rng + ?Sized>(
        &mut self,
        graph: &Graph,
        agent: NodeId,
        rng: &mut R,
    ) -> Result<Estimate, GameError> {
        if let Some(node) = self.certain_node() {
            return Ok(Estimate { node, survey: None });
        }

        let surveyed = self.highest_probability_node(graph, agent, rng);
        let found = self.survey(graph, surveyed, rng);
        self.observe(graph, agent, surveyed, found)?;

        Ok(Estimate {
            node: self.highest_probability_node(graph, agent, rng),
            survey: Some(SurveyRecord {
                node: surveyed,
                found,
            }),
        })
    }

    fn refresh_transition(&mut self, graph: &Graph, agent: NodeId) -> Result<(), GameError> {
        if self.motion == MotionModel::Pursuing {
            self.transition.recompute_pursuit(graph, agent);
            self.transition.verify(self.tolerance)?;
        }
        Ok(())
    }

    fn apply_observation(
        &mut self,
        graph: &Graph,
        agent: NodeId,
        node: NodeId,
        found: bool,
        residual: f64,
    ) -> Result<(), GameError> {
        if found {
            self.belief.concentrate(node);
            return Ok(());
        }

        if (self.belief.prob(node) - 1.0).abs() > self.tolerance {
            self.belief.rule_out(node, residual);
            return Ok(());
        }

        let neighbors = graph.neighbors(node);
        match self.motion {
            MotionModel::Wandering => {
                let share = 1.0 / neighbors.len() as f64;
                self.belief
                    .spread_from(node, neighbors.iter().map(|&n| (n, share)), residual);
            }
            MotionModel::Pursuing => {
                self.transition.recompute_pursuit(graph, agent);
                self.transition.verify(self.tolerance)?;
                let column: Vec<(NodeId, f64)> = neighbors
                    .iter()
                    .map(|&n| (n, self.transition.get(n, node)))
                    .collect();
                self.belief.spread_from(node, column, residual);
            }
        }
        Ok(())
    }
}

fn pick_uniform<R: Rng + ?Sized>(candidates: &[NodeId], rng: &mut R) -> NodeId {
    debug_assert!(!candidates.is_empty(), "belief vector has no nodes");
    candidates[rng.gen_range(0..candidates.len())]
}
