//! Ground-truth board: the graph, entity positions, round counter and status.

use super::status::GameStatus;
use crate::config::{ConfigError, GameConfig};
use crate::error::GameError;
use crate::model::entity::Entity;
use crate::model::graph::{Graph, NodeId};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Positions {
    pub agent: NodeId,
    pub prey: NodeId,
    pub predator: NodeId,
}

impl Positions {
    pub fn get(&self, entity: Entity) -> NodeId {
        match entity {
            Entity::Agent => self.agent,
            Entity::Prey => self.prey,
            Entity::Predator => self.predator,
        }
    }

    fn set(&mut self, entity: Entity, node: NodeId) {
        match entity {
            Entity::Agent => self.agent = node,
            Entity::Prey => self.prey = node,
            Entity::Predator => self.predator = node,
        }
    }

    /// Agent anywhere; prey and predator anywhere except the agent's node.
    pub fn spawn<R: Rng + ?Sized>(node_count: usize, rng: &mut R) -> Self {
        let agent = rng.gen_range(0..node_count);
        let mut away_from_agent = || loop {
            let node = rng.gen_range(0..node_count);
            if node != agent {
                break node;
            }
        };
        let prey = away_from_agent();
        let predator = away_from_agent();
        Self {
            agent,
            prey,
            predator,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    config: GameConfig,
    graph: Graph,
    positions: Positions,
    rounds: u32,
    status: GameStatus,
}

impl Board {
    /// Places the three entities and evaluates the starting status.
    ///
    /// Positions are not required to be distinct, so a board may start terminal.
    pub fn new(
        config: GameConfig,
        mut graph: Graph,
        positions: Positions,
    ) -> Result<Self, GameError> {
        config.validate()?;
        if graph.node_count() != config.node_count {
            return Err(ConfigError::GraphSize {
                expected: config.node_count,
                found: graph.node_count(),
            }
            .into());
        }
        for entity in Entity::TURN_ORDER {
            let node = positions.get(entity);
            if !graph.contains(node) {
                return Err(ConfigError::SpawnOutOfRange {
                    node,
                    node_count: graph.node_count(),
                }
                .into());
            }
        }

        graph.clear_occupants();
        for entity in Entity::TURN_ORDER {
            graph.place(entity, positions.get(entity));
        }

        Ok(Self {
            config,
            graph,
            status: GameStatus::evaluate(&positions, 0, config.step_limit),
            positions,
            rounds: 0,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn positions(&self) -> &Positions {
        &self.positions
    }

    pub fn position(&self, entity: Entity) -> NodeId {
        self.positions.get(entity)
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status.is_terminal()
    }

    /// Moves `entity` to `to`, updating occupancy flags, and re-evaluates the status.
    pub fn move_entity(&mut self, entity: Entity, to: NodeId) -> GameStatus {
        debug_assert!(self.graph.contains(to), "move target {to} out of range");
        let from = self.positions.get(entity);
        self.graph.relocate(entity, from, to);
        self.positions.set(entity, to);
        self.refresh_status()
    }

    /// Closes the current round and re-evaluates the status against the step limit.
    pub fn complete_round(&mut self) -> GameStatus {
        self.rounds += 1;
        self.refresh_status()
    }

    fn refresh_status(&mut self) -> GameStatus {
        self.status = GameStatus::evaluate(&self.positions, self.rounds, self.config.step_limit);
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn positions(agent: NodeId, prey: NodeId, predator: NodeId) -> Positions {
        Positions {
            agent,
            prey,
            predator,
        }
    }

    #[test]
    fn spawn_keeps_opponents_off_agent() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let spawned = Positions::spawn(5, &mut rng);
            assert_ne!(spawned.agent, spawned.prey);
            assert_ne!(spawned.agent, spawned.predator);
        }
    }

    #[test]
    fn new_board_flags_occupants() {
        let config = GameConfig::with_node_count(6);
        let board = Board::new(config, Graph::ring(6), positions(0, 2, 4)).unwrap();
        assert!(board.graph().is_occupied_by(2, Entity::Prey));
        assert!(board.graph().is_occupied_by(4, Entity::Predator));
        assert_eq!(board.status(), GameStatus::InProgress);
    }

    #[test]
    fn forced_overlap_starts_terminal() {
        let config = GameConfig::with_node_count(6);
        let board = Board::new(config, Graph::ring(6), positions(0, 0, 3)).unwrap();
        assert_eq!(board.status(), GameStatus::Success);
    }

    #[test]
    fn rejects_out_of_range_positions_and_size_mismatch() {
        let config = GameConfig::with_node_count(6);
        let err = Board::new(config, Graph::ring(6), positions(0, 9, 3)).unwrap_err();
        assert_eq!(
            err,
            GameError::Config(ConfigError::SpawnOutOfRange {
                node: 9,
                node_count: 6
            })
        );
        let err = Board::new(config, Graph::ring(8), positions(0, 1, 3)).unwrap_err();
        assert!(matches!(err, GameError::Config(ConfigError::GraphSize { .. })));
    }

    #[test]
    fn moves_update_flags_and_status() {
        let config = GameConfig::with_node_count(6);
        let mut board = Board::new(config, Graph::ring(6), positions(0, 3, 2)).unwrap();
        assert_eq!(board.move_entity(Entity::Predator, 1), GameStatus::InProgress);
        assert!(!board.graph().is_occupied_by(2, Entity::Predator));
        assert!(board.graph().is_occupied_by(1, Entity::Predator));
        assert_eq!(board.move_entity(Entity::Predator, 0), GameStatus::Failure);
    }

    #[test]
    fn round_counter_drives_timeout() {
        let config = GameConfig {
            step_limit: 2,
            ..GameConfig::with_node_count(6)
        };
        let mut board = Board::new(config, Graph::ring(6), positions(0, 3, 2)).unwrap();
        assert_eq!(board.complete_round(), GameStatus::InProgress);
        assert_eq!(board.complete_round(), GameStatus::Timeout);
        assert_eq!(board.rounds(), 2);
    }
}
