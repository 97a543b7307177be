use super::board::{Board, Positions};
use super::status::GameStatus;
use crate::model::entity::Entity;
use crate::model::graph::NodeId;
use serde::{Deserialize, Serialize};

/// Read-only view of the board after one sub-turn, for renderers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardSnapshot {
    pub round: u32,
    pub mover: Option<Entity>,
    pub status: GameStatus,
    pub positions: Positions,
    pub adjacency: Vec<Vec<NodeId>>,
}

impl BoardSnapshot {
    /// `mover` is `None` for the state before any move.
    pub fn capture(board: &Board, mover: Option<Entity>) -> Self {
        BoardSnapshot {
            round: board.rounds(),
            mover,
            status: board.status(),
            positions: *board.positions(),
            adjacency: board.graph().adjacency(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Terminal outcome of one run plus the tracking counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub status: GameStatus,
    pub rounds: u32,
    pub agent_moves: u32,
    pub prey_correct: u32,
    pub predator_correct: u32,
}
