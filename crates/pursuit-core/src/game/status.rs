use core::fmt;
use serde::{Deserialize, Serialize};

use super::board::Positions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Success,
    Failure,
    Timeout,
}

impl GameStatus {
    pub const TERMINAL: [GameStatus; 3] =
        [GameStatus::Success, GameStatus::Failure, GameStatus::Timeout];

    /// Status of a board after any single move.
    ///
    /// Meeting the prey wins even when the predator shares the node.
    pub fn evaluate(positions: &Positions, rounds: u32, step_limit: u32) -> Self {
        if positions.agent == positions.prey {
            GameStatus::Success
        } else if positions.agent == positions.predator {
            GameStatus::Failure
        } else if rounds >= step_limit {
            GameStatus::Timeout
        } else {
            GameStatus::InProgress
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            GameStatus::InProgress => "in_progress",
            GameStatus::Success => "success",
            GameStatus::Failure => "failure",
            GameStatus::Timeout => "timeout",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
