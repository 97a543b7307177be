pub mod board;
pub mod snapshot;
pub mod status;

pub use board::{Board, Positions};
pub use snapshot::{BoardSnapshot, RunReport};
pub use status::GameStatus;
