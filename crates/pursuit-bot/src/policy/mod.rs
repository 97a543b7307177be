mod heuristic;
pub mod opponent;
mod predicate;

pub use heuristic::{PolicyParams, PredicatePolicy};
pub use predicate::{Distances, NeighborPredicate, UnknownPredicate};

use pursuit_core::model::graph::{Graph, NodeId};
use rand::RngCore;

/// Context provided to movement policies for one agent move.
///
/// `prey` and `predator` may be belief estimates rather than true positions.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub graph: &'a Graph,
    pub position: NodeId,
    pub prey: NodeId,
    pub predator: NodeId,
}

/// Chooses the agent's next node: its current node or one of its neighbors.
pub trait MovementPolicy: Send + Sync {
    fn name(&self) -> &str;

    fn choose_move(&self, ctx: &PolicyContext, rng: &mut dyn RngCore) -> NodeId;
}
