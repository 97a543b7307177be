use crate::policy::opponent::{predator_move, random_neighbor};
use pursuit_core::model::graph::{Graph, NodeId};
use rand::Rng;

/// How the predator actually moves. Belief models always assume the focused pursuit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PredatorBehavior {
    #[default]
    Focused,
    /// With `probability` each turn, steps to a random neighbor instead of pursuing.
    Distracted { probability: f64 },
}

impl PredatorBehavior {
    pub fn choose_move<R: Rng + ?Sized>(
        self,
        graph: &Graph,
        at: NodeId,
        agent: NodeId,
        rng: &mut R,
    ) -> NodeId {
        match self {
            PredatorBehavior::Focused => predator_move(graph, at, agent, rng),
            PredatorBehavior::Distracted { probability } => {
                if rng.gen_bool(probability) {
                    random_neighbor(graph, at, rng)
                } else {
                    predator_move(graph, at, agent, rng)
                }
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PredatorBehavior::Focused => "focused",
            PredatorBehavior::Distracted { .. } => "distracted",
        }
    }
}
