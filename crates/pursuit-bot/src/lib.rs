pub mod bot;
pub mod engine;
pub mod policy;

pub use bot::{Agent, AgentDecision, AgentVariant, Heuristic, PredatorBehavior};
pub use engine::{GameSetup, TurnEngine, TurnObserver};
pub use policy::{MovementPolicy, NeighborPredicate, PolicyContext, PredicatePolicy};
