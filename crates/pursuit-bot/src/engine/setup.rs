use crate::bot::{AgentVariant, PredatorBehavior};
use crate::policy::MovementPolicy;
use pursuit_core::GameConfig;
use pursuit_core::game::Positions;

/// Everything needed to start one run on a given graph.
///
/// Unset overrides fall back to the variant's defaults and random spawns.
pub struct GameSetup {
    pub config: GameConfig,
    pub variant: AgentVariant,
    pub seed: u64,
    pub(crate) positions: Option<Positions>,
    pub(crate) policy: Option<Box<dyn MovementPolicy>>,
    pub(crate) predator: Option<PredatorBehavior>,
    pub(crate) known_predator_start: Option<bool>,
}

impl GameSetup {
    pub fn new(config: GameConfig, variant: AgentVariant, seed: u64) -> Self {
        Self {
            config,
            variant,
            seed,
            positions: None,
            policy: None,
            predator: None,
            known_predator_start: None,
        }
    }

    /// Forces spawn positions. Overlapping positions are allowed.
    pub fn with_positions(mut self, positions: Positions) -> Self {
        self.positions = Some(positions);
        self
    }

    pub fn with_policy(mut self, policy: Box<dyn MovementPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_predator(mut self, behavior: PredatorBehavior) -> Self {
        self.predator = Some(behavior);
        self
    }

    pub fn with_known_predator_start(mut self, known: bool) -> Self {
        self.known_predator_start = Some(known);
        self
    }
}
