use super::AgentVariant;
use crate::policy::{MovementPolicy, PolicyContext};
use pursuit_core::belief::{BeliefTracker, SurveyRecord};
use pursuit_core::game::Positions;
use pursuit_core::model::entity::Entity;
use pursuit_core::model::graph::{Graph, NodeId};
use pursuit_core::{GameConfig, GameError};
use rand::Rng;
use tracing::{Level, event};

/// Per-run tallies reported when the game ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackingCounters {
    pub moves: u32,
    pub prey_correct: u32,
    pub predator_correct: u32,
}

/// Outcome of one agent decision, before the board applies the move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDecision {
    pub destination: NodeId,
    pub prey_target: NodeId,
    pub predator_target: NodeId,
    pub surveys: Vec<(Entity, SurveyRecord)>,
}

pub struct Agent {
    variant: AgentVariant,
    policy: Box<dyn MovementPolicy>,
    prey: Option<BeliefTracker>,
    predator: Option<BeliefTracker>,
    counters: TrackingCounters,
}

impl Agent {
    pub fn new(
        config: &GameConfig,
        graph: &Graph,
        position: NodeId,
        variant: AgentVariant,
        policy: Box<dyn MovementPolicy>,
    ) -> Result<Self, GameError> {
        let sensor = variant.sensor(config);
        let prey = variant
            .tracks_prey
            .then(|| BeliefTracker::for_prey(config, graph, position, sensor))
            .transpose()?;
        let predator = variant
            .tracks_predator
            .then(|| BeliefTracker::for_predator(config, graph, position, sensor))
            .transpose()?;

        Ok(Self {
            variant,
            policy,
            prey,
            predator,
            counters: TrackingCounters::default(),
        })
    }

    pub fn variant(&self) -> AgentVariant {
        self.variant
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    pub fn counters(&self) -> TrackingCounters {
        self.counters
    }

    pub fn tracker(&self, entity: Entity) -> Option<&BeliefTracker> {
        match entity {
            Entity::Prey => self.prey.as_ref(),
            Entity::Predator => self.predator.as_ref(),
            Entity::Agent => None,
        }
    }

    fn tracker_mut(&mut self, entity: Entity) -> Option<&mut BeliefTracker> {
        match entity {
            Entity::Prey => self.prey.as_mut(),
            Entity::Predator => self.predator.as_mut(),
            Entity::Agent => None,
        }
    }

    /// Resolves where the opponents are and picks the next node.
    ///
    /// Untracked opponents are read from `truth`. At most one survey is spent per turn,
    /// on the predator while it is uncertain and otherwise on the prey.
    /// `known_predator` is applied as a detection without using the sensor.
    pub fn decide<R: Rng>(
        &mut self,
        graph: &Graph,
        truth: &Positions,
        known_predator: Option<NodeId>,
        rng: &mut R,
    ) -> Result<AgentDecision, GameError> {
        let position = truth.agent;
        let mut surveys = Vec::new();

        if let (Some(node), Some(tracker)) = (known_predator, self.predator.as_mut()) {
            tracker.observe(graph, position, node, true)?;
        }

        let predator_uncertain = self
            .predator
            .as_ref()
            .is_some_and(|tracker| tracker.certain_node().is_none());
        let survey_target = if predator_uncertain {
            Some(Entity::Predator)
        } else if self
            .prey
            .as_ref()
            .is_some_and(|tracker| tracker.certain_node().is_none())
        {
            Some(Entity::Prey)
        } else {
            None
        };

        let mut resolve = |entity: Entity, agent: &mut Agent| -> Result<NodeId, GameError> {
            let Some(tracker) = agent.tracker_mut(entity) else {
                return Ok(truth.get(entity));
            };
            if survey_target == Some(entity) {
                let estimate = tracker.estimate(graph, position, rng)?;
                if let Some(record) = estimate.survey {
                    log_survey(entity, position, record);
                    surveys.push((entity, record));
                }
                return Ok(estimate.node);
            }
            Ok(tracker
                .certain_node()
                .unwrap_or_else(|| tracker.highest_probability_node(graph, position, rng)))
        };
        let predator_target = resolve(Entity::Predator, self)?;
        let prey_target = resolve(Entity::Prey, self)?;

        self.record_accuracy(truth);

        let ctx = PolicyContext {
            graph,
            position,
            prey: prey_target,
            predator: predator_target,
        };
        let destination = self.policy.choose_move(&ctx, rng);
        self.counters.moves += 1;

        Ok(AgentDecision {
            destination,
            prey_target,
            predator_target,
            surveys,
        })
    }

    fn record_accuracy(&mut self, truth: &Positions) {
        let hit = |tracker: Option<&BeliefTracker>, actual: NodeId| {
            tracker.and_then(|t| t.belief().unique_argmax()) == Some(actual)
        };
        if hit(self.prey.as_ref(), truth.prey) {
            self.counters.prey_correct += 1;
        }
        if hit(self.predator.as_ref(), truth.predator) {
            self.counters.predator_correct += 1;
        }
    }

    /// Rules out the agent's node for `entity`, if tracked.
    pub fn rule_out_own_node(
        &mut self,
        entity: Entity,
        graph: &Graph,
        position: NodeId,
    ) -> Result<(), GameError> {
        if let Some(tracker) = self.tracker_mut(entity) {
            tracker.rule_out_agent_node(graph, position)?;
        }
        Ok(())
    }

    /// Propagates the belief about `entity` after it moved, if tracked.
    pub fn propagate(
        &mut self,
        entity: Entity,
        graph: &Graph,
        position: NodeId,
    ) -> Result<(), GameError> {
        if let Some(tracker) = self.tracker_mut(entity) {
            tracker.transition_update(graph, position)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("variant", &self.variant)
            .field("policy", &self.policy.name())
            .field("counters", &self.counters)
            .finish()
    }
}

/// Off unless the subscriber enables the `pursuit_bot::survey` target.
fn log_survey(entity: Entity, position: NodeId, record: SurveyRecord) {
    if !tracing::enabled!(target: "pursuit_bot::survey", Level::INFO) {
        return;
    }

    event!(
        target: "pursuit_bot::survey",
        Level::INFO,
        entity = entity.as_str(),
        agent = position,
        node = record.node,
        found = record.found,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PredicatePolicy;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ring_board(
        n: usize,
        agent: NodeId,
        prey: NodeId,
        predator: NodeId,
    ) -> (GameConfig, Graph, Positions) {
        let mut graph = Graph::ring(n);
        graph.place(Entity::Agent, agent);
        graph.place(Entity::Prey, prey);
        graph.place(Entity::Predator, predator);
        let positions = Positions {
            agent,
            prey,
            predator,
        };
        (GameConfig::with_node_count(n), graph, positions)
    }

    fn agent(config: &GameConfig, graph: &Graph, at: NodeId, number: u8) -> Agent {
        let variant = AgentVariant::roster(number).unwrap();
        Agent::new(config, graph, at, variant, Box::new(variant.default_policy())).unwrap()
    }

    #[test]
    fn fully_informed_agent_uses_true_positions() {
        let (config, graph, truth) = ring_board(10, 0, 3, 7);
        let mut rng = StdRng::seed_from_u64(1);
        let mut agent = agent(&config, &graph, 0, 1);
        let decision = agent.decide(&graph, &truth, None, &mut rng).unwrap();
        assert_eq!(decision.prey_target, 3);
        assert_eq!(decision.predator_target, 7);
        assert!(decision.surveys.is_empty());
        assert_eq!(decision.destination, 1);
        assert_eq!(agent.counters().moves, 1);
    }

    #[test]
    fn combined_agent_surveys_predator_first() {
        let (config, graph, truth) = ring_board(10, 0, 3, 7);
        let mut rng = StdRng::seed_from_u64(2);
        let mut agent = agent(&config, &graph, 0, 7);
        let decision = agent.decide(&graph, &truth, None, &mut rng).unwrap();
        assert_eq!(decision.surveys.len(), 1);
        assert_eq!(decision.surveys[0].0, Entity::Predator);
    }

    #[test]
    fn known_predator_start_skips_predator_survey() {
        let (config, graph, truth) = ring_board(10, 0, 3, 7);
        let mut rng = StdRng::seed_from_u64(3);
        let mut agent = agent(&config, &graph, 0, 7);
        let decision = agent.decide(&graph, &truth, Some(7), &mut rng).unwrap();
        assert_eq!(decision.predator_target, 7);
        assert_eq!(decision.surveys.len(), 1);
        assert_eq!(decision.surveys[0].0, Entity::Prey);
        assert_eq!(agent.counters().predator_correct, 1);
    }

    #[test]
    fn rule_out_own_node_clears_tracked_beliefs() {
        let (config, graph, truth) = ring_board(10, 0, 3, 7);
        let mut rng = StdRng::seed_from_u64(4);
        let mut agent = agent(&config, &graph, 0, 8);
        let decision = agent.decide(&graph, &truth, None, &mut rng).unwrap();
        for entity in [Entity::Prey, Entity::Predator] {
            agent
                .rule_out_own_node(entity, &graph, decision.destination)
                .unwrap();
            let belief = agent.tracker(entity).unwrap().belief();
            assert_eq!(belief.prob(decision.destination), 0.0);
        }
    }

    #[test]
    fn custom_policy_is_used() {
        let (config, graph, truth) = ring_board(10, 0, 3, 7);
        let mut rng = StdRng::seed_from_u64(5);
        let variant = AgentVariant::roster(3).unwrap();
        let policy = PredicatePolicy::new("custom", crate::policy::PolicyParams {
            predicates: vec![],
            route_around_predator: false,
        });
        let mut agent = Agent::new(&config, &graph, 0, variant, Box::new(policy)).unwrap();
        assert_eq!(agent.policy_name(), "custom");
        let decision = agent.decide(&graph, &truth, None, &mut rng).unwrap();
        assert_eq!(decision.destination, 0);
    }
}
