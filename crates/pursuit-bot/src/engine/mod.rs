//! Turn sequencing for one run.
//!
//! A round is three sub-turns: agent, prey, predator. The status is evaluated after
//! every sub-turn, so a run can end mid-round. Belief bookkeeping per sub-turn:
//!
//! * agent: decide (surveys included), move, then rule out its new node for every
//!   tracked opponent;
//! * prey: move, propagate the prey belief, then rule out the agent's node;
//! * predator: move, close the round, propagate the predator belief against the
//!   agent's position, then rule out the agent's node.

mod observer;
mod setup;

pub use observer::{SnapshotRecorder, TurnObserver};
pub use setup::GameSetup;

use crate::bot::{Agent, PredatorBehavior};
use crate::policy::opponent::prey_move;
use pursuit_core::{ConfigError, GameError};
use pursuit_core::belief::BeliefMetrics;
use pursuit_core::game::{Board, BoardSnapshot, GameStatus, Positions, RunReport};
use pursuit_core::model::entity::Entity;
use pursuit_core::model::graph::Graph;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{Level, event};

pub struct TurnEngine {
    board: Board,
    agent: Agent,
    predator: PredatorBehavior,
    known_predator_start: bool,
    next_mover: Entity,
    last_mover: Option<Entity>,
    rng: StdRng,
}

impl TurnEngine {
    pub fn new(graph: Graph, setup: GameSetup) -> Result<Self, GameError> {
        let GameSetup {
            config,
            variant,
            seed,
            positions,
            policy,
            predator,
            known_predator_start,
        } = setup;
        config.validate()?;
        if graph.node_count() != config.node_count {
            return Err(ConfigError::GraphSize {
                expected: config.node_count,
                found: graph.node_count(),
            }
            .into());
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let positions =
            positions.unwrap_or_else(|| Positions::spawn(graph.node_count(), &mut rng));
        let board = Board::new(config, graph, positions)?;
        let policy = policy.unwrap_or_else(|| Box::new(variant.default_policy()));
        let agent = Agent::new(&config, board.graph(), positions.agent, variant, policy)?;

        Ok(Self {
            board,
            agent,
            predator: predator.unwrap_or_else(|| variant.opponent(&config)),
            known_predator_start: known_predator_start
                .unwrap_or_else(|| variant.knows_predator_start()),
            next_mover: Entity::Agent,
            last_mover: None,
            rng,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn predator_behavior(&self) -> PredatorBehavior {
        self.predator
    }

    pub fn status(&self) -> GameStatus {
        self.board.status()
    }

    pub fn next_mover(&self) -> Entity {
        self.next_mover
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::capture(&self.board, self.last_mover)
    }

    pub fn report(&self) -> RunReport {
        let counters = self.agent.counters();
        RunReport {
            status: self.board.status(),
            rounds: self.board.rounds(),
            agent_moves: counters.moves,
            prey_correct: counters.prey_correct,
            predator_correct: counters.predator_correct,
        }
    }

    /// Plays exactly one sub-turn unless the game is already over.
    pub fn advance(&mut self) -> Result<GameStatus, GameError> {
        if self.board.is_over() {
            return Ok(self.board.status());
        }

        let mover = self.next_mover;
        let status = match mover {
            Entity::Agent => self.agent_turn()?,
            Entity::Prey => self.prey_turn()?,
            Entity::Predator => self.predator_turn()?,
        };
        self.last_mover = Some(mover);
        self.next_mover = mover.next();
        self.log_sub_turn(mover);
        Ok(status)
    }

    /// Plays sub-turns until the round closes or the game ends.
    pub fn step_round(&mut self) -> Result<GameStatus, GameError> {
        loop {
            let status = self.advance()?;
            if status.is_terminal() || self.next_mover == Entity::Agent {
                return Ok(status);
            }
        }
    }

    pub fn run(&mut self) -> Result<RunReport, GameError> {
        while !self.board.is_over() {
            self.advance()?;
        }
        let report = self.report();
        self.log_finish(&report);
        Ok(report)
    }

    /// Like [`Self::run`], handing a snapshot to `observer` before the first
    /// sub-turn and after each one.
    pub fn run_observed(
        &mut self,
        observer: &mut dyn TurnObserver,
    ) -> Result<RunReport, GameError> {
        observer.on_sub_turn(&self.snapshot());
        while !self.board.is_over() {
            self.advance()?;
            observer.on_sub_turn(&self.snapshot());
        }
        let report = self.report();
        self.log_finish(&report);
        observer.on_finish(&report);
        Ok(report)
    }

    fn agent_turn(&mut self) -> Result<GameStatus, GameError> {
        let known_predator = (self.known_predator_start && self.agent.counters().moves == 0)
            .then(|| self.board.position(Entity::Predator));
        let decision = self.agent.decide(
            self.board.graph(),
            self.board.positions(),
            known_predator,
            &mut self.rng,
        )?;

        let status = self.board.move_entity(Entity::Agent, decision.destination);
        if status.is_terminal() {
            return Ok(status);
        }
        for entity in [Entity::Prey, Entity::Predator] {
            self.agent
                .rule_out_own_node(entity, self.board.graph(), decision.destination)?;
        }
        Ok(status)
    }

    fn prey_turn(&mut self) -> Result<GameStatus, GameError> {
        let from = self.board.position(Entity::Prey);
        let to = prey_move(self.board.graph(), from, &mut self.rng);
        let status = self.board.move_entity(Entity::Prey, to);
        self.settle(Entity::Prey, status)
    }

    fn predator_turn(&mut self) -> Result<GameStatus, GameError> {
        let from = self.board.position(Entity::Predator);
        let agent = self.board.position(Entity::Agent);
        let to = self
            .predator
            .choose_move(self.board.graph(), from, agent, &mut self.rng);
        self.board.move_entity(Entity::Predator, to);
        let status = self.board.complete_round();
        self.settle(Entity::Predator, status)
    }

    /// Belief bookkeeping after an opponent moved.
    fn settle(&mut self, entity: Entity, status: GameStatus) -> Result<GameStatus, GameError> {
        let agent = self.board.position(Entity::Agent);
        self.agent.propagate(entity, self.board.graph(), agent)?;
        if !status.is_terminal() {
            self.agent
                .rule_out_own_node(entity, self.board.graph(), agent)?;
        }
        Ok(status)
    }

    fn log_sub_turn(&self, mover: Entity) {
        if !tracing::enabled!(Level::DEBUG) {
            return;
        }

        let tolerance = self.board.config().tolerance;
        let metrics = |entity| {
            self.agent
                .tracker(entity)
                .map(|tracker| BeliefMetrics::from_belief(tracker.belief(), tolerance))
        };
        let prey = metrics(Entity::Prey);
        let predator = metrics(Entity::Predator);

        event!(
            target: "pursuit_bot::engine",
            Level::DEBUG,
            round = self.board.rounds(),
            mover = mover.as_str(),
            node = self.board.position(mover),
            status = self.board.status().as_str(),
            prey_entropy = prey.map(|m| m.entropy),
            prey_max_probability = prey.map(|m| m.max_probability),
            predator_entropy = predator.map(|m| m.entropy),
            predator_max_probability = predator.map(|m| m.max_probability),
        );
    }

    fn log_finish(&self, report: &RunReport) {
        if !tracing::enabled!(Level::INFO) {
            return;
        }

        event!(
            target: "pursuit_bot::engine",
            Level::INFO,
            variant = %self.agent.variant(),
            policy = self.agent.policy_name(),
            predator = self.predator.as_str(),
            status = report.status.as_str(),
            rounds = report.rounds,
            agent_moves = report.agent_moves,
            prey_correct = report.prey_correct,
            predator_correct = report.predator_correct,
        );
    }
}
