//! Parallel trial execution.
//!
//! A trial is one freshly generated graph on which every configured agent plays
//! `game.runs_per_trial` runs. Trial seeds are drawn up front from the configured seed,
//! and each trial derives its graph and run seeds from its own `StdRng`, so results do
//! not depend on how rayon schedules trials.

mod blueprint;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use pursuit_bot::engine::TurnEngine;
use pursuit_core::GameError;
use pursuit_core::game::{GameStatus, RunReport};
use pursuit_core::model::graph::Graph;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{BenchmarkConfig, ResolvedOutputs};
use crate::logging::{telemetry_dir, telemetry_path};
use crate::telemetry::{
    TelemetryError, TelemetryOutputs, append_highlights_to_markdown, write_summary_outputs,
};

use blueprint::AgentBlueprint;
pub use blueprint::AgentError;

/// Primary entry point for benchmark sweeps.
pub struct TrialRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    logging_enabled: bool,
}

/// Summary details returned after a sweep.
pub struct RunSummary {
    pub trials: usize,
    pub runs_per_trial: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub summary_json_path: PathBuf,
    pub plot_path: Option<PathBuf>,
    pub telemetry_path: Option<PathBuf>,
    pub telemetry_outputs: Option<TelemetryOutputs>,
}

impl TrialRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let agents = AgentBlueprint::from_configs(&config.agents)?;

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            agents,
        })
    }

    /// Execute every trial for every agent, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;
        if !self.outputs.plots_dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.outputs.plots_dir)?;
        }

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let trial_seeds = self.trial_seeds();
        let mut rows_written = 0usize;
        let mut analytics = AnalyticsCollector::new(&self.config);

        for agent in &self.agents {
            let outcomes = trial_seeds
                .par_iter()
                .enumerate()
                .map(|(trial_index, &seed)| self.play_trial(agent, trial_index, seed))
                .collect::<Result<Vec<_>, _>>()?;

            for outcome in &outcomes {
                analytics.record_trial(outcome)?;
                rows_written += write_run_rows(&mut writer, &self.config, agent, outcome)?;
            }
        }

        writer.flush()?;

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;
        let summary_json_path = self.outputs.summary_md.with_extension("json");
        summary.write_json(&summary_json_path)?;
        let plot_path = match summary.render_plot(&self.outputs.plots_dir) {
            Ok(path) => Some(path),
            Err(err) => {
                eprintln!("WARN: {}", err);
                None
            }
        };

        let telemetry_dir = telemetry_dir(&self.outputs);
        let telemetry_path = self
            .logging_enabled
            .then(|| telemetry_path(&self.outputs));

        let telemetry_outputs = if let Some(path) = telemetry_path.as_ref() {
            write_summary_outputs(path, &telemetry_dir)?
        } else {
            None
        };

        if let Some(outputs) = telemetry_outputs.as_ref() {
            append_highlights_to_markdown(&self.outputs.summary_md, outputs)?;
        }

        Ok(RunSummary {
            trials: trial_seeds.len(),
            runs_per_trial: self.config.game.runs_per_trial,
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            summary_json_path,
            plot_path,
            telemetry_path,
            telemetry_outputs,
        })
    }

    fn trial_seeds(&self) -> Vec<u64> {
        let mut rng = StdRng::seed_from_u64(self.config.trials.seed.unwrap_or(0));
        (0..self.config.trials.count)
            .map(|_| rng.next_u64())
            .collect()
    }

    /// Plays one trial for `agent`. Every agent sees the same graph and run seeds for a
    /// given trial index, so per-trial results pair up across agents.
    fn play_trial(
        &self,
        agent: &AgentBlueprint,
        trial_index: usize,
        trial_seed: u64,
    ) -> Result<TrialOutcome, RunnerError> {
        let game = self.config.game;
        let mut rng = StdRng::seed_from_u64(trial_seed);
        let graph = Graph::generate(&game, &mut rng);

        let mut runs = Vec::with_capacity(game.runs_per_trial);
        for run_index in 0..game.runs_per_trial {
            let seed = rng.next_u64();
            let mut engine = TurnEngine::new(graph.clone(), agent.setup(game, seed))?;
            let report = engine.run()?;
            runs.push(RunRecord {
                run_index,
                seed,
                report,
            });
        }

        let outcome = TrialOutcome {
            agent: agent.name.clone(),
            trial_index,
            trial_seed,
            runs,
        };

        if self.logging_enabled && tracing::enabled!(Level::INFO) {
            let tally = outcome.tally();
            event!(
                target: "pursuit_bench::trial",
                Level::INFO,
                run_id = %self.config.run_id,
                agent = %outcome.agent,
                variant = %agent.variant,
                trial_index = trial_index as u64,
                success = tally.success,
                failure = tally.failure,
                timeout = tally.timeout,
            );
        }

        Ok(outcome)
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_run_rows(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    agent: &AgentBlueprint,
    outcome: &TrialOutcome,
) -> Result<usize, RunnerError> {
    let variant = agent.variant.to_string();
    let mut rows_written = 0usize;
    for run in &outcome.runs {
        let row = RunLogRow {
            run_id: &config.run_id,
            agent: &outcome.agent,
            variant: &variant,
            trial_index: outcome.trial_index,
            trial_seed: outcome.trial_seed,
            run_index: run.run_index,
            run_seed: run.seed,
            status: run.report.status,
            rounds: run.report.rounds,
            agent_moves: run.report.agent_moves,
            prey_correct: run.report.prey_correct,
            predator_correct: run.report.predator_correct,
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }

    Ok(rows_written)
}

/// All runs one agent played on one trial graph.
pub struct TrialOutcome {
    pub agent: String,
    pub trial_index: usize,
    pub trial_seed: u64,
    pub runs: Vec<RunRecord>,
}

impl TrialOutcome {
    pub fn tally(&self) -> TrialTally {
        let mut tally = TrialTally::default();
        for run in &self.runs {
            tally.record(&run.report);
        }
        tally
    }
}

pub struct RunRecord {
    pub run_index: usize,
    pub seed: u64,
    pub report: RunReport,
}

/// Per-trial counts, one column each in the exported table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrialTally {
    pub success: u32,
    pub failure: u32,
    pub timeout: u32,
    pub total: u32,
    pub prey_correct: u64,
    pub predator_correct: u64,
    pub agent_moves: u64,
}

impl TrialTally {
    fn record(&mut self, report: &RunReport) {
        match report.status {
            GameStatus::Success => self.success += 1,
            GameStatus::Failure => self.failure += 1,
            GameStatus::Timeout => self.timeout += 1,
            GameStatus::InProgress => {}
        }
        self.total += 1;
        self.prey_correct += u64::from(report.prey_correct);
        self.predator_correct += u64::from(report.predator_correct);
        self.agent_moves += u64::from(report.agent_moves);
    }

    pub fn rate(&self, count: u32) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(count) / f64::from(self.total)
        }
    }
}

#[derive(Serialize)]
struct RunLogRow<'a> {
    run_id: &'a str,
    agent: &'a str,
    variant: &'a str,
    trial_index: usize,
    trial_seed: u64,
    run_index: usize,
    run_seed: u64,
    status: GameStatus,
    rounds: u32,
    agent_moves: u32,
    prey_correct: u32,
    predator_correct: u32,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("game execution failed: {0}")]
    Game(#[from] GameError),
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("telemetry summarisation failed: {0}")]
    Telemetry(#[from] TelemetryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: GameStatus, moves: u32) -> RunReport {
        RunReport {
            status,
            rounds: moves,
            agent_moves: moves,
            prey_correct: 1,
            predator_correct: 2,
        }
    }

    #[test]
    fn tally_counts_each_outcome() {
        let outcome = TrialOutcome {
            agent: "bot".to_string(),
            trial_index: 0,
            trial_seed: 9,
            runs: [
                report(GameStatus::Success, 3),
                report(GameStatus::Success, 4),
                report(GameStatus::Failure, 5),
                report(GameStatus::Timeout, 6),
            ]
            .into_iter()
            .enumerate()
            .map(|(run_index, report)| RunRecord {
                run_index,
                seed: run_index as u64,
                report,
            })
            .collect(),
        };

        let tally = outcome.tally();
        assert_eq!(tally.success, 2);
        assert_eq!(tally.failure, 1);
        assert_eq!(tally.timeout, 1);
        assert_eq!(tally.total, 4);
        assert_eq!(tally.agent_moves, 18);
        assert_eq!(tally.prey_correct, 4);
        assert_eq!(tally.predator_correct, 8);
        assert!((tally.rate(tally.success) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_tally_has_zero_rates() {
        assert_eq!(TrialTally::default().rate(0), 0.0);
    }
}
