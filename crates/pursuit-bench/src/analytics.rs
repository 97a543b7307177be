use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;
use thiserror::Error;

use crate::config::BenchmarkConfig;
use crate::trial::{TrialOutcome, TrialTally};

const CONFIDENCE_Z: f64 = 1.96; // 95% CI
const TIMEOUT_GREY: RGBColor = RGBColor(150, 150, 150);

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("agent '{0}' present in results but missing from configuration")]
    UnknownAgent(String),
    #[error("baseline '{baseline}' has no result for trial {trial}")]
    MissingBaselineTrial { baseline: String, trial: usize },
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode summary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to render plot: {0}")]
    Plot(String),
}

/// Collects per-trial tallies in configuration order.
pub struct AnalyticsCollector {
    baseline: Option<String>,
    agents: Vec<AgentAccumulator>,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Self {
        let agents = config
            .agents
            .iter()
            .map(|agent| AgentAccumulator {
                name: agent.name.clone(),
                variant: agent.variant.clone(),
                params: agent.params.clone(),
                trials: Vec::new(),
            })
            .collect();

        Self {
            baseline: config.metrics.baseline.clone(),
            agents,
        }
    }

    pub fn record_trial(&mut self, outcome: &TrialOutcome) -> Result<(), AnalyticsError> {
        let acc = self
            .agents
            .iter_mut()
            .find(|acc| acc.name == outcome.agent)
            .ok_or_else(|| AnalyticsError::UnknownAgent(outcome.agent.clone()))?;
        acc.trials.push(outcome.tally());
        Ok(())
    }

    pub fn finalize(self) -> Result<AnalyticsSummary, AnalyticsError> {
        let baseline_rates = match self.baseline.as_ref() {
            Some(name) => self
                .agents
                .iter()
                .find(|acc| &acc.name == name)
                .map(AgentAccumulator::success_rates),
            None => None,
        };

        let mut comparisons = Vec::new();
        if let (Some(baseline), Some(base)) = (self.baseline.as_ref(), baseline_rates.as_ref()) {
            for acc in &self.agents {
                if &acc.name == baseline {
                    continue;
                }
                let rates = acc.success_rates();
                if rates.len() > base.len() {
                    return Err(AnalyticsError::MissingBaselineTrial {
                        baseline: baseline.clone(),
                        trial: base.len(),
                    });
                }
                let diffs: Vec<f64> = rates.iter().zip(base).map(|(a, b)| a - b).collect();
                let (p_value, sample_size) = wilcoxon_signed_rank(&diffs);
                comparisons.push(ComparisonReport {
                    agent: acc.name.clone(),
                    mean_success_delta: mean(&diffs),
                    p_value,
                    sample_size,
                });
            }
        }

        Ok(AnalyticsSummary {
            baseline: self.baseline,
            agents: self
                .agents
                .into_iter()
                .map(AgentAccumulator::into_report)
                .collect(),
            comparisons,
        })
    }
}

struct AgentAccumulator {
    name: String,
    variant: String,
    params: serde_yaml::Value,
    trials: Vec<TrialTally>,
}

impl AgentAccumulator {
    fn success_rates(&self) -> Vec<f64> {
        self.trials
            .iter()
            .map(|tally| tally.rate(tally.success))
            .collect()
    }

    fn column(&self, pick: impl Fn(&TrialTally) -> f64) -> ColumnStats {
        let values: Vec<f64> = self.trials.iter().map(pick).collect();
        ColumnStats::from_values(&values)
    }

    fn into_report(self) -> AgentReport {
        let success_rates = self.success_rates();
        AgentReport {
            success: self.column(|t| f64::from(t.success)),
            failure: self.column(|t| f64::from(t.failure)),
            timeout: self.column(|t| f64::from(t.timeout)),
            total: self.column(|t| f64::from(t.total)),
            prey_correct: self.column(|t| t.prey_correct as f64),
            predator_correct: self.column(|t| t.predator_correct as f64),
            agent_moves: self.column(|t| t.agent_moves as f64),
            success_rate: mean(&success_rates),
            failure_rate: mean(&self.rates(|t| t.failure)),
            timeout_rate: mean(&self.rates(|t| t.timeout)),
            success_rate_ci95: confidence_interval(&success_rates),
            runs: self.trials.iter().map(|t| t.total as usize).sum(),
            name: self.name,
            variant: self.variant,
            params: self.params,
            per_trial: self.trials,
        }
    }

    fn rates(&self, count: impl Fn(&TrialTally) -> u32) -> Vec<f64> {
        self.trials
            .iter()
            .map(|tally| tally.rate(count(tally)))
            .collect()
    }
}

/// Mean and population standard deviation of one column across trials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ColumnStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl ColumnStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        Self {
            mean: values.iter().mean(),
            std_dev: values.iter().population_std_dev(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: Option<String>,
    pub agents: Vec<AgentReport>,
    pub comparisons: Vec<ComparisonReport>,
}

impl AnalyticsSummary {
    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Trial Summary\n\n");
        rows.push_str("Counts are per trial, reported as mean ± population std-dev.\n\n");
        rows.push_str("| Agent | Variant | Runs | Success | Failure | Timeout | Success rate | 95% CI | Prey correct | Predator correct | Moves |\n");
        rows.push_str("|-------|---------|------|---------|---------|---------|--------------|--------|--------------|------------------|-------|\n");

        for agent in &self.agents {
            rows.push_str(&format!(
                "| {name} | {variant} | {runs} | {success} | {failure} | {timeout} | {rate:.1}% | [{ci_low:.3}, {ci_high:.3}] | {prey} | {predator} | {moves} |\n",
                name = agent.name,
                variant = agent.variant,
                runs = agent.runs,
                success = cell(agent.success),
                failure = cell(agent.failure),
                timeout = cell(agent.timeout),
                rate = agent.success_rate * 100.0,
                ci_low = agent.success_rate_ci95.0,
                ci_high = agent.success_rate_ci95.1,
                prey = cell(agent.prey_correct),
                predator = cell(agent.predator_correct),
                moves = cell(agent.agent_moves),
            ));
        }

        if let Some(baseline) = self.baseline.as_ref().filter(|_| !self.comparisons.is_empty()) {
            rows.push_str(&format!("\n## Versus baseline `{baseline}`\n\n"));
            rows.push_str("| Agent | Δ success rate | p-value | Trials |\n");
            rows.push_str("|-------|----------------|---------|--------|\n");
            for comparison in &self.comparisons {
                rows.push_str(&format!(
                    "| {} | {:+.3} | {:.3} | {} |\n",
                    comparison.agent,
                    comparison.mean_success_delta,
                    comparison.p_value,
                    comparison.sample_size
                ));
            }
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }

    /// Writes the full summary, per-trial tallies included, as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json).map_err(|e| AnalyticsError::Io {
            context: "writing summary json",
            source: e,
        })
    }

    /// Stacked success / failure / timeout rates, one bar per agent.
    pub fn render_plot(&self, dir: impl AsRef<Path>) -> Result<PathBuf, AnalyticsError> {
        let dir = dir.as_ref();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| AnalyticsError::Io {
                context: "creating plots directory",
                source: e,
            })?;
        }

        let output_path = dir.join("outcome_rates.png");
        let agents = self.agents.clone();

        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let plot_attempt = std::panic::catch_unwind(move || -> Result<PathBuf, AnalyticsError> {
            let root = BitMapBackend::new(&output_path, (800, 480)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .caption("Outcome rates per agent", ("sans-serif", 22))
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 60)
                .build_cartesian_2d(0..agents.len(), 0.0..1.0)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .configure_mesh()
                .disable_mesh()
                .y_desc("Share of runs")
                .x_desc("Agent")
                .x_label_formatter(&|idx: &usize| {
                    agents
                        .get(*idx)
                        .map(|agent| agent.name.clone())
                        .unwrap_or_default()
                })
                .draw()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            for (idx, agent) in agents.iter().enumerate() {
                let success_top = agent.success_rate;
                let failure_top = success_top + agent.failure_rate;
                let timeout_top = failure_top + agent.timeout_rate;
                let segments = [
                    (0.0, success_top, GREEN),
                    (success_top, failure_top, RED),
                    (failure_top, timeout_top, TIMEOUT_GREY),
                ];
                chart
                    .draw_series(segments.into_iter().map(|(low, high, color)| {
                        Rectangle::new([(idx, low), (idx + 1, high)], color.filled())
                    }))
                    .map_err(|e| AnalyticsError::Plot(e.to_string()))?;
            }

            drop(chart);

            root.present()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(root);

            Ok(output_path)
        });

        std::panic::set_hook(prev_hook);

        match plot_attempt {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::Plot(
                "plotters panicked while rendering (missing font support?)".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub variant: String,
    pub params: serde_yaml::Value,
    pub runs: usize,
    pub success: ColumnStats,
    pub failure: ColumnStats,
    pub timeout: ColumnStats,
    pub total: ColumnStats,
    pub prey_correct: ColumnStats,
    pub predator_correct: ColumnStats,
    pub agent_moves: ColumnStats,
    pub success_rate: f64,
    pub failure_rate: f64,
    pub timeout_rate: f64,
    pub success_rate_ci95: (f64, f64),
    pub per_trial: Vec<TrialTally>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub agent: String,
    pub mean_success_delta: f64,
    pub p_value: f64,
    pub sample_size: usize,
}

fn cell(stats: ColumnStats) -> String {
    format!("{:.2} ± {:.2}", stats.mean, stats.std_dev)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = mean(points);
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}

/// Two-sided paired signed-rank test under the normal approximation.
///
/// Returns the p-value and the number of non-zero differences used.
fn wilcoxon_signed_rank(diffs: &[f64]) -> (f64, usize) {
    let mut paired: Vec<(f64, f64)> = diffs
        .iter()
        .filter(|d| d.abs() > f64::EPSILON)
        .map(|d| (d.abs(), d.signum()))
        .collect();
    let n = paired.len();
    if n == 0 {
        return (1.0, 0);
    }
    paired.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut w_plus = 0.0;
    let mut w_minus = 0.0;
    let mut tie_adjustment = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && (paired[j + 1].0 - paired[i].0).abs() < 1e-12 {
            j += 1;
        }
        let rank = (i + j + 2) as f64 / 2.0;
        for (_, sign) in &paired[i..=j] {
            if *sign > 0.0 {
                w_plus += rank;
            } else {
                w_minus += rank;
            }
        }
        let ties = (j - i + 1) as f64;
        if ties > 1.0 {
            tie_adjustment += (ties.powi(3) - ties) / 48.0;
        }
        i = j + 1;
    }

    let w = f64::min(w_plus, w_minus);
    let n_f = n as f64;
    let mean_w = n_f * (n_f + 1.0) / 4.0;
    let variance_w = n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) / 24.0 - tie_adjustment;
    if variance_w <= 0.0 {
        return (1.0, n);
    }

    let Ok(normal) = Normal::new(0.0, 1.0) else {
        return (1.0, n);
    };
    let z = (((w - mean_w).abs() - 0.5) / variance_w.sqrt()).max(0.0);
    let p = 2.0 * (1.0 - normal.cdf(z));
    (p.clamp(0.0, 1.0), n)
}
