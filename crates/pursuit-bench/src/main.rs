use std::path::PathBuf;

use clap::Parser;

use pursuit_bench::config::BenchmarkConfig;
use pursuit_bench::logging::init_logging;
use pursuit_bench::trial::{RunSummary, TrialRunner};
use pursuit_core::AppInfo;

/// Trial harness for the pursuit agents.
#[derive(Debug, Parser)]
#[command(
    name = "pursuit-bench",
    author,
    version,
    about = "Deterministic pursuit trial harness"
)]
struct Cli {
    /// Sweep description (YAML).
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Replaces `run_id`, and with it every `{run_id}` in the output paths.
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Number of freshly generated graphs.
    #[arg(long, value_name = "TRIALS")]
    trials: Option<usize>,

    /// Seed for graph generation and spawns.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Games per agent on each graph.
    #[arg(long, value_name = "RUNS")]
    runs: Option<usize>,

    /// Stop once the sweep file and agents check out.
    #[arg(long)]
    validate_only: bool,

    /// Log every survey regardless of config.
    #[arg(long)]
    log_survey_details: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut BenchmarkConfig) {
        if let Some(run_id) = &self.run_id {
            config.run_id.clone_from(run_id);
        }
        config.trials.count = self.trials.unwrap_or(config.trials.count);
        config.trials.seed = self.seed.or(config.trials.seed);
        config.game.runs_per_trial = self.runs.unwrap_or(config.game.runs_per_trial);
        config.logging.survey_details |= self.log_survey_details;
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let outputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let agents = config.agents.len();
    println!(
        "{} {}: sweep '{run_id}', {agents} agent{}, {} trials x {} runs",
        AppInfo::name(),
        AppInfo::version(),
        if agents == 1 { "" } else { "s" },
        config.trials.count,
        config.game.runs_per_trial
    );

    let _logging = init_logging(&config.logging, &outputs)?;
    let runner = TrialRunner::new(config, outputs)?;
    if cli.validate_only {
        println!("Configuration is valid; no trials were run.");
        return Ok(());
    }

    let summary = runner.run()?;
    report(&run_id, &summary);
    Ok(())
}

fn report(run_id: &str, summary: &RunSummary) {
    println!(
        "Sweep '{run_id}' finished: {} trials x {} runs, {} rows in {}",
        summary.trials,
        summary.runs_per_trial,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    let artifacts = [
        ("Summary table", Some(&summary.summary_path)),
        ("Summary data", Some(&summary.summary_json_path)),
        ("Outcome plot", summary.plot_path.as_ref()),
        ("Telemetry log", summary.telemetry_path.as_ref()),
    ];
    for (label, path) in artifacts {
        if let Some(path) = path {
            println!("{label}: {}", path.display());
        }
    }

    let Some(telemetry) = &summary.telemetry_outputs else {
        return;
    };
    println!("Telemetry digest: {}", telemetry.markdown_path.display());
    println!(
        "  {} surveys logged across {} games",
        telemetry.summary.surveys.count, telemetry.summary.games.finished
    );
    for (status, count) in &telemetry.summary.games.status_counts {
        println!("  {status}: {count}");
    }
}
