//! YAML description of a sweep: which agents play, on how many graphs, and where
//! the artifacts go.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use pursuit_bot::AgentVariant;
use pursuit_core::GameConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::Level;

const DEFAULT_TRIAL_COUNT: usize = 100;
const RUN_ID_PLACEHOLDER: &str = "{run_id}";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    #[serde(default)]
    pub trials: TrialConfig,
    #[serde(default)]
    pub game: GameConfig,
    pub agents: Vec<AgentConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Read, parse and validate a sweep file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    /// Check every block. Also fills in empty agent `params` so later stages can
    /// treat them as a mapping. Called again after CLI overrides are applied.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        check_slug("run_id", &self.run_id)?;
        if self.trials.count == 0 {
            return Err(invalid("trials.count", "at least one trial is required"));
        }
        self.game
            .validate()
            .map_err(|err| invalid("game", err.to_string()))?;
        self.outputs.validate(&self.run_id)?;
        validate_agents(&mut self.agents)?;
        if let Some(baseline) = &self.metrics.baseline {
            if !self.agents.iter().any(|agent| &agent.name == baseline) {
                return Err(invalid(
                    "metrics.baseline",
                    format!("no agent named '{baseline}'"),
                ));
            }
        }
        Ok(())
    }

    /// Output paths with every `{run_id}` substituted.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        self.outputs.resolve(&self.run_id)
    }
}

/// Each trial plays on one freshly generated graph.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TrialConfig {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_trial_count")]
    pub count: usize,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            seed: None,
            count: DEFAULT_TRIAL_COUNT,
        }
    }
}

fn default_trial_count() -> usize {
    DEFAULT_TRIAL_COUNT
}

/// One benchmarked agent.
///
/// `params` optionally overrides the movement policy:
/// `predicates` (ordered list of neighbor predicate names) and `route_around_predator`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub variant: String,
    #[serde(default)]
    pub params: serde_yaml::Value,
}

/// Path templates for the sweep artifacts; `{run_id}` may appear anywhere.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
    pub plots_dir: String,
}

impl OutputsConfig {
    fn templates(&self) -> [(&'static str, &str); 3] {
        [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
            ("outputs.plots_dir", &self.plots_dir),
        ]
    }

    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (field, template) in self.templates() {
            if template.trim().is_empty() || substitute(template, run_id).as_os_str().is_empty() {
                return Err(invalid(field, "expected a path"));
            }
        }
        Ok(())
    }

    fn resolve(&self, run_id: &str) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: substitute(&self.jsonl, run_id),
            summary_md: substitute(&self.summary_md, run_id),
            plots_dir: substitute(&self.plots_dir, run_id),
        }
    }
}

fn substitute(template: &str, run_id: &str) -> PathBuf {
    PathBuf::from(template.replace(RUN_ID_PLACEHOLDER, run_id))
}

/// When `baseline` names an agent, every other agent's per-trial success rate is
/// compared against it with a paired signed-rank test.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MetricsConfig {
    #[serde(default)]
    pub baseline: Option<String>,
}

/// Structured logging is off unless `enable_structured` is set.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enable_structured: bool,
    pub tracing_level: String,
    /// Emit one event per survey under the `pursuit_bot::survey` target.
    pub survey_details: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: Level::INFO.to_string(),
            survey_details: false,
        }
    }
}

impl LoggingConfig {
    /// The configured level, or `None` if it does not name one.
    pub fn level(&self) -> Option<Level> {
        self.tracing_level.trim().parse().ok()
    }
}

fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

fn check_slug(field: &str, value: &str) -> Result<(), ValidationError> {
    if is_slug(value) {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("'{value}' must be non-empty and use only letters, digits, '.', '_' or '-'"),
        ))
    }
}

fn validate_agents(agents: &mut [AgentConfig]) -> Result<(), ValidationError> {
    if agents.is_empty() {
        return Err(invalid("agents", "no agents to benchmark"));
    }

    let mut names = HashSet::new();
    for agent in agents.iter_mut() {
        check_slug("agents.name", &agent.name)?;
        if !names.insert(agent.name.clone()) {
            return Err(invalid(
                "agents",
                format!("'{}' appears more than once", agent.name),
            ));
        }
        agent
            .variant
            .parse::<AgentVariant>()
            .map_err(|err| invalid(format!("agents[{}].variant", agent.name), err.to_string()))?;
        if agent.params.is_null() {
            agent.params = serde_yaml::Value::Mapping(Default::default());
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
    pub plots_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read sweep file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not a valid sweep file: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        field: field.into(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SWEEP: &str = r#"
run_id: "sweep_smoke"
trials:
  seed: 123
  count: 4
game:
  node_count: 20
  runs_per_trial: 5
agents:
  - name: "full_info"
    variant: "agent1"
  - name: "combined"
    variant: "agent8-defective"
    params:
      route_around_predator: false
outputs:
  jsonl: "bench/out/{run_id}/runs.jsonl"
  summary_md: "bench/out/{run_id}/summary.md"
  plots_dir: "bench/out/{run_id}/plots"
metrics:
  baseline: "full_info"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    fn parse(yaml: &str) -> BenchmarkConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn rejected_field(yaml: &str) -> String {
        match parse(yaml).validate() {
            Err(ValidationError::InvalidField { field, .. }) => field,
            Ok(()) => panic!("expected validation to fail"),
        }
    }

    #[test]
    fn accepts_the_sample_sweep() {
        let mut config = parse(SWEEP);
        config.validate().unwrap();

        assert_eq!(config.trials.count, 4);
        assert_eq!(config.game.node_count, 20);
        assert_eq!(config.game.step_limit, 5000);
        assert!(config.logging.enable_structured);
        assert!(!config.logging.survey_details);
        assert_eq!(config.logging.level(), Some(Level::DEBUG));
        assert_eq!(
            config.resolved_outputs().jsonl,
            PathBuf::from("bench/out/sweep_smoke/runs.jsonl")
        );
        assert!(config.agents[0].params.is_mapping());
    }

    #[test]
    fn optional_blocks_take_defaults() {
        let yaml = SWEEP
            .split("metrics:")
            .next()
            .unwrap()
            .replace("trials:\n  seed: 123\n  count: 4\n", "");
        let mut config = parse(&yaml);
        config.validate().unwrap();
        assert_eq!(config.metrics.baseline, None);
        assert_eq!(config.trials, TrialConfig::default());
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.logging.level(), Some(Level::INFO));
    }

    #[test]
    fn rejects_each_invalid_block() {
        let cases = [
            (("baseline: \"full_info\"", "baseline: \"ghost\""), "metrics.baseline"),
            (("name: \"combined\"", "name: \"full_info\""), "agents"),
            (("name: \"combined\"", "name: \"com bined\""), "agents.name"),
            (("agent8-defective", "agent9"), "agents[combined].variant"),
            (("node_count: 20", "node_count: 2"), "game"),
            (("sweep_smoke", "sweep smoke"), "run_id"),
            (("count: 4", "count: 0"), "trials.count"),
            (("\"bench/out/{run_id}/plots\"", "\"  \""), "outputs.plots_dir"),
        ];
        for ((from, to), field) in cases {
            assert_eq!(rejected_field(&SWEEP.replace(from, to)), field, "{from} -> {to}");
        }
    }

    #[test]
    fn empty_agent_list_is_rejected() {
        let start = SWEEP.find("agents:").unwrap();
        let end = SWEEP.find("outputs:").unwrap();
        let yaml = format!("{}agents: []\n{}", &SWEEP[..start], &SWEEP[end..])
            .replace("metrics:\n  baseline: \"full_info\"\n", "");
        assert_eq!(rejected_field(&yaml), "agents");
    }

    #[test]
    fn run_id_is_substituted_everywhere() {
        let yaml = SWEEP.replace(
            "bench/out/{run_id}/plots",
            "bench/out/{run_id}/{run_id}/plots",
        );
        let mut config = parse(&yaml);
        config.validate().unwrap();
        assert_eq!(
            config.resolved_outputs().plots_dir,
            PathBuf::from("bench/out/sweep_smoke/sweep_smoke/plots")
        );
    }

    #[test]
    fn level_names_are_case_insensitive() {
        let logging = |level: &str| LoggingConfig {
            tracing_level: level.to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(logging(" WARN ").level(), Some(Level::WARN));
        assert_eq!(logging("chatty").level(), None);
        assert_eq!(logging("").level(), None);
    }

    #[test]
    fn read_errors_name_the_file() {
        let err = BenchmarkConfig::from_path("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("exist.yaml"));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.yaml");
        fs::write(&path, SWEEP.replace("count: 4", "count: 0")).unwrap();
        assert!(matches!(
            BenchmarkConfig::from_path(&path),
            Err(ConfigError::Invalid { .. })
        ));

        fs::write(&path, SWEEP).unwrap();
        assert_eq!(BenchmarkConfig::from_path(&path).unwrap().run_id, "sweep_smoke");
    }
}
