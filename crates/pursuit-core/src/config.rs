//! Immutable game configuration threaded through every constructor.

use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_NODE_COUNT: usize = 50;
const DEFAULT_TOLERANCE: f64 = 0.000_001;
const DEFAULT_MAX_CHORD_LENGTH: usize = 5;
const DEFAULT_MAX_DEGREE: usize = 3;
const DEFAULT_STEP_LIMIT: u32 = 5000;
const DEFAULT_DISTRACTION_PROBABILITY: f64 = 0.4;
const DEFAULT_SENSOR_FALSE_NEGATIVE: f64 = 0.1;
const DEFAULT_RUNS_PER_TRIAL: usize = 30;

/// Largest tolerance accepted for floating point equality checks.
const MAX_TOLERANCE: f64 = 0.01;

/// Parameters shared by one run (or one trial of runs).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub node_count: usize,
    pub tolerance: f64,
    pub max_chord_length: usize,
    pub max_degree: usize,
    pub step_limit: u32,
    pub distraction_probability: f64,
    pub sensor_false_negative: f64,
    pub runs_per_trial: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            node_count: DEFAULT_NODE_COUNT,
            tolerance: DEFAULT_TOLERANCE,
            max_chord_length: DEFAULT_MAX_CHORD_LENGTH,
            max_degree: DEFAULT_MAX_DEGREE,
            step_limit: DEFAULT_STEP_LIMIT,
            distraction_probability: DEFAULT_DISTRACTION_PROBABILITY,
            sensor_false_negative: DEFAULT_SENSOR_FALSE_NEGATIVE,
            runs_per_trial: DEFAULT_RUNS_PER_TRIAL,
        }
    }
}

impl GameConfig {
    /// Default configuration resized to `node_count` nodes.
    pub fn with_node_count(node_count: usize) -> Self {
        Self {
            node_count,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_count < 3 {
            return Err(ConfigError::NodeCount {
                found: self.node_count,
            });
        }

        if !self.tolerance.is_finite() || self.tolerance <= 0.0 || self.tolerance > MAX_TOLERANCE
        {
            return Err(ConfigError::Tolerance {
                found: self.tolerance,
            });
        }

        if self.max_chord_length < 2 {
            return Err(ConfigError::ChordLength {
                found: self.max_chord_length,
            });
        }

        if self.max_degree < 2 {
            return Err(ConfigError::MaxDegree {
                found: self.max_degree,
            });
        }

        if self.step_limit == 0 {
            return Err(ConfigError::StepLimit);
        }

        for (field, value) in [
            ("distraction_probability", self.distraction_probability),
            ("sensor_false_negative", self.sensor_false_negative),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { field, value });
            }
        }

        if self.runs_per_trial == 0 {
            return Err(ConfigError::RunsPerTrial);
        }

        Ok(())
    }

    /// Distance reported by the oracle when a destination cannot be reached.
    ///
    /// A shortest path visits each node at most once, so it has at most `N - 1` hops
    /// even when the search must detour around excluded nodes.
    pub fn unreachable_distance(&self) -> u32 {
        unreachable_distance(self.node_count)
    }

    /// Returns true when `value` equals one within the configured tolerance.
    pub fn is_one(&self, value: f64) -> bool {
        (value - 1.0).abs() <= self.tolerance
    }
}

pub(crate) fn unreachable_distance(node_count: usize) -> u32 {
    node_count as u32
}

/// Parameters rejected at construction time.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NodeCount { found: usize },
    Tolerance { found: f64 },
    ChordLength { found: usize },
    MaxDegree { found: usize },
    StepLimit,
    Probability { field: &'static str, value: f64 },
    RunsPerTrial,
    SpawnOutOfRange { node: usize, node_count: usize },
    GraphSize { expected: usize, found: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NodeCount { found } => {
                write!(f, "node count must be at least 3 (found {found})")
            }
            ConfigError::Tolerance { found } => {
                write!(f, "tolerance must be in (0, {MAX_TOLERANCE}] (found {found})")
            }
            ConfigError::ChordLength { found } => {
                write!(f, "maximum chord length must be at least 2 (found {found})")
            }
            ConfigError::MaxDegree { found } => {
                write!(f, "maximum degree must be at least 2 (found {found})")
            }
            ConfigError::StepLimit => write!(f, "step limit must be greater than zero"),
            ConfigError::Probability { field, value } => {
                write!(f, "{field} must be within [0, 1] (found {value})")
            }
            ConfigError::RunsPerTrial => write!(f, "runs per trial must be greater than zero"),
            ConfigError::SpawnOutOfRange { node, node_count } => {
                write!(f, "spawn node {node} outside graph of {node_count} nodes")
            }
            ConfigError::GraphSize { expected, found } => {
                write!(f, "graph has {found} nodes but configuration expects {expected}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
