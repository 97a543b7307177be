mod agent;
mod predator;

pub use agent::{Agent, AgentDecision, TrackingCounters};
pub use predator::PredatorBehavior;

use crate::policy::{PolicyParams, PredicatePolicy};
use core::fmt;
use pursuit_core::GameConfig;
use pursuit_core::belief::Sensor;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Heuristic {
    #[default]
    Baseline,
    Improved,
}

/// Which opponents an agent tracks, with what sensor, and how it moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentVariant {
    pub tracks_prey: bool,
    pub tracks_predator: bool,
    pub defective_sensor: bool,
    pub heuristic: Heuristic,
}

impl AgentVariant {
    /// Numbered roster: odd numbers move with the baseline policy, even with the improved one.
    ///
    /// 1-2 see everything, 3-4 track the prey, 5-6 track the predator, 7-8 track both.
    pub fn roster(number: u8) -> Option<Self> {
        let (tracks_prey, tracks_predator) = match number {
            1 | 2 => (false, false),
            3 | 4 => (true, false),
            5 | 6 => (false, true),
            7 | 8 => (true, true),
            _ => return None,
        };
        let heuristic = if number % 2 == 0 {
            Heuristic::Improved
        } else {
            Heuristic::Baseline
        };
        Some(Self {
            tracks_prey,
            tracks_predator,
            defective_sensor: false,
            heuristic,
        })
    }

    pub fn with_defective_sensor(mut self) -> Self {
        self.defective_sensor = true;
        self
    }

    pub fn is_fully_informed(self) -> bool {
        !self.tracks_prey && !self.tracks_predator
    }

    pub fn number(self) -> u8 {
        let base = match (self.tracks_prey, self.tracks_predator) {
            (false, false) => 1,
            (true, false) => 3,
            (false, true) => 5,
            (true, true) => 7,
        };
        match self.heuristic {
            Heuristic::Baseline => base,
            Heuristic::Improved => base + 1,
        }
    }

    pub fn sensor(self, config: &GameConfig) -> Sensor {
        if self.defective_sensor {
            Sensor::defective(config.sensor_false_negative)
        } else {
            Sensor::Perfect
        }
    }

    /// Agents that track the predator face the distracted one.
    pub fn opponent(self, config: &GameConfig) -> PredatorBehavior {
        if self.tracks_predator {
            PredatorBehavior::Distracted {
                probability: config.distraction_probability,
            }
        } else {
            PredatorBehavior::Focused
        }
    }

    /// Predator-tracking agents are told where the predator starts.
    pub fn knows_predator_start(self) -> bool {
        self.tracks_predator
    }

    pub fn default_policy(self) -> PredicatePolicy {
        match self.heuristic {
            Heuristic::Baseline => PredicatePolicy::baseline(),
            Heuristic::Improved => PredicatePolicy::improved(),
        }
    }

    pub fn policy_with(self, params: PolicyParams) -> PredicatePolicy {
        PredicatePolicy::new(self.to_string(), params)
    }
}

impl fmt::Display for AgentVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent{}", self.number())?;
        if self.defective_sensor {
            f.write_str("-defective")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVariantError {
    pub input: String,
    pub reason: &'static str,
}

impl fmt::Display for ParseVariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid agent variant '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for ParseVariantError {}

impl FromStr for AgentVariant {
    type Err = ParseVariantError;

    /// Accepts `agent7`, `7`, `agent7-defective`, `7d` and `-7`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let error = |reason| ParseVariantError {
            input: value.to_string(),
            reason,
        };

        let normalized = value.trim().to_ascii_lowercase();
        let mut body = normalized.strip_prefix("agent").unwrap_or(&normalized);
        let mut defective = false;
        if let Some(rest) = body.strip_prefix('-') {
            defective = true;
            body = rest;
        }
        if let Some(rest) = body
            .strip_suffix("-defective")
            .or_else(|| body.strip_suffix('d'))
        {
            defective = true;
            body = rest;
        }

        let number = body
            .parse::<u8>()
            .map_err(|_| error("expected an agent number"))?;
        let variant =
            AgentVariant::roster(number).ok_or_else(|| error("agent number must be 1-8"))?;
        if !defective {
            return Ok(variant);
        }
        if variant.is_fully_informed() {
            return Err(error("fully informed agents carry no sensor"));
        }
        Ok(variant.with_defective_sensor())
    }
}
