use core::fmt;
use std::str::FromStr;

/// Oracle distances from one node to the two opponents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distances {
    pub prey: u32,
    pub predator: u32,
}

/// Comparison of a neighbor's distances against the agent's current ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeighborPredicate {
    CloserPreyFartherPredator,
    CloserPreyNotCloserPredator,
    NotFartherPreyFartherPredator,
    NotFartherPreyNotCloserPredator,
    FartherPredator,
    NotCloserPredator,
}

impl NeighborPredicate {
    pub const BASELINE_ORDER: [NeighborPredicate; 6] = [
        NeighborPredicate::CloserPreyFartherPredator,
        NeighborPredicate::CloserPreyNotCloserPredator,
        NeighborPredicate::NotFartherPreyFartherPredator,
        NeighborPredicate::NotFartherPreyNotCloserPredator,
        NeighborPredicate::FartherPredator,
        NeighborPredicate::NotCloserPredator,
    ];

    pub fn matches(self, here: Distances, there: Distances) -> bool {
        let closer_prey = there.prey < here.prey;
        let not_farther_prey = there.prey <= here.prey;
        let farther_predator = there.predator > here.predator;
        let not_closer_predator = there.predator >= here.predator;

        match self {
            NeighborPredicate::CloserPreyFartherPredator => closer_prey && farther_predator,
            NeighborPredicate::CloserPreyNotCloserPredator => closer_prey && not_closer_predator,
            NeighborPredicate::NotFartherPreyFartherPredator => {
                not_farther_prey && farther_predator
            }
            NeighborPredicate::NotFartherPreyNotCloserPredator => {
                not_farther_prey && not_closer_predator
            }
            NeighborPredicate::FartherPredator => farther_predator,
            NeighborPredicate::NotCloserPredator => not_closer_predator,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            NeighborPredicate::CloserPreyFartherPredator => "closer_prey_farther_predator",
            NeighborPredicate::CloserPreyNotCloserPredator => "closer_prey_not_closer_predator",
            NeighborPredicate::NotFartherPreyFartherPredator => {
                "not_farther_prey_farther_predator"
            }
            NeighborPredicate::NotFartherPreyNotCloserPredator => {
                "not_farther_prey_not_closer_predator"
            }
            NeighborPredicate::FartherPredator => "farther_predator",
            NeighborPredicate::NotCloserPredator => "not_closer_predator",
        }
    }
}

impl fmt::Display for NeighborPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPredicate(pub String);

impl fmt::Display for UnknownPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown neighbor predicate '{}'", self.0)
    }
}

impl std::error::Error for UnknownPredicate {}

impl FromStr for NeighborPredicate {
    type Err = UnknownPredicate;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        NeighborPredicate::BASELINE_ORDER
            .into_iter()
            .find(|predicate| predicate.as_str() == normalized)
            .ok_or_else(|| UnknownPredicate(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(prey: u32, predator: u32) -> Distances {
        Distances { prey, predator }
    }

    #[test]
    fn strict_and_weak_comparisons() {
        let here = d(4, 2);
        assert!(NeighborPredicate::CloserPreyFartherPredator.matches(here, d(3, 3)));
        assert!(!NeighborPredicate::CloserPreyFartherPredator.matches(here, d(3, 2)));
        assert!(NeighborPredicate::CloserPreyNotCloserPredator.matches(here, d(3, 2)));
        assert!(NeighborPredicate::NotFartherPreyFartherPredator.matches(here, d(4, 3)));
        assert!(NeighborPredicate::NotFartherPreyNotCloserPredator.matches(here, d(4, 2)));
        assert!(!NeighborPredicate::NotFartherPreyNotCloserPredator.matches(here, d(5, 2)));
        assert!(NeighborPredicate::FartherPredator.matches(here, d(9, 3)));
        assert!(NeighborPredicate::NotCloserPredator.matches(here, d(9, 2)));
        assert!(!NeighborPredicate::NotCloserPredator.matches(here, d(0, 1)));
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(
            "Farther-Predator".parse::<NeighborPredicate>(),
            Ok(NeighborPredicate::FartherPredator)
        );
        for predicate in NeighborPredicate::BASELINE_ORDER {
            assert_eq!(predicate.to_string().parse(), Ok(predicate));
        }
        assert!("sideways".parse::<NeighborPredicate>().is_err());
    }
}
