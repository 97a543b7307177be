use core::fmt;
use serde::{Deserialize, Serialize};

/// The three pieces on the board. Exactly one of each exists per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Entity {
    Agent = 0,
    Prey = 1,
    Predator = 2,
}

impl Entity {
    /// Turn order within a round.
    pub const TURN_ORDER: [Entity; 3] = [Entity::Agent, Entity::Prey, Entity::Predator];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Entity::Agent),
            1 => Some(Entity::Prey),
            2 => Some(Entity::Predator),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Entity moving after `self` within a round.
    pub const fn next(self) -> Entity {
        match self {
            Entity::Agent => Entity::Prey,
            Entity::Prey => Entity::Predator,
            Entity::Predator => Entity::Agent,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Entity::Agent => "agent",
            Entity::Prey => "prey",
            Entity::Predator => "predator",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Entity::Agent => "Agent",
            Entity::Prey => "Prey",
            Entity::Predator => "Predator",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::Entity;

    #[test]
    fn next_wraps_around() {
        assert_eq!(Entity::Predator.next(), Entity::Agent);
    }

    #[test]
    fn turn_order_follows_next() {
        for pair in Entity::TURN_ORDER.windows(2) {
            assert_eq!(pair[0].next(), pair[1]);
        }
    }

    #[test]
    fn index_roundtrip() {
        for (i, entity) in Entity::TURN_ORDER.iter().enumerate() {
            assert_eq!(Entity::from_index(i), Some(*entity));
            assert_eq!(entity.index(), i);
        }
        assert_eq!(Entity::from_index(3), None);
    }
}
