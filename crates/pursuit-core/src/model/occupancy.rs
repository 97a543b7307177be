use super::entity::Entity;

/// Bit-mask describing which entities stand on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OccupantMask(u8);

impl OccupantMask {
    pub const EMPTY: Self = Self(0);

    pub fn contains(self, entity: Entity) -> bool {
        let bit = 1 << entity as u8;
        self.0 & bit != 0
    }

    pub fn with(mut self, entity: Entity) -> Self {
        let bit = 1 << entity as u8;
        self.0 |= bit;
        self
    }

    pub fn without(mut self, entity: Entity) -> Self {
        let bit = 1 << entity as u8;
        self.0 &= !bit;
        self
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_and_without_toggle_bits() {
        let mask = OccupantMask::EMPTY.with(Entity::Prey).with(Entity::Agent);
        assert!(mask.contains(Entity::Prey));
        assert!(mask.contains(Entity::Agent));
        assert!(!mask.contains(Entity::Predator));

        let mask = mask.without(Entity::Prey);
        assert!(!mask.contains(Entity::Prey));
        assert!(!mask.is_empty());
        assert!(mask.without(Entity::Agent).is_empty());
    }
}
