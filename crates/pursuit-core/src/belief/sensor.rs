use rand::Rng;
use serde::{Deserialize, Serialize};

/// Single-node survey drone.
///
/// A defective drone misses an occupant with probability `false_negative` and never
/// reports an occupant that is not there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Sensor {
    Perfect,
    Defective { false_negative: f64 },
}

impl Sensor {
    pub fn defective(false_negative: f64) -> Self {
        Sensor::Defective { false_negative }
    }

    pub fn is_defective(self) -> bool {
        matches!(self, Sensor::Defective { .. })
    }

    /// Mass a negative survey leaves at the surveyed node.
    pub fn residual(self) -> f64 {
        match self {
            Sensor::Perfect => 0.0,
            Sensor::Defective { false_negative } => false_negative,
        }
    }

    /// Reports whether the surveyed node holds the target, given the ground truth.
    pub fn survey<R: Rng + ?Sized>(self, occupied: bool, rng: &mut R) -> bool {
        if !occupied {
            return false;
        }
        match self {
            Sensor::Perfect => true,
            Sensor::Defective { false_negative } => rng.r#gen::<f64>() >= false_negative,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn perfect_sensor_reports_truth() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(Sensor::Perfect.survey(true, &mut rng));
        assert!(!Sensor::Perfect.survey(false, &mut rng));
        assert_eq!(Sensor::Perfect.residual(), 0.0);
    }

    #[test]
    fn defective_sensor_never_reports_false_positive() {
        let mut rng = SmallRng::seed_from_u64(2);
        let sensor = Sensor::defective(0.5);
        for _ in 0..200 {
            assert!(!sensor.survey(false, &mut rng));
        }
    }

    #[test]
    fn defective_sensor_misses_at_configured_rate() {
        let mut rng = SmallRng::seed_from_u64(3);
        let sensor = Sensor::defective(0.1);
        let hits = (0..10_000).filter(|_| sensor.survey(true, &mut rng)).count();
        assert!((8_700..=9_300).contains(&hits), "hits = {hits}");
    }

    #[test]
    fn fully_broken_sensor_never_detects() {
        let mut rng = SmallRng::seed_from_u64(4);
        let sensor = Sensor::defective(1.0);
        assert!((0..100).all(|_| !sensor.survey(true, &mut rng)));
        assert_eq!(sensor.residual(), 1.0);
    }
}
