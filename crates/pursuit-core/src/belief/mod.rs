pub mod sensor;
pub mod telemetry;
pub mod tracker;
pub mod transition;
pub mod vector;

pub use sensor::Sensor;
pub use telemetry::BeliefMetrics;
pub use tracker::{BeliefTracker, Estimate, MotionModel, SurveyRecord};
pub use transition::{PREDATOR_PURSUIT_BIAS, TransitionMatrix};
pub use vector::BeliefVector;
