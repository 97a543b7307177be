pub mod distance;
pub mod entity;
pub mod graph;
pub mod occupancy;
