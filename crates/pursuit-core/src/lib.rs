#![deny(warnings)]
pub mod belief;
pub mod config;
pub mod error;
pub mod game;
pub mod model;

pub use config::{ConfigError, GameConfig};
pub use error::{GameError, InvariantViolation};

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "pursuit"
    }

    pub const fn codename() -> &'static str {
        "Partial Information"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "pursuit");
        assert_eq!(AppInfo::codename(), "Partial Information");
        assert!(!AppInfo::version().is_empty());
    }
}
