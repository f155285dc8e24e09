pub mod config;
pub mod error;
pub mod types;

pub use config::BattleConfig;
pub use error::{BattleError, ConfigError, ConfigurationError, StateError, ValidationError};
pub use types::{CombatSide, Round, UnitId};
