//! Battle configuration with documented constants
//!
//! Every tunable number of the combat core lives here. Values can be
//! overridden from TOML; any field left out keeps its default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::ConfigError;

/// Coefficients of the damage formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageConfig {
    /// Attack factor gained per point of attack over defense
    pub attack_bonus_per_point: f64,

    /// Cap on the skill part of the attack factor (+300%)
    pub max_attack_bonus: f64,

    /// Damage reduction per point of defense over attack
    pub defense_reduction_per_point: f64,

    /// Cap on the skill part of the reduction (70%)
    pub max_defense_reduction: f64,

    /// Attack factor added by a lucky strike
    pub lucky_bonus: f64,

    /// Reduction applied by an unlucky strike
    pub unlucky_penalty: f64,

    /// Reduction for shooting beyond `effective_range`
    pub range_penalty: f64,

    /// Reduction for shooters fighting hand to hand
    pub melee_penalty: f64,

    /// Hex distance up to which shots deal full damage
    pub effective_range: u32,

    /// Attack factor per hex charged, for units with the jousting ability
    pub jousting_bonus_per_hex: f64,
}

impl Default for DamageConfig {
    fn default() -> Self {
        Self {
            attack_bonus_per_point: 0.05,
            max_attack_bonus: 3.0,
            defense_reduction_per_point: 0.025,
            max_defense_reduction: 0.7,
            lucky_bonus: 1.0,
            unlucky_penalty: 0.5,
            range_penalty: 0.5,
            melee_penalty: 0.5,
            effective_range: 10,
            jousting_bonus_per_hex: 0.05,
        }
    }
}

/// Turn and round rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    /// Retaliation strikes each stack gets per round
    pub retaliations_per_round: u32,

    /// Defense gained by defending, as a percentage of current defense (min +1)
    pub defend_bonus_percent: u32,

    /// Round cap used by the headless runner before calling a draw
    pub max_rounds: u32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            retaliations_per_round: 1,
            defend_bonus_percent: 20,
            max_rounds: 100,
        }
    }
}

/// Morale and luck rolls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FortuneConfig {
    pub enabled: bool,

    /// Probability per point of morale or luck (1/24 per point)
    pub chance_per_point: f64,

    /// Morale and luck are clamped to +/- this many points
    pub max_points: i8,
}

impl Default for FortuneConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chance_per_point: 1.0 / 24.0,
            max_points: 3,
        }
    }
}

/// Complete battle configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleConfig {
    #[serde(default)]
    pub damage: DamageConfig,
    #[serde(default)]
    pub turns: TurnConfig,
    #[serde(default)]
    pub fortune: FortuneConfig,
}

impl BattleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), String> {
        let d = &self.damage;
        if d.attack_bonus_per_point < 0.0 || d.defense_reduction_per_point < 0.0 {
            return Err("skill coefficients must not be negative".into());
        }

        if !(0.0..=1.0).contains(&d.max_defense_reduction) {
            return Err(format!(
                "max_defense_reduction ({}) must be within 0..=1",
                d.max_defense_reduction
            ));
        }

        if !(0.0..=1.0).contains(&self.fortune.chance_per_point) {
            return Err(format!(
                "chance_per_point ({}) must be a probability",
                self.fortune.chance_per_point
            ));
        }

        if self.fortune.chance_per_point * f64::from(self.fortune.max_points) >= 1.0 {
            return Err("max_points * chance_per_point must stay below certainty".into());
        }

        Ok(())
    }
}
