//! AI personality configuration loaded from TOML
//!
//! A personality is a name plus the weights used to score candidate attacks.
//! Missing fields keep their defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::ConfigError;

/// Weights for scoring an attack option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiWeights {
    /// Value per expected point of damage dealt
    pub damage_value: f64,
    /// Cost per expected point of retaliation damage taken
    pub retaliation_aversion: f64,
    /// Cost per expected point of damage dealt to our own stacks
    pub friendly_fire_aversion: f64,
    /// Flat bonus when the strike should destroy the target
    pub lethal_bonus: f64,
    /// Flat penalty when the retaliation should destroy the attacker
    pub self_death_penalty: f64,
    /// Attacks scoring below this are skipped in favour of moving or waiting
    pub min_score: f64,
}

impl Default for AiWeights {
    fn default() -> Self {
        Self {
            damage_value: 1.0,
            retaliation_aversion: 1.0,
            friendly_fire_aversion: 1.0,
            lethal_bonus: 50.0,
            self_death_penalty: 200.0,
            min_score: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiPersonality {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub weights: AiWeights,
}

fn default_name() -> String {
    "balanced".to_string()
}

impl Default for AiPersonality {
    fn default() -> Self {
        Self {
            name: default_name(),
            weights: AiWeights::default(),
        }
    }
}

impl AiPersonality {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Ignores retaliation entirely
    pub fn reckless() -> Self {
        Self {
            name: "reckless".to_string(),
            weights: AiWeights {
                retaliation_aversion: 0.0,
                self_death_penalty: 0.0,
                min_score: 0.0,
                ..AiWeights::default()
            },
        }
    }
}

/// Loads from `data/ai_personalities/{name}.toml`; the file name wins over any `name` inside
pub fn load_personality(name: &str) -> Result<AiPersonality, ConfigError> {
    let mut personality = AiPersonality::load(&personality_path(name))?;
    personality.name = name.to_string();
    Ok(personality)
}

fn personality_path(name: &str) -> PathBuf {
    PathBuf::from("data/ai_personalities").join(format!("{}.toml", name))
}
