//! Roster data supplied when a battle starts
//!
//! Rosters are plain serde data so they can come from TOML files or be built
//! in code by the surrounding game.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::battle::constants::{
    ATTACKER_DEPLOY_COLUMN, DEFENDER_DEPLOY_COLUMN, MAX_FORTUNE, MAX_SLOTS, MIN_FORTUNE, SLOT_ROWS,
};
use crate::battle::hex::HexCoord;
use crate::battle::units::Abilities;
use crate::core::error::{ConfigError, ConfigurationError};
use crate::core::types::CombatSide;

/// Stats shared by every individual of a creature type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureProfile {
    pub name: String,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub health: u32,
    pub damage_min: u32,
    pub damage_max: u32,
    #[serde(default)]
    pub shots: u32,
    #[serde(default)]
    pub double_wide: bool,
    #[serde(default)]
    pub morale: i8,
    #[serde(default)]
    pub luck: i8,
    #[serde(default)]
    pub abilities: Abilities,
}

impl CreatureProfile {
    pub fn new(
        name: impl Into<String>,
        attack: i32,
        defense: i32,
        speed: i32,
        health: u32,
        damage_min: u32,
        damage_max: u32,
    ) -> Self {
        Self {
            name: name.into(),
            attack,
            defense,
            speed,
            health,
            damage_min,
            damage_max,
            shots: 0,
            double_wide: false,
            morale: 0,
            luck: 0,
            abilities: Abilities::default(),
        }
    }

    pub fn with_shots(mut self, shots: u32) -> Self {
        self.shots = shots;
        self
    }

    pub fn with_abilities(mut self, abilities: Abilities) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn double_wide(mut self) -> Self {
        self.double_wide = true;
        self
    }

    pub fn with_fortune(mut self, morale: i8, luck: i8) -> Self {
        self.morale = morale;
        self.luck = luck;
        self
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidCreature {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.health == 0 {
            return Err(invalid("health must be positive"));
        }
        if self.damage_min == 0 || self.damage_min > self.damage_max {
            return Err(invalid("damage range must satisfy 1 <= min <= max"));
        }
        if self.speed < 0 || self.attack < 0 || self.defense < 0 {
            return Err(invalid("attack, defense and speed must not be negative"));
        }
        let fortune = MIN_FORTUNE..=MAX_FORTUNE;
        if !fortune.contains(&self.morale) || !fortune.contains(&self.luck) {
            return Err(invalid("morale and luck must be within -3..=3"));
        }
        Ok(())
    }
}

/// One stack in a roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSpec {
    pub creature: CreatureProfile,
    pub count: u32,
    pub slot: u8,
    /// Head hex; deployed by slot when absent
    #[serde(default)]
    pub position: Option<HexCoord>,
}

impl StackSpec {
    pub fn new(creature: CreatureProfile, count: u32, slot: u8) -> Self {
        Self {
            creature,
            count,
            slot,
            position: None,
        }
    }

    pub fn at(mut self, position: HexCoord) -> Self {
        self.position = Some(position);
        self
    }

    /// Head hex for this stack on `side`: explicit position or slot deployment
    pub fn deployment_hex(&self, side: CombatSide) -> HexCoord {
        if let Some(position) = self.position {
            return position;
        }

        let row = SLOT_ROWS
            .get(self.slot as usize)
            .copied()
            .unwrap_or(-1);
        let inward = i32::from(self.creature.double_wide);
        match side {
            CombatSide::Attacker => HexCoord::new(ATTACKER_DEPLOY_COLUMN + inward, row),
            CombatSide::Defender => HexCoord::new(DEFENDER_DEPLOY_COLUMN - inward, row),
        }
    }
}

/// All stacks fielded by one side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub stacks: Vec<StackSpec>,
}

impl Roster {
    pub fn new(stacks: Vec<StackSpec>) -> Self {
        Self { stacks }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check the roster shape; placement is checked against the battlefield later
    pub fn validate(&self, side: CombatSide) -> Result<(), ConfigurationError> {
        if self.stacks.is_empty() {
            return Err(ConfigurationError::EmptySide(side));
        }

        let mut used = [false; MAX_SLOTS as usize];
        for spec in &self.stacks {
            if spec.count == 0 {
                return Err(ConfigurationError::EmptyStack(spec.creature.name.clone()));
            }
            if spec.slot >= MAX_SLOTS {
                return Err(ConfigurationError::SlotOutOfRange {
                    name: spec.creature.name.clone(),
                    slot: spec.slot,
                });
            }
            if std::mem::replace(&mut used[spec.slot as usize], true) {
                return Err(ConfigurationError::DuplicateSlot {
                    side,
                    slot: spec.slot,
                });
            }
            spec.creature.validate()?;
        }
        Ok(())
    }
}
