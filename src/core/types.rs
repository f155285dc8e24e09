//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a creature stack.
///
/// Ids index the flat unit arena owned by the combat state, so they stay
/// valid for the whole battle (dead stacks are never removed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Combat round counter (first round is 1)
pub type Round = u32;

/// The two opposing rosters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatSide {
    Attacker,
    Defender,
}

impl CombatSide {
    pub fn opponent(self) -> Self {
        match self {
            CombatSide::Attacker => CombatSide::Defender,
            CombatSide::Defender => CombatSide::Attacker,
        }
    }

    /// Fixed priority used when no other tie-break applies (attacker first)
    pub fn priority(self) -> u8 {
        match self {
            CombatSide::Attacker => 0,
            CombatSide::Defender => 1,
        }
    }

    pub fn index(self) -> usize {
        self.priority() as usize
    }

    pub fn both() -> [CombatSide; 2] {
        [CombatSide::Attacker, CombatSide::Defender]
    }
}

impl fmt::Display for CombatSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatSide::Attacker => write!(f, "attacker"),
            CombatSide::Defender => write!(f, "defender"),
        }
    }
}
