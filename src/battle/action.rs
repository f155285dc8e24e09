//! Action commands submitted by players or AI
//!
//! A command is a transient request. The resolver validates it completely
//! against the current state before anything is changed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::battle::hex::HexCoord;
use crate::core::types::{CombatSide, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Move,
    Wait,
    Defend,
    MeleeAttack,
    RangedAttack,
    Retreat,
    Surrender,
}

impl ActionKind {
    /// Ends the battle instead of spending a turn
    pub fn is_terminal(self) -> bool {
        matches!(self, ActionKind::Retreat | ActionKind::Surrender)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Move => "move",
            ActionKind::Wait => "wait",
            ActionKind::Defend => "defend",
            ActionKind::MeleeAttack => "melee attack",
            ActionKind::RangedAttack => "ranged attack",
            ActionKind::Retreat => "retreat",
            ActionKind::Surrender => "surrender",
        };
        f.write_str(name)
    }
}

/// A requested action for the acting stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCommand {
    pub side: CombatSide,
    pub actor: UnitId,
    pub kind: ActionKind,
    /// Destination for Move
    pub target_hex: Option<HexCoord>,
    /// Victim for attacks
    pub target_unit: Option<UnitId>,
    /// Where a melee attacker stands to strike; `None` strikes from where it is
    pub attack_origin: Option<HexCoord>,
    pub return_after_attack: bool,
}

impl ActionCommand {
    fn new(side: CombatSide, actor: UnitId, kind: ActionKind) -> Self {
        Self {
            side,
            actor,
            kind,
            target_hex: None,
            target_unit: None,
            attack_origin: None,
            return_after_attack: false,
        }
    }

    pub fn move_to(side: CombatSide, actor: UnitId, hex: HexCoord) -> Self {
        Self {
            target_hex: Some(hex),
            ..Self::new(side, actor, ActionKind::Move)
        }
    }

    pub fn wait(side: CombatSide, actor: UnitId) -> Self {
        Self::new(side, actor, ActionKind::Wait)
    }

    pub fn defend(side: CombatSide, actor: UnitId) -> Self {
        Self::new(side, actor, ActionKind::Defend)
    }

    /// Melee strike from the actor's current hex
    pub fn melee(side: CombatSide, actor: UnitId, target: UnitId) -> Self {
        Self {
            target_unit: Some(target),
            ..Self::new(side, actor, ActionKind::MeleeAttack)
        }
    }

    /// Walk or fly to `origin`, then strike
    pub fn melee_from(side: CombatSide, actor: UnitId, target: UnitId, origin: HexCoord) -> Self {
        Self {
            attack_origin: Some(origin),
            ..Self::melee(side, actor, target)
        }
    }

    pub fn ranged(side: CombatSide, actor: UnitId, target: UnitId) -> Self {
        Self {
            target_unit: Some(target),
            ..Self::new(side, actor, ActionKind::RangedAttack)
        }
    }

    pub fn retreat(side: CombatSide, actor: UnitId) -> Self {
        Self::new(side, actor, ActionKind::Retreat)
    }

    pub fn surrender(side: CombatSide, actor: UnitId) -> Self {
        Self::new(side, actor, ActionKind::Surrender)
    }

    /// Return to the starting hex after a melee strike
    pub fn and_return(mut self) -> Self {
        self.return_after_attack = true;
        self
    }
}
