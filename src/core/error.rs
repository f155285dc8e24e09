use thiserror::Error;

use crate::battle::hex::HexCoord;
use crate::core::types::{CombatSide, UnitId};

/// Rejected command. Recoverable: no state was changed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unit {0} does not exist")]
    UnknownUnit(UnitId),

    #[error("unit {0} is dead")]
    DeadActor(UnitId),

    #[error("unit {unit} does not belong to the {side}")]
    WrongSide { unit: UnitId, side: CombatSide },

    #[error("it is not unit {0}'s turn")]
    NotActorsTurn(UnitId),

    #[error("command is missing its {0}")]
    MissingTarget(&'static str),

    #[error("hex {0} is not a playable hex")]
    InvalidHex(HexCoord),

    #[error("hex {0} is out of reach")]
    Unreachable(HexCoord),

    #[error("hex {0} is occupied or blocked")]
    Occupied(HexCoord),

    #[error("unit {0} is not an enemy")]
    NotAnEnemy(UnitId),

    #[error("target {0} is already dead")]
    TargetDead(UnitId),

    #[error("unit {attacker} cannot reach melee contact with {defender}")]
    NotAdjacent { attacker: UnitId, defender: UnitId },

    #[error("unit {0} has no ammunition left")]
    InsufficientAmmo(UnitId),

    #[error("unit {0} cannot shoot while an enemy is adjacent")]
    ShooterBlocked(UnitId),

    #[error("unit {0} has already waited this round")]
    AlreadyWaited(UnitId),

    #[error("unit {0} cannot return after striking")]
    ReturnNotAllowed(UnitId),

    #[error("unit {0} is already standing on the target hex")]
    AlreadyThere(UnitId),
}

/// Command issued against a battle that can no longer accept it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("the battle is already over")]
    BattleFinished,
}

/// Malformed initial roster, fatal to the battle being set up
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("the {0} roster has no living stacks")]
    EmptySide(CombatSide),

    #[error("stack '{0}' has no creatures")]
    EmptyStack(String),

    #[error("creature '{name}' is invalid: {reason}")]
    InvalidCreature { name: String, reason: String },

    #[error("slot {slot} of '{name}' is outside 0..=6")]
    SlotOutOfRange { name: String, slot: u8 },

    #[error("the {side} roster uses slot {slot} twice")]
    DuplicateSlot { side: CombatSide, slot: u8 },

    #[error("stack '{name}' cannot be placed at {hex}")]
    InvalidPlacement { name: String, hex: HexCoord },

    #[error("stack '{name}' overlaps another stack or obstacle at {hex}")]
    OverlappingPlacement { name: String, hex: HexCoord },

    #[error("battle rules are invalid: {0}")]
    InvalidRules(String),
}

/// Top-level error returned by the combat core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BattleError {
    #[error("invalid action: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid state: {0}")]
    State(#[from] StateError),

    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl BattleError {
    /// Validation and state errors leave the battle untouched and may be retried
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BattleError::Configuration(_))
    }
}

/// Failure to read a config or roster file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, BattleError>;
