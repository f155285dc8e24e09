//! Battle system - turn-based stack combat on a hex battlefield
//!
//! Two rosters of creature stacks fight on a 17x11 offset hex grid. Turn
//! order comes from speed, damage from a skill-based formula, and every
//! command is validated in full before it touches the state.
//!
//! Flow: the caller asks the resolver whose turn it is, builds an
//! `ActionCommand` (by hand or through `ai`), and executes it. Each command
//! returns the events it caused.

pub mod action;
pub mod ai;
pub mod battlefield;
pub mod constants;
pub mod damage;
pub mod events;
pub mod execution;
pub mod fortune;
pub mod hex;
pub mod pathfinding;
pub mod roster;
pub mod scheduler;
pub mod state;
pub mod units;

// Re-exports for convenient access
pub use action::{ActionCommand, ActionKind};
pub use ai::{AiPersonality, AiWeights, BattleAi, TacticalAi};
pub use battlefield::Battlefield;
pub use constants::*;
pub use damage::{
    attack_factor, casualties, defense_factor, estimate_damage, strike_context, AttackBonuses,
    DamageContext, DamageEstimate, DefenseReductions,
};
pub use events::{BattleEvent, BattleEventLog, BattleEventType, CombatResult};
pub use execution::CombatResolver;
pub use fortune::LuckRoll;
pub use hex::{HexCoord, HexDirection};
pub use pathfinding::{HexPathfinder, Pathfinder, Reachability};
pub use roster::{CreatureProfile, Roster, StackSpec};
pub use scheduler::{ScheduledTurn, TurnPhase, TurnScheduler};
pub use state::{
    BattleOutcome, BattlePhase, BattleReport, CombatState, EndReason, SideReport, SideState,
    StateSnapshot, UnitSnapshot,
};
pub use units::{Abilities, CombatUnit, DamageBias, DamageRange, StatusEffect};
