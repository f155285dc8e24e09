//! Battle AI
//!
//! Architecture: Trait + Data hybrid
//! - BattleAi trait defines the interface the battle loop drives
//! - AiPersonality holds TOML-loaded scoring weights
//! - TacticalAi is the default greedy implementation

pub mod personality;
pub mod scoring;
pub mod tactical;

pub use personality::{load_personality, AiPersonality, AiWeights};
pub use scoring::{attack_options, evaluate_attack, AttackEvaluation, AttackOption};
pub use tactical::TacticalAi;

use crate::battle::action::ActionCommand;
use crate::battle::pathfinding::Pathfinder;
use crate::battle::state::CombatState;
use crate::core::config::BattleConfig;

/// Trait for battle AI implementations
pub trait BattleAi {
    /// Command for the stack whose turn it is, or `None` when nobody is due
    fn choose_action(
        &mut self,
        state: &CombatState,
        rules: &BattleConfig,
        pathfinder: &dyn Pathfinder,
    ) -> Option<ActionCommand>;

    /// Get the personality configuration
    fn personality(&self) -> &AiPersonality;
}
