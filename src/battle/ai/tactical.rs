//! Greedy single-turn AI
//!
//! Scores every attack open to the acting stack and takes the best one. When
//! nothing clears the personality's threshold it closes in on the nearest
//! enemy, then waits, then defends.

use ordered_float::OrderedFloat;
use std::cmp::Reverse;

use crate::battle::action::ActionCommand;
use crate::battle::ai::personality::AiPersonality;
use crate::battle::ai::scoring::{attack_options, evaluate_attack, AttackEvaluation};
use crate::battle::ai::BattleAi;
use crate::battle::hex::HexCoord;
use crate::battle::pathfinding::Pathfinder;
use crate::battle::state::CombatState;
use crate::battle::units::CombatUnit;
use crate::core::config::BattleConfig;

pub struct TacticalAi {
    personality: AiPersonality,
}

impl TacticalAi {
    pub fn new(personality: AiPersonality) -> Self {
        Self { personality }
    }

    /// Best attack for `actor`, whatever its score
    pub fn best_attack(
        &self,
        state: &CombatState,
        actor: &CombatUnit,
        rules: &BattleConfig,
        pathfinder: &dyn Pathfinder,
    ) -> Option<AttackEvaluation> {
        attack_options(state, actor, pathfinder)
            .into_iter()
            .enumerate()
            .filter_map(|(index, option)| {
                let target = state.unit(option.target)?;
                let eval = evaluate_attack(
                    actor,
                    target,
                    option,
                    &rules.damage,
                    &self.personality.weights,
                );
                Some((index, eval))
            })
            .max_by_key(|(index, eval)| (OrderedFloat(eval.score), Reverse(*index)))
            .map(|(_, eval)| eval)
    }

    /// Reachable hex that gets closest to any living enemy, if it gains ground
    fn approach(
        &self,
        state: &CombatState,
        actor: &CombatUnit,
        pathfinder: &dyn Pathfinder,
    ) -> Option<HexCoord> {
        let enemies: Vec<HexCoord> = state
            .living(actor.side.opponent())
            .map(|u| u.position)
            .collect();
        let gap = |hex: HexCoord| {
            enemies
                .iter()
                .filter_map(|e| hex.distance(e))
                .min()
                .unwrap_or(u32::MAX)
        };

        let speed = actor.effective_speed().max(0) as u32;
        let reach = pathfinder.reachable(&state.battlefield, actor, speed);
        let current = gap(actor.position);

        reach
            .hexes()
            .into_iter()
            .filter(|h| *h != actor.position)
            .map(|h| (gap(h), reach.distance_to(h).unwrap_or(u32::MAX), h))
            .min_by_key(|(g, d, h)| (*g, *d, h.y(), h.x()))
            .filter(|(g, _, _)| *g < current)
            .map(|(_, _, h)| h)
    }
}

impl Default for TacticalAi {
    fn default() -> Self {
        Self::new(AiPersonality::default())
    }
}

impl BattleAi for TacticalAi {
    fn choose_action(
        &mut self,
        state: &CombatState,
        rules: &BattleConfig,
        pathfinder: &dyn Pathfinder,
    ) -> Option<ActionCommand> {
        let actor = state.unit(state.current_actor()?)?;
        let side = actor.side;

        if let Some(best) = self.best_attack(state, actor, rules, pathfinder) {
            if best.score >= self.personality.weights.min_score {
                let option = best.option;
                let command = if option.is_ranged {
                    ActionCommand::ranged(side, actor.id, option.target)
                } else {
                    match option.origin {
                        Some(origin) => {
                            ActionCommand::melee_from(side, actor.id, option.target, origin)
                        }
                        None => ActionCommand::melee(side, actor.id, option.target),
                    }
                };
                return Some(command);
            }
        }

        if let Some(hex) = self.approach(state, actor, pathfinder) {
            return Some(ActionCommand::move_to(side, actor.id, hex));
        }

        if !actor.has_waited {
            return Some(ActionCommand::wait(side, actor.id));
        }
        Some(ActionCommand::defend(side, actor.id))
    }

    fn personality(&self) -> &AiPersonality {
        &self.personality
    }
}
