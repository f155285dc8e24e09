//! Attack scoring
//!
//! score = expected damage - expected retaliation - expected friendly fire
//!         + lethal bonus - self-death penalty
//!
//! Expectations use the midpoint of the damage range with no luck.

use serde::{Deserialize, Serialize};

use crate::battle::ai::personality::AiWeights;
use crate::battle::damage::{estimate_damage, strike_context};
use crate::battle::hex::HexCoord;
use crate::battle::pathfinding::Pathfinder;
use crate::battle::state::CombatState;
use crate::battle::units::CombatUnit;
use crate::core::config::DamageConfig;
use crate::core::types::UnitId;

/// One way the acting stack could attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOption {
    pub target: UnitId,
    pub is_ranged: bool,
    /// Hex to strike from; `None` when striking from where it stands
    pub origin: Option<HexCoord>,
    pub charge: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackEvaluation {
    pub option: AttackOption,
    pub expected_damage: f64,
    pub expected_retaliation: f64,
    pub friendly_fire: f64,
    pub lethal: bool,
    pub attacker_dies: bool,
    pub score: f64,
}

/// Every legal attack for `actor`, in a stable order
pub fn attack_options(
    state: &CombatState,
    actor: &CombatUnit,
    pathfinder: &dyn Pathfinder,
) -> Vec<AttackOption> {
    let mut enemies: Vec<&CombatUnit> = state.living(actor.side.opponent()).collect();
    enemies.sort_by_key(|u| u.id);

    let mut options = Vec::new();

    let blocked = state.adjacent_enemies(actor).next().is_some();
    if actor.ammo > 0 && !blocked {
        options.extend(enemies.iter().map(|enemy| AttackOption {
            target: enemy.id,
            is_ranged: true,
            origin: None,
            charge: 0,
        }));
    }

    let speed = actor.effective_speed().max(0) as u32;
    let reach = pathfinder.reachable(&state.battlefield, actor, speed);
    let hexes = reach.hexes();
    for enemy in enemies {
        let closest = hexes
            .iter()
            .filter(|h| actor.is_adjacent_from(**h, enemy))
            .filter_map(|h| reach.distance_to(*h).map(|d| (*h, d)))
            .min_by_key(|(_, d)| *d);

        if let Some((hex, distance)) = closest {
            options.push(AttackOption {
                target: enemy.id,
                is_ranged: false,
                origin: (hex != actor.position).then_some(hex),
                charge: distance,
            });
        }
    }

    options
}

pub fn evaluate_attack(
    actor: &CombatUnit,
    target: &CombatUnit,
    option: AttackOption,
    rules: &DamageConfig,
    weights: &AiWeights,
) -> AttackEvaluation {
    let ctx = strike_context(actor, target, option.is_ranged, option.charge, rules);
    let target_health = target.total_health() as f64;
    let expected_damage = estimate_damage(actor, target, &ctx, rules)
        .average()
        .min(target_health);
    let lethal = expected_damage >= target_health;

    let expected_retaliation = if option.is_ranged
        || lethal
        || actor.abilities.no_melee_retaliation
        || !target.can_retaliate()
    {
        0.0
    } else {
        let mut wounded = target.clone();
        wounded.apply_damage(expected_damage.floor() as u32);
        let counter_ctx = strike_context(&wounded, actor, false, 0, rules);
        estimate_damage(&wounded, actor, &counter_ctx, rules)
            .average()
            .min(actor.total_health() as f64)
    };
    let attacker_dies = expected_retaliation >= actor.total_health() as f64;

    // no strike in the core hits more than one stack
    let friendly_fire = 0.0;

    let mut score = weights.damage_value * expected_damage
        - weights.retaliation_aversion * expected_retaliation
        - weights.friendly_fire_aversion * friendly_fire;
    if lethal {
        score += weights.lethal_bonus;
    }
    if attacker_dies {
        score -= weights.self_death_penalty;
    }

    AttackEvaluation {
        option,
        expected_damage,
        expected_retaliation,
        friendly_fire,
        lethal,
        attacker_dies,
        score,
    }
}
