//! Damage and casualty calculation
//!
//! Pure functions: nothing here mutates a stack or draws randomness. The
//! resolver rolls inside the returned range and applies the result.
//!
//! The formula has three parts:
//! - base damage: per-individual range times stack size (bless/curse pin it)
//! - attack factor: additive bonuses starting at 1.0
//! - defense factor: multiplicative reductions starting at 1.0

use serde::{Deserialize, Serialize};

use crate::battle::units::CombatUnit;
use crate::core::config::DamageConfig;

/// Extra additive attack bonuses supplied by abilities outside the core
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttackBonuses {
    pub specialty: f64,
    /// Bonus per hex in `DamageContext::charge_distance`
    pub jousting_per_hex: f64,
    pub hate: f64,
    pub death_blow: f64,
}

/// Extra multiplicative reductions supplied outside the core
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DefenseReductions {
    pub armor: f64,
    pub shield: f64,
    pub obstacle_cover: f64,
}

/// Everything about a single strike that is not a stat of either stack
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageContext {
    pub is_ranged: bool,
    /// Hex distance between shooter and target (ranged only)
    pub distance: u32,
    /// Hexes walked before a melee strike
    pub charge_distance: u32,
    pub lucky: bool,
    pub unlucky: bool,
    pub blessed: bool,
    pub cursed: bool,
    pub bonuses: AttackBonuses,
    pub reductions: DefenseReductions,
}

impl DamageContext {
    pub fn melee() -> Self {
        Self::default()
    }

    pub fn ranged(distance: u32) -> Self {
        Self {
            is_ranged: true,
            distance,
            ..Self::default()
        }
    }
}

/// Context for `attacker` striking `defender`, before any luck roll.
///
/// Bless/curse come from the attacker's effects; jousting stacks get the
/// configured per-hex bonus for `charge_distance`.
pub fn strike_context(
    attacker: &CombatUnit,
    defender: &CombatUnit,
    is_ranged: bool,
    charge_distance: u32,
    rules: &DamageConfig,
) -> DamageContext {
    let mut ctx = if is_ranged {
        DamageContext::ranged(attacker.distance_to(defender).unwrap_or(0))
    } else {
        DamageContext {
            charge_distance,
            ..DamageContext::melee()
        }
    };
    ctx.blessed = attacker.is_blessed();
    ctx.cursed = attacker.is_cursed();
    if attacker.abilities.jousting && !is_ranged {
        ctx.bonuses.jousting_per_hex = rules.jousting_bonus_per_hex;
    }
    ctx
}

/// Inclusive damage bounds for one strike of a whole stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEstimate {
    pub min: u32,
    pub max: u32,
}

impl DamageEstimate {
    pub fn average(&self) -> f64 {
        (f64::from(self.min) + f64::from(self.max)) / 2.0
    }
}

/// Additive attack factor (1.0 = unmodified)
pub fn attack_factor(
    attacker: &CombatUnit,
    defender: &CombatUnit,
    ctx: &DamageContext,
    rules: &DamageConfig,
) -> f64 {
    let mut factor = 1.0;

    let advantage = attacker.effective_attack() - defender.effective_defense();
    if advantage > 0 {
        factor += (f64::from(advantage) * rules.attack_bonus_per_point).min(rules.max_attack_bonus);
    }

    if ctx.lucky {
        factor += rules.lucky_bonus;
    }

    let b = &ctx.bonuses;
    factor += b.specialty + b.hate + b.death_blow;
    factor += b.jousting_per_hex * f64::from(ctx.charge_distance);

    factor
}

/// Multiplicative defense factor (1.0 = no reduction)
pub fn defense_factor(
    attacker: &CombatUnit,
    defender: &CombatUnit,
    ctx: &DamageContext,
    rules: &DamageConfig,
) -> f64 {
    let mut reductions = Vec::with_capacity(6);

    let advantage = defender.effective_defense() - attacker.effective_attack();
    if advantage > 0 {
        reductions.push(
            (f64::from(advantage) * rules.defense_reduction_per_point)
                .min(rules.max_defense_reduction),
        );
    }

    if ctx.is_ranged && ctx.distance > rules.effective_range {
        reductions.push(rules.range_penalty);
    } else if !ctx.is_ranged && attacker.is_shooter() && !attacker.abilities.no_melee_penalty {
        reductions.push(rules.melee_penalty);
    }

    if ctx.unlucky {
        reductions.push(rules.unlucky_penalty);
    }

    let r = &ctx.reductions;
    reductions.extend([r.armor, r.shield, r.obstacle_cover]);

    reductions
        .into_iter()
        .map(|penalty| 1.0 - penalty.clamp(0.0, 1.0))
        .product()
}

/// Damage bounds for `attacker` striking `defender`
pub fn estimate_damage(
    attacker: &CombatUnit,
    defender: &CombatUnit,
    ctx: &DamageContext,
    rules: &DamageConfig,
) -> DamageEstimate {
    let count = u64::from(attacker.count);
    let mut base_min = u64::from(attacker.damage.min) * count;
    let mut base_max = u64::from(attacker.damage.max) * count;
    if ctx.cursed {
        base_max = base_min;
    } else if ctx.blessed {
        base_min = base_max;
    }

    let factor = attack_factor(attacker, defender, ctx, rules)
        * defense_factor(attacker, defender, ctx, rules);

    DamageEstimate {
        min: scaled(base_min, factor),
        max: scaled(base_max, factor),
    }
}

/// `floor(base * factor)`, at least 1
fn scaled(base: u64, factor: f64) -> u32 {
    // absorb float noise so exact products do not floor one below
    let value = (base as f64 * factor + 1e-9).floor();
    (value.min(f64::from(u32::MAX)) as u32).max(1)
}

/// Individuals of `defender` killed by `damage`
pub fn casualties(defender: &CombatUnit, damage: u32) -> u32 {
    if !defender.is_alive() || damage < defender.first_health {
        return 0;
    }
    let kills = 1 + (damage - defender.first_health) / defender.max_health;
    kills.min(defender.count)
}
