//! Creature stacks: the mutable combat record of one group of identical creatures
//!
//! A stack shares one health pool. Only the "first" individual can be partly
//! wounded; every other individual is at full health.

use serde::{Deserialize, Serialize};

use crate::battle::hex::{HexCoord, HexDirection};
use crate::battle::roster::StackSpec;
use crate::core::types::{CombatSide, UnitId};

/// Per-individual damage range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRange {
    pub min: u32,
    pub max: u32,
}

impl DamageRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Capability flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Abilities {
    pub flying: bool,
    pub double_attack: bool,
    /// Enemies attacked in melee never strike back
    pub no_melee_retaliation: bool,
    /// Shooter that fights hand to hand at full strength
    pub no_melee_penalty: bool,
    /// Gains attack for every hex charged before a melee strike
    pub jousting: bool,
    /// May return to its starting hex after a melee strike
    pub strike_and_return: bool,
}

/// Forces a damage roll to one end of its range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageBias {
    /// Blessed: always maximum damage
    Maximum,
    /// Cursed: always minimum damage
    Minimum,
}

/// Timed modifier to a stack's stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub name: String,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub damage_bias: Option<DamageBias>,
    /// Round boundaries this effect survives before expiring
    pub rounds_remaining: u32,
}

impl StatusEffect {
    pub fn new(name: impl Into<String>, rounds: u32) -> Self {
        Self {
            name: name.into(),
            attack: 0,
            defense: 0,
            speed: 0,
            damage_bias: None,
            rounds_remaining: rounds,
        }
    }

    pub fn with_attack(mut self, delta: i32) -> Self {
        self.attack = delta;
        self
    }

    pub fn with_defense(mut self, delta: i32) -> Self {
        self.defense = delta;
        self
    }

    pub fn with_speed(mut self, delta: i32) -> Self {
        self.speed = delta;
        self
    }

    pub fn with_bias(mut self, bias: DamageBias) -> Self {
        self.damage_bias = Some(bias);
        self
    }

    pub fn bless(rounds: u32) -> Self {
        Self::new("bless", rounds).with_bias(DamageBias::Maximum)
    }

    pub fn curse(rounds: u32) -> Self {
        Self::new("curse", rounds).with_bias(DamageBias::Minimum)
    }
}

/// One stack of identical creatures in battle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatUnit {
    pub id: UnitId,
    pub side: CombatSide,
    pub name: String,
    /// Roster slot (0-6), used only to break speed ties
    pub slot: u8,

    // Position
    pub position: HexCoord,
    pub facing: HexDirection,
    pub double_wide: bool,

    // Health pool
    pub count: u32,
    pub initial_count: u32,
    pub first_health: u32,
    pub max_health: u32,

    // Stats
    pub base_attack: i32,
    pub base_defense: i32,
    pub base_speed: i32,
    pub damage: DamageRange,
    pub morale: i8,
    pub luck: i8,
    pub effects: Vec<StatusEffect>,
    pub abilities: Abilities,

    // Resources
    pub max_ammo: u32,
    pub ammo: u32,
    pub retaliations_left: u32,

    // Per-round flags
    pub has_moved: bool,
    pub has_retaliated: bool,
    pub is_defending: bool,
    pub has_waited: bool,
}

impl CombatUnit {
    /// Build a stack from roster data, standing at `position` facing the enemy
    pub fn from_spec(
        id: UnitId,
        side: CombatSide,
        spec: &StackSpec,
        position: HexCoord,
        retaliations: u32,
    ) -> Self {
        let creature = &spec.creature;
        Self {
            id,
            side,
            name: creature.name.clone(),
            slot: spec.slot,
            position,
            facing: facing_for(side),
            double_wide: creature.double_wide,
            count: spec.count,
            initial_count: spec.count,
            first_health: creature.health,
            max_health: creature.health,
            base_attack: creature.attack,
            base_defense: creature.defense,
            base_speed: creature.speed,
            damage: DamageRange::new(creature.damage_min, creature.damage_max),
            morale: creature.morale,
            luck: creature.luck,
            effects: Vec::new(),
            abilities: creature.abilities,
            max_ammo: creature.shots,
            ammo: creature.shots,
            retaliations_left: retaliations,
            has_moved: false,
            has_retaliated: false,
            is_defending: false,
            has_waited: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.count > 0
    }

    /// Has a ranged attack at all (ammo may be spent)
    pub fn is_shooter(&self) -> bool {
        self.max_ammo > 0
    }

    /// Hexes covered by this stack
    pub fn occupied_hexes(&self) -> Vec<HexCoord> {
        footprint(self.position, self.facing, self.double_wide)
    }

    /// Hexes this stack would cover with its head at `head`
    pub fn footprint_at(&self, head: HexCoord) -> Vec<HexCoord> {
        footprint(head, self.facing, self.double_wide)
    }

    pub fn occupies(&self, hex: HexCoord) -> bool {
        self.occupied_hexes().contains(&hex)
    }

    /// Does any hex of this stack touch any hex of `other`?
    pub fn is_adjacent_to(&self, other: &CombatUnit) -> bool {
        self.is_adjacent_from(self.position, other)
    }

    /// Adjacency to `other` if this stack stood with its head at `head`
    pub fn is_adjacent_from(&self, head: HexCoord, other: &CombatUnit) -> bool {
        let theirs = other.occupied_hexes();
        self.footprint_at(head)
            .iter()
            .any(|mine| theirs.iter().any(|t| mine.is_adjacent(t)))
    }

    /// Closest hex distance between the two footprints
    pub fn distance_to(&self, other: &CombatUnit) -> Option<u32> {
        let theirs = other.occupied_hexes();
        self.occupied_hexes()
            .iter()
            .flat_map(|mine| theirs.iter().filter_map(move |t| mine.distance(t)))
            .min()
    }

    pub fn effective_attack(&self) -> i32 {
        (self.base_attack + self.effects.iter().map(|e| e.attack).sum::<i32>()).max(0)
    }

    pub fn effective_defense(&self) -> i32 {
        (self.base_defense + self.effects.iter().map(|e| e.defense).sum::<i32>()).max(0)
    }

    pub fn effective_speed(&self) -> i32 {
        (self.base_speed + self.effects.iter().map(|e| e.speed).sum::<i32>()).max(0)
    }

    pub fn is_blessed(&self) -> bool {
        self.effects
            .iter()
            .any(|e| e.damage_bias == Some(DamageBias::Maximum))
    }

    pub fn is_cursed(&self) -> bool {
        self.effects
            .iter()
            .any(|e| e.damage_bias == Some(DamageBias::Minimum))
    }

    /// Total hit points left in the stack
    pub fn total_health(&self) -> u64 {
        if !self.is_alive() {
            return 0;
        }
        u64::from(self.count - 1) * u64::from(self.max_health) + u64::from(self.first_health)
    }

    /// Apply damage, killing whole individuals as it overflows.
    ///
    /// Returns the number of individuals killed. Damage beyond the stack's
    /// total health is discarded; a dead stack is left untouched.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        if !self.is_alive() || amount == 0 {
            return 0;
        }

        let before = self.count;
        let remaining = self.total_health().saturating_sub(u64::from(amount));
        if remaining == 0 {
            self.count = 0;
            self.first_health = 0;
        } else {
            let max = u64::from(self.max_health);
            let count = remaining.div_ceil(max);
            self.count = count as u32;
            self.first_health = (remaining - (count - 1) * max) as u32;
        }
        before - self.count
    }

    /// Restore health to the wounded individual, never resurrecting the dead
    pub fn heal(&mut self, amount: u32) {
        if !self.is_alive() {
            return;
        }
        self.first_health = self.first_health.saturating_add(amount).min(self.max_health);
    }

    pub fn add_status_effect(&mut self, effect: StatusEffect) {
        self.effects.push(effect);
    }

    /// Round boundary: age effects and clear the per-round flags
    pub fn reset_for_new_round(&mut self, retaliations: u32) {
        for effect in &mut self.effects {
            effect.rounds_remaining = effect.rounds_remaining.saturating_sub(1);
        }
        self.effects.retain(|e| e.rounds_remaining > 0);

        self.has_moved = false;
        self.has_retaliated = false;
        self.is_defending = false;
        self.has_waited = false;
        self.retaliations_left = retaliations;
    }

    /// Can strike back at a melee attacker right now
    pub fn can_retaliate(&self) -> bool {
        self.is_alive() && self.retaliations_left > 0
    }
}

/// Stacks face the enemy: attackers look right, defenders left
pub fn facing_for(side: CombatSide) -> HexDirection {
    match side {
        CombatSide::Attacker => HexDirection::Right,
        CombatSide::Defender => HexDirection::Left,
    }
}

/// Head plus, for double-wide creatures, the tail hex behind it
pub fn footprint(head: HexCoord, facing: HexDirection, double_wide: bool) -> Vec<HexCoord> {
    if double_wide {
        vec![head, head.neighbor(facing.opposite())]
    } else {
        vec![head]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::roster::CreatureProfile;

    fn stack(count: u32, health: u32) -> CombatUnit {
        let spec = StackSpec::new(CreatureProfile::new("Pikeman", 4, 5, 4, health, 1, 3), count, 0);
        CombatUnit::from_spec(UnitId(0), CombatSide::Attacker, &spec, HexCoord::new(1, 0), 1)
    }

    #[test]
    fn test_from_spec_full_health() {
        let unit = stack(10, 10);
        assert_eq!(unit.count, 10);
        assert_eq!(unit.first_health, 10);
        assert_eq!(unit.total_health(), 100);
        assert_eq!(unit.facing, HexDirection::Right);
    }

    #[test]
    fn test_damage_within_first_individual() {
        let mut unit = stack(3, 10);
        assert_eq!(unit.apply_damage(4), 0);
        assert_eq!(unit.count, 3);
        assert_eq!(unit.first_health, 6);
    }

    #[test]
    fn test_damage_overflows_into_individuals() {
        let mut unit = stack(3, 10);
        assert_eq!(unit.apply_damage(25), 2);
        assert_eq!(unit.count, 1);
        assert_eq!(unit.first_health, 5);
    }

    #[test]
    fn test_exact_kill_refills_next() {
        let mut unit = stack(3, 10);
        assert_eq!(unit.apply_damage(10), 1);
        assert_eq!(unit.count, 2);
        assert_eq!(unit.first_health, 10);
    }

    #[test]
    fn test_overkill_discarded() {
        let mut unit = stack(2, 10);
        assert_eq!(unit.apply_damage(500), 2);
        assert_eq!(unit.count, 0);
        assert_eq!(unit.first_health, 0);
        assert!(!unit.is_alive());
    }

    #[test]
    fn test_damage_on_dead_stack_is_noop() {
        let mut unit = stack(1, 10);
        unit.apply_damage(10);
        let snapshot = (unit.count, unit.first_health);
        assert_eq!(unit.apply_damage(7), 0);
        assert_eq!((unit.count, unit.first_health), snapshot);
    }

    #[test]
    fn test_heal_caps_and_never_resurrects() {
        let mut unit = stack(3, 10);
        unit.apply_damage(14);
        assert_eq!((unit.count, unit.first_health), (2, 6));
        unit.heal(50);
        assert_eq!((unit.count, unit.first_health), (2, 10));

        unit.apply_damage(100);
        unit.heal(10);
        assert_eq!(unit.count, 0);
        assert_eq!(unit.first_health, 0);
    }

    #[test]
    fn test_effects_stack_additively_and_expire() {
        let mut unit = stack(5, 10);
        unit.add_status_effect(StatusEffect::new("haste", 2).with_speed(3));
        unit.add_status_effect(StatusEffect::new("frenzy", 1).with_attack(4).with_speed(-1));
        assert_eq!(unit.effective_speed(), 6);
        assert_eq!(unit.effective_attack(), 8);

        unit.reset_for_new_round(1);
        assert_eq!(unit.effects.len(), 1);
        assert_eq!(unit.effective_speed(), 7);
        assert_eq!(unit.effective_attack(), 4);

        unit.reset_for_new_round(1);
        assert!(unit.effects.is_empty());
    }

    #[test]
    fn test_reset_clears_round_flags() {
        let mut unit = stack(5, 10);
        unit.has_moved = true;
        unit.has_retaliated = true;
        unit.is_defending = true;
        unit.has_waited = true;
        unit.retaliations_left = 0;
        unit.reset_for_new_round(1);
        assert!(!unit.has_moved && !unit.has_retaliated && !unit.is_defending && !unit.has_waited);
        assert_eq!(unit.retaliations_left, 1);
    }

    #[test]
    fn test_bless_and_curse_flags() {
        let mut unit = stack(5, 10);
        assert!(!unit.is_blessed() && !unit.is_cursed());
        unit.add_status_effect(StatusEffect::bless(1));
        unit.add_status_effect(StatusEffect::curse(1));
        assert!(unit.is_blessed() && unit.is_cursed());
    }

    #[test]
    fn test_double_wide_footprint() {
        let mut unit = stack(1, 10);
        unit.double_wide = true;
        unit.position = HexCoord::new(2, 4);
        assert_eq!(unit.occupied_hexes(), vec![HexCoord::new(2, 4), HexCoord::new(1, 4)]);

        let tail = footprint(HexCoord::new(14, 4), HexDirection::Left, true)[1];
        assert_eq!(tail, HexCoord::new(15, 4));
    }
}
