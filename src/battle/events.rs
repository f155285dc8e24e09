//! Battle events for the presentation layer
//!
//! Every command returns the events it caused; the resolver also keeps the
//! full log for the whole battle.

use serde::{Deserialize, Serialize};

use crate::battle::fortune::LuckRoll;
use crate::battle::hex::HexCoord;
use crate::battle::scheduler::TurnPhase;
use crate::battle::state::BattleOutcome;
use crate::core::types::{Round, UnitId};

/// Outcome of one strike, with the defender's counter nested inside
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatResult {
    pub attacker: UnitId,
    pub defender: UnitId,
    pub damage: u32,
    pub kills: u32,
    pub defender_died: bool,
    pub is_ranged: bool,
    pub luck: LuckRoll,
    /// Set only on retaliation strikes; these never provoke a counter
    pub is_retaliation: bool,
    pub retaliation: Option<Box<CombatResult>>,
}

impl CombatResult {
    /// A strike that has not landed yet
    pub fn new(attacker: UnitId, defender: UnitId, is_ranged: bool) -> Self {
        Self {
            attacker,
            defender,
            damage: 0,
            kills: 0,
            defender_died: false,
            is_ranged,
            luck: LuckRoll::Neutral,
            is_retaliation: false,
            retaliation: None,
        }
    }

    /// Damage dealt by this strike and its counter, in order
    pub fn strikes(&self) -> Vec<&CombatResult> {
        let mut strikes = vec![self];
        if let Some(counter) = &self.retaliation {
            strikes.extend(counter.strikes());
        }
        strikes
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleEvent {
    pub round: Round,
    pub event_type: BattleEventType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEventType {
    BattleStarted,
    RoundStarted,
    TurnStarted {
        unit_id: UnitId,
        phase: TurnPhase,
        bonus: bool,
    },
    UnitMoved {
        unit_id: UnitId,
        from: HexCoord,
        to: HexCoord,
        distance: u32,
    },
    UnitWaited {
        unit_id: UnitId,
    },
    UnitDefended {
        unit_id: UnitId,
        defense_bonus: i32,
    },
    AttackResolved(CombatResult),
    UnitDied {
        unit_id: UnitId,
    },
    MoraleBonus {
        unit_id: UnitId,
    },
    MoraleFreeze {
        unit_id: UnitId,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
}

/// Events produced by a single call into the resolver
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BattleEventLog {
    pub events: Vec<BattleEvent>,
}

impl BattleEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event_type: BattleEventType, description: String, round: Round) {
        self.events.push(BattleEvent {
            round,
            event_type,
            description,
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BattleEvent> {
        self.events.iter()
    }

    /// Every strike resolved in this log, retaliations included
    pub fn attacks(&self) -> impl Iterator<Item = &CombatResult> {
        self.events.iter().filter_map(|e| match &e.event_type {
            BattleEventType::AttackResolved(result) => Some(result),
            _ => None,
        })
    }

    pub fn contains(&self, predicate: impl Fn(&BattleEventType) -> bool) -> bool {
        self.events.iter().any(|e| predicate(&e.event_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(attacker: u32, defender: u32, damage: u32) -> CombatResult {
        CombatResult {
            damage,
            ..CombatResult::new(UnitId(attacker), UnitId(defender), false)
        }
    }

    #[test]
    fn test_strikes_flatten_retaliation() {
        let mut first = hit(0, 1, 10);
        first.retaliation = Some(Box::new(CombatResult {
            is_retaliation: true,
            ..hit(1, 0, 4)
        }));
        let damage: Vec<u32> = first.strikes().iter().map(|s| s.damage).collect();
        assert_eq!(damage, vec![10, 4]);
    }

    #[test]
    fn test_log_filters_attacks() {
        let mut log = BattleEventLog::new();
        log.push(BattleEventType::RoundStarted, "Round 1".into(), 1);
        log.push(BattleEventType::AttackResolved(hit(0, 1, 7)), "hit".into(), 1);
        assert_eq!(log.len(), 2);
        assert_eq!(log.attacks().count(), 1);
        assert!(log.contains(|e| matches!(e, BattleEventType::RoundStarted)));
        assert!(!log.contains(|e| matches!(e, BattleEventType::BattleStarted)));
    }
}
