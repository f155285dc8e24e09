//! Turn scheduler: who acts next
//!
//! A round runs through three phases, never backwards:
//! Normal -> WaitWithMoraleBonus -> Wait.
//!
//! The Normal phase always picks the highest-priority stack at the moment of
//! asking (speed, then slot within a side, then the side that did not act
//! last). Wait phases hand out turns in the order stacks chose to wait.
//! Bonus turns jump ahead of everything in the current phase.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::battle::units::CombatUnit;
use crate::core::error::ValidationError;
use crate::core::types::{CombatSide, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TurnPhase {
    #[default]
    Normal,
    WaitWithMoraleBonus,
    Wait,
}

/// A turn handed out by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTurn {
    pub unit: UnitId,
    pub phase: TurnPhase,
    pub bonus: bool,
    /// All queues ran dry and a new round was started to find this turn
    pub new_round: bool,
}

/// Priority between two stacks; `Less` acts first
pub fn turn_order(a: &CombatUnit, b: &CombatUnit, last_side: Option<CombatSide>) -> Ordering {
    b.effective_speed()
        .cmp(&a.effective_speed())
        .then_with(|| {
            if a.side == b.side {
                a.slot.cmp(&b.slot)
            } else {
                side_rank(a.side, last_side).cmp(&side_rank(b.side, last_side))
            }
        })
        .then(a.id.cmp(&b.id))
}

/// The side that did not act last goes first, otherwise fixed priority
fn side_rank(side: CombatSide, last_side: Option<CombatSide>) -> u8 {
    match last_side {
        Some(last) if last == side => 1,
        Some(_) => 0,
        None => side.priority(),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnScheduler {
    phase: TurnPhase,
    normal: Vec<UnitId>,
    wait_with_morale: VecDeque<UnitId>,
    wait: VecDeque<UnitId>,
    bonus: VecDeque<UnitId>,
    last_side: Option<CombatSide>,
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn last_side(&self) -> Option<CombatSide> {
        self.last_side
    }

    /// Seed the Normal queue with every living stack that has not acted
    pub fn build_queue(&mut self, units: &[CombatUnit]) {
        let mut ready: Vec<&CombatUnit> = units
            .iter()
            .filter(|u| u.is_alive() && !u.has_moved)
            .collect();
        ready.sort_by(|a, b| turn_order(a, b, self.last_side));

        self.normal = ready.into_iter().map(|u| u.id).collect();
        self.wait_with_morale.clear();
        self.wait.clear();
        self.bonus.clear();
        self.phase = TurnPhase::Normal;
    }

    /// Stacks still queued in `phase`, in the order they are stored
    pub fn queued(&self, phase: TurnPhase) -> Vec<UnitId> {
        match phase {
            TurnPhase::Normal => self.normal.clone(),
            TurnPhase::WaitWithMoraleBonus => self.wait_with_morale.iter().copied().collect(),
            TurnPhase::Wait => self.wait.iter().copied().collect(),
        }
    }

    pub fn pending_bonus_turns(&self) -> Vec<UnitId> {
        self.bonus.iter().copied().collect()
    }

    /// Remember which side acted, for the cross-side tie-break
    pub fn record_action(&mut self, side: CombatSide) {
        self.last_side = Some(side);
    }

    /// Hand out the next turn.
    ///
    /// Starts a new round (resetting every stack) when all queues are empty.
    /// Returns `None` only when no living stack is left.
    pub fn next(&mut self, units: &mut [CombatUnit], retaliations: u32) -> Option<ScheduledTurn> {
        let mut new_round = false;

        loop {
            while let Some(id) = self.bonus.pop_front() {
                if is_alive(units, id) {
                    return Some(ScheduledTurn {
                        unit: id,
                        phase: self.phase,
                        bonus: true,
                        new_round,
                    });
                }
            }

            if let Some(id) = self.pop_current_phase(units) {
                return Some(ScheduledTurn {
                    unit: id,
                    phase: self.phase,
                    bonus: false,
                    new_round,
                });
            }

            match self.phase {
                TurnPhase::Normal => self.phase = TurnPhase::WaitWithMoraleBonus,
                TurnPhase::WaitWithMoraleBonus => self.phase = TurnPhase::Wait,
                TurnPhase::Wait => {
                    if new_round {
                        return None;
                    }
                    for unit in units.iter_mut() {
                        unit.reset_for_new_round(retaliations);
                    }
                    self.build_queue(units);
                    new_round = true;
                }
            }
        }
    }

    fn pop_current_phase(&mut self, units: &[CombatUnit]) -> Option<UnitId> {
        match self.phase {
            TurnPhase::Normal => {
                self.normal.retain(|id| is_alive(units, *id));
                let last_side = self.last_side;
                let (index, _) = self
                    .normal
                    .iter()
                    .enumerate()
                    .filter_map(|(i, id)| units.get(id.index()).map(|u| (i, u)))
                    .min_by(|(_, a), (_, b)| turn_order(a, b, last_side))?;
                Some(self.normal.remove(index))
            }
            TurnPhase::WaitWithMoraleBonus => pop_living(&mut self.wait_with_morale, units),
            TurnPhase::Wait => pop_living(&mut self.wait, units),
        }
    }

    /// Defer `unit` to a wait phase for the rest of the round.
    ///
    /// Stacks with negative morale fall to the plain Wait phase, all others
    /// wait with their morale intact. Only one wait per round is allowed.
    pub fn move_to_wait(&mut self, unit: &mut CombatUnit) -> Result<TurnPhase, ValidationError> {
        if unit.has_waited {
            return Err(ValidationError::AlreadyWaited(unit.id));
        }

        self.remove(unit.id);
        unit.has_waited = true;
        if unit.morale < 0 {
            self.wait.push_back(unit.id);
            Ok(TurnPhase::Wait)
        } else {
            self.wait_with_morale.push_back(unit.id);
            Ok(TurnPhase::WaitWithMoraleBonus)
        }
    }

    /// Give `unit` an extra turn ahead of everything in the current phase
    pub fn insert_bonus_turn(&mut self, unit: UnitId) {
        self.bonus.push_front(unit);
    }

    /// Drop a stack from every queue
    pub fn remove(&mut self, unit: UnitId) {
        self.normal.retain(|id| *id != unit);
        self.wait_with_morale.retain(|id| *id != unit);
        self.wait.retain(|id| *id != unit);
        self.bonus.retain(|id| *id != unit);
    }

    /// Upcoming turns without touching the real battle.
    ///
    /// Runs the scheduler on clones, assuming each turn is a plain action.
    pub fn preview(&self, units: &[CombatUnit], count: usize, retaliations: u32) -> Vec<UnitId> {
        let mut scheduler = self.clone();
        let mut units = units.to_vec();
        let mut order = Vec::with_capacity(count);

        while order.len() < count {
            let Some(turn) = scheduler.next(&mut units, retaliations) else {
                break;
            };
            if let Some(unit) = units.get_mut(turn.unit.index()) {
                unit.has_moved = true;
                scheduler.record_action(unit.side);
            }
            order.push(turn.unit);
        }

        order
    }
}

fn is_alive(units: &[CombatUnit], id: UnitId) -> bool {
    units.get(id.index()).is_some_and(CombatUnit::is_alive)
}

fn pop_living(queue: &mut VecDeque<UnitId>, units: &[CombatUnit]) -> Option<UnitId> {
    while let Some(id) = queue.pop_front() {
        if is_alive(units, id) {
            return Some(id);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::hex::HexCoord;
    use crate::battle::roster::{CreatureProfile, StackSpec};

    fn unit(id: u32, side: CombatSide, speed: i32, slot: u8) -> CombatUnit {
        let spec = StackSpec::new(CreatureProfile::new("Test", 1, 1, speed, 5, 1, 1), 3, slot);
        CombatUnit::from_spec(UnitId(id), side, &spec, HexCoord::new(1, 0), 1)
    }

    /// Pop a turn and act with it the way the resolver does
    fn act(scheduler: &mut TurnScheduler, units: &mut [CombatUnit]) -> ScheduledTurn {
        let turn = scheduler.next(units, 1).unwrap();
        let unit = &mut units[turn.unit.index()];
        unit.has_moved = true;
        scheduler.record_action(unit.side);
        turn
    }

    #[test]
    fn test_speed_descending() {
        let mut units = vec![
            unit(0, CombatSide::Attacker, 4, 0),
            unit(1, CombatSide::Attacker, 9, 1),
            unit(2, CombatSide::Defender, 6, 0),
        ];
        let mut scheduler = TurnScheduler::new();
        scheduler.build_queue(&units);

        let order: Vec<_> = (0..3).map(|_| act(&mut scheduler, &mut units).unit).collect();
        assert_eq!(order, vec![UnitId(1), UnitId(2), UnitId(0)]);
    }

    #[test]
    fn test_same_side_tie_uses_slot() {
        let mut units = vec![
            unit(0, CombatSide::Attacker, 5, 5),
            unit(1, CombatSide::Attacker, 5, 2),
        ];
        let mut scheduler = TurnScheduler::new();
        scheduler.build_queue(&units);
        assert_eq!(act(&mut scheduler, &mut units).unit, UnitId(1));
        assert_eq!(act(&mut scheduler, &mut units).unit, UnitId(0));
    }

    #[test]
    fn test_cross_side_tie_alternates() {
        let mut units = vec![
            unit(0, CombatSide::Attacker, 5, 0),
            unit(1, CombatSide::Attacker, 5, 1),
            unit(2, CombatSide::Defender, 5, 0),
            unit(3, CombatSide::Defender, 5, 1),
        ];
        let mut scheduler = TurnScheduler::new();
        scheduler.build_queue(&units);

        // Nobody acted yet: attacker priority, then sides alternate
        let order: Vec<_> = (0..4).map(|_| act(&mut scheduler, &mut units).unit).collect();
        assert_eq!(order, vec![UnitId(0), UnitId(2), UnitId(1), UnitId(3)]);
    }

    #[test]
    fn test_wait_goes_after_normal_phase() {
        let mut units = vec![
            unit(0, CombatSide::Attacker, 9, 0),
            unit(1, CombatSide::Defender, 5, 0),
            unit(2, CombatSide::Attacker, 3, 1),
        ];
        let mut scheduler = TurnScheduler::new();
        scheduler.build_queue(&units);

        let first = scheduler.next(&mut units, 1).unwrap();
        assert_eq!(first.unit, UnitId(0));
        let phase = scheduler.move_to_wait(&mut units[0]).unwrap();
        assert_eq!(phase, TurnPhase::WaitWithMoraleBonus);

        assert_eq!(act(&mut scheduler, &mut units).unit, UnitId(1));
        assert_eq!(act(&mut scheduler, &mut units).unit, UnitId(2));
        let waited = act(&mut scheduler, &mut units);
        assert_eq!(waited.unit, UnitId(0));
        assert_eq!(waited.phase, TurnPhase::WaitWithMoraleBonus);
        assert!(!waited.new_round);
    }

    #[test]
    fn test_negative_morale_waits_last() {
        let mut units = vec![
            unit(0, CombatSide::Attacker, 9, 0),
            unit(1, CombatSide::Defender, 8, 0),
            unit(2, CombatSide::Attacker, 3, 1),
        ];
        units[0].morale = -1;
        let mut scheduler = TurnScheduler::new();
        scheduler.build_queue(&units);

        scheduler.next(&mut units, 1).unwrap();
        assert_eq!(scheduler.move_to_wait(&mut units[0]).unwrap(), TurnPhase::Wait);
        scheduler.next(&mut units, 1).unwrap();
        assert_eq!(scheduler.move_to_wait(&mut units[1]).unwrap(), TurnPhase::WaitWithMoraleBonus);

        assert_eq!(act(&mut scheduler, &mut units).unit, UnitId(2));
        assert_eq!(act(&mut scheduler, &mut units).unit, UnitId(1));
        let last = act(&mut scheduler, &mut units);
        assert_eq!((last.unit, last.phase), (UnitId(0), TurnPhase::Wait));
    }

    #[test]
    fn test_double_wait_rejected() {
        let mut units = vec![unit(0, CombatSide::Attacker, 5, 0)];
        let mut scheduler = TurnScheduler::new();
        scheduler.build_queue(&units);
        scheduler.next(&mut units, 1).unwrap();
        scheduler.move_to_wait(&mut units[0]).unwrap();
        scheduler.next(&mut units, 1).unwrap();
        assert_eq!(
            scheduler.move_to_wait(&mut units[0]),
            Err(ValidationError::AlreadyWaited(UnitId(0)))
        );
    }

    #[test]
    fn test_new_round_resets_units() {
        let mut units = vec![
            unit(0, CombatSide::Attacker, 5, 0),
            unit(1, CombatSide::Defender, 4, 0),
        ];
        let mut scheduler = TurnScheduler::new();
        scheduler.build_queue(&units);
        act(&mut scheduler, &mut units);
        act(&mut scheduler, &mut units);

        units[1].retaliations_left = 0;
        let turn = scheduler.next(&mut units, 1).unwrap();
        assert!(turn.new_round);
        assert_eq!(turn.unit, UnitId(0));
        assert_eq!(units[1].retaliations_left, 1);
        assert!(!units[1].has_moved);
    }

    #[test]
    fn test_dead_units_skipped() {
        let mut units = vec![
            unit(0, CombatSide::Attacker, 9, 0),
            unit(1, CombatSide::Defender, 5, 0),
        ];
        let mut scheduler = TurnScheduler::new();
        scheduler.build_queue(&units);
        units[0].apply_damage(1000);
        assert_eq!(act(&mut scheduler, &mut units).unit, UnitId(1));
    }

    #[test]
    fn test_no_living_units() {
        let mut units = vec![unit(0, CombatSide::Attacker, 9, 0)];
        units[0].apply_damage(1000);
        let mut scheduler = TurnScheduler::new();
        scheduler.build_queue(&units);
        assert!(scheduler.next(&mut units, 1).is_none());
    }

    #[test]
    fn test_bonus_turn_jumps_queue() {
        let mut units = vec![
            unit(0, CombatSide::Attacker, 9, 0),
            unit(1, CombatSide::Defender, 5, 0),
        ];
        let mut scheduler = TurnScheduler::new();
        scheduler.build_queue(&units);
        act(&mut scheduler, &mut units);
        scheduler.insert_bonus_turn(UnitId(0));

        let bonus = act(&mut scheduler, &mut units);
        assert_eq!(bonus.unit, UnitId(0));
        assert!(bonus.bonus);
        assert_eq!(act(&mut scheduler, &mut units).unit, UnitId(1));
    }

    #[test]
    fn test_preview_crosses_rounds_without_mutation() {
        let units = vec![
            unit(0, CombatSide::Attacker, 9, 0),
            unit(1, CombatSide::Defender, 5, 0),
        ];
        let mut scheduler = TurnScheduler::new();
        scheduler.build_queue(&units);

        let preview = scheduler.preview(&units, 5, 1);
        assert_eq!(
            preview,
            vec![UnitId(0), UnitId(1), UnitId(0), UnitId(1), UnitId(0)]
        );
        assert_eq!(scheduler.queued(TurnPhase::Normal).len(), 2);
        assert!(units.iter().all(|u| !u.has_moved));
    }

    #[test]
    fn test_speed_change_mid_round_respected() {
        let mut units = vec![
            unit(0, CombatSide::Attacker, 9, 0),
            unit(1, CombatSide::Defender, 5, 0),
            unit(2, CombatSide::Defender, 6, 1),
        ];
        let mut scheduler = TurnScheduler::new();
        scheduler.build_queue(&units);
        act(&mut scheduler, &mut units);

        units[1].base_speed = 10;
        assert_eq!(act(&mut scheduler, &mut units).unit, UnitId(1));
    }
}
