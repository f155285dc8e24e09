//! Combat state: both rosters, the battlefield, the scheduler and the round
//!
//! Stacks live in one flat arena indexed by `UnitId`. Dead stacks stay in it
//! for reporting; the occupancy index on the battlefield only tracks the
//! living.

use serde::{Deserialize, Serialize};

use crate::battle::battlefield::Battlefield;
use crate::battle::hex::HexCoord;
use crate::battle::scheduler::{ScheduledTurn, TurnScheduler};
use crate::battle::units::CombatUnit;
use crate::core::types::{CombatSide, Round, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattlePhase {
    #[default]
    Active,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// One side has no living stacks
    Annihilation,
    Retreat,
    Surrender,
    /// Stopped by the caller after too many rounds
    RoundLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleOutcome {
    /// `None` for a draw
    pub winner: Option<CombatSide>,
    pub reason: EndReason,
}

/// Per-side bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideState {
    pub side: CombatSide,
    /// Turns completed this round (waits and freezes excluded)
    pub actions_this_round: u32,
    /// Left the field by retreating; survivors are forfeit
    pub fled: bool,
}

impl SideState {
    pub fn new(side: CombatSide) -> Self {
        Self {
            side,
            actions_this_round: 0,
            fled: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatState {
    pub units: Vec<CombatUnit>,
    pub sides: [SideState; 2],
    pub battlefield: Battlefield,
    pub scheduler: TurnScheduler,
    pub round: Round,
    pub phase: BattlePhase,
    pub outcome: Option<BattleOutcome>,
    /// Turn currently waiting for a command
    pub active: Option<ScheduledTurn>,
}

impl CombatState {
    pub fn new(units: Vec<CombatUnit>, battlefield: Battlefield) -> Self {
        let mut state = Self {
            units,
            sides: [
                SideState::new(CombatSide::Attacker),
                SideState::new(CombatSide::Defender),
            ],
            battlefield,
            scheduler: TurnScheduler::new(),
            round: 1,
            phase: BattlePhase::Active,
            outcome: None,
            active: None,
        };
        state.rebuild_occupancy();
        state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, BattlePhase::Finished)
    }

    pub fn winner(&self) -> Option<CombatSide> {
        self.outcome.and_then(|o| o.winner)
    }

    pub fn current_actor(&self) -> Option<UnitId> {
        self.active.map(|turn| turn.unit)
    }

    pub fn unit(&self, id: UnitId) -> Option<&CombatUnit> {
        self.units.get(id.index())
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut CombatUnit> {
        self.units.get_mut(id.index())
    }

    pub fn side(&self, side: CombatSide) -> &SideState {
        &self.sides[side.index()]
    }

    pub fn side_mut(&mut self, side: CombatSide) -> &mut SideState {
        &mut self.sides[side.index()]
    }

    /// All stacks of `side`, dead ones included
    pub fn units_of(&self, side: CombatSide) -> impl Iterator<Item = &CombatUnit> {
        self.units.iter().filter(move |u| u.side == side)
    }

    pub fn living(&self, side: CombatSide) -> impl Iterator<Item = &CombatUnit> {
        self.units_of(side).filter(|u| u.is_alive())
    }

    pub fn has_living(&self, side: CombatSide) -> bool {
        self.living(side).next().is_some()
    }

    /// Living enemies touching `unit`
    pub fn adjacent_enemies<'a>(
        &'a self,
        unit: &'a CombatUnit,
    ) -> impl Iterator<Item = &'a CombatUnit> + 'a {
        self.living(unit.side.opponent())
            .filter(move |enemy| unit.is_adjacent_to(enemy))
    }

    pub fn rebuild_occupancy(&mut self) {
        self.battlefield.rebuild_occupancy(&self.units);
    }

    /// Immutable view for display
    pub fn snapshot(&self) -> StateSnapshot {
        let mut obstacles: Vec<HexCoord> = self.battlefield.obstacles().copied().collect();
        obstacles.sort_by_key(|h| (h.y(), h.x()));

        StateSnapshot {
            round: self.round,
            phase: self.phase,
            outcome: self.outcome,
            active_unit: self.current_actor(),
            units: self.units.iter().map(UnitSnapshot::from).collect(),
            obstacles,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub side: CombatSide,
    pub name: String,
    pub hexes: Vec<HexCoord>,
    pub count: u32,
    pub first_health: u32,
    pub max_health: u32,
    pub ammo: u32,
    pub is_defending: bool,
    pub alive: bool,
}

impl From<&CombatUnit> for UnitSnapshot {
    fn from(unit: &CombatUnit) -> Self {
        Self {
            id: unit.id,
            side: unit.side,
            name: unit.name.clone(),
            hexes: unit.occupied_hexes(),
            count: unit.count,
            first_health: unit.first_health,
            max_health: unit.max_health,
            ammo: unit.ammo,
            is_defending: unit.is_defending,
            alive: unit.is_alive(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub round: Round,
    pub phase: BattlePhase,
    pub outcome: Option<BattleOutcome>,
    pub active_unit: Option<UnitId>,
    pub units: Vec<UnitSnapshot>,
    pub obstacles: Vec<HexCoord>,
}

/// A stack that leaves the battle with its side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survivor {
    pub id: UnitId,
    pub name: String,
    pub slot: u8,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Casualty {
    pub id: UnitId,
    pub name: String,
    pub slot: u8,
    pub lost: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideReport {
    pub side: CombatSide,
    pub survivors: Vec<Survivor>,
    pub casualties: Vec<Casualty>,
    pub individuals_lost: u32,
}

/// Results handed back to the roster owner when the battle ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    pub outcome: Option<BattleOutcome>,
    pub rounds: Round,
    pub attacker: SideReport,
    pub defender: SideReport,
    /// Health of every enemy individual killed, awarded to the winner
    pub experience: u64,
}

impl BattleReport {
    pub fn from_state(state: &CombatState) -> Self {
        let side_report = |side: CombatSide| {
            let fled = state.side(side).fled;
            let survivors = state
                .living(side)
                .filter(|_| !fled)
                .map(|u| Survivor {
                    id: u.id,
                    name: u.name.clone(),
                    slot: u.slot,
                    count: u.count,
                })
                .collect();
            let casualties: Vec<Casualty> = state
                .units_of(side)
                .filter(|u| u.count < u.initial_count)
                .map(|u| Casualty {
                    id: u.id,
                    name: u.name.clone(),
                    slot: u.slot,
                    lost: u.initial_count - u.count,
                })
                .collect();
            let individuals_lost = casualties.iter().map(|c| c.lost).sum();
            SideReport {
                side,
                survivors,
                casualties,
                individuals_lost,
            }
        };

        let experience = state
            .winner()
            .map(|winner| {
                state
                    .units_of(winner.opponent())
                    .map(|u| u64::from(u.initial_count - u.count) * u64::from(u.max_health))
                    .sum()
            })
            .unwrap_or(0);

        Self {
            outcome: state.outcome,
            rounds: state.round,
            attacker: side_report(CombatSide::Attacker),
            defender: side_report(CombatSide::Defender),
            experience,
        }
    }

    pub fn winner(&self) -> Option<CombatSide> {
        self.outcome.and_then(|o| o.winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::roster::{CreatureProfile, StackSpec};

    fn state() -> CombatState {
        let spec = StackSpec::new(CreatureProfile::new("Imp", 2, 3, 5, 4, 1, 2), 10, 0);
        let ogre = StackSpec::new(CreatureProfile::new("Ogre", 13, 7, 4, 60, 6, 12), 2, 0);
        let units = vec![
            CombatUnit::from_spec(UnitId(0), CombatSide::Attacker, &spec, HexCoord::new(1, 0), 1),
            CombatUnit::from_spec(UnitId(1), CombatSide::Defender, &ogre, HexCoord::new(15, 0), 1),
        ];
        CombatState::new(units, Battlefield::new([HexCoord::new(8, 5), HexCoord::new(8, 4)]))
    }

    #[test]
    fn test_new_state_indexes_units() {
        let state = state();
        assert_eq!(state.round, 1);
        assert!(!state.is_finished());
        assert_eq!(state.battlefield.occupant(HexCoord::new(15, 0)), Some(UnitId(1)));
        assert!(state.has_living(CombatSide::Defender));
        assert_eq!(state.units_of(CombatSide::Attacker).count(), 1);
    }

    #[test]
    fn test_snapshot_reflects_units() {
        let mut state = state();
        state.units[1].apply_damage(70);
        let snapshot = state.snapshot();
        assert_eq!(snapshot.units.len(), 2);
        assert_eq!(snapshot.units[1].count, 1);
        assert_eq!(snapshot.units[1].first_health, 50);
        assert_eq!(snapshot.obstacles, vec![HexCoord::new(8, 4), HexCoord::new(8, 5)]);
        assert!(serde_json::to_string(&snapshot).is_ok());
    }

    #[test]
    fn test_report_experience_and_casualties() {
        let mut state = state();
        state.units[1].apply_damage(500);
        state.units[0].apply_damage(9);
        state.phase = BattlePhase::Finished;
        state.outcome = Some(BattleOutcome {
            winner: Some(CombatSide::Attacker),
            reason: EndReason::Annihilation,
        });

        let report = BattleReport::from_state(&state);
        assert_eq!(report.winner(), Some(CombatSide::Attacker));
        assert_eq!(report.experience, 120);
        assert_eq!(report.attacker.individuals_lost, 2);
        assert_eq!(report.attacker.survivors[0].count, 8);
        assert!(report.defender.survivors.is_empty());
        assert_eq!(report.defender.casualties[0].lost, 2);
    }

    #[test]
    fn test_fled_side_forfeits_survivors() {
        let mut state = state();
        state.side_mut(CombatSide::Attacker).fled = true;
        state.outcome = Some(BattleOutcome {
            winner: Some(CombatSide::Defender),
            reason: EndReason::Retreat,
        });
        let report = BattleReport::from_state(&state);
        assert!(report.attacker.survivors.is_empty());
        assert_eq!(report.defender.survivors.len(), 1);
        assert_eq!(report.experience, 0);
    }
}
