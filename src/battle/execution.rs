//! Combat resolver: validates and applies action commands
//!
//! Each command is fully validated against the current state before anything
//! changes, so a rejected command leaves the battle exactly as it was.
//! Accepted commands mutate the stacks, update the scheduler and hand the
//! turn to the next actor before returning.

use rand::Rng;
use tracing::{debug, info, warn};

use crate::battle::action::{ActionCommand, ActionKind};
use crate::battle::battlefield::Battlefield;
use crate::battle::damage::{estimate_damage, strike_context, DamageEstimate};
use crate::battle::events::{BattleEvent, BattleEventLog, BattleEventType, CombatResult};
use crate::battle::fortune::{roll_luck, roll_morale_bonus, roll_morale_freeze};
use crate::battle::hex::HexCoord;
use crate::battle::pathfinding::{HexPathfinder, Pathfinder};
use crate::battle::roster::Roster;
use crate::battle::state::{BattleOutcome, BattlePhase, BattleReport, CombatState, EndReason};
use crate::battle::units::{CombatUnit, StatusEffect};
use crate::core::config::BattleConfig;
use crate::core::error::{ConfigurationError, Result, StateError, ValidationError};
use crate::core::types::{CombatSide, UnitId};

/// A command that passed validation, with everything needed to apply it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plan {
    Move {
        to: HexCoord,
        distance: u32,
    },
    Wait,
    Defend,
    Melee {
        target: UnitId,
        origin: HexCoord,
        charge: u32,
        return_to: Option<HexCoord>,
    },
    Ranged {
        target: UnitId,
    },
    Retreat,
    Surrender,
}

pub struct CombatResolver<R: Rng> {
    state: CombatState,
    config: BattleConfig,
    rng: R,
    pathfinder: Box<dyn Pathfinder>,
    battle_log: Vec<BattleEvent>,
}

impl<R: Rng> CombatResolver<R> {
    /// Deploy both rosters and hand the first turn of round 1 out.
    ///
    /// Uses [`HexPathfinder`]; see [`CombatResolver::with_pathfinder`].
    pub fn initialize_battle(
        attacker: &Roster,
        defender: &Roster,
        obstacles: impl IntoIterator<Item = HexCoord>,
        config: BattleConfig,
        rng: R,
    ) -> Result<Self> {
        Self::initialize_with_pathfinder(
            attacker,
            defender,
            obstacles,
            config,
            rng,
            Box::new(HexPathfinder),
        )
    }

    pub fn initialize_with_pathfinder(
        attacker: &Roster,
        defender: &Roster,
        obstacles: impl IntoIterator<Item = HexCoord>,
        config: BattleConfig,
        rng: R,
        pathfinder: Box<dyn Pathfinder>,
    ) -> Result<Self> {
        config.validate().map_err(ConfigurationError::InvalidRules)?;
        attacker.validate(CombatSide::Attacker)?;
        defender.validate(CombatSide::Defender)?;

        let mut battlefield = Battlefield::new(obstacles);
        let mut units: Vec<CombatUnit> = Vec::new();
        let retaliations = config.turns.retaliations_per_round;

        for (side, roster) in [(CombatSide::Attacker, attacker), (CombatSide::Defender, defender)] {
            for spec in &roster.stacks {
                let id = UnitId(units.len() as u32);
                let unit =
                    CombatUnit::from_spec(id, side, spec, spec.deployment_hex(side), retaliations);

                for hex in unit.occupied_hexes() {
                    if !hex.is_valid() {
                        return Err(ConfigurationError::InvalidPlacement {
                            name: unit.name.clone(),
                            hex,
                        }
                        .into());
                    }
                    if !battlefield.is_free_for(hex, None) {
                        return Err(ConfigurationError::OverlappingPlacement {
                            name: unit.name.clone(),
                            hex,
                        }
                        .into());
                    }
                }

                units.push(unit);
                battlefield.rebuild_occupancy(&units);
            }
        }

        let mut state = CombatState::new(units, battlefield);
        state.scheduler.build_queue(&state.units);

        let mut resolver = Self {
            state,
            config,
            rng,
            pathfinder,
            battle_log: Vec::new(),
        };

        info!(
            attackers = attacker.stacks.len(),
            defenders = defender.stacks.len(),
            "Battle initialized"
        );

        let mut events = BattleEventLog::new();
        resolver.emit(&mut events, BattleEventType::BattleStarted, "Battle has begun!".into());
        resolver.emit(&mut events, BattleEventType::RoundStarted, "Round 1".into());
        resolver.advance_turn(&mut events);
        Ok(resolver)
    }

    /// Swap the movement capability
    pub fn with_pathfinder(mut self, pathfinder: Box<dyn Pathfinder>) -> Self {
        self.pathfinder = pathfinder;
        self
    }

    pub fn state(&self) -> &CombatState {
        &self.state
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn pathfinder(&self) -> &dyn Pathfinder {
        self.pathfinder.as_ref()
    }

    /// Every event since the battle started
    pub fn events(&self) -> &[BattleEvent] {
        &self.battle_log
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn current_actor(&self) -> Option<UnitId> {
        self.state.current_actor()
    }

    pub fn report(&self) -> BattleReport {
        BattleReport::from_state(&self.state)
    }

    /// The next `count` actors, starting with the one to move now.
    ///
    /// Crosses round boundaries; the battle itself is not touched.
    pub fn preview_turn_order(&self, count: usize) -> Vec<UnitId> {
        if self.is_finished() {
            return Vec::new();
        }
        let mut scheduler = self.state.scheduler.clone();
        let mut units = self.state.units.clone();
        let mut order = Vec::with_capacity(count);

        // assume the current actor takes a plain action
        if let Some(actor) = self.state.current_actor().and_then(|id| units.get_mut(id.index())) {
            actor.has_moved = true;
            scheduler.record_action(actor.side);
            order.push(actor.id);
        }

        order.extend(scheduler.preview(
            &units,
            count.saturating_sub(order.len()),
            self.config.turns.retaliations_per_round,
        ));
        order.truncate(count);
        order
    }

    /// Grant `unit` an extra turn right after the current one
    pub fn insert_bonus_turn(&mut self, unit: UnitId) -> Result<()> {
        if self.is_finished() {
            return Err(StateError::BattleFinished.into());
        }
        let target = self
            .state
            .unit(unit)
            .ok_or(ValidationError::UnknownUnit(unit))?;
        if !target.is_alive() {
            return Err(ValidationError::DeadActor(unit).into());
        }
        self.state.scheduler.insert_bonus_turn(unit);
        Ok(())
    }

    /// Damage range `attacker` would deal to `defender` right now, luck aside
    pub fn estimate(
        &self,
        attacker: UnitId,
        defender: UnitId,
        is_ranged: bool,
    ) -> Option<DamageEstimate> {
        let a = self.state.unit(attacker)?;
        let d = self.state.unit(defender)?;
        let ctx = strike_context(a, d, is_ranged, 0, &self.config.damage);
        Some(estimate_damage(a, d, &ctx, &self.config.damage))
    }

    /// Validate and apply one command
    pub fn execute_action(&mut self, cmd: ActionCommand) -> Result<BattleEventLog> {
        if self.is_finished() {
            warn!(actor = %cmd.actor, "Command rejected: battle is over");
            return Err(StateError::BattleFinished.into());
        }

        let plan = self.validate(&cmd).map_err(|e| {
            warn!(actor = %cmd.actor, kind = %cmd.kind, error = %e, "Command rejected");
            e
        })?;

        let mut events = BattleEventLog::new();
        match plan {
            Plan::Move { to, distance } => {
                self.relocate(cmd.actor, to, distance, &mut events);
                self.finish_turn(cmd.actor, &mut events);
            }
            Plan::Wait => self.apply_wait(cmd.actor, &mut events)?,
            Plan::Defend => {
                self.apply_defend(cmd.actor, &mut events);
                self.finish_turn(cmd.actor, &mut events);
            }
            Plan::Melee {
                target,
                origin,
                charge,
                return_to,
            } => {
                self.apply_melee(cmd.actor, target, origin, charge, return_to, &mut events);
                self.finish_turn(cmd.actor, &mut events);
            }
            Plan::Ranged { target } => {
                self.apply_ranged(cmd.actor, target, &mut events);
                self.finish_turn(cmd.actor, &mut events);
            }
            Plan::Retreat => {
                self.state.side_mut(cmd.side).fled = true;
                self.end_battle(Some(cmd.side.opponent()), EndReason::Retreat, &mut events);
            }
            Plan::Surrender => {
                self.end_battle(Some(cmd.side.opponent()), EndReason::Surrender, &mut events);
            }
        }

        Ok(events)
    }

    /// End the battle if a side has been wiped out
    pub fn check_battle_end(&mut self) -> bool {
        let mut events = BattleEventLog::new();
        self.check_battle_end_into(&mut events)
    }

    /// Stop a battle that ran too long; nobody wins
    pub fn declare_draw(&mut self) -> Result<BattleEventLog> {
        if self.is_finished() {
            return Err(StateError::BattleFinished.into());
        }
        let mut events = BattleEventLog::new();
        self.end_battle(None, EndReason::RoundLimit, &mut events);
        Ok(events)
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    fn validate(&self, cmd: &ActionCommand) -> std::result::Result<Plan, ValidationError> {
        let actor = self
            .state
            .unit(cmd.actor)
            .ok_or(ValidationError::UnknownUnit(cmd.actor))?;
        if !actor.is_alive() {
            return Err(ValidationError::DeadActor(cmd.actor));
        }
        if actor.side != cmd.side {
            return Err(ValidationError::WrongSide {
                unit: cmd.actor,
                side: cmd.side,
            });
        }
        if self.state.current_actor() != Some(cmd.actor) {
            return Err(ValidationError::NotActorsTurn(cmd.actor));
        }

        match cmd.kind {
            ActionKind::Move => {
                let to = cmd.target_hex.ok_or(ValidationError::MissingTarget("target hex"))?;
                if to == actor.position {
                    return Err(ValidationError::AlreadyThere(actor.id));
                }
                let distance = self.reach(actor, to)?;
                Ok(Plan::Move { to, distance })
            }
            ActionKind::Wait => {
                if actor.has_waited {
                    return Err(ValidationError::AlreadyWaited(actor.id));
                }
                Ok(Plan::Wait)
            }
            ActionKind::Defend => Ok(Plan::Defend),
            ActionKind::MeleeAttack => {
                let target = self.enemy_target(actor, cmd)?;
                if cmd.return_after_attack && !actor.abilities.strike_and_return {
                    return Err(ValidationError::ReturnNotAllowed(actor.id));
                }

                // an attacker already in contact strikes from where it stands
                let (origin, charge) = match cmd.attack_origin {
                    Some(origin) if origin != actor.position && !actor.is_adjacent_to(target) => {
                        (origin, self.reach(actor, origin)?)
                    }
                    _ => (actor.position, 0),
                };
                if !actor.is_adjacent_from(origin, target) {
                    return Err(ValidationError::NotAdjacent {
                        attacker: actor.id,
                        defender: target.id,
                    });
                }

                Ok(Plan::Melee {
                    target: target.id,
                    origin,
                    charge,
                    return_to: cmd.return_after_attack.then_some(actor.position),
                })
            }
            ActionKind::RangedAttack => {
                let target = self.enemy_target(actor, cmd)?;
                if actor.ammo == 0 {
                    return Err(ValidationError::InsufficientAmmo(actor.id));
                }
                if self.state.adjacent_enemies(actor).next().is_some() {
                    return Err(ValidationError::ShooterBlocked(actor.id));
                }
                Ok(Plan::Ranged { target: target.id })
            }
            ActionKind::Retreat => Ok(Plan::Retreat),
            ActionKind::Surrender => Ok(Plan::Surrender),
        }
    }

    /// Path length for `unit` to bring its head to `hex` this turn
    fn reach(&self, unit: &CombatUnit, hex: HexCoord) -> std::result::Result<u32, ValidationError> {
        if !hex.is_valid() {
            return Err(ValidationError::InvalidHex(hex));
        }
        if !self
            .state
            .battlefield
            .footprint_free(&unit.footprint_at(hex), Some(unit.id))
        {
            return Err(ValidationError::Occupied(hex));
        }

        let speed = unit.effective_speed().max(0) as u32;
        self.pathfinder
            .reachable(&self.state.battlefield, unit, speed)
            .distance_to(hex)
            .ok_or(ValidationError::Unreachable(hex))
    }

    fn enemy_target<'a>(
        &'a self,
        actor: &CombatUnit,
        cmd: &ActionCommand,
    ) -> std::result::Result<&'a CombatUnit, ValidationError> {
        let id = cmd
            .target_unit
            .ok_or(ValidationError::MissingTarget("target unit"))?;
        let target = self
            .state
            .unit(id)
            .ok_or(ValidationError::UnknownUnit(id))?;
        if target.side == actor.side {
            return Err(ValidationError::NotAnEnemy(id));
        }
        if !target.is_alive() {
            return Err(ValidationError::TargetDead(id));
        }
        Ok(target)
    }

    // ------------------------------------------------------------------
    // Application
    // ------------------------------------------------------------------

    fn relocate(&mut self, id: UnitId, to: HexCoord, distance: u32, events: &mut BattleEventLog) {
        let Some(unit) = self.state.unit_mut(id) else {
            return;
        };
        let from = unit.position;
        unit.position = to;
        self.state.rebuild_occupancy();

        debug!(unit = %id, %from, %to, distance, "Unit moved");
        self.emit(
            events,
            BattleEventType::UnitMoved {
                unit_id: id,
                from,
                to,
                distance,
            },
            format!("{} moved from {} to {}", id, from, to),
        );
    }

    fn apply_wait(&mut self, id: UnitId, events: &mut BattleEventLog) -> Result<()> {
        let Some(unit) = self.state.units.get_mut(id.index()) else {
            return Err(ValidationError::UnknownUnit(id).into());
        };
        let phase = self.state.scheduler.move_to_wait(unit)?;
        self.state.active = None;

        debug!(unit = %id, ?phase, "Unit waits");
        self.emit(
            events,
            BattleEventType::UnitWaited { unit_id: id },
            format!("{} waits", id),
        );
        self.advance_turn(events);
        Ok(())
    }

    fn apply_defend(&mut self, id: UnitId, events: &mut BattleEventLog) {
        let percent = i64::from(self.config.turns.defend_bonus_percent);
        let Some(unit) = self.state.unit_mut(id) else {
            return;
        };
        let bonus = (i64::from(unit.effective_defense()) * percent / 100).max(1) as i32;
        unit.add_status_effect(StatusEffect::new("defend", 1).with_defense(bonus));
        unit.is_defending = true;

        debug!(unit = %id, bonus, "Unit defends");
        self.emit(
            events,
            BattleEventType::UnitDefended {
                unit_id: id,
                defense_bonus: bonus,
            },
            format!("{} defends (+{} defense)", id, bonus),
        );
    }

    fn apply_melee(
        &mut self,
        attacker: UnitId,
        defender: UnitId,
        origin: HexCoord,
        charge: u32,
        return_to: Option<HexCoord>,
        events: &mut BattleEventLog,
    ) {
        if charge > 0 {
            self.relocate(attacker, origin, charge, events);
        }

        let first = self.strike(attacker, defender, false, charge, true);
        self.record_strike(first, events);
        if self.check_battle_end_into(events) {
            return;
        }

        let double_attack = self
            .state
            .unit(attacker)
            .is_some_and(|u| u.is_alive() && u.abilities.double_attack);
        let defender_alive = self.state.unit(defender).is_some_and(CombatUnit::is_alive);
        if double_attack && defender_alive {
            let second = self.strike(attacker, defender, false, 0, false);
            self.record_strike(second, events);
            if self.check_battle_end_into(events) {
                return;
            }
        }

        if let Some(home) = return_to {
            let Some(unit) = self.state.unit(attacker) else {
                return;
            };
            let free = self
                .state
                .battlefield
                .footprint_free(&unit.footprint_at(home), Some(attacker));
            if unit.is_alive() && free && unit.position != home {
                self.relocate(attacker, home, charge, events);
            }
        }
    }

    fn apply_ranged(&mut self, attacker: UnitId, defender: UnitId, events: &mut BattleEventLog) {
        if let Some(unit) = self.state.unit_mut(attacker) {
            unit.ammo = unit.ammo.saturating_sub(1);
        }
        let result = self.strike(attacker, defender, true, 0, false);
        self.record_strike(result, events);
        self.check_battle_end_into(events);
    }

    /// One strike, plus the defender's counter when `allow_retaliation`.
    ///
    /// Counters are always resolved with `allow_retaliation = false`, so they
    /// cannot chain.
    fn strike(
        &mut self,
        attacker_id: UnitId,
        defender_id: UnitId,
        is_ranged: bool,
        charge: u32,
        allow_retaliation: bool,
    ) -> CombatResult {
        let mut result = CombatResult::new(attacker_id, defender_id, is_ranged);

        let (estimate, counter_allowed) = match (
            self.state.unit(attacker_id),
            self.state.unit(defender_id),
        ) {
            (Some(attacker), Some(defender)) => {
                result.luck = roll_luck(&mut self.rng, attacker.luck, &self.config.fortune);
                let mut ctx =
                    strike_context(attacker, defender, is_ranged, charge, &self.config.damage);
                ctx.lucky = result.luck.is_lucky();
                ctx.unlucky = result.luck.is_unlucky();
                (
                    estimate_damage(attacker, defender, &ctx, &self.config.damage),
                    allow_retaliation && !is_ranged && !attacker.abilities.no_melee_retaliation,
                )
            }
            _ => return result,
        };
        let damage = self.rng.gen_range(estimate.min..=estimate.max);

        let Some(target) = self.state.unit_mut(defender_id) else {
            return result;
        };
        result.damage = damage;
        result.kills = target.apply_damage(damage);
        result.defender_died = !target.is_alive();
        let counters = counter_allowed && target.can_retaliate();
        if counters {
            target.retaliations_left -= 1;
            target.has_retaliated = true;
        }

        debug!(
            attacker = %attacker_id,
            defender = %defender_id,
            damage,
            kills = result.kills,
            luck = ?result.luck,
            ranged = is_ranged,
            "Strike resolved"
        );

        if result.defender_died {
            self.state.scheduler.remove(defender_id);
            self.state.rebuild_occupancy();
        }

        if counters {
            let mut counter = self.strike(defender_id, attacker_id, false, 0, false);
            counter.is_retaliation = true;
            result.retaliation = Some(Box::new(counter));
        }

        result
    }

    fn record_strike(&mut self, result: CombatResult, events: &mut BattleEventLog) {
        let deaths: Vec<UnitId> = result
            .strikes()
            .iter()
            .filter(|s| s.defender_died)
            .map(|s| s.defender)
            .collect();

        let description = match &result.retaliation {
            Some(counter) => format!(
                "{} hits {} for {} ({} killed), {} strikes back for {} ({} killed)",
                result.attacker,
                result.defender,
                result.damage,
                result.kills,
                counter.attacker,
                counter.damage,
                counter.kills
            ),
            None => format!(
                "{} hits {} for {} ({} killed)",
                result.attacker, result.defender, result.damage, result.kills
            ),
        };
        self.emit(events, BattleEventType::AttackResolved(result), description);

        for unit_id in deaths {
            info!(unit = %unit_id, "Stack destroyed");
            self.emit(
                events,
                BattleEventType::UnitDied { unit_id },
                format!("{} was destroyed", unit_id),
            );
        }
    }

    // ------------------------------------------------------------------
    // Turn flow
    // ------------------------------------------------------------------

    /// Close the actor's turn, maybe grant a morale bonus, pick the next actor
    fn finish_turn(&mut self, id: UnitId, events: &mut BattleEventLog) {
        let was_bonus = self.state.active.is_some_and(|t| t.bonus);
        self.state.active = None;

        let Some(unit) = self.state.unit_mut(id) else {
            return;
        };
        unit.has_moved = true;
        let (side, morale, alive) = (unit.side, unit.morale, unit.is_alive());
        self.state.scheduler.record_action(side);
        self.state.side_mut(side).actions_this_round += 1;

        if self.is_finished() {
            return;
        }

        if alive && !was_bonus && roll_morale_bonus(&mut self.rng, morale, &self.config.fortune) {
            self.state.scheduler.insert_bonus_turn(id);
            debug!(unit = %id, "High morale: extra turn");
            self.emit(
                events,
                BattleEventType::MoraleBonus { unit_id: id },
                format!("{} is inspired and acts again", id),
            );
        }

        self.advance_turn(events);
    }

    /// Hand the turn to the next stack, skipping those frozen by low morale.
    ///
    /// Once as many turns in a row have frozen as there are living stacks,
    /// freezes are no longer rolled until someone acts.
    fn advance_turn(&mut self, events: &mut BattleEventLog) {
        let retaliations = self.config.turns.retaliations_per_round;
        let living = self.state.units.iter().filter(|u| u.is_alive()).count();
        let mut frozen = 0;

        while !self.is_finished() {
            let Some(turn) = self.state.scheduler.next(&mut self.state.units, retaliations) else {
                self.state.active = None;
                return;
            };

            if turn.new_round {
                self.state.round += 1;
                for side in &mut self.state.sides {
                    side.actions_this_round = 0;
                }
                info!(round = self.state.round, "Round started");
                let round = self.state.round;
                self.emit(events, BattleEventType::RoundStarted, format!("Round {}", round));
            }

            let Some(unit) = self.state.unit(turn.unit) else {
                continue;
            };
            let (side, morale, waited) = (unit.side, unit.morale, unit.has_waited);
            self.emit(
                events,
                BattleEventType::TurnStarted {
                    unit_id: turn.unit,
                    phase: turn.phase,
                    bonus: turn.bonus,
                },
                format!("{} to act", turn.unit),
            );

            if !turn.bonus
                && !waited
                && frozen < living
                && roll_morale_freeze(&mut self.rng, morale, &self.config.fortune)
            {
                frozen += 1;
                if let Some(unit) = self.state.unit_mut(turn.unit) {
                    unit.has_moved = true;
                }
                self.state.scheduler.record_action(side);
                debug!(unit = %turn.unit, "Low morale: turn lost");
                self.emit(
                    events,
                    BattleEventType::MoraleFreeze { unit_id: turn.unit },
                    format!("{} freezes in fear", turn.unit),
                );
                continue;
            }

            self.state.active = Some(turn);
            return;
        }
    }

    fn check_battle_end_into(&mut self, events: &mut BattleEventLog) -> bool {
        if self.is_finished() {
            return true;
        }

        let winner = match (
            self.state.has_living(CombatSide::Attacker),
            self.state.has_living(CombatSide::Defender),
        ) {
            (true, true) => return false,
            (true, false) => Some(CombatSide::Attacker),
            (false, true) => Some(CombatSide::Defender),
            (false, false) => None,
        };
        self.end_battle(winner, EndReason::Annihilation, events);
        true
    }

    fn end_battle(
        &mut self,
        winner: Option<CombatSide>,
        reason: EndReason,
        events: &mut BattleEventLog,
    ) {
        let outcome = BattleOutcome { winner, reason };
        self.state.phase = BattlePhase::Finished;
        self.state.outcome = Some(outcome);
        self.state.active = None;

        info!(?winner, ?reason, round = self.state.round, "Battle ended");
        self.emit(
            events,
            BattleEventType::BattleEnded { outcome },
            format!("Battle ended: {:?} ({:?})", winner, reason),
        );
    }

    /// Push to both the per-call log and the battle log
    fn emit(
        &mut self,
        events: &mut BattleEventLog,
        event_type: BattleEventType,
        description: String,
    ) {
        let round = self.state.round;
        events.push(event_type.clone(), description.clone(), round);
        self.battle_log.push(BattleEvent {
            round,
            event_type,
            description,
        });
    }
}
