//! Morale and luck rolls
//!
//! Each point of morale or luck is worth `chance_per_point`. Positive luck can
//! turn a strike lucky, negative luck unlucky. Positive morale can grant an
//! extra turn after acting; negative morale can freeze a stack when its turn
//! comes up.
//!
//! A roll only draws from the generator when the relevant value is non-zero,
//! so neutral stacks leave the damage sequence untouched.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::FortuneConfig;

/// Outcome of a luck roll before a strike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LuckRoll {
    #[default]
    Neutral,
    Lucky,
    Unlucky,
}

impl LuckRoll {
    pub fn is_lucky(self) -> bool {
        self == LuckRoll::Lucky
    }

    pub fn is_unlucky(self) -> bool {
        self == LuckRoll::Unlucky
    }
}

/// Probability granted by `points` of morale or luck
pub fn chance(points: i8, config: &FortuneConfig) -> f64 {
    let points = points.unsigned_abs().min(config.max_points.unsigned_abs());
    (f64::from(points) * config.chance_per_point).clamp(0.0, 1.0)
}

fn roll<R: Rng>(rng: &mut R, points: i8, config: &FortuneConfig) -> bool {
    if !config.enabled || points == 0 {
        return false;
    }
    rng.gen_bool(chance(points, config))
}

pub fn roll_luck<R: Rng>(rng: &mut R, luck: i8, config: &FortuneConfig) -> LuckRoll {
    if !roll(rng, luck, config) {
        return LuckRoll::Neutral;
    }
    if luck > 0 {
        LuckRoll::Lucky
    } else {
        LuckRoll::Unlucky
    }
}

/// Extra turn after a completed action (positive morale only)
pub fn roll_morale_bonus<R: Rng>(rng: &mut R, morale: i8, config: &FortuneConfig) -> bool {
    morale > 0 && roll(rng, morale, config)
}

/// Lost turn when selected to act (negative morale only)
pub fn roll_morale_freeze<R: Rng>(rng: &mut R, morale: i8, config: &FortuneConfig) -> bool {
    morale < 0 && roll(rng, morale, config)
}
