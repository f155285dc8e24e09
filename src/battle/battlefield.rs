//! Battlefield: obstacles plus a derived hex -> stack occupancy index
//!
//! Stacks own their positions. The index here is rebuilt from the unit arena
//! after every mutation and is never edited by hand.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::battle::hex::HexCoord;
use crate::battle::units::CombatUnit;
use crate::core::types::UnitId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Battlefield {
    obstacles: AHashSet<HexCoord>,
    #[serde(skip)]
    occupancy: AHashMap<HexCoord, UnitId>,
}

impl Battlefield {
    pub fn new(obstacles: impl IntoIterator<Item = HexCoord>) -> Self {
        Self {
            obstacles: obstacles.into_iter().filter(HexCoord::in_grid).collect(),
            occupancy: AHashMap::new(),
        }
    }

    /// Rebuild the occupancy index from living stacks
    pub fn rebuild_occupancy(&mut self, units: &[CombatUnit]) {
        self.occupancy.clear();
        for unit in units.iter().filter(|u| u.is_alive()) {
            for hex in unit.occupied_hexes() {
                self.occupancy.insert(hex, unit.id);
            }
        }
    }

    pub fn is_obstacle(&self, hex: HexCoord) -> bool {
        self.obstacles.contains(&hex)
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &HexCoord> {
        self.obstacles.iter()
    }

    pub fn occupant(&self, hex: HexCoord) -> Option<UnitId> {
        self.occupancy.get(&hex).copied()
    }

    /// Playable, not blocked and not held by anyone other than `ignore`
    pub fn is_free_for(&self, hex: HexCoord, ignore: Option<UnitId>) -> bool {
        if !hex.is_valid() || self.is_obstacle(hex) {
            return false;
        }
        match self.occupant(hex) {
            None => true,
            Some(id) => Some(id) == ignore,
        }
    }

    /// Every hex of a footprint is free for `ignore`
    pub fn footprint_free(&self, hexes: &[HexCoord], ignore: Option<UnitId>) -> bool {
        hexes.iter().all(|h| self.is_free_for(*h, ignore))
    }
}
