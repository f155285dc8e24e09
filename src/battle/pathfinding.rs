//! Reachability search for stacks on the battlefield
//!
//! The resolver only depends on the [`Pathfinder`] trait; [`HexPathfinder`] is
//! the default implementation. Walkers flood outward hex by hex around
//! obstacles and other stacks, flyers may land on any free footprint within
//! range.

use ahash::AHashMap;
use std::collections::VecDeque;

use crate::battle::battlefield::Battlefield;
use crate::battle::hex::HexCoord;
use crate::battle::units::CombatUnit;

/// Hexes a stack can bring its head to, with distances and paths
#[derive(Debug, Clone, Default)]
pub struct Reachability {
    origin: HexCoord,
    distances: AHashMap<HexCoord, u32>,
    came_from: AHashMap<HexCoord, HexCoord>,
}

impl Reachability {
    pub fn new(origin: HexCoord) -> Self {
        let mut distances = AHashMap::new();
        distances.insert(origin, 0);
        Self {
            origin,
            distances,
            came_from: AHashMap::new(),
        }
    }

    /// Record `hex` as reachable in `distance` steps via `from`
    pub fn insert(&mut self, hex: HexCoord, distance: u32, from: HexCoord) {
        self.distances.insert(hex, distance);
        self.came_from.insert(hex, from);
    }

    pub fn origin(&self) -> HexCoord {
        self.origin
    }

    pub fn contains(&self, hex: HexCoord) -> bool {
        self.distances.contains_key(&hex)
    }

    pub fn distance_to(&self, hex: HexCoord) -> Option<u32> {
        self.distances.get(&hex).copied()
    }

    /// Reachable hexes in grid order (origin included)
    pub fn hexes(&self) -> Vec<HexCoord> {
        let mut hexes: Vec<HexCoord> = self.distances.keys().copied().collect();
        hexes.sort_by_key(|h| (h.y(), h.x()));
        hexes
    }

    /// Path from the origin to `hex`, both ends included
    pub fn path_to(&self, hex: HexCoord) -> Option<Vec<HexCoord>> {
        if !self.contains(hex) {
            return None;
        }

        let mut path = vec![hex];
        let mut current = hex;
        while let Some(&prev) = self.came_from.get(&current) {
            path.push(prev);
            current = prev;
        }
        path.reverse();
        Some(path)
    }
}

/// Movement capability injected into the resolver
pub trait Pathfinder {
    /// Every head position `unit` can reach within `max_distance` steps
    fn reachable(&self, field: &Battlefield, unit: &CombatUnit, max_distance: u32) -> Reachability;
}

/// Breadth-first search on the hex grid
#[derive(Debug, Clone, Copy, Default)]
pub struct HexPathfinder;

impl HexPathfinder {
    fn walk(&self, field: &Battlefield, unit: &CombatUnit, max_distance: u32) -> Reachability {
        let mut result = Reachability::new(unit.position);
        let mut frontier = VecDeque::from([(unit.position, 0u32)]);

        while let Some((current, steps)) = frontier.pop_front() {
            if steps >= max_distance {
                continue;
            }

            for next in current.neighbors() {
                if result.contains(next) {
                    continue;
                }
                if !field.footprint_free(&unit.footprint_at(next), Some(unit.id)) {
                    continue;
                }
                result.insert(next, steps + 1, current);
                frontier.push_back((next, steps + 1));
            }
        }

        result
    }

    fn fly(&self, field: &Battlefield, unit: &CombatUnit, max_distance: u32) -> Reachability {
        let mut result = Reachability::new(unit.position);

        for hex in HexCoord::all() {
            if hex == unit.position {
                continue;
            }
            let Some(distance) = unit.position.distance(&hex) else {
                continue;
            };
            if distance > max_distance {
                continue;
            }
            if field.footprint_free(&unit.footprint_at(hex), Some(unit.id)) {
                result.insert(hex, distance, unit.position);
            }
        }

        result
    }
}

impl Pathfinder for HexPathfinder {
    fn reachable(&self, field: &Battlefield, unit: &CombatUnit, max_distance: u32) -> Reachability {
        if unit.abilities.flying {
            self.fly(field, unit, max_distance)
        } else {
            self.walk(field, unit, max_distance)
        }
    }
}
