//! Hex coordinate system for the battlefield (offset coordinates)
//!
//! The field is a 17x11 grid of hexes in rows. Odd rows sit half a hex to
//! the left of even rows, so the neighbor offsets depend on row parity.
//! Distances go through an axial transform (`x + y / 2`).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::battle::constants::{GRID_HEIGHT, GRID_WIDTH, HEX_COUNT, RESERVED_COLUMNS};

/// Offset hex coordinate on the battlefield.
///
/// A coordinate is either inside the grid or equal to [`HexCoord::INVALID`];
/// every operation that would leave the grid returns `INVALID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawHex")]
pub struct HexCoord {
    x: i32,
    y: i32,
}

/// Wire form of a coordinate; collapsed through [`HexCoord::new`] on load
#[derive(Deserialize)]
struct RawHex {
    x: i32,
    y: i32,
}

impl From<RawHex> for HexCoord {
    fn from(raw: RawHex) -> Self {
        HexCoord::new(raw.x, raw.y)
    }
}

impl HexCoord {
    pub const INVALID: HexCoord = HexCoord { x: -1, y: -1 };

    /// Build a coordinate, collapsing anything outside the grid to `INVALID`
    pub fn new(x: i32, y: i32) -> Self {
        if (0..GRID_WIDTH).contains(&x) && (0..GRID_HEIGHT).contains(&y) {
            Self { x, y }
        } else {
            Self::INVALID
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn from_index(index: usize) -> Self {
        if index >= HEX_COUNT {
            return Self::INVALID;
        }
        let index = index as i32;
        Self::new(index % GRID_WIDTH, index / GRID_WIDTH)
    }

    /// Linear index (`x + y * 17`), `None` for the invalid coordinate
    pub fn index(&self) -> Option<usize> {
        self.in_grid()
            .then(|| (self.x + self.y * GRID_WIDTH) as usize)
    }

    /// Inside the 17x11 grid (reserved columns included)
    pub fn in_grid(&self) -> bool {
        (0..GRID_WIDTH).contains(&self.x) && (0..GRID_HEIGHT).contains(&self.y)
    }

    /// Inside the grid and accessible to normal stacks
    pub fn is_valid(&self) -> bool {
        self.in_grid() && !RESERVED_COLUMNS.contains(&self.x)
    }

    /// Adjacent hex in a direction, `INVALID` if it falls off the grid
    pub fn neighbor(&self, direction: HexDirection) -> Self {
        if !self.in_grid() {
            return Self::INVALID;
        }

        let odd = self.y % 2 == 1;
        let (x, y) = (self.x, self.y);
        match direction {
            HexDirection::TopLeft => Self::new(if odd { x - 1 } else { x }, y - 1),
            HexDirection::TopRight => Self::new(if odd { x } else { x + 1 }, y - 1),
            HexDirection::Right => Self::new(x + 1, y),
            HexDirection::BottomRight => Self::new(if odd { x } else { x + 1 }, y + 1),
            HexDirection::BottomLeft => Self::new(if odd { x - 1 } else { x }, y + 1),
            HexDirection::Left => Self::new(x - 1, y),
        }
    }

    /// All in-grid neighbors
    pub fn neighbors(&self) -> Vec<HexCoord> {
        HexDirection::all()
            .into_iter()
            .map(|d| self.neighbor(d))
            .filter(HexCoord::in_grid)
            .collect()
    }

    /// Hex distance, `None` when either coordinate is off the grid
    pub fn distance(&self, other: &Self) -> Option<u32> {
        if !self.in_grid() || !other.in_grid() {
            return None;
        }

        let x1 = self.x + self.y / 2;
        let x2 = other.x + other.y / 2;
        let dx = x2 - x1;
        let dy = other.y - self.y;

        let same_sign = (dx >= 0 && dy >= 0) || (dx <= 0 && dy <= 0);
        let distance = if same_sign {
            dx.abs().max(dy.abs())
        } else {
            dx.abs() + dy.abs()
        };
        Some(distance as u32)
    }

    pub fn is_adjacent(&self, other: &Self) -> bool {
        self.distance(other) == Some(1)
    }

    /// Every hex of the grid, row by row
    pub fn all() -> impl Iterator<Item = HexCoord> {
        (0..HEX_COUNT).map(HexCoord::from_index)
    }
}

impl Default for HexCoord {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.in_grid() {
            write!(f, "({}, {})", self.x, self.y)
        } else {
            write!(f, "(invalid)")
        }
    }
}

/// The six hex directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HexDirection {
    TopLeft,
    TopRight,
    Right,
    BottomRight,
    BottomLeft,
    Left,
}

impl HexDirection {
    pub fn opposite(&self) -> Self {
        match self {
            HexDirection::TopLeft => HexDirection::BottomRight,
            HexDirection::TopRight => HexDirection::BottomLeft,
            HexDirection::Right => HexDirection::Left,
            HexDirection::BottomRight => HexDirection::TopLeft,
            HexDirection::BottomLeft => HexDirection::TopRight,
            HexDirection::Left => HexDirection::Right,
        }
    }

    pub fn all() -> [HexDirection; 6] {
        [
            HexDirection::TopLeft,
            HexDirection::TopRight,
            HexDirection::Right,
            HexDirection::BottomRight,
            HexDirection::BottomLeft,
            HexDirection::Left,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_grid_is_invalid() {
        assert_eq!(HexCoord::new(17, 0), HexCoord::INVALID);
        assert_eq!(HexCoord::new(0, -1), HexCoord::INVALID);
        assert!(!HexCoord::INVALID.in_grid());
        assert_eq!(HexCoord::INVALID.index(), None);
    }

    #[test]
    fn test_off_grid_position_loads_as_invalid() {
        let hex: HexCoord = serde_json::from_str(r#"{"x":20,"y":3}"#).unwrap();
        assert_eq!(hex, HexCoord::INVALID);

        let hex: HexCoord = toml::from_str("x = 4\ny = 11").unwrap();
        assert_eq!(hex, HexCoord::INVALID);

        let hex: HexCoord = serde_json::from_str(r#"{"x":3,"y":4}"#).unwrap();
        assert_eq!((hex.x(), hex.y()), (3, 4));
        assert_eq!(serde_json::to_string(&hex).unwrap(), r#"{"x":3,"y":4}"#);
    }

    #[test]
    fn test_reserved_columns_not_valid() {
        assert!(HexCoord::new(0, 5).in_grid());
        assert!(!HexCoord::new(0, 5).is_valid());
        assert!(!HexCoord::new(16, 5).is_valid());
        assert!(HexCoord::new(1, 5).is_valid());
    }

    #[test]
    fn test_index_round_trip() {
        let hex = HexCoord::new(3, 4);
        assert_eq!(hex.index(), Some(3 + 4 * 17));
        assert_eq!(HexCoord::from_index(71), hex);
        assert_eq!(HexCoord::from_index(187), HexCoord::INVALID);
    }

    #[test]
    fn test_neighbor_parity() {
        // Even row: upper neighbors are x and x+1
        let even = HexCoord::new(5, 2);
        assert_eq!(even.neighbor(HexDirection::TopLeft), HexCoord::new(5, 1));
        assert_eq!(even.neighbor(HexDirection::TopRight), HexCoord::new(6, 1));
        // Odd row: upper neighbors are x-1 and x
        let odd = HexCoord::new(5, 3);
        assert_eq!(odd.neighbor(HexDirection::TopLeft), HexCoord::new(4, 2));
        assert_eq!(odd.neighbor(HexDirection::TopRight), HexCoord::new(5, 2));
    }

    #[test]
    fn test_neighbor_off_grid() {
        let corner = HexCoord::new(0, 0);
        assert_eq!(corner.neighbor(HexDirection::Left), HexCoord::INVALID);
        assert_eq!(corner.neighbor(HexDirection::TopRight), HexCoord::INVALID);
        assert_eq!(corner.neighbors().len(), 3);
    }

    #[test]
    fn test_neighbors_are_distance_one() {
        let center = HexCoord::new(8, 5);
        let neighbors = center.neighbors();
        assert_eq!(neighbors.len(), 6);
        for n in neighbors {
            assert_eq!(center.distance(&n), Some(1), "neighbor {n}");
        }
    }

    #[test]
    fn test_distance_same_and_row() {
        let a = HexCoord::new(2, 4);
        assert_eq!(a.distance(&a), Some(0));
        assert_eq!(a.distance(&HexCoord::new(9, 4)), Some(7));
    }

    #[test]
    fn test_distance_across_rows() {
        // Down-right diagonal from (1, 0): (2,1), (2,2), (3,3), (3,4)
        let a = HexCoord::new(1, 0);
        assert_eq!(a.distance(&HexCoord::new(3, 4)), Some(4));
        assert_eq!(HexCoord::new(5, 4).distance(&HexCoord::new(4, 0)), Some(4));
        // Opposite signs add up
        assert_eq!(HexCoord::new(2, 4).distance(&HexCoord::new(6, 0)), Some(6));
        assert_eq!(HexCoord::new(1, 5).distance(&HexCoord::new(15, 5)), Some(14));
    }

    #[test]
    fn test_distance_invalid() {
        assert_eq!(HexCoord::INVALID.distance(&HexCoord::new(1, 1)), None);
    }

    #[test]
    fn test_direction_opposite() {
        for d in HexDirection::all() {
            assert_eq!(d.opposite().opposite(), d);
        }
        assert_eq!(HexDirection::Right.opposite(), HexDirection::Left);
    }
}
