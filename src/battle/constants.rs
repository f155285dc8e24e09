//! Battlefield constants
//!
//! Formula coefficients are configurable (see `core::config`); only the
//! fixed geometry and roster shape live here.

// Battlefield grid (offset layout, linear index = x + y * GRID_WIDTH)
pub const GRID_WIDTH: i32 = 17;
pub const GRID_HEIGHT: i32 = 11;
pub const HEX_COUNT: usize = (GRID_WIDTH * GRID_HEIGHT) as usize;

// Edge columns are reserved for war machines and never hold normal stacks
pub const RESERVED_COLUMNS: [i32; 2] = [0, GRID_WIDTH - 1];

// Rosters
pub const MAX_SLOTS: u8 = 7;

// Default deployment columns and the row used by each slot
pub const ATTACKER_DEPLOY_COLUMN: i32 = 1;
pub const DEFENDER_DEPLOY_COLUMN: i32 = GRID_WIDTH - 2;
pub const SLOT_ROWS: [i32; MAX_SLOTS as usize] = [0, 2, 4, 5, 6, 8, 10];

// Morale and luck range on a stack
pub const MIN_FORTUNE: i8 = -3;
pub const MAX_FORTUNE: i8 = 3;
