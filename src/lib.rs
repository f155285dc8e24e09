//! Hex Tactics - turn-based stack combat on a hex battlefield

pub mod battle;
pub mod core;
