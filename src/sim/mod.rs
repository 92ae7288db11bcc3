//! Deterministic falling-sand simulation
//!
//! All movement rules live here. This module must be pure and deterministic:
//! - Fixed discrete steps only
//! - Seeded RNG only
//! - Double-buffered updates (read the previous state, write the next)
//! - No rendering or platform dependencies

pub mod cell;
pub mod grid;
pub mod step;

pub use cell::Cell;
pub use grid::Grid;
pub use step::{EditCommand, RngState, Simulation, step_into};
