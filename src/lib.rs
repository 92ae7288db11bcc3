//! Sandfall - a falling-sand cellular automaton
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid state, movement rules, stepping)
//! - `settings`: Data-driven simulation configuration
//!
//! Rendering and input handling live outside this crate: a frontend feeds
//! [`sim::EditCommand`]s in once per input event and draws the read-only
//! grid snapshot out once per frame.

pub mod settings;
pub mod sim;

pub use settings::Settings;
pub use sim::{Cell, EditCommand, Grid, Simulation};

/// Simulation configuration constants
pub mod consts {
    /// Reference screen size the grid defaults are derived from
    pub const SCREEN_WIDTH: u32 = 800;
    pub const SCREEN_HEIGHT: u32 = 600;

    /// Side of one rendered cell in pixels
    pub const CELL_SIZE: u32 = 5;

    /// Default grid dimensions (screen divided into cells)
    pub const GRID_WIDTH: usize = (SCREEN_WIDTH / CELL_SIZE) as usize;
    pub const GRID_HEIGHT: usize = (SCREEN_HEIGHT / CELL_SIZE) as usize;

    /// Fixed step cadence the external driver targets
    pub const TARGET_FPS: u32 = 60;
}
