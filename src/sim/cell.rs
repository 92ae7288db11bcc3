//! Cell material tags
//!
//! A cell carries no per-instance state (no velocity, no age); its behavior
//! each step is decided purely from the surrounding neighborhood. Adding a
//! material means adding a variant here and a movement clause in `step`.

use serde::{Deserialize, Serialize};

/// Material occupying one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Nothing here
    #[default]
    Empty,
    /// Granular solid - falls straight down and settles diagonally
    Sand,
    /// Liquid - falls, settles diagonally, and flows sideways
    Water,
}

impl Cell {
    /// True if a mover can occupy this cell without displacing anything
    #[inline]
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    /// True if sand can sink through this cell (empty, or less dense)
    #[inline]
    pub fn yields_to_sand(self) -> bool {
        matches!(self, Cell::Empty | Cell::Water)
    }
}
