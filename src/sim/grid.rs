//! Fixed-size 2D material grid
//!
//! Coordinates are `(x, y)` with `y` increasing downward, the gravity
//! direction. The grid stores exactly one [`Cell`] per coordinate and does
//! no material-specific validation: any tag is legal anywhere.
//!
//! Out-of-range access is a programmer error and panics. Callers that take
//! coordinates from the outside world (pointer positions) bounds-check
//! before touching the grid; the step engine only ever computes in-range
//! neighbors.

use serde::{Deserialize, Serialize};

use super::cell::Cell;

/// A rectangular array of cells, stored row-major (top row first)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create an all-empty grid
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be nonzero");
        Self {
            width,
            height,
            cells: vec![Cell::Empty; width * height],
        }
    }

    /// Width in cells
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// True if `(x, y)` addresses a cell of this grid
    #[inline]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            self.in_bounds(x, y),
            "cell ({x}, {y}) out of bounds for {}x{} grid",
            self.width,
            self.height
        );
        y * self.width + x
    }

    /// Material at `(x, y)`. Panics when out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Cell {
        self.cells[self.index(x, y)]
    }

    /// Overwrite the material at `(x, y)`. Panics when out of bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        let i = self.index(x, y);
        self.cells[i] = cell;
    }

    /// Set every cell to the same material
    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    /// Copy every cell into a like-sized grid without reallocating.
    /// Panics when the dimensions differ.
    pub fn clone_into(&self, target: &mut Grid) {
        assert!(
            self.width == target.width && self.height == target.height,
            "grid dimension mismatch: {}x{} vs {}x{}",
            self.width,
            self.height,
            target.width,
            target.height
        );
        target.cells.copy_from_slice(&self.cells);
    }

    /// All cells in row-major order (the order a renderer draws them)
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Iterate rows top to bottom; each row is a `width`-long slice
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks_exact(self.width)
    }

    /// Number of cells holding the given material
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }
}
