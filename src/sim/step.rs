//! Double-buffered simulation step
//!
//! One call to [`step_into`] advances the whole grid by a single discrete
//! tick. Every move decision reads the *previous* step's state and writes
//! its outcome into a separate buffer, so a particle that moved is never
//! reprocessed mid-pass. Destinations are additionally claimed in the
//! write buffer: a rule only fires while the write buffer still agrees
//! with the read snapshot at the destination, which serializes contention
//! within the pass - at most one mover lands in any cell per step, and no
//! material is ever created or destroyed.
//!
//! Randomness is limited to 50/50 tie-breaks between equally viable left
//! and right destinations, drawn from an injected [`Rng`]. Same input grid
//! plus same random outcomes always yields the same next grid.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::cell::Cell;
use super::grid::Grid;

/// RNG seed wrapper so a run can be reproduced later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// A single grid edit from the input layer
///
/// Issued once per input event, with coordinates already divided down by
/// the cell pixel size. Out-of-range coordinates are ignored at this
/// boundary rather than forwarded to the panicking grid accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditCommand {
    /// Place a material at `(x, y)`
    Paint { x: usize, y: usize, cell: Cell },
    /// Clear the cell at `(x, y)`
    Erase { x: usize, y: usize },
}

/// Advance one tick: read from `current`, write the next state into `next`.
///
/// `next` is first overwritten with a copy of `current` (no allocation),
/// then both the source and destination of every move are patched in
/// place. Panics if the buffers differ in size.
///
/// Rows are swept from just above the bottom row up to the top, columns
/// left to right. The bottom row is never a mover.
pub fn step_into(current: &Grid, next: &mut Grid, rng: &mut impl Rng) {
    current.clone_into(next);

    for y in (0..current.height().saturating_sub(1)).rev() {
        for x in 0..current.width() {
            match current.get(x, y) {
                Cell::Sand => step_sand(current, next, rng, x, y),
                Cell::Water => step_water(current, next, rng, x, y),
                Cell::Empty => {}
            }
        }
    }
}

/// Sand falls straight down, sinks through water, and settles diagonally.
fn step_sand(current: &Grid, next: &mut Grid, rng: &mut impl Rng, x: usize, y: usize) {
    let below = y + 1;

    // Straight down. The destination must still be unclaimed in the write
    // buffer; swapping puts whatever was displaced (empty or water) into
    // the vacated cell.
    let under = current.get(x, below);
    if under.yields_to_sand() && next.get(x, below) == under {
        next.set(x, below, Cell::Sand);
        next.set(x, y, under);
        return;
    }

    // Blocked: diagonal settle, with the same displacement swap.
    let can_left = x > 0 && settle_target_open(current, next, x - 1, below);
    let can_right = x + 1 < current.width() && settle_target_open(current, next, x + 1, below);

    if let Some(nx) = pick_side(can_left, can_right, x, rng) {
        let displaced = current.get(nx, below);
        next.set(nx, below, Cell::Sand);
        next.set(x, y, displaced);
    }
}

/// Water falls, settles diagonally, then spreads along its row.
fn step_water(current: &Grid, next: &mut Grid, rng: &mut impl Rng, x: usize, y: usize) {
    // A sand swap may already have displaced this water within the same
    // tick; if so the write buffer no longer holds water here and the cell
    // must not move twice.
    if next.get(x, y) != Cell::Water {
        return;
    }

    let below = y + 1;

    // Straight down
    if flow_target_open(current, next, x, below) {
        next.set(x, below, Cell::Water);
        next.set(x, y, Cell::Empty);
        return;
    }

    // Diagonal down
    let can_left = x > 0 && flow_target_open(current, next, x - 1, below);
    let can_right = x + 1 < current.width() && flow_target_open(current, next, x + 1, below);
    if let Some(nx) = pick_side(can_left, can_right, x, rng) {
        next.set(nx, below, Cell::Water);
        next.set(x, y, Cell::Empty);
        return;
    }

    // Lateral flow along the same row
    let can_left = x > 0 && flow_target_open(current, next, x - 1, y);
    let can_right = x + 1 < current.width() && flow_target_open(current, next, x + 1, y);
    if let Some(nx) = pick_side(can_left, can_right, x, rng) {
        next.set(nx, y, Cell::Water);
        next.set(x, y, Cell::Empty);
    }
}

/// Sand settle destination: passable in the snapshot, unclaimed in the
/// write buffer
#[inline]
fn settle_target_open(current: &Grid, next: &Grid, x: usize, y: usize) -> bool {
    let c = current.get(x, y);
    c.yields_to_sand() && next.get(x, y) == c
}

/// Water destination: empty in both the snapshot and the write buffer
#[inline]
fn flow_target_open(current: &Grid, next: &Grid, x: usize, y: usize) -> bool {
    current.get(x, y).is_empty() && next.get(x, y).is_empty()
}

/// Choose between viable left/right columns, flipping a coin on ties
fn pick_side(left: bool, right: bool, x: usize, rng: &mut impl Rng) -> Option<usize> {
    match (left, right) {
        (true, true) => Some(if rng.random_bool(0.5) { x - 1 } else { x + 1 }),
        (true, false) => Some(x - 1),
        (false, true) => Some(x + 1),
        (false, false) => None,
    }
}

/// A running simulation: step buffers plus the seeded RNG
///
/// Both grids are allocated once at construction and reused for every
/// tick; [`Simulation::step`] computes the next state into the back buffer
/// and swaps. Edits and steps must be serialized by the caller - the grid
/// is not synchronized for concurrent mutation.
#[derive(Debug, Clone)]
pub struct Simulation {
    current: Grid,
    next: Grid,
    rng: Pcg32,
    /// Run seed, kept for reproducibility
    pub seed: u64,
    /// Ticks advanced since construction
    pub ticks: u64,
}

impl Simulation {
    /// Create an empty simulation with the given dimensions and seed
    pub fn new(width: usize, height: usize, seed: u64) -> Self {
        Self {
            current: Grid::new(width, height),
            next: Grid::new(width, height),
            rng: RngState::new(seed).to_rng(),
            seed,
            ticks: 0,
        }
    }

    /// Read-only view of the live grid for rendering
    pub fn grid(&self) -> &Grid {
        &self.current
    }

    /// Apply one paint/erase command; out-of-range coordinates are ignored
    pub fn apply_edit(&mut self, edit: EditCommand) {
        match edit {
            EditCommand::Paint { x, y, cell } => {
                if self.current.in_bounds(x, y) {
                    self.current.set(x, y, cell);
                }
            }
            EditCommand::Erase { x, y } => {
                if self.current.in_bounds(x, y) {
                    self.current.set(x, y, Cell::Empty);
                }
            }
        }
    }

    /// Advance one tick and make the result the live grid
    pub fn step(&mut self) {
        step_into(&self.current, &mut self.next, &mut self.rng);
        std::mem::swap(&mut self.current, &mut self.next);
        self.ticks += 1;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    /// Build a grid from rows of '.', 'o' (sand), '~' (water)
    fn grid_from(rows: &[&str]) -> Grid {
        let height = rows.len();
        let width = rows[0].len();
        let mut grid = Grid::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let cell = match ch {
                    '.' => Cell::Empty,
                    'o' => Cell::Sand,
                    '~' => Cell::Water,
                    _ => panic!("unknown cell char {ch:?}"),
                };
                grid.set(x, y, cell);
            }
        }
        grid
    }

    fn step_once(grid: &Grid, seed: u64) -> Grid {
        let mut next = Grid::new(grid.width(), grid.height());
        let mut rng = RngState::new(seed).to_rng();
        step_into(grid, &mut next, &mut rng);
        next
    }

    #[test]
    fn test_sand_falls_straight_down() {
        let grid = grid_from(&[
            ".o.", //
            "...", //
            "...",
        ]);
        let next = step_once(&grid, 0);
        assert_eq!(next.get(1, 0), Cell::Empty);
        assert_eq!(next.get(1, 1), Cell::Sand);
    }

    #[test]
    fn test_bottom_row_never_moves() {
        let grid = grid_from(&[
            "...", //
            "o~o",
        ]);
        let next = step_once(&grid, 7);
        assert_eq!(next, grid);
    }

    #[test]
    fn test_sand_sinks_through_water_on_floor() {
        // Water on the bottom row cannot move; the sand above swaps with
        // it: denser material ends up below.
        let grid = grid_from(&[
            ".o.", //
            ".~.",
        ]);
        let next = step_once(&grid, 3);
        assert_eq!(next.get(1, 0), Cell::Water);
        assert_eq!(next.get(1, 1), Cell::Sand);
    }

    #[test]
    fn test_sand_sinks_through_trapped_water() {
        // The water is walled in on every side, so it is still in place
        // when the grain above swaps with it.
        let grid = grid_from(&[
            ".o.", //
            "o~o", //
            "ooo",
        ]);
        let next = step_once(&grid, 3);
        assert_eq!(next.get(1, 0), Cell::Water);
        assert_eq!(next.get(1, 1), Cell::Sand);
        assert_eq!(next.count(Cell::Sand), grid.count(Cell::Sand));
        assert_eq!(next.count(Cell::Water), 1);
    }

    #[test]
    fn test_blocked_sand_settles_diagonally() {
        // Directly below is sand, both diagonals open: the grain must end
        // up on one side, never stay put.
        let grid = grid_from(&[
            ".o.", //
            ".o.", //
            "ooo",
        ]);
        for seed in 0..16 {
            let next = step_once(&grid, seed);
            assert_eq!(next.get(1, 0), Cell::Empty, "seed {seed}");
            let settled =
                (next.get(0, 1) == Cell::Sand) ^ (next.get(2, 1) == Cell::Sand);
            assert!(settled, "seed {seed}: expected exactly one diagonal");
        }
    }

    #[test]
    fn test_sand_settles_into_only_open_diagonal() {
        let grid = grid_from(&[
            ".o.", //
            "oo.", //
            "ooo",
        ]);
        let next = step_once(&grid, 11);
        assert_eq!(next.get(1, 0), Cell::Empty);
        assert_eq!(next.get(2, 1), Cell::Sand);
    }

    #[test]
    fn test_diagonal_settle_swaps_with_water() {
        // Straight down is blocked and the only open diagonal holds water;
        // the water must surface into the grain's old cell, not vanish.
        let grid = grid_from(&[
            ".o.", //
            "~oo", //
            "ooo",
        ]);
        let next = step_once(&grid, 0);
        assert_eq!(next.get(1, 0), Cell::Water);
        assert_eq!(next.get(0, 1), Cell::Sand);
        assert_eq!(next.count(Cell::Water), 1);
        assert_eq!(next.count(Cell::Sand), grid.count(Cell::Sand));
    }

    #[test]
    fn test_water_flows_laterally() {
        // Floor below, open cells either side: the water moves to exactly
        // one lateral neighbor.
        let grid = grid_from(&[
            ".....", //
            "..~..", //
            "ooooo",
        ]);
        for seed in 0..16 {
            let next = step_once(&grid, seed);
            assert_eq!(next.get(2, 1), Cell::Empty, "seed {seed}");
            let flowed =
                (next.get(1, 1) == Cell::Water) ^ (next.get(3, 1) == Cell::Water);
            assert!(flowed, "seed {seed}: expected exactly one lateral cell");
            assert_eq!(next.count(Cell::Water), 1, "seed {seed}");
        }
    }

    #[test]
    fn test_two_grains_cannot_claim_one_diagonal() {
        // Both grains are blocked below and share (1, 1) as their only
        // viable diagonal. The claim check lets exactly one take it.
        let grid = grid_from(&[
            "o.o", //
            "o.o", //
            "ooo",
        ]);
        let next = step_once(&grid, 5);
        assert_eq!(next.count(Cell::Sand), grid.count(Cell::Sand));
        assert_eq!(next.get(1, 1), Cell::Sand);
        let stayed = (next.get(0, 0) == Cell::Sand) ^ (next.get(2, 0) == Cell::Sand);
        assert!(stayed, "exactly one grain should be left behind");
    }

    #[test]
    fn test_two_waters_cannot_claim_one_gap() {
        let grid = grid_from(&[
            "~.~", //
            "ooo",
        ]);
        let next = step_once(&grid, 9);
        assert_eq!(next.count(Cell::Water), 2);
    }

    #[test]
    fn test_fixed_seed_runs_are_identical() {
        let mut a = Simulation::new(16, 12, 42);
        let mut b = Simulation::new(16, 12, 42);
        for sim in [&mut a, &mut b] {
            for x in 4..12 {
                sim.apply_edit(EditCommand::Paint { x, y: 0, cell: Cell::Sand });
                sim.apply_edit(EditCommand::Paint { x, y: 2, cell: Cell::Water });
            }
        }

        for _ in 0..50 {
            a.step();
            b.step();
            assert_eq!(a.grid(), b.grid());
        }
    }

    #[test]
    fn test_edits_outside_grid_are_ignored() {
        let mut sim = Simulation::new(4, 4, 0);
        sim.apply_edit(EditCommand::Paint { x: 4, y: 0, cell: Cell::Sand });
        sim.apply_edit(EditCommand::Paint { x: 0, y: 9, cell: Cell::Sand });
        assert_eq!(sim.grid().count(Cell::Sand), 0);

        sim.apply_edit(EditCommand::Paint { x: 1, y: 1, cell: Cell::Sand });
        assert_eq!(sim.grid().count(Cell::Sand), 1);
        sim.apply_edit(EditCommand::Erase { x: 1, y: 1 });
        assert_eq!(sim.grid().count(Cell::Sand), 0);
    }

    #[test]
    fn test_pile_settles_and_conserves_mass() {
        // Pour a column of sand into a pool of water and run it to rest.
        let mut sim = Simulation::new(12, 10, 1234);
        for y in 7..10 {
            for x in 0..12 {
                sim.apply_edit(EditCommand::Paint { x, y, cell: Cell::Water });
            }
        }
        for y in 0..4 {
            sim.apply_edit(EditCommand::Paint { x: 6, y, cell: Cell::Sand });
        }
        let sand = sim.grid().count(Cell::Sand);
        let water = sim.grid().count(Cell::Water);

        for _ in 0..200 {
            sim.step();
        }

        assert_eq!(sim.grid().count(Cell::Sand), sand);
        assert_eq!(sim.grid().count(Cell::Water), water);
        // Everything has sunk out of the top half by now.
        for y in 0..3 {
            for x in 0..12 {
                assert_eq!(sim.grid().get(x, y), Cell::Empty, "({x}, {y})");
            }
        }
    }

    proptest! {
        #[test]
        fn prop_step_conserves_mass(
            cells in prop::collection::vec(0u8..3, 16 * 12),
            seed in any::<u64>(),
        ) {
            let mut grid = Grid::new(16, 12);
            for (i, v) in cells.iter().enumerate() {
                let cell = match v {
                    0 => Cell::Empty,
                    1 => Cell::Sand,
                    _ => Cell::Water,
                };
                grid.set(i % 16, i / 16, cell);
            }

            let next = step_once(&grid, seed);
            prop_assert_eq!(next.count(Cell::Sand), grid.count(Cell::Sand));
            prop_assert_eq!(next.count(Cell::Water), grid.count(Cell::Water));
        }

        #[test]
        fn prop_bottom_row_is_immobile(
            cells in prop::collection::vec(0u8..3, 8),
            seed in any::<u64>(),
        ) {
            let mut grid = Grid::new(8, 6);
            for (x, v) in cells.iter().enumerate() {
                let cell = match v {
                    0 => Cell::Empty,
                    1 => Cell::Sand,
                    _ => Cell::Water,
                };
                grid.set(x, 5, cell);
            }

            let next = step_once(&grid, seed);
            for x in 0..8 {
                prop_assert_eq!(next.get(x, 5), grid.get(x, 5));
            }
        }
    }
}
