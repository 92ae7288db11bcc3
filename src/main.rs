//! Sandfall entry point
//!
//! Headless driver: builds a demo scene, steps the simulation at the
//! configured tick count, and prints the result as ASCII. Windowed
//! rendering belongs to a separate frontend; this binary exercises the
//! engine end to end.

use sandfall::settings::Settings;
use sandfall::sim::{Cell, EditCommand, Grid, Simulation};

fn main() {
    env_logger::init();

    let settings = Settings::load();
    let seed = settings.effective_seed();
    log::info!(
        "Sandfall starting: {}x{} grid, seed {}",
        settings.grid_width,
        settings.grid_height,
        seed
    );

    let mut sim = Simulation::new(settings.grid_width, settings.grid_height, seed);
    paint_demo_scene(&mut sim, &settings);

    // Five simulated seconds at the configured cadence. The driver owns
    // the cadence; each step is one fixed discrete tick regardless of
    // wall-clock time.
    let fps = settings.target_fps.max(1);
    for tick in 1..=fps * 5 {
        sim.step();
        if tick.is_multiple_of(fps) {
            let grid = sim.grid();
            log::info!(
                "t={}s sand={} water={}",
                tick / fps,
                grid.count(Cell::Sand),
                grid.count(Cell::Water)
            );
        }
    }

    print_frame(sim.grid());
}

/// A column of the configured brush pouring into a water pool
fn paint_demo_scene(sim: &mut Simulation, settings: &Settings) {
    let w = settings.grid_width;
    let h = settings.grid_height;

    for y in h - h / 6..h {
        for x in w / 4..3 * w / 4 {
            sim.apply_edit(EditCommand::Paint {
                x,
                y,
                cell: Cell::Water,
            });
        }
    }
    for y in 0..h / 4 {
        sim.apply_edit(EditCommand::Paint {
            x: w / 2,
            y,
            cell: settings.brush,
        });
    }
}

/// One character per cell, row-major like a renderer would draw it
fn print_frame(grid: &Grid) {
    let mut out = String::with_capacity((grid.width() + 1) * grid.height());
    for row in grid.rows() {
        for &cell in row {
            out.push(match cell {
                Cell::Empty => '.',
                Cell::Sand => 'o',
                Cell::Water => '~',
            });
        }
        out.push('\n');
    }
    print!("{out}");
}
