//! Simulation settings
//!
//! Persisted as JSON in the working directory. Loading falls back to
//! defaults when the file is missing or malformed, so a frontend can
//! always construct a simulation.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::Cell;

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Grid width in cells
    pub grid_width: usize,
    /// Grid height in cells
    pub grid_height: usize,
    /// Rendered cell size in pixels; frontends divide pointer coordinates
    /// by this before building edit commands
    pub cell_size: u32,
    /// Step cadence the external driver targets
    pub target_fps: u32,
    /// Fixed run seed; unset means seed from the system clock
    #[serde(default)]
    pub seed: Option<u64>,
    /// Material painted by default
    pub brush: Cell,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grid_width: GRID_WIDTH,
            grid_height: GRID_HEIGHT,
            cell_size: CELL_SIZE,
            target_fps: TARGET_FPS,
            seed: None,
            brush: Cell::Sand,
        }
    }
}

impl Settings {
    /// Settings file name, looked up in the working directory
    const FILE_NAME: &'static str = "sandfall_settings.json";

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(Path::new(Self::FILE_NAME))
    }

    /// Load settings from `path`, falling back to defaults on any failure
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed settings file ({e}); using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings to the default location
    pub fn save(&self) -> std::io::Result<()> {
        self.save_to(Path::new(Self::FILE_NAME))
    }

    /// Save settings as pretty JSON
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Seed for a new run: the configured one, or one from the clock
    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default()
        })
    }
}
