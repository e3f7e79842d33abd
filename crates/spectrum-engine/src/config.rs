//! Engine configuration.
//!
//! Every field has a default, so a JSON config only needs to name what it
//! changes:
//!
//! ```json
//! { "volume": 8, "tape_volume_offset": 3 }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 48K ROM image, read by [`EngineConfig::read_rom`]. Only needed to
    /// run a CPU; the format tools don't use it.
    pub rom: Option<PathBuf>,
    /// Playback volume, 0-10.
    pub volume: u8,
    pub sound_enabled: bool,
    /// How many volume steps quieter tape loading plays than normal sound.
    pub tape_volume_offset: u8,
    /// Scanline after which the scheduler records its diagnostic register
    /// snapshot.
    pub diagnostic_line: usize,
    /// Value returned by reads of unassigned (odd) ports.
    pub floating_bus: u8,
    /// Frames run before typing the load command, so the ROM finishes its
    /// start-up.
    pub warmup_frames: u32,
    /// Frames each scripted key is held, and the idle gap after it.
    pub key_hold_frames: u32,
    /// Render checkpoints per screen refresh during tape loading. 1 renders
    /// at every checkpoint.
    pub render_throttle: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rom: None,
            volume: 5,
            sound_enabled: true,
            tape_volume_offset: 2,
            diagnostic_line: 156,
            floating_bus: 0xFF,
            warmup_frames: 200,
            key_hold_frames: 10,
            render_throttle: 1,
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        let mut config: Self = serde_json::from_str(text)?;
        config.normalise();
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Read the configured ROM image. Its size is checked when the machine
    /// is built.
    pub fn read_rom(&self) -> Result<Vec<u8>, EngineError> {
        let path = self.rom.as_deref().ok_or(EngineError::NoRom)?;
        Ok(fs::read(path)?)
    }

    /// Clamp out-of-range values instead of rejecting the file.
    fn normalise(&mut self) {
        self.volume = self.volume.min(10);
        self.diagnostic_line = self.diagnostic_line.min(crate::scheduler::LINES_PER_FRAME - 1);
        self.render_throttle = self.render_throttle.max(1);
    }
}
