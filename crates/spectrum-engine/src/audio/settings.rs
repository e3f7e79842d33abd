//! Volume and mute state shared by both contexts.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use super::MAX_VOLUME;

/// Volume (0-10) and the sound on/off switch.
///
/// Read by the audio context every frame and by the tape engine for its
/// loading volume; written from the primary context.
#[derive(Debug)]
pub struct AudioSettings {
    volume: AtomicU8,
    enabled: AtomicBool,
}

impl AudioSettings {
    #[must_use]
    pub fn new(volume: u8, enabled: bool) -> Self {
        Self {
            volume: AtomicU8::new(volume.min(MAX_VOLUME)),
            enabled: AtomicBool::new(enabled),
        }
    }

    #[must_use]
    pub fn volume(&self) -> u8 {
        self.volume.load(Ordering::Relaxed)
    }

    pub fn set_volume(&self, volume: u8) {
        self.volume.store(volume.min(MAX_VOLUME), Ordering::Relaxed);
    }

    /// One step louder, stopping at 10. Returns the new level.
    pub fn volume_up(&self) -> u8 {
        self.step(|v| (v < MAX_VOLUME).then(|| v + 1))
    }

    /// One step quieter, stopping at 0. Returns the new level.
    pub fn volume_down(&self) -> u8 {
        self.step(|v| v.checked_sub(1))
    }

    fn step(&self, f: impl FnMut(u8) -> Option<u8>) -> u8 {
        // Err means the level was already at the limit.
        let _ = self
            .volume
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, f);
        self.volume()
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Volume as heard: 0 while sound is off.
    #[must_use]
    pub fn effective_volume(&self) -> u8 {
        if self.enabled() { self.volume() } else { 0 }
    }

    /// Volume for tape loading: `offset` steps below the playback volume,
    /// never below 0, and 0 while sound is off.
    #[must_use]
    pub fn tape_volume(&self, offset: u8) -> u8 {
        self.effective_volume().saturating_sub(offset)
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self::new(5, true)
    }
}
