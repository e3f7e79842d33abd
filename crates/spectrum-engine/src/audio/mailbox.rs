//! Single-slot frame hand-off between the primary and audio contexts.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::scheduler::FrameAccumulator;

/// A one-frame mailbox. Submitting overwrites any frame the audio context
/// has not taken yet, so only the newest frame is ever played.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct FrameMailbox {
    slot: Arc<Mutex<Option<FrameAccumulator>>>,
}

impl FrameMailbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a frame. Never blocks on the consumer beyond the lock itself.
    pub fn submit(&self, frame: &FrameAccumulator) {
        *self.lock() = Some(*frame);
    }

    /// Take the pending frame, leaving the slot empty.
    #[must_use]
    pub fn take(&self) -> Option<FrameAccumulator> {
        self.lock().take()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<FrameAccumulator>> {
        // The slot holds plain data; a panic elsewhere can't leave it torn.
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
