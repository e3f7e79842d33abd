//! A/B sample buffers.

use super::{SAMPLES_PER_FRAME, SampleFrame};

/// Which of the two physical buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferId {
    A,
    B,
}

impl BufferId {
    fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

/// Two sample buffers: the active one is filled by the renderer while the
/// other is in flight at the sink. Ownership swaps once per frame.
///
/// The in-flight buffer is the one that is not active, so exactly one
/// buffer is in flight at every point.
pub struct AudioDoubleBuffer {
    buffers: [SampleFrame; 2],
    active: BufferId,
}

impl AudioDoubleBuffer {
    /// Both buffers silent, A active.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffers: [[0; SAMPLES_PER_FRAME]; 2],
            active: BufferId::A,
        }
    }

    #[must_use]
    pub fn active_id(&self) -> BufferId {
        self.active
    }

    #[must_use]
    pub fn in_flight_id(&self) -> BufferId {
        self.active.other()
    }

    /// The buffer being filled.
    pub fn active_mut(&mut self) -> &mut SampleFrame {
        &mut self.buffers[self.active.index()]
    }

    /// The buffer owned by the sink.
    #[must_use]
    pub fn in_flight(&self) -> &SampleFrame {
        &self.buffers[self.in_flight_id().index()]
    }

    /// Hand the freshly filled buffer to the sink and reclaim the other one.
    /// Returns the buffer now in flight.
    pub fn flip(&mut self) -> &SampleFrame {
        self.active = self.active.other();
        self.in_flight()
    }
}

impl Default for AudioDoubleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_sends_the_filled_buffer() {
        let mut buffers = AudioDoubleBuffer::new();
        buffers.active_mut()[0] = 123;
        let sent = buffers.flip();
        assert_eq!(sent[0], 123);
        assert_eq!(buffers.active_id(), BufferId::B);
        assert_eq!(buffers.in_flight_id(), BufferId::A);
    }

    #[test]
    fn exactly_one_in_flight_after_each_flip() {
        let mut buffers = AudioDoubleBuffer::new();
        for n in 0..7 {
            buffers.flip();
            let expected = if n % 2 == 0 { BufferId::A } else { BufferId::B };
            assert_eq!(buffers.in_flight_id(), expected);
            assert_ne!(buffers.in_flight_id(), buffers.active_id());
        }
    }

    #[test]
    fn refilling_does_not_touch_the_in_flight_buffer() {
        let mut buffers = AudioDoubleBuffer::new();
        buffers.active_mut().fill(5);
        buffers.flip();
        buffers.active_mut().fill(-5);
        assert!(buffers.in_flight().iter().all(|&s| s == 5));
    }
}
