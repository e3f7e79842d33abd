//! Keyboard input for the ZX Spectrum.
//!
//! Two layers:
//! 1. `SpectrumKey`: logical key names mapped to the 8×5 keyboard matrix.
//! 2. `InputQueue`: frame-stamped key events for scripted sequences, such as
//!    typing `LOAD ""` before a tape starts.

use std::collections::VecDeque;

use crate::keyboard::KeyboardState;

/// Logical key on the 48K Spectrum keyboard.
///
/// Each key maps to a (row, bit) pair in the 8×5 keyboard matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectrumKey {
    // Row 0 (addr bit A8)
    CapsShift,
    Z,
    X,
    C,
    V,
    // Row 1 (addr bit A9)
    A,
    S,
    D,
    F,
    G,
    // Row 2 (addr bit A10)
    Q,
    W,
    E,
    R,
    T,
    // Row 3 (addr bit A11)
    N1,
    N2,
    N3,
    N4,
    N5,
    // Row 4 (addr bit A12)
    N0,
    N9,
    N8,
    N7,
    N6,
    // Row 5 (addr bit A13)
    P,
    O,
    I,
    U,
    Y,
    // Row 6 (addr bit A14)
    Enter,
    L,
    K,
    J,
    H,
    // Row 7 (addr bit A15)
    Space,
    SymShift,
    M,
    N,
    B,
}

impl SpectrumKey {
    /// Return the (row, bit) pair for this key in the keyboard matrix.
    #[must_use]
    pub const fn matrix(self) -> (usize, u8) {
        match self {
            Self::CapsShift => (0, 0),
            Self::Z => (0, 1),
            Self::X => (0, 2),
            Self::C => (0, 3),
            Self::V => (0, 4),

            Self::A => (1, 0),
            Self::S => (1, 1),
            Self::D => (1, 2),
            Self::F => (1, 3),
            Self::G => (1, 4),

            Self::Q => (2, 0),
            Self::W => (2, 1),
            Self::E => (2, 2),
            Self::R => (2, 3),
            Self::T => (2, 4),

            Self::N1 => (3, 0),
            Self::N2 => (3, 1),
            Self::N3 => (3, 2),
            Self::N4 => (3, 3),
            Self::N5 => (3, 4),

            Self::N0 => (4, 0),
            Self::N9 => (4, 1),
            Self::N8 => (4, 2),
            Self::N7 => (4, 3),
            Self::N6 => (4, 4),

            Self::P => (5, 0),
            Self::O => (5, 1),
            Self::I => (5, 2),
            Self::U => (5, 3),
            Self::Y => (5, 4),

            Self::Enter => (6, 0),
            Self::L => (6, 1),
            Self::K => (6, 2),
            Self::J => (6, 3),
            Self::H => (6, 4),

            Self::Space => (7, 0),
            Self::SymShift => (7, 1),
            Self::M => (7, 2),
            Self::N => (7, 3),
            Self::B => (7, 4),
        }
    }
}

/// A frame-stamped keyboard event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    /// Frame (relative to the start of the script) at which this event fires.
    pub frame: u64,
    pub key: SpectrumKey,
    /// True = press, false = release.
    pub pressed: bool,
}

/// Timed input queue for scripted key sequences.
///
/// Events are kept sorted by frame and applied at the start of each frame.
/// Events sharing a frame fire in the order they were pushed.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The sequence that types `LOAD ""` and ENTER from the 48K BASIC
    /// prompt: J (keyword LOAD), Symbol Shift + P twice (the quotes), ENTER.
    ///
    /// Each key is held for `hold` frames and followed by `hold` idle
    /// frames. Symbol Shift stays down across both quotes.
    #[must_use]
    pub fn load_command(hold: u64) -> Self {
        let mut queue = Self::new();
        let mut frame = 0;

        queue.enqueue_key(SpectrumKey::J, frame, hold);
        frame += 2 * hold;

        queue.push_press(SpectrumKey::SymShift, frame);
        frame += hold;
        for _ in 0..2 {
            queue.enqueue_key(SpectrumKey::P, frame, hold);
            frame += 2 * hold;
        }
        queue.push_release(SpectrumKey::SymShift, frame);

        queue.enqueue_key(SpectrumKey::Enter, frame, hold);
        queue
    }

    /// Enqueue a raw input event.
    pub fn push(&mut self, event: InputEvent) {
        let pos = self
            .events
            .iter()
            .position(|e| e.frame > event.frame)
            .unwrap_or(self.events.len());
        self.events.insert(pos, event);
    }

    fn push_press(&mut self, key: SpectrumKey, frame: u64) {
        self.push(InputEvent {
            frame,
            key,
            pressed: true,
        });
    }

    fn push_release(&mut self, key: SpectrumKey, frame: u64) {
        self.push(InputEvent {
            frame,
            key,
            pressed: false,
        });
    }

    /// Enqueue a key press and release.
    ///
    /// The key is pressed at `at_frame` and released at `at_frame + hold_frames`.
    pub fn enqueue_key(&mut self, key: SpectrumKey, at_frame: u64, hold_frames: u64) {
        self.push_press(key, at_frame);
        self.push_release(key, at_frame + hold_frames);
    }

    /// Number of frames a script needs: one past the last event, plus the
    /// idle tail a key release is followed by.
    #[must_use]
    pub fn span(&self, tail: u64) -> u64 {
        self.events.back().map_or(0, |e| e.frame + tail)
    }

    /// Apply every event due at or before `frame` to the keyboard.
    pub fn process(&mut self, frame: u64, keyboard: &mut KeyboardState) {
        while self.events.front().is_some_and(|e| e.frame <= frame) {
            let Some(event) = self.events.pop_front() else {
                break;
            };
            let (row, bit) = event.key.matrix();
            keyboard.set_key(row, bit, event.pressed);
        }
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pending events in firing order.
    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }
}
