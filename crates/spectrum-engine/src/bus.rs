//! Spectrum bus: memory and I/O routing.
//!
//! The bus connects the CPU unit to memory, the keyboard matrix, the border
//! and beeper latches, and the EAR input latch the tape engine drives.
//!
//! # Ports
//!
//! Only A0 is decoded, as on the real ULA:
//! - even port read: keyboard half-rows selected by the high address byte,
//!   bits 5 and 7 high, bit 6 = EAR input latch
//! - odd port read: the floating bus value
//! - even port write: border = bits 0-2, beeper = bit 4
//! - odd port write: ignored

use emu_core::Bus;

use crate::keyboard::KeyboardState;
use crate::memory::Memory48K;

/// Value read from ports nothing answers on.
pub const DEFAULT_FLOATING_BUS: u8 = 0xFF;

/// The Spectrum bus, implementing `emu_core::Bus`.
pub struct SpectrumBus {
    pub memory: Memory48K,
    pub keyboard: KeyboardState,
    /// Border colour, 0-7.
    border: u8,
    /// Beeper output latch (bit 4 of the last even-port write).
    beeper: bool,
    /// Set when the beeper latch has been high at any point since the last
    /// `begin_step`.
    beeper_seen: bool,
    /// EAR input latch, as seen on bit 6 of an even-port read.
    ear: bool,
    floating_bus: u8,
}

impl SpectrumBus {
    #[must_use]
    pub fn new(memory: Memory48K) -> Self {
        Self {
            memory,
            keyboard: KeyboardState::new(),
            border: 0,
            beeper: false,
            beeper_seen: false,
            ear: false,
            floating_bus: DEFAULT_FLOATING_BUS,
        }
    }

    /// Clear every latch and release all keys. Memory is untouched.
    pub fn reset(&mut self) {
        self.keyboard.release_all();
        self.border = 0;
        self.beeper = false;
        self.beeper_seen = false;
        self.ear = false;
    }

    pub fn set_floating_bus(&mut self, value: u8) {
        self.floating_bus = value;
    }

    #[must_use]
    pub fn border(&self) -> u8 {
        self.border
    }

    pub fn set_border(&mut self, colour: u8) {
        self.border = colour & 0x07;
    }

    #[must_use]
    pub fn beeper(&self) -> bool {
        self.beeper
    }

    #[must_use]
    pub fn ear(&self) -> bool {
        self.ear
    }

    pub fn set_ear(&mut self, level: bool) {
        self.ear = level;
    }

    pub fn toggle_ear(&mut self) {
        self.ear = !self.ear;
    }

    /// Start a scheduler step. The beeper counts as active for the step if
    /// it is high now or goes high before the next call.
    pub fn begin_step(&mut self) {
        self.beeper_seen = self.beeper;
    }

    /// Whether the beeper was high for any part of the current step.
    #[must_use]
    pub fn beeper_active_in_step(&self) -> bool {
        self.beeper_seen
    }
}

impl Bus for SpectrumBus {
    fn read(&mut self, address: u16) -> u8 {
        self.memory.read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory.write(address, value);
    }

    fn io_read(&mut self, port: u16) -> u8 {
        if port & 0x01 != 0 {
            return self.floating_bus;
        }
        let addr_high = (port >> 8) as u8;
        let keys = self.keyboard.read(addr_high) & 0x1F;
        let ear = if self.ear { 0x40 } else { 0x00 };
        keys | 0xA0 | ear
    }

    fn io_write(&mut self, port: u16, value: u8) {
        if port & 0x01 != 0 {
            return;
        }
        self.border = value & 0x07;
        self.beeper = value & 0x10 != 0;
        self.beeper_seen |= self.beeper;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ROM_SIZE;

    fn make_bus() -> SpectrumBus {
        SpectrumBus::new(Memory48K::new(&[0u8; ROM_SIZE]).expect("ROM size is valid"))
    }

    #[test]
    fn even_port_write_sets_border_and_beeper() {
        let mut bus = make_bus();
        bus.io_write(0x00FE, 0x15);
        assert_eq!(bus.border(), 5);
        assert!(bus.beeper());

        bus.io_write(0x00FE, 0x07);
        assert_eq!(bus.border(), 7);
        assert!(!bus.beeper());
    }

    #[test]
    fn odd_port_write_is_ignored() {
        let mut bus = make_bus();
        bus.io_write(0x00FF, 0x17);
        assert_eq!(bus.border(), 0);
        assert!(!bus.beeper());
    }

    #[test]
    fn even_port_read_composes_keys_and_ear() {
        let mut bus = make_bus();
        assert_eq!(bus.io_read(0xFEFE), 0xBF);

        bus.set_ear(true);
        assert_eq!(bus.io_read(0xFEFE), 0xFF);

        bus.keyboard.set_key(0, 1, true); // Z
        assert_eq!(bus.io_read(0xFEFE), 0xFD);
        assert_eq!(bus.io_read(0x7FFE), 0xFF);
    }

    #[test]
    fn odd_port_read_returns_floating_bus() {
        let mut bus = make_bus();
        assert_eq!(bus.io_read(0x00FF), 0xFF);
        bus.set_floating_bus(0x38);
        assert_eq!(bus.io_read(0x1F1F), 0x38);
    }

    #[test]
    fn beeper_pulse_within_step_is_seen() {
        let mut bus = make_bus();
        bus.begin_step();
        assert!(!bus.beeper_active_in_step());

        bus.io_write(0xFE, 0x10);
        bus.io_write(0xFE, 0x00);
        assert!(bus.beeper_active_in_step());

        bus.begin_step();
        assert!(!bus.beeper_active_in_step());
    }

    #[test]
    fn beeper_held_high_counts_for_next_step() {
        let mut bus = make_bus();
        bus.io_write(0xFE, 0x10);
        bus.begin_step();
        assert!(bus.beeper_active_in_step());
    }

    #[test]
    fn reset_clears_latches_but_not_ram() {
        let mut bus = make_bus();
        bus.write(0x8000, 0x42);
        bus.io_write(0xFE, 0x13);
        bus.set_ear(true);
        bus.keyboard.set_key(6, 0, true);

        bus.reset();

        assert_eq!(bus.border(), 0);
        assert!(!bus.beeper());
        assert!(!bus.ear());
        assert_eq!(bus.io_read(0xBFFE) & 0x1F, 0x1F);
        assert_eq!(bus.read(0x8000), 0x42);
    }
}
