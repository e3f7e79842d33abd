//! 48K Spectrum memory: 16K ROM + 48K RAM.
//!
//! Layout:
//! - $0000-$3FFF: ROM (writes ignored)
//! - $4000-$FFFF: RAM
//!
//! The address space is exactly 64K, so every `u16` is a valid address.

use log::{debug, warn};

use crate::error::EngineError;

/// ROM image size.
pub const ROM_SIZE: usize = 0x4000;

/// RAM size.
pub const RAM_SIZE: usize = 0xC000;

/// First RAM address.
pub const RAM_START: u16 = 0x4000;

/// What the start of a ROM image says about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomSignature {
    /// `DI; XOR A` at $0000 and `JP $15CB` at $0038.
    Classic,
    /// `DI; XOR A` at $0000 and the IM 1 handler inlined at $0038
    /// (`PUSH AF; PUSH HL; LD HL,...`).
    Inline,
    /// `DI; XOR A` at $0000, unrecognised IM 1 handler.
    OtherHandler,
    /// Doesn't start with `DI; XOR A`.
    Mismatch,
}

impl RomSignature {
    #[must_use]
    pub fn identify(rom: &[u8]) -> Self {
        if !rom.starts_with(&[0xF3, 0xAF]) {
            return Self::Mismatch;
        }
        match rom.get(0x38..0x3B) {
            Some([0xC3, 0xCB, 0x15]) => Self::Classic,
            Some([0xF5, 0xE5, 0x2A]) => Self::Inline,
            _ => Self::OtherHandler,
        }
    }
}

pub struct Memory48K {
    rom: Box<[u8]>,
    ram: Box<[u8]>,
}

impl Memory48K {
    /// Create a new 48K memory with the given ROM data. RAM starts zeroed.
    pub fn new(rom: &[u8]) -> Result<Self, EngineError> {
        if rom.len() != ROM_SIZE {
            return Err(EngineError::RomSize {
                expected: ROM_SIZE,
                got: rom.len(),
            });
        }

        match RomSignature::identify(rom) {
            RomSignature::Mismatch => warn!(
                "ROM does not start with DI; XOR A (got {:02X} {:02X}); not a 48K ROM?",
                rom[0], rom[1]
            ),
            signature => debug!("48K ROM, {signature:?} IM 1 handler"),
        }

        Ok(Self {
            rom: rom.into(),
            ram: vec![0; RAM_SIZE].into_boxed_slice(),
        })
    }

    #[must_use]
    pub fn read(&self, addr: u16) -> u8 {
        match addr.checked_sub(RAM_START) {
            Some(offset) => self.ram[usize::from(offset)],
            None => self.rom[usize::from(addr)],
        }
    }

    /// Write a byte. ROM writes are silently discarded.
    pub fn write(&mut self, addr: u16, val: u8) {
        if let Some(offset) = addr.checked_sub(RAM_START) {
            self.ram[usize::from(offset)] = val;
        }
    }

    /// Overlay `data` at `addr` through the normal write path, wrapping at
    /// the top of the address space like the CPU would.
    pub fn load_block(&mut self, addr: u16, data: &[u8]) {
        let mut at = addr;
        for &byte in data {
            self.write(at, byte);
            at = at.wrapping_add(1);
        }
    }

    /// Direct RAM access for snapshot loading. Offset 0 = address $4000.
    pub fn load_ram(&mut self, data: &[u8]) {
        let len = data.len().min(self.ram.len());
        self.ram[..len].copy_from_slice(&data[..len]);
    }

    /// The whole RAM image, `$4000` first.
    #[must_use]
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    #[must_use]
    pub fn rom(&self) -> &[u8] {
        &self.rom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_memory() -> Memory48K {
        let mut rom = vec![0u8; ROM_SIZE];
        rom[0] = 0xF3; // DI
        rom[ROM_SIZE - 1] = 0x3C;
        Memory48K::new(&rom).expect("16K ROM should be accepted")
    }

    #[test]
    fn rom_is_readable_and_immutable() {
        let mut mem = make_memory();
        assert_eq!(mem.read(0x0000), 0xF3);
        mem.write(0x0000, 0x00);
        mem.write(0x3FFF, 0x00);
        assert_eq!(mem.read(0x0000), 0xF3);
        assert_eq!(mem.read(0x3FFF), 0x3C);
    }

    #[test]
    fn ram_round_trips_across_the_whole_range() {
        let mut mem = make_memory();
        mem.write(0x4000, 0x11);
        mem.write(0x8000, 0x22);
        mem.write(0xFFFF, 0x33);
        assert_eq!(mem.read(0x4000), 0x11);
        assert_eq!(mem.read(0x8000), 0x22);
        assert_eq!(mem.read(0xFFFF), 0x33);
        assert_eq!(mem.ram()[0], 0x11);
        assert_eq!(mem.ram()[RAM_SIZE - 1], 0x33);
    }

    #[test]
    fn load_block_skips_rom_and_wraps() {
        let mut mem = make_memory();
        mem.load_block(0xFFFE, &[1, 2, 3, 4]);
        assert_eq!(mem.read(0xFFFE), 1);
        assert_eq!(mem.read(0xFFFF), 2);
        assert_eq!(mem.read(0x0000), 0xF3);
    }

    #[test]
    fn rom_signature_variants() {
        let mut rom = vec![0u8; ROM_SIZE];
        assert_eq!(RomSignature::identify(&rom), RomSignature::Mismatch);

        rom[..2].copy_from_slice(&[0xF3, 0xAF]);
        assert_eq!(RomSignature::identify(&rom), RomSignature::OtherHandler);

        rom[0x38..0x3B].copy_from_slice(&[0xC3, 0xCB, 0x15]);
        assert_eq!(RomSignature::identify(&rom), RomSignature::Classic);

        rom[0x38..0x3B].copy_from_slice(&[0xF5, 0xE5, 0x2A]);
        assert_eq!(RomSignature::identify(&rom), RomSignature::Inline);

        assert_eq!(RomSignature::identify(&[0xF3]), RomSignature::Mismatch);
    }

    #[test]
    fn unsigned_rom_is_still_accepted() {
        let mem = Memory48K::new(&[0u8; ROM_SIZE]).expect("size is all that is enforced");
        assert_eq!(mem.rom()[0], 0);
    }

    #[test]
    fn wrong_rom_size_rejected() {
        assert!(matches!(
            Memory48K::new(&[0u8; 100]),
            Err(EngineError::RomSize { got: 100, .. })
        ));
    }
}
