//! SNA snapshot codec for the 48K Spectrum.
//!
//! **48K format** (49,179 bytes): 27-byte header + 49,152 bytes of RAM
//! covering `$4000-$FFFF`. PC is not stored in the header. It sits on the
//! stack at SP, exactly as a `RETN` out of the NMI handler would find it, so
//! the loader pops it after the RAM image is in place.
//!
//! Header layout:
//!
//! | offset | field |
//! |---|---|
//! | 0 | I |
//! | 1-8 | HL', DE', BC', AF' |
//! | 9-14 | HL, DE, BC |
//! | 15-18 | IY, IX |
//! | 19 | bit 2 = IFF2 |
//! | 20 | R |
//! | 21-22 | AF (F first) |
//! | 23-24 | SP |
//! | 25 | interrupt mode |
//! | 26 | border colour |

use emu_core::{RegisterPair, Registers};
use thiserror::Error;

/// Size of a 48K SNA snapshot file.
pub const SNA_48K_SIZE: usize = 49_179;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 27;

/// RAM dump size (48K from `$4000-$FFFF`).
pub const RAM_SIZE: usize = 49_152;

/// First RAM address. Everything below is ROM.
pub const RAM_START: u16 = 0x4000;

/// Ways an SNA image can be rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnaError {
    #[error("SNA file must be {SNA_48K_SIZE} bytes, got {0}")]
    WrongSize(usize),
    #[error("SNA RAM image must be {RAM_SIZE} bytes, got {0}")]
    WrongRamSize(usize),
}

/// A parsed 48K SNA snapshot.
///
/// `registers.pc` carries no information in this format: it is zero after
/// [`SnaSnapshot::parse`] and ignored by [`SnaSnapshot::to_bytes`]. The real
/// PC lives in RAM at SP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnaSnapshot {
    pub registers: Registers,
    /// Border colour, 0-7.
    pub border: u8,
    ram: Box<[u8]>,
}

impl SnaSnapshot {
    /// Build a snapshot from a register block, border and a 48K RAM image.
    pub fn new(registers: Registers, border: u8, ram: &[u8]) -> Result<Self, SnaError> {
        if ram.len() != RAM_SIZE {
            return Err(SnaError::WrongRamSize(ram.len()));
        }
        Ok(Self {
            registers,
            border: border & 0x07,
            ram: ram.into(),
        })
    }

    /// Parse a 49,179-byte SNA image.
    pub fn parse(data: &[u8]) -> Result<Self, SnaError> {
        if data.len() != SNA_48K_SIZE {
            return Err(SnaError::WrongSize(data.len()));
        }

        let pair = |offset: usize| RegisterPair::from_le([data[offset], data[offset + 1]]);
        let iff = data[19] & 0x04 != 0;

        let registers = Registers {
            i: data[0],
            hl_alt: pair(1),
            de_alt: pair(3),
            bc_alt: pair(5),
            af_alt: pair(7),
            hl: pair(9),
            de: pair(11),
            bc: pair(13),
            iy: pair(15),
            ix: pair(17),
            iff1: iff,
            iff2: iff,
            r: data[20],
            af: pair(21),
            sp: pair(23),
            im: data[25],
            ..Registers::default()
        };

        Ok(Self {
            registers,
            border: data[26] & 0x07,
            ram: data[HEADER_SIZE..].into(),
        })
    }

    /// Serialize back to a 49,179-byte image.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let regs = &self.registers;
        let mut out = Vec::with_capacity(SNA_48K_SIZE);

        out.push(regs.i);
        for pair in [
            regs.hl_alt,
            regs.de_alt,
            regs.bc_alt,
            regs.af_alt,
            regs.hl,
            regs.de,
            regs.bc,
            regs.iy,
            regs.ix,
        ] {
            out.extend_from_slice(&pair.to_le());
        }
        out.push(if regs.iff2 { 0x04 } else { 0x00 });
        out.push(regs.r);
        out.extend_from_slice(&regs.af.to_le());
        out.extend_from_slice(&regs.sp.to_le());
        out.push(regs.im);
        out.push(self.border & 0x07);
        out.extend_from_slice(&self.ram);

        out
    }

    /// The 48K RAM image, `$4000` first.
    #[must_use]
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    #[must_use]
    pub fn ram_mut(&mut self) -> &mut [u8] {
        &mut self.ram
    }

    /// The return address stored at SP, if both stack bytes lie in RAM.
    ///
    /// Returns `None` when SP points into ROM (or at `$FFFF`), where the
    /// value depends on the ROM image rather than the snapshot.
    #[must_use]
    pub fn stacked_pc(&self) -> Option<u16> {
        let sp = self.registers.sp.word();
        if sp < RAM_START || sp == 0xFFFF {
            return None;
        }
        let offset = usize::from(sp - RAM_START);
        Some(RegisterPair::from_le([self.ram[offset], self.ram[offset + 1]]).word())
    }
}
