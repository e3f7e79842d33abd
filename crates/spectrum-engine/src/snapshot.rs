//! Applying snapshots to a running machine.
//!
//! The codecs live in `format-sna` and `format-z80`; this module parses an
//! image completely first and only then resets the machine and writes the
//! result into it. A format error therefore leaves the machine exactly as it
//! was.
//!
//! **SNA**: PC is not stored in the header. It sits on the stack at SP, so
//! after loading we pop it through the full memory map (ROM included) and
//! advance SP by two, as a `RETN` would.
//!
//! **Z80**: each decoded memory block is overlaid on RAM. Pages the file
//! does not carry keep whatever they held before the load.

use std::ffi::OsStr;
use std::path::Path;

use emu_core::{Cpu, RegisterPair};
use format_sna::SnaSnapshot;
use format_z80::{Z80Snapshot, Z80Version};
use log::{debug, info};

use crate::error::EngineError;
use crate::memory::RAM_START;
use crate::spectrum::Spectrum;

/// The two snapshot formats the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Sna,
    Z80,
}

impl SnapshotFormat {
    /// Pick the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, EngineError> {
        let ext = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("sna") => Ok(Self::Sna),
            Some("z80") => Ok(Self::Z80),
            _ => Err(EngineError::UnknownFormat(path.display().to_string())),
        }
    }
}

/// Load a snapshot of either format.
pub fn load_snapshot<C: Cpu>(
    spectrum: &mut Spectrum<C>,
    format: SnapshotFormat,
    data: &[u8],
) -> Result<(), EngineError> {
    match format {
        SnapshotFormat::Sna => load_sna(spectrum, data),
        SnapshotFormat::Z80 => load_z80(spectrum, data).map(|_| ()),
    }
}

/// Load a 49,179-byte SNA image.
pub fn load_sna<C: Cpu>(spectrum: &mut Spectrum<C>, data: &[u8]) -> Result<(), EngineError> {
    let snapshot = SnaSnapshot::parse(data)?;

    spectrum.reset();
    *spectrum.registers_mut() = snapshot.registers;
    spectrum.bus_mut().memory.load_ram(snapshot.ram());
    spectrum.bus_mut().set_border(snapshot.border);

    let sp = snapshot.registers.sp.word();
    let pc = RegisterPair::from_bytes(spectrum.peek(sp.wrapping_add(1)), spectrum.peek(sp));
    let regs = spectrum.registers_mut();
    regs.pc = pc;
    regs.sp = RegisterPair::new(sp.wrapping_add(2));

    info!(
        "SNA loaded: PC=${:04X} SP=${:04X} IM{} border {}",
        pc.word(),
        sp.wrapping_add(2),
        snapshot.registers.im,
        snapshot.border
    );
    Ok(())
}

/// Load a Z80 image (v1, v2 or v3). Returns the detected version.
pub fn load_z80<C: Cpu>(
    spectrum: &mut Spectrum<C>,
    data: &[u8],
) -> Result<Z80Version, EngineError> {
    let snapshot = Z80Snapshot::parse(data)?;

    spectrum.reset();
    *spectrum.registers_mut() = snapshot.registers;
    for block in &snapshot.blocks {
        debug!(
            "Z80 block: {} bytes at ${:04X}",
            block.data.len(),
            block.address
        );
        spectrum.bus_mut().memory.load_block(block.address, &block.data);
    }
    if let Some(border) = snapshot.border {
        spectrum.bus_mut().set_border(border);
    }

    info!(
        "Z80 {:?} loaded: PC=${:04X} SP=${:04X} IM{}, {} memory blocks",
        snapshot.version,
        snapshot.registers.pc.word(),
        snapshot.registers.sp.word(),
        snapshot.registers.im,
        snapshot.blocks.len()
    );
    Ok(snapshot.version)
}

/// Capture the machine as an SNA snapshot.
///
/// PC is pushed below SP in the saved RAM image (not in the live machine),
/// the inverse of [`load_sna`]. Stack bytes that would land in ROM are
/// dropped.
pub fn capture_sna<C: Cpu>(spectrum: &Spectrum<C>) -> Result<SnaSnapshot, EngineError> {
    let mut registers = *spectrum.registers();
    let mut ram = spectrum.bus().memory.ram().to_vec();

    let sp = registers.sp.word().wrapping_sub(2);
    let [low, high] = registers.pc.to_le();
    for (addr, byte) in [(sp, low), (sp.wrapping_add(1), high)] {
        if let Some(offset) = addr.checked_sub(RAM_START) {
            ram[usize::from(offset)] = byte;
        }
    }
    registers.sp = RegisterPair::new(sp);
    registers.pc = RegisterPair::default();

    Ok(SnaSnapshot::new(registers, spectrum.bus().border(), &ram)?)
}

/// Serialize the machine as a 49,179-byte SNA image.
pub fn save_sna<C: Cpu>(spectrum: &Spectrum<C>) -> Result<Vec<u8>, EngineError> {
    Ok(capture_sna(spectrum)?.to_bytes())
}

/// Serialize the machine as a version 3 Z80 image.
#[must_use]
pub fn save_z80<C: Cpu>(spectrum: &Spectrum<C>) -> Vec<u8> {
    let ram = spectrum.bus().memory.ram();
    let blocks = ram
        .chunks(format_z80::PAGE_SIZE)
        .zip([0x4000u16, 0x8000, 0xC000])
        .map(|(chunk, address)| format_z80::MemoryBlock {
            address,
            data: chunk.to_vec(),
        })
        .collect();

    Z80Snapshot {
        version: Z80Version::V3,
        registers: *spectrum.registers(),
        border: Some(spectrum.bus().border()),
        hardware_mode: 0,
        blocks,
    }
    .to_v3_bytes()
}
