//! .Z80 snapshot codec for the 48K Spectrum (v1, v2, v3 formats).
//!
//! **Version 1** (offset 6-7 PC != 0): 30-byte header + one memory block
//! covering `$4000-$FFFF`, RLE-compressed as a whole unless the status byte
//! at offset 12 is 255.
//!
//! **Version 2/3** (offset 6-7 PC = 0): 30-byte base header + 2-byte
//! extended header length + extended header + page blocks. An extended
//! header of 23 bytes is version 2; anything else is treated as version 3.
//! Each page block is `{len: u16, page: u8, data}` and expands to exactly
//! 16K. Pages 8, 4 and 5 map to `$4000`, `$8000` and `$C000`.
//!
//! Parsing never touches a machine. The result is a [`Z80Snapshot`] that the
//! caller overlays onto memory block by block.

pub mod rle;

use emu_core::{RegisterPair, Registers};
use format_sna::{RAM_SIZE, RAM_START, SnaError, SnaSnapshot};
use log::warn;
use thiserror::Error;

pub use rle::RleError;

/// Size of the base header shared by every version.
pub const BASE_HEADER_SIZE: usize = 30;

/// Size of one memory page.
pub const PAGE_SIZE: usize = 0x4000;

/// Extended header length that marks a version 2 file.
const V2_EXT_LEN: u16 = 23;

/// Extended header length this crate writes (version 3, no port 0x1FFD).
const V3_EXT_LEN: u16 = 54;

/// Page block length meaning "16K follows uncompressed".
const RAW_PAGE_LEN: u16 = 0xFFFF;

/// Status byte value meaning "uncompressed, flags = 1". Any other value
/// marks a compressed version 1 block.
const FLAGS_SENTINEL: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Z80Version {
    V1,
    V2,
    V3,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Z80Error {
    #[error("Z80 file too short: need at least {needed} bytes, got {got}")]
    TooShort { needed: usize, got: usize },
    #[error("Z80 extended header length {0} cannot hold PC and hardware mode")]
    ExtensionTooShort(u16),
    #[error("Z80 page block header truncated at offset {0}")]
    TruncatedPageHeader(usize),
    #[error("Z80 block for page {page} truncated: need {needed} bytes, {available} remain")]
    TruncatedPage {
        page: u8,
        needed: usize,
        available: usize,
    },
    #[error("Z80 page {page} expands to {len} bytes, expected {PAGE_SIZE}")]
    PageSize { page: u8, len: usize },
    #[error("stack pointer ${0:04X} leaves no room for PC in RAM")]
    StackOutsideRam(u16),
    #[error(transparent)]
    Rle(#[from] RleError),
    #[error(transparent)]
    Sna(#[from] SnaError),
}

/// A run of RAM restored from the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlock {
    /// First address the data belongs at.
    pub address: u16,
    pub data: Vec<u8>,
}

/// A parsed .Z80 snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Z80Snapshot {
    pub version: Z80Version,
    /// Full register block, PC included.
    pub registers: Registers,
    /// Border colour, absent when the status byte held the 255 sentinel.
    pub border: Option<u8>,
    /// Hardware mode byte from the extended header (0 for v1).
    pub hardware_mode: u8,
    /// Memory overlays in file order.
    pub blocks: Vec<MemoryBlock>,
}

/// RAM address a 48K page id maps to.
#[must_use]
pub fn page_address(page: u8) -> Option<u16> {
    match page {
        8 => Some(0x4000),
        4 => Some(0x8000),
        5 => Some(0xC000),
        _ => None,
    }
}

/// Whether a hardware mode byte names a plain 48K machine.
#[must_use]
pub fn is_48k_hardware(version: Z80Version, mode: u8) -> bool {
    match version {
        Z80Version::V1 => true,
        Z80Version::V2 => matches!(mode, 0 | 1),
        Z80Version::V3 => matches!(mode, 0 | 1 | 3),
    }
}

fn u16_at(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

impl Z80Snapshot {
    /// Parse a .Z80 image, detecting the version automatically.
    pub fn parse(data: &[u8]) -> Result<Self, Z80Error> {
        if data.len() < BASE_HEADER_SIZE {
            return Err(Z80Error::TooShort {
                needed: BASE_HEADER_SIZE,
                got: data.len(),
            });
        }

        let (registers, flags1) = decode_base_header(data);
        let border = (data[12] != FLAGS_SENTINEL).then_some((flags1 >> 1) & 0x07);

        if registers.pc.word() != 0 {
            return Ok(Self {
                version: Z80Version::V1,
                registers,
                border,
                hardware_mode: 0,
                blocks: vec![decode_v1_memory(data)?],
            });
        }

        Self::parse_paged(data, registers, border)
    }

    fn parse_paged(
        data: &[u8],
        mut registers: Registers,
        border: Option<u8>,
    ) -> Result<Self, Z80Error> {
        let ext_start = BASE_HEADER_SIZE + 2;
        if data.len() < ext_start {
            return Err(Z80Error::TooShort {
                needed: ext_start,
                got: data.len(),
            });
        }

        let ext_len = u16_at(data, BASE_HEADER_SIZE);
        if ext_len < 3 {
            return Err(Z80Error::ExtensionTooShort(ext_len));
        }
        let ext_end = ext_start + usize::from(ext_len);
        if data.len() < ext_end {
            return Err(Z80Error::TooShort {
                needed: ext_end,
                got: data.len(),
            });
        }

        let version = if ext_len == V2_EXT_LEN {
            Z80Version::V2
        } else {
            Z80Version::V3
        };

        registers.pc = RegisterPair::new(u16_at(data, ext_start));
        let hardware_mode = data[ext_start + 2];
        if !is_48k_hardware(version, hardware_mode) {
            warn!("Z80 {version:?} hardware mode {hardware_mode} is not a plain 48K; loading RAM pages anyway");
        }

        let mut blocks = Vec::new();
        let mut pos = ext_end;
        while pos < data.len() {
            if pos + 3 > data.len() {
                return Err(Z80Error::TruncatedPageHeader(pos));
            }
            let block_len = u16_at(data, pos);
            let page = data[pos + 2];
            pos += 3;

            let stored = if block_len == RAW_PAGE_LEN {
                PAGE_SIZE
            } else {
                usize::from(block_len)
            };
            let available = data.len() - pos;
            if stored > available {
                return Err(Z80Error::TruncatedPage {
                    page,
                    needed: stored,
                    available,
                });
            }
            let body = &data[pos..pos + stored];
            pos += stored;

            let Some(address) = page_address(page) else {
                warn!("Z80 page {page} has no 48K mapping; skipped");
                continue;
            };

            let page_data = if block_len == RAW_PAGE_LEN {
                body.to_vec()
            } else {
                rle::decompress(body)?
            };
            if page_data.len() != PAGE_SIZE {
                return Err(Z80Error::PageSize {
                    page,
                    len: page_data.len(),
                });
            }

            blocks.push(MemoryBlock {
                address,
                data: page_data,
            });
        }

        Ok(Self {
            version,
            registers,
            border,
            hardware_mode,
            blocks,
        })
    }

    /// Build a snapshot from an SNA image, popping its stacked PC.
    pub fn from_sna(sna: &SnaSnapshot) -> Result<Self, Z80Error> {
        let sp = sna.registers.sp.word();
        let pc = sna.stacked_pc().ok_or(Z80Error::StackOutsideRam(sp))?;

        let mut registers = sna.registers;
        registers.pc = RegisterPair::new(pc);
        registers.sp = RegisterPair::new(sp.wrapping_add(2));

        let blocks = sna
            .ram()
            .chunks(PAGE_SIZE)
            .zip([0x4000u16, 0x8000, 0xC000])
            .map(|(chunk, address)| MemoryBlock {
                address,
                data: chunk.to_vec(),
            })
            .collect();

        Ok(Self {
            version: Z80Version::V3,
            registers,
            border: Some(sna.border),
            hardware_mode: 0,
            blocks,
        })
    }

    /// Convert to an SNA image, pushing PC below SP.
    ///
    /// RAM not covered by any block is zero.
    pub fn to_sna(&self) -> Result<SnaSnapshot, Z80Error> {
        let sp = self.registers.sp.word();
        let new_sp = sp.wrapping_sub(2);
        if new_sp < RAM_START || new_sp == 0xFFFF {
            return Err(Z80Error::StackOutsideRam(sp));
        }

        let mut ram = self.ram_image();
        let offset = usize::from(new_sp - RAM_START);
        ram[offset..offset + 2].copy_from_slice(&self.registers.pc.to_le());

        let mut registers = self.registers;
        registers.sp = RegisterPair::new(new_sp);
        registers.pc = RegisterPair::default();

        Ok(SnaSnapshot::new(
            registers,
            self.border.unwrap_or(0),
            &ram,
        )?)
    }

    /// The 48K RAM image these blocks describe.
    #[must_use]
    pub fn ram_image(&self) -> Vec<u8> {
        let mut ram = vec![0u8; RAM_SIZE];
        for block in &self.blocks {
            let Some(start) = usize::from(block.address).checked_sub(usize::from(RAM_START))
            else {
                continue;
            };
            let len = block.data.len().min(RAM_SIZE.saturating_sub(start));
            ram[start..start + len].copy_from_slice(&block.data[..len]);
        }
        ram
    }

    /// Serialize as a version 3, 48K snapshot with compressed pages.
    #[must_use]
    pub fn to_v3_bytes(&self) -> Vec<u8> {
        let regs = &self.registers;
        let border = self.border.unwrap_or(0) & 0x07;

        let mut out = Vec::with_capacity(BASE_HEADER_SIZE + 2 + usize::from(V3_EXT_LEN));
        out.extend_from_slice(&[regs.a(), regs.f()]);
        out.extend_from_slice(&regs.bc.to_le());
        out.extend_from_slice(&regs.hl.to_le());
        out.extend_from_slice(&[0, 0]); // PC lives in the extended header
        out.extend_from_slice(&regs.sp.to_le());
        out.push(regs.i);
        out.push(regs.r & 0x7F);
        out.push(((regs.r >> 7) & 0x01) | (border << 1));
        out.extend_from_slice(&regs.de.to_le());
        out.extend_from_slice(&regs.bc_alt.to_le());
        out.extend_from_slice(&regs.de_alt.to_le());
        out.extend_from_slice(&regs.hl_alt.to_le());
        out.extend_from_slice(&[regs.af_alt.high(), regs.af_alt.low()]);
        out.extend_from_slice(&regs.iy.to_le());
        out.extend_from_slice(&regs.ix.to_le());
        out.push(u8::from(regs.iff1));
        out.push(u8::from(regs.iff2));
        out.push(regs.im & 0x03);

        out.extend_from_slice(&V3_EXT_LEN.to_le_bytes());
        let mut ext = [0u8; V3_EXT_LEN as usize];
        ext[..2].copy_from_slice(&regs.pc.to_le());
        out.extend_from_slice(&ext);

        let ram = self.ram_image();
        for page in [8u8, 4, 5] {
            let Some(address) = page_address(page) else {
                continue;
            };
            let start = usize::from(address - RAM_START);
            let raw = &ram[start..start + PAGE_SIZE];
            let packed = rle::compress(raw);
            if packed.len() >= PAGE_SIZE {
                out.extend_from_slice(&RAW_PAGE_LEN.to_le_bytes());
                out.push(page);
                out.extend_from_slice(raw);
            } else {
                out.extend_from_slice(&(packed.len() as u16).to_le_bytes());
                out.push(page);
                out.extend_from_slice(&packed);
            }
        }

        out
    }
}

/// Decode the 30-byte base header. Returns the registers (PC from offset 6,
/// zero for v2/v3) and the effective status byte.
fn decode_base_header(data: &[u8]) -> (Registers, u8) {
    let pair = |offset: usize| RegisterPair::new(u16_at(data, offset));
    let flags1 = if data[12] == FLAGS_SENTINEL { 1 } else { data[12] };

    let registers = Registers {
        af: RegisterPair::from_bytes(data[0], data[1]),
        bc: pair(2),
        hl: pair(4),
        pc: pair(6),
        sp: pair(8),
        i: data[10],
        // Bit 7 of R is stored separately in the status byte.
        r: (data[11] & 0x7F) | ((flags1 & 0x01) << 7),
        de: pair(13),
        bc_alt: pair(15),
        de_alt: pair(17),
        hl_alt: pair(19),
        af_alt: RegisterPair::from_bytes(data[21], data[22]),
        iy: pair(23),
        ix: pair(25),
        iff1: data[27] != 0,
        iff2: data[28] != 0,
        im: data[29] & 0x03,
    };

    (registers, flags1)
}

fn decode_v1_memory(data: &[u8]) -> Result<MemoryBlock, Z80Error> {
    let body = &data[BASE_HEADER_SIZE..];
    let mut ram = if data[12] != FLAGS_SENTINEL {
        rle::decompress(body)?
    } else {
        body.to_vec()
    };

    if ram.len() != RAM_SIZE {
        warn!(
            "Z80 v1 memory block is {} bytes, expected {RAM_SIZE}",
            ram.len()
        );
        ram.truncate(RAM_SIZE);
    }

    Ok(MemoryBlock {
        address: RAM_START,
        data: ram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a minimal v1 snapshot with a raw RAM image (status byte 255).
    fn make_v1_uncompressed(pc: u16) -> Vec<u8> {
        let mut data = vec![0u8; BASE_HEADER_SIZE + RAM_SIZE];

        data[0] = 0xAA; // A
        data[1] = 0xFF; // F
        data[2] = 0x34; // C
        data[3] = 0x12; // B
        data[4] = 0x78; // L
        data[5] = 0x56; // H
        data[6] = pc as u8;
        data[7] = (pc >> 8) as u8;
        data[8] = 0x00;
        data[9] = 0x80; // SP = $8000
        data[10] = 0x3F; // I
        data[11] = 0xC2; // R, bit 7 must be ignored
        data[12] = FLAGS_SENTINEL;
        data[21] = 0x11; // A'
        data[22] = 0x22; // F'
        data[27] = 1;
        data[28] = 1;
        data[29] = 0x41; // IM 1 plus unrelated flag bits

        data[BASE_HEADER_SIZE] = 0x55;
        data[BASE_HEADER_SIZE + 0x4000] = 0x88;
        data[BASE_HEADER_SIZE + 0x8000] = 0xCC;

        data
    }

    /// The same snapshot with a real status byte and a compressed body.
    fn make_v1(pc: u16) -> Vec<u8> {
        let raw = make_v1_uncompressed(pc);
        let mut data = raw[..BASE_HEADER_SIZE].to_vec();
        data[12] = 0x05; // border 2, R bit 7 set
        data.extend_from_slice(&rle::compress(&raw[BASE_HEADER_SIZE..]));
        data
    }

    fn make_paged(ext_len: u16, hardware_mode: u8, pc: u16) -> Vec<u8> {
        let mut data = vec![0u8; BASE_HEADER_SIZE];
        data[0] = 0xBB;
        data[8] = 0x00;
        data[9] = 0x80;
        data[12] = 0x04; // border 2
        data[29] = 1;
        data.extend_from_slice(&ext_len.to_le_bytes());
        let mut ext = vec![0u8; usize::from(ext_len)];
        ext[0] = pc as u8;
        ext[1] = (pc >> 8) as u8;
        if let Some(mode) = ext.get_mut(2) {
            *mode = hardware_mode;
        }
        data.extend_from_slice(&ext);
        data
    }

    fn push_page(data: &mut Vec<u8>, page: u8, content: &[u8]) {
        let packed = rle::compress(content);
        data.extend_from_slice(&(packed.len() as u16).to_le_bytes());
        data.push(page);
        data.extend_from_slice(&packed);
    }

    fn page_with_marker(marker: u8) -> Vec<u8> {
        let mut page = vec![0u8; PAGE_SIZE];
        page[0] = marker;
        page[PAGE_SIZE - 1] = marker;
        page
    }

    #[test]
    fn v1_decodes_registers() {
        let snap = Z80Snapshot::parse(&make_v1(0xABCD)).expect("parse should succeed");
        let regs = &snap.registers;

        assert_eq!(snap.version, Z80Version::V1);
        assert_eq!(regs.a(), 0xAA);
        assert_eq!(regs.f(), 0xFF);
        assert_eq!(regs.bc.word(), 0x1234);
        assert_eq!(regs.hl.word(), 0x5678);
        assert_eq!(regs.pc.word(), 0xABCD);
        assert_eq!(regs.sp.word(), 0x8000);
        assert_eq!(regs.i, 0x3F);
        assert_eq!(regs.r, 0xC2);
        assert_eq!(regs.af_alt.high(), 0x11);
        assert_eq!(regs.af_alt.low(), 0x22);
        assert_eq!(regs.im, 1);
        assert!(regs.iff1 && regs.iff2);
        assert_eq!(snap.border, Some(2));
    }

    #[test]
    fn v1_covers_all_ram() {
        for data in [make_v1(0x0100), make_v1_uncompressed(0x0100)] {
            let snap = Z80Snapshot::parse(&data).expect("parse should succeed");
            assert_eq!(snap.blocks.len(), 1);
            let block = &snap.blocks[0];
            assert_eq!(block.address, 0x4000);
            assert_eq!(block.data.len(), RAM_SIZE);
            assert_eq!(block.data[0], 0x55);
            assert_eq!(block.data[0x4000], 0x88);
            assert_eq!(block.data[0x8000], 0xCC);
        }
    }

    #[test]
    fn v1_is_compressed_whatever_bit_5_says() {
        let mut data = vec![0u8; BASE_HEADER_SIZE];
        data[7] = 0x01; // PC = $0100
        data[12] = 0x00;
        data.extend_from_slice(&[0xED, 0xED, 0x05, 0x7A, 0xED, 0xED, 0x00, 0x00]);

        let snap = Z80Snapshot::parse(&data).expect("parse should succeed");
        assert_eq!(&snap.blocks[0].data, &[0x7A; 5]);
    }

    #[test]
    fn v1_compressed_stops_at_end_marker() {
        let mut data = vec![0u8; BASE_HEADER_SIZE];
        data[7] = 0x01; // PC = $0100
        data[12] = 0x26; // compressed, border 3
        let mut ram = vec![0u8; RAM_SIZE];
        ram[..10].fill(0xAA);
        ram[10] = 0x55;
        data.extend_from_slice(&rle::compress(&ram));
        data.extend_from_slice(&[0xED, 0xED, 0x00, 0x00]);
        data.extend_from_slice(&[0x99; 8]); // trailing junk after the marker

        let snap = Z80Snapshot::parse(&data).expect("parse should succeed");
        assert_eq!(snap.blocks[0].data, ram);
        assert_eq!(snap.border, Some(3));
    }

    #[test]
    fn sentinel_status_byte_means_uncompressed() {
        let mut data = make_v1_uncompressed(0x0100);
        data[11] = 0x01;
        data[12] = 0xFF;
        // A run header in the RAM image must stay literal.
        data[BASE_HEADER_SIZE..BASE_HEADER_SIZE + 4].copy_from_slice(&[0xED, 0xED, 0x05, 0x7A]);

        let snap = Z80Snapshot::parse(&data).expect("parse should succeed");
        assert_eq!(snap.border, None);
        assert_eq!(snap.registers.r, 0x81);
        assert_eq!(&snap.blocks[0].data[..4], &[0xED, 0xED, 0x05, 0x7A]);
    }

    #[test]
    fn extension_length_selects_version() {
        let v2 = Z80Snapshot::parse(&make_paged(23, 0, 0x1234)).expect("parse should succeed");
        assert_eq!(v2.version, Z80Version::V2);
        assert_eq!(v2.registers.pc.word(), 0x1234);

        let v3 = Z80Snapshot::parse(&make_paged(42, 0, 0x1234)).expect("parse should succeed");
        assert_eq!(v3.version, Z80Version::V3);

        let v3 = Z80Snapshot::parse(&make_paged(54, 3, 0x1234)).expect("parse should succeed");
        assert_eq!(v3.version, Z80Version::V3);
        assert!(is_48k_hardware(v3.version, v3.hardware_mode));
    }

    #[test]
    fn pages_map_to_their_windows() {
        let mut data = make_paged(23, 0, 0x8000);
        push_page(&mut data, 8, &page_with_marker(0x58));
        push_page(&mut data, 4, &page_with_marker(0x48));
        push_page(&mut data, 5, &page_with_marker(0x5C));

        let snap = Z80Snapshot::parse(&data).expect("parse should succeed");
        let addresses: Vec<u16> = snap.blocks.iter().map(|b| b.address).collect();
        assert_eq!(addresses, vec![0x4000, 0x8000, 0xC000]);

        let ram = snap.ram_image();
        assert_eq!(ram[0], 0x58);
        assert_eq!(ram[0x4000], 0x48);
        assert_eq!(ram[0xBFFF], 0x5C);
    }

    #[test]
    fn unknown_page_and_hardware_mode_are_tolerated() {
        let mut data = make_paged(54, 9, 0x8000);
        push_page(&mut data, 0, &page_with_marker(0x01));
        push_page(&mut data, 5, &page_with_marker(0x5C));

        let snap = Z80Snapshot::parse(&data).expect("parse should succeed");
        assert_eq!(snap.hardware_mode, 9);
        assert!(!is_48k_hardware(snap.version, snap.hardware_mode));
        assert_eq!(snap.blocks.len(), 1);
        assert_eq!(snap.blocks[0].address, 0xC000);
    }

    #[test]
    fn raw_page_marker_reads_16k_verbatim() {
        let mut data = make_paged(54, 0, 0x8000);
        data.extend_from_slice(&RAW_PAGE_LEN.to_le_bytes());
        data.push(8);
        let mut raw = vec![0u8; PAGE_SIZE];
        raw[..4].copy_from_slice(&[0xED, 0xED, 0x03, 0x01]);
        data.extend_from_slice(&raw);

        let snap = Z80Snapshot::parse(&data).expect("parse should succeed");
        assert_eq!(snap.blocks[0].data, raw);
    }

    #[test]
    fn short_page_is_rejected() {
        let mut data = make_paged(23, 0, 0x8000);
        push_page(&mut data, 8, &[0u8; 100]);
        assert_eq!(
            Z80Snapshot::parse(&data),
            Err(Z80Error::PageSize { page: 8, len: 100 })
        );
    }

    #[test]
    fn truncated_page_is_rejected() {
        let mut data = make_paged(23, 0, 0x8000);
        data.extend_from_slice(&[0x10, 0x00, 8, 0x01, 0x02]);
        assert!(matches!(
            Z80Snapshot::parse(&data),
            Err(Z80Error::TruncatedPage { page: 8, needed: 16, .. })
        ));

        let mut data = make_paged(23, 0, 0x8000);
        data.extend_from_slice(&[0x10, 0x00]);
        assert!(matches!(
            Z80Snapshot::parse(&data),
            Err(Z80Error::TruncatedPageHeader(_))
        ));
    }

    #[test]
    fn truncated_headers_are_rejected() {
        assert_eq!(
            Z80Snapshot::parse(&[0u8; 10]),
            Err(Z80Error::TooShort { needed: 30, got: 10 })
        );
        // PC = 0 but no extended header length.
        assert!(matches!(
            Z80Snapshot::parse(&[0u8; 31]),
            Err(Z80Error::TooShort { needed: 32, .. })
        ));
        let mut data = make_paged(23, 0, 0);
        data.truncate(40);
        assert!(matches!(
            Z80Snapshot::parse(&data),
            Err(Z80Error::TooShort { .. })
        ));
        assert_eq!(
            Z80Snapshot::parse(&make_paged(2, 0, 0)),
            Err(Z80Error::ExtensionTooShort(2))
        );
    }

    #[test]
    fn truncated_run_in_page_is_an_rle_error() {
        let mut data = make_paged(23, 0, 0x8000);
        data.extend_from_slice(&[0x03, 0x00, 8, 0xED, 0xED, 0x05]);
        assert!(matches!(
            Z80Snapshot::parse(&data),
            Err(Z80Error::Rle(RleError::TruncatedRun(0)))
        ));
    }

    #[test]
    fn v3_writer_output_parses_back() {
        let mut raw = make_v1_uncompressed(0x6000);
        raw[BASE_HEADER_SIZE + 0x1234] = 0xED;
        raw[BASE_HEADER_SIZE + 0x1235] = 0xED;
        let mut data = raw[..BASE_HEADER_SIZE].to_vec();
        data[12] = 0x05;
        data.extend_from_slice(&rle::compress(&raw[BASE_HEADER_SIZE..]));
        let original = Z80Snapshot::parse(&data).expect("parse should succeed");

        let written = original.to_v3_bytes();
        let reparsed = Z80Snapshot::parse(&written).expect("reparse should succeed");

        assert_eq!(reparsed.version, Z80Version::V3);
        assert_eq!(reparsed.registers, original.registers);
        assert_eq!(reparsed.border, original.border);
        assert_eq!(reparsed.ram_image(), original.ram_image());
    }

    #[test]
    fn sna_conversion_moves_pc_between_stack_and_header() {
        let mut ram = vec![0u8; RAM_SIZE];
        ram[0x4000] = 0x34; // $8000
        ram[0x4001] = 0x12;
        let regs = Registers {
            sp: RegisterPair::new(0x8000),
            ..Registers::default()
        };
        let sna = SnaSnapshot::new(regs, 4, &ram).expect("new should succeed");

        let snap = Z80Snapshot::from_sna(&sna).expect("from_sna should succeed");
        assert_eq!(snap.registers.pc.word(), 0x1234);
        assert_eq!(snap.registers.sp.word(), 0x8002);
        assert_eq!(snap.border, Some(4));

        let back = snap.to_sna().expect("to_sna should succeed");
        assert_eq!(back, sna);
    }

    #[test]
    fn sna_conversion_needs_stack_in_ram() {
        let regs = Registers {
            sp: RegisterPair::new(0x0100),
            ..Registers::default()
        };
        let sna = SnaSnapshot::new(regs, 0, &vec![0u8; RAM_SIZE]).expect("new should succeed");
        assert_eq!(
            Z80Snapshot::from_sna(&sna),
            Err(Z80Error::StackOutsideRam(0x0100))
        );
    }
}
