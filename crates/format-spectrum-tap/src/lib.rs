//! TAP file format parser.
//!
//! TAP is the simplest Spectrum tape format: sequential blocks of data,
//! each preceded by a 2-byte little-endian length word. There is no
//! terminator; the image ends where the bytes end. The first byte of each
//! block is the flag (`$00` header, `$FF` data) and, for well-formed blocks,
//! the last byte is an XOR checksum over everything before it.
//!
//! A typical program consists of two blocks:
//!   1. Header block (flag $00, 17 bytes of metadata, checksum)
//!   2. Data block (flag $FF, the actual program/data, checksum)
//!
//! The tape signal plays every stored byte, flag and checksum included, so
//! [`TapBlock`] keeps the block exactly as stored.

use thiserror::Error;

/// Flag byte of a header block.
pub const FLAG_HEADER: u8 = 0x00;

/// Flag byte of a data block.
pub const FLAG_DATA: u8 = 0xFF;

/// Stored length of a standard header block: flag + 17 bytes + checksum.
pub const HEADER_BLOCK_LEN: usize = 19;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TapError {
    #[error("truncated TAP file: expected 2-byte length at offset {offset}")]
    TruncatedLength { offset: usize },
    #[error("TAP block at offset {offset} has length 0")]
    EmptyBlock { offset: usize },
    #[error("truncated TAP block at offset {offset}: need {declared} bytes, only {remaining} remain")]
    BlockOverrun {
        offset: usize,
        declared: usize,
        remaining: usize,
    },
}

/// A single block from a TAP file, stored bytes verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapBlock {
    bytes: Vec<u8>,
}

impl TapBlock {
    /// Wrap stored block bytes. Returns `None` for an empty slice.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Option<Self> {
        (!bytes.is_empty()).then_some(Self { bytes })
    }

    /// Every stored byte, flag first.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn flag(&self) -> u8 {
        self.bytes[0]
    }

    /// Header blocks get the long pilot tone.
    #[must_use]
    pub fn is_header(&self) -> bool {
        self.flag() == FLAG_HEADER
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; a block holds at least its flag byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the XOR of all stored bytes is zero.
    ///
    /// A bad checksum is the ROM loader's business, not the tape's. This is
    /// only used for diagnostics.
    #[must_use]
    pub fn checksum_valid(&self) -> bool {
        self.bytes.len() >= 2 && self.bytes.iter().fold(0, |acc, &b| acc ^ b) == 0
    }

    /// Decode the standard 17-byte header, if this is one.
    #[must_use]
    pub fn header(&self) -> Option<TapHeader> {
        TapHeader::decode(self)
    }
}

/// A parsed TAP file containing sequential blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TapFile {
    /// The blocks in the TAP file, in order.
    pub blocks: Vec<TapBlock>,
}

impl TapFile {
    /// Parse a TAP file from raw bytes.
    ///
    /// An empty image is valid and holds no blocks.
    pub fn parse(data: &[u8]) -> Result<Self, TapError> {
        let mut blocks = Vec::new();
        let mut offset = 0;

        while offset < data.len() {
            if offset + 2 > data.len() {
                return Err(TapError::TruncatedLength { offset });
            }

            let declared = usize::from(u16::from_le_bytes([data[offset], data[offset + 1]]));
            let start = offset + 2;

            if declared == 0 {
                return Err(TapError::EmptyBlock { offset });
            }
            let remaining = data.len() - start;
            if declared > remaining {
                return Err(TapError::BlockOverrun {
                    offset,
                    declared,
                    remaining,
                });
            }

            blocks.push(TapBlock {
                bytes: data[start..start + declared].to_vec(),
            });
            offset = start + declared;
        }

        Ok(Self { blocks })
    }

    /// Serialize back into TAP framing.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for block in &self.blocks {
            out.extend_from_slice(&(block.len() as u16).to_le_bytes());
            out.extend_from_slice(block.bytes());
        }
        out
    }
}

/// What a header block describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderType {
    Program,
    NumberArray,
    CharacterArray,
    Code,
    Unknown(u8),
}

impl From<u8> for HeaderType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Program,
            1 => Self::NumberArray,
            2 => Self::CharacterArray,
            3 => Self::Code,
            other => Self::Unknown(other),
        }
    }
}

/// The 17 bytes of metadata in a standard header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapHeader {
    pub kind: HeaderType,
    /// File name, trailing spaces trimmed. Non-ASCII bytes become `?`.
    pub name: String,
    /// Length of the data block's payload.
    pub data_length: u16,
    /// Autostart line for programs, load address for code.
    pub param1: u16,
    /// Program length without variables, for programs.
    pub param2: u16,
}

impl TapHeader {
    /// Decode a header block (flag `$00`, 19 stored bytes).
    #[must_use]
    pub fn decode(block: &TapBlock) -> Option<Self> {
        let b = block.bytes();
        if b.len() != HEADER_BLOCK_LEN || b[0] != FLAG_HEADER {
            return None;
        }

        let name = b[2..12]
            .iter()
            .map(|&c| if (0x20..0x7F).contains(&c) { c as char } else { '?' })
            .collect::<String>()
            .trim_end()
            .to_string();
        let word = |offset: usize| u16::from_le_bytes([b[offset], b[offset + 1]]);

        Some(Self {
            kind: HeaderType::from(b[1]),
            name,
            data_length: word(12),
            param1: word(14),
            param2: word(16),
        })
    }
}
