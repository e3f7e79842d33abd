//! Engine error type.

use std::io;

use format_sna::SnaError;
use format_spectrum_tap::TapError;
use format_z80::Z80Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("48K ROM must be exactly {expected} bytes, got {got}")]
    RomSize { expected: usize, got: usize },

    /// The CPU unit ran zero cycles for a non-zero request.
    #[error("CPU unit executed 0 of {requested} requested cycles at PC=${pc:04X}")]
    CpuStalled { requested: u32, pc: u16 },

    #[error("no ROM image configured")]
    NoRom,

    #[error("out of memory buffering {bytes} bytes")]
    OutOfMemory { bytes: usize },

    #[error("SNA snapshot: {0}")]
    Sna(#[from] SnaError),

    #[error("Z80 snapshot: {0}")]
    Z80(#[from] Z80Error),

    #[error("tape image: {0}")]
    Tap(#[from] TapError),

    #[error("unrecognised snapshot format: {0}")]
    UnknownFormat(String),

    #[error("config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("WAV output: {0}")]
    Wav(#[from] hound::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl EngineError {
    /// Whether this is a format error in loaded data, as opposed to a
    /// resource problem or a broken CPU unit.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::Sna(_) | Self::Z80(_) | Self::Tap(_) | Self::UnknownFormat(_)
        )
    }
}
