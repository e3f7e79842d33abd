//! Z80 register block.
//!
//! Register pairs are stored as 16-bit words and accessed through explicit
//! high/low accessors, so snapshot code can restore either byte-by-byte or
//! word-at-a-time without relying on any in-memory layout.

/// One 16-bit register pair (AF, BC, SP, IX, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RegisterPair(u16);

impl RegisterPair {
    #[must_use]
    pub const fn new(word: u16) -> Self {
        Self(word)
    }

    /// Build a pair from its high and low bytes.
    #[must_use]
    pub const fn from_bytes(high: u8, low: u8) -> Self {
        Self(((high as u16) << 8) | low as u16)
    }

    /// Build a pair from two bytes stored little-endian (low byte first).
    #[must_use]
    pub const fn from_le(bytes: [u8; 2]) -> Self {
        Self::from_bytes(bytes[1], bytes[0])
    }

    #[must_use]
    pub const fn word(self) -> u16 {
        self.0
    }

    #[must_use]
    pub const fn high(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[must_use]
    pub const fn low(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// The pair as two bytes, low byte first.
    #[must_use]
    pub const fn to_le(self) -> [u8; 2] {
        [self.low(), self.high()]
    }

    pub fn set_word(&mut self, word: u16) {
        self.0 = word;
    }

    pub fn set_high(&mut self, value: u8) {
        self.0 = (self.0 & 0x00FF) | (u16::from(value) << 8);
    }

    pub fn set_low(&mut self, value: u8) {
        self.0 = (self.0 & 0xFF00) | u16::from(value);
    }
}

impl From<u16> for RegisterPair {
    fn from(word: u16) -> Self {
        Self(word)
    }
}

/// The complete Z80 register block owned by the CPU unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    // Main set
    pub af: RegisterPair,
    pub bc: RegisterPair,
    pub de: RegisterPair,
    pub hl: RegisterPair,

    // Alternate set
    pub af_alt: RegisterPair,
    pub bc_alt: RegisterPair,
    pub de_alt: RegisterPair,
    pub hl_alt: RegisterPair,

    // Index and control
    pub ix: RegisterPair,
    pub iy: RegisterPair,
    pub sp: RegisterPair,
    pub pc: RegisterPair,

    /// Interrupt vector base.
    pub i: u8,
    /// Memory refresh counter. Only the low 7 bits count; bit 7 is whatever
    /// was last loaded into it.
    pub r: u8,

    // Interrupt state
    pub iff1: bool,
    pub iff2: bool,
    /// Interrupt mode, 0-2.
    pub im: u8,
}

impl Registers {
    /// Accumulator (high byte of AF).
    #[must_use]
    pub const fn a(&self) -> u8 {
        self.af.high()
    }

    /// Flags (low byte of AF).
    #[must_use]
    pub const fn f(&self) -> u8 {
        self.af.low()
    }
}
