//! ZX Spectrum 48K machine-state engine.
//!
//! Everything around the CPU that makes a 48K Spectrum load and sound
//! right: the memory and port model, a scanline-stepped frame scheduler,
//! SNA and Z80 snapshot loading, a TAP tape engine that feeds the ROM loader
//! a real pulse signal, and the beeper audio pipeline. The CPU itself is
//! any [`emu_core::Cpu`] implementation.

pub mod audio;
mod bus;
pub mod capture;
mod config;
mod context;
mod error;
pub mod input;
mod keyboard;
mod memory;
pub mod scheduler;
pub mod snapshot;
mod spectrum;
pub mod tape;

pub use bus::{DEFAULT_FLOATING_BUS, SpectrumBus};
pub use config::EngineConfig;
pub use context::EngineContext;
pub use error::EngineError;
pub use input::{InputQueue, SpectrumKey};
pub use keyboard::KeyboardState;
pub use memory::{Memory48K, RAM_SIZE, RAM_START, ROM_SIZE, RomSignature};
pub use scheduler::{FrameAccumulator, FrameReport, FrameScheduler};
pub use snapshot::SnapshotFormat;
pub use spectrum::Spectrum;
pub use tape::{TapeLoadReport, TapeLoader};
