//! Core traits and types shared by the Spectrum machine-state engine.
//!
//! The instruction interpreter itself is an external collaborator. This crate
//! only fixes the contract between it and the rest of the engine: the CPU
//! unit runs for a number of T-states against a [`Bus`], accepts interrupt
//! requests, and exposes a [`Registers`] block that snapshot and tape code may
//! overwrite directly.

mod bus;
mod cpu;
mod registers;
#[cfg(feature = "test-utils")]
pub mod testing;

pub use bus::Bus;
pub use cpu::Cpu;
pub use registers::{RegisterPair, Registers};
