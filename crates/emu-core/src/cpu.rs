//! CPU unit trait.

use crate::{Bus, Registers};

/// An opaque CPU execution unit.
///
/// The engine never decodes instructions. It asks the unit to run for a
/// number of T-states and reads back how many were actually executed, which
/// may overshoot the request by up to one instruction.
///
/// The bus is passed in, not owned, so the machine can keep ownership of
/// memory and ports between calls.
pub trait Cpu {
    /// Reset the unit to its power-on state.
    fn reset(&mut self);

    /// Execute at least `cycles` T-states and return the count executed.
    ///
    /// Must return a non-zero value for any non-zero request. A zero return
    /// is a contract violation the caller treats as fatal.
    fn run<B: Bus>(&mut self, cycles: u32, bus: &mut B) -> u32;

    /// Request a maskable interrupt with the given vector address.
    fn interrupt(&mut self, vector: u16);

    /// Register block, for inspection.
    fn registers(&self) -> &Registers;

    /// Register block, for direct restoration by snapshot and tape code.
    fn registers_mut(&mut self) -> &mut Registers;
}
