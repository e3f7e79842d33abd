//! The 48K machine state: a CPU unit wired to the Spectrum bus.
//!
//! The CPU unit is generic. Anything implementing [`emu_core::Cpu`] can be
//! plugged in; the engine only needs it to run a number of T-states, accept
//! interrupts, and expose its register block.

use emu_core::{Cpu, Registers};
use log::error;

use crate::bus::SpectrumBus;
use crate::error::EngineError;
use crate::input::SpectrumKey;
use crate::memory::Memory48K;

pub struct Spectrum<C: Cpu> {
    cpu: C,
    bus: SpectrumBus,
}

impl<C: Cpu> Spectrum<C> {
    /// Wire a CPU unit to a fresh 48K bus. `rom` must be exactly 16K.
    pub fn new(cpu: C, rom: &[u8]) -> Result<Self, EngineError> {
        let memory = Memory48K::new(rom)?;
        Ok(Self {
            cpu,
            bus: SpectrumBus::new(memory),
        })
    }

    /// Reset the CPU unit and every latch. RAM keeps its contents.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.bus.reset();
    }

    /// Run the CPU unit for (at least) `cycles` T-states.
    ///
    /// Returns the T-states actually executed, which may overshoot the
    /// request by part of an instruction. A unit that executes nothing for
    /// a non-zero request is broken; that is reported as
    /// [`EngineError::CpuStalled`].
    pub fn run_cycles(&mut self, cycles: u32) -> Result<u32, EngineError> {
        self.bus.begin_step();
        let used = self.cpu.run(cycles, &mut self.bus);
        if used == 0 && cycles > 0 {
            let pc = self.cpu.registers().pc.word();
            error!("CPU unit executed 0 of {cycles} cycles at PC=${pc:04X}");
            return Err(EngineError::CpuStalled {
                requested: cycles,
                pc,
            });
        }
        Ok(used)
    }

    /// Whether the beeper was high at any point during the last `run_cycles`.
    #[must_use]
    pub fn beeper_was_active(&self) -> bool {
        self.bus.beeper_active_in_step()
    }

    pub fn interrupt(&mut self, vector: u16) {
        self.cpu.interrupt(vector);
    }

    #[must_use]
    pub fn registers(&self) -> &Registers {
        self.cpu.registers()
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        self.cpu.registers_mut()
    }

    /// Reference to the CPU unit.
    #[must_use]
    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    /// Reference to the bus.
    #[must_use]
    pub fn bus(&self) -> &SpectrumBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut SpectrumBus {
        &mut self.bus
    }

    /// Read memory as the CPU would see it (ROM included).
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        self.bus.memory.read(addr)
    }

    /// Press a key immediately (stays pressed until released).
    pub fn press_key(&mut self, key: SpectrumKey) {
        let (row, bit) = key.matrix();
        self.bus.keyboard.set_key(row, bit, true);
    }

    pub fn release_key(&mut self, key: SpectrumKey) {
        let (row, bit) = key.matrix();
        self.bus.keyboard.set_key(row, bit, false);
    }

    pub fn release_all_keys(&mut self) {
        self.bus.keyboard.release_all();
    }
}
