//! Deterministic CPU stand-in for tests.
//!
//! `ScriptedCpu` executes in fixed-size "instructions" of `quantum` T-states
//! and calls an optional hook before each one. Hooks can poke ports and
//! memory, so a test can play the part of the ROM (toggle the beeper, poll
//! the EAR bit) without a real interpreter.

use crate::{Bus, Cpu, Registers};

/// Hook invoked before every simulated instruction.
///
/// Receives the register block, the bus, and the T-state count elapsed since
/// the last reset.
pub type StepHook = Box<dyn FnMut(&mut Registers, &mut dyn Bus, u64)>;

/// A CPU unit that burns cycles in fixed steps.
pub struct ScriptedCpu {
    regs: Registers,
    quantum: u32,
    elapsed: u64,
    hook: Option<StepHook>,
    stalled: bool,
    interrupts: Vec<u16>,
    resets: u32,
}

impl ScriptedCpu {
    /// A CPU whose instructions all take `quantum` T-states.
    ///
    /// # Panics
    ///
    /// Panics if `quantum` is zero.
    #[must_use]
    pub fn new(quantum: u32) -> Self {
        assert!(quantum > 0, "instruction length must be non-zero");
        Self {
            regs: Registers::default(),
            quantum,
            elapsed: 0,
            hook: None,
            stalled: false,
            interrupts: Vec::new(),
            resets: 0,
        }
    }

    /// Install the per-instruction hook.
    #[must_use]
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Registers, &mut dyn Bus, u64) + 'static,
    {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Make every subsequent `run` return zero, breaking the contract.
    pub fn stall(&mut self) {
        self.stalled = true;
    }

    /// T-states executed since the last reset.
    #[must_use]
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Vectors of every interrupt delivered so far.
    #[must_use]
    pub fn interrupts(&self) -> &[u16] {
        &self.interrupts
    }

    /// Number of times `reset` has been called.
    #[must_use]
    pub fn resets(&self) -> u32 {
        self.resets
    }
}

impl Cpu for ScriptedCpu {
    fn reset(&mut self) {
        self.regs = Registers::default();
        self.elapsed = 0;
        self.resets += 1;
    }

    fn run<B: Bus>(&mut self, cycles: u32, bus: &mut B) -> u32 {
        if self.stalled || cycles == 0 {
            return 0;
        }
        let mut done = 0;
        while done < cycles {
            if let Some(hook) = self.hook.as_mut() {
                hook(&mut self.regs, &mut *bus, self.elapsed);
            }
            done += self.quantum;
            self.elapsed += u64::from(self.quantum);
        }
        done
    }

    fn interrupt(&mut self, vector: u16) {
        self.interrupts.push(vector);
    }

    fn registers(&self) -> &Registers {
        &self.regs
    }

    fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullBus;

    impl Bus for NullBus {
        fn read(&mut self, _address: u16) -> u8 {
            0xFF
        }
        fn write(&mut self, _address: u16, _value: u8) {}
        fn io_read(&mut self, _port: u16) -> u8 {
            0xFF
        }
        fn io_write(&mut self, _port: u16, _value: u8) {}
    }

    #[test]
    fn run_rounds_up_to_whole_instructions() {
        let mut cpu = ScriptedCpu::new(4);
        assert_eq!(cpu.run(224, &mut NullBus), 224);
        assert_eq!(cpu.run(667, &mut NullBus), 668);
        assert_eq!(cpu.elapsed(), 892);
    }

    #[test]
    fn stalled_cpu_executes_nothing() {
        let mut cpu = ScriptedCpu::new(4);
        cpu.stall();
        assert_eq!(cpu.run(224, &mut NullBus), 0);
    }

    #[test]
    fn hook_sees_elapsed_time() {
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let log = seen.clone();
        let mut cpu = ScriptedCpu::new(8).with_hook(move |_, _, t| {
            log.borrow_mut().push(t);
        });
        cpu.run(24, &mut NullBus);
        assert_eq!(*seen.borrow(), vec![0, 8, 16]);
    }
}
