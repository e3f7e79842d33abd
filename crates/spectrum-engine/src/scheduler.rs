//! Frame scheduler.
//!
//! One 48K PAL frame is 312 scanlines of 224 T-states (69,888 in all). The
//! scheduler steps the CPU one scanline at a time, recording for each line
//! how many of its cycles ran with the beeper latch high. That per-line
//! record is the [`FrameAccumulator`] the beeper pipeline turns into sound.
//!
//! After the last line, a single IM 1 interrupt is raised if the CPU has
//! interrupts enabled.

use emu_core::Cpu;
use log::trace;

use crate::error::EngineError;
use crate::spectrum::Spectrum;

/// Scanlines per frame.
pub const LINES_PER_FRAME: usize = 312;

/// T-states per scanline.
pub const CYCLES_PER_LINE: u32 = 224;

/// T-states per frame.
pub const CYCLES_PER_FRAME: u32 = LINES_PER_FRAME as u32 * CYCLES_PER_LINE;

/// RST 38h, the IM 1 interrupt target.
pub const INTERRUPT_VECTOR: u16 = 0x0038;

/// Per-scanline beeper-high cycle counts for one frame, each 0-224.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameAccumulator([u16; LINES_PER_FRAME]);

impl FrameAccumulator {
    #[must_use]
    pub const fn new() -> Self {
        Self([0; LINES_PER_FRAME])
    }

    /// Every line set to the same count (clamped to 224).
    #[must_use]
    pub fn filled(value: u16) -> Self {
        Self([value.min(CYCLES_PER_LINE as u16); LINES_PER_FRAME])
    }

    /// Store a line's count, clamped to 224. Out-of-range lines are ignored.
    pub fn set(&mut self, line: usize, value: u16) {
        if let Some(slot) = self.0.get_mut(line) {
            *slot = value.min(CYCLES_PER_LINE as u16);
        }
    }

    #[must_use]
    pub fn get(&self, line: usize) -> u16 {
        self.0.get(line).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn lines(&self) -> &[u16; LINES_PER_FRAME] {
        &self.0
    }
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Registers captured mid-frame, away from interrupt delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    pub pc: u16,
    pub sp: u16,
    pub im: u8,
    pub iff1: bool,
}

/// What one call to [`FrameScheduler::run_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// T-states executed, overshoot included.
    pub cycles: u64,
    /// Whether the end-of-frame interrupt was raised.
    pub interrupted: bool,
    pub diagnostics: Diagnostics,
}

pub struct FrameScheduler {
    diagnostic_line: usize,
    /// T-states the CPU ran past the end of the previous step, owed back by
    /// shortening the next request.
    overshoot: u32,
    frames: u64,
    last_diagnostics: Option<Diagnostics>,
}

impl FrameScheduler {
    #[must_use]
    pub fn new(diagnostic_line: usize) -> Self {
        Self {
            diagnostic_line: diagnostic_line.min(LINES_PER_FRAME - 1),
            overshoot: 0,
            frames: 0,
            last_diagnostics: None,
        }
    }

    /// Run one frame.
    ///
    /// `accumulator` receives the per-line beeper record only when the whole
    /// frame completes; pass `None` to run silently. A stalled CPU unit
    /// aborts the frame and leaves `accumulator` untouched.
    pub fn run_frame<C: Cpu>(
        &mut self,
        spectrum: &mut Spectrum<C>,
        accumulator: Option<&mut FrameAccumulator>,
    ) -> Result<FrameReport, EngineError> {
        let mut frame = FrameAccumulator::new();
        let mut cycles = 0u64;
        let mut diagnostics = None;

        for line in 0..LINES_PER_FRAME {
            let (used, beeper) = self.step(spectrum, CYCLES_PER_LINE)?;
            cycles += u64::from(used);
            if beeper {
                frame.set(line, used.min(CYCLES_PER_LINE) as u16);
            }

            if line == self.diagnostic_line {
                let regs = spectrum.registers();
                diagnostics = Some(Diagnostics {
                    pc: regs.pc.word(),
                    sp: regs.sp.word(),
                    im: regs.im,
                    iff1: regs.iff1,
                });
            }
        }

        let regs = spectrum.registers();
        let interrupted = regs.iff1 && regs.im == 1;
        if interrupted {
            spectrum.interrupt(INTERRUPT_VECTOR);
        }

        if let Some(out) = accumulator {
            *out = frame;
        }
        self.frames += 1;

        let diagnostics = diagnostics.unwrap_or(Diagnostics {
            pc: 0,
            sp: 0,
            im: 0,
            iff1: false,
        });
        trace!(
            "frame {}: {cycles} T-states, PC=${:04X} SP=${:04X} IM{} IFF1={}",
            self.frames, diagnostics.pc, diagnostics.sp, diagnostics.im, diagnostics.iff1
        );
        self.last_diagnostics = Some(diagnostics);

        Ok(FrameReport {
            cycles,
            interrupted,
            diagnostics,
        })
    }

    /// Run `cycles` T-states on the long-run timeline, paying back any
    /// overshoot from the previous step first.
    ///
    /// Returns the T-states executed and whether the beeper was high during
    /// them. When the debt covers the whole request the CPU is not called.
    pub fn step<C: Cpu>(
        &mut self,
        spectrum: &mut Spectrum<C>,
        cycles: u32,
    ) -> Result<(u32, bool), EngineError> {
        let owed = self.overshoot.min(cycles);
        self.overshoot -= owed;
        let request = cycles - owed;
        if request == 0 {
            return Ok((0, false));
        }

        let used = spectrum.run_cycles(request)?;
        self.overshoot += used.saturating_sub(request);
        Ok((used, spectrum.beeper_was_active()))
    }

    /// Frames completed so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Diagnostic snapshot from the last completed frame.
    #[must_use]
    pub fn last_diagnostics(&self) -> Option<Diagnostics> {
        self.last_diagnostics
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(156)
    }
}
