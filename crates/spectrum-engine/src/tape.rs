//! Tape engine: plays a TAP image into the EAR input while the ROM loads it.
//!
//! Loading is a replay of the real thing. The machine is reset and left to
//! boot, `LOAD ""` is typed on the keyboard, and then every block is turned
//! into a pulse program (pilot tone, two sync pulses, two edges per data
//! bit, a pause) which toggles the EAR latch between CPU runs of the right
//! length. The ROM's own loader does the rest.
//!
//! While the signal plays, EAR is sampled every 224 T-states into a
//! [`FrameAccumulator`] so the load is audible through the normal beeper
//! pipeline, and a caller-supplied callback is invoked now and then so the
//! screen can show the load in progress. The border turns cyan for each
//! pilot tone and yellow for the data, and gets its old colour back once
//! the block's pause is over.

#![allow(clippy::cast_possible_truncation)]

use std::fs::File;
use std::io::Read;
use std::iter;
use std::path::Path;

use emu_core::Cpu;
use format_spectrum_tap::{FLAG_HEADER, TapBlock, TapFile};
use log::{debug, info, warn};

use crate::audio::{
    AudioSettings, AudioSink, BeeperRenderer, FrameMailbox, SAMPLE_RATE, SAMPLES_PER_FRAME,
    SampleFrame,
};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::input::InputQueue;
use crate::scheduler::{CYCLES_PER_LINE, FrameAccumulator, FrameScheduler, LINES_PER_FRAME};
use crate::spectrum::Spectrum;

/// Standard ROM loader timings, in T-states unless noted.
pub mod timing {
    pub const PILOT_PULSE: u32 = 2168;
    pub const PILOT_HEADER_PULSES: u32 = 8063;
    pub const PILOT_DATA_PULSES: u32 = 3223;
    pub const SYNC1: u32 = 667;
    pub const SYNC2: u32 = 735;
    pub const ZERO_PULSE: u32 = 855;
    pub const ONE_PULSE: u32 = 1710;
    /// Gap after each block, in milliseconds.
    pub const PAUSE_MS: u32 = 1000;
    /// 3.5 MHz.
    pub const TICKS_PER_MS: u32 = 3500;
    /// Pilot pulses between render checkpoints.
    pub const PILOT_RENDER_INTERVAL: u32 = 500;
    /// Data bytes between render checkpoints.
    pub const BYTE_RENDER_INTERVAL: usize = 32;
    /// Border while the pilot tone plays.
    pub const PILOT_BORDER: u8 = 5;
    /// Border while data bits play.
    pub const DATA_BORDER: u8 = 6;
}

/// Which part of a block is about to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPhase {
    Pilot,
    Data,
}

/// One step of a block's pulse program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    /// Run for this many T-states, then toggle EAR.
    Edge(u32),
    /// Run for this many T-states, leaving EAR alone.
    Run(u32),
    /// Force EAR low.
    Low,
    /// The screen may be refreshed here (subject to throttling).
    Checkpoint,
    /// The pilot or the data bits start here.
    Phase(BlockPhase),
    /// The last bit of the block has been sent.
    BlockEnd,
}

/// Parameters of one block's signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseProgram {
    pub pilot_pulses: u32,
    /// Bits of the final byte that are sent, MSB first (1-8).
    pub bits_in_last_byte: u8,
    pub pause_ms: u32,
}

impl PulseProgram {
    /// Standard-speed program for a TAP block: the pilot length depends on
    /// the flag byte, every byte is sent whole.
    #[must_use]
    pub fn for_block(block: &TapBlock) -> Self {
        let pilot_pulses = if block.flag() == FLAG_HEADER {
            timing::PILOT_HEADER_PULSES
        } else {
            timing::PILOT_DATA_PULSES
        };
        Self {
            pilot_pulses,
            bits_in_last_byte: 8,
            pause_ms: timing::PAUSE_MS,
        }
    }

    /// The event sequence that sends `data`.
    pub fn events(self, data: &[u8]) -> impl Iterator<Item = SignalEvent> + '_ {
        use SignalEvent::{BlockEnd, Checkpoint, Edge, Low, Phase, Run};

        let pilot = (0..self.pilot_pulses).flat_map(|i| {
            let checkpoint = (i % timing::PILOT_RENDER_INTERVAL == 0).then_some(Checkpoint);
            iter::once(Edge(timing::PILOT_PULSE)).chain(checkpoint)
        });

        let sync = [Edge(timing::SYNC1), Edge(timing::SYNC2)];

        let last = data.len().saturating_sub(1);
        let last_bits = self.bits_in_last_byte.clamp(1, 8);
        let bits = data.iter().enumerate().flat_map(move |(index, &byte)| {
            let count = if index == last { last_bits } else { 8 };
            let pulses = (0..count).flat_map(move |bit| {
                let len = if byte & (0x80 >> bit) != 0 {
                    timing::ONE_PULSE
                } else {
                    timing::ZERO_PULSE
                };
                [Edge(len), Edge(len)]
            });
            let checkpoint = (index % timing::BYTE_RENDER_INTERVAL == 0).then_some(Checkpoint);
            pulses.chain(checkpoint)
        });

        // The first millisecond of the pause keeps the last level, the rest
        // is held low.
        let pause: Box<dyn Iterator<Item = SignalEvent>> = if self.pause_ms == 0 {
            Box::new(iter::empty())
        } else {
            Box::new(
                [Run(timing::TICKS_PER_MS), Low]
                    .into_iter()
                    .chain(iter::repeat_n(
                        Run(timing::TICKS_PER_MS),
                        (self.pause_ms - 1) as usize,
                    )),
            )
        };

        iter::once(Phase(BlockPhase::Pilot))
            .chain(pilot)
            .chain(sync)
            .chain(iter::once(Phase(BlockPhase::Data)))
            .chain(bits)
            .chain(iter::once(BlockEnd))
            .chain(pause)
    }
}

/// Builds beeper frames from the EAR level, one line per 224 T-states.
///
/// A line is `224 * volume / 10` while EAR is high and 0 while it is low,
/// averaged with the previous line's target to soften the edges.
#[derive(Debug, Default)]
pub struct TapeAudio {
    frame: FrameAccumulator,
    line: usize,
    pending: u64,
    last: u16,
}

impl TapeAudio {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for `ticks` T-states spent at `ear`. `emit` receives each
    /// frame as its 312th line is written.
    pub fn advance(
        &mut self,
        ticks: u32,
        ear: bool,
        volume: u8,
        mut emit: impl FnMut(&FrameAccumulator),
    ) {
        let target = if ear {
            (CYCLES_PER_LINE * u32::from(volume.min(10)) / 10) as u16
        } else {
            0
        };

        self.pending += u64::from(ticks);
        while self.pending >= u64::from(CYCLES_PER_LINE) {
            self.pending -= u64::from(CYCLES_PER_LINE);

            self.frame.set(self.line, (target + self.last) / 2);
            self.last = target;
            self.line += 1;

            if self.line == LINES_PER_FRAME {
                emit(&self.frame);
                self.frame = FrameAccumulator::new();
                self.line = 0;
            }
        }
    }

    /// Lines written into the current, unfinished frame.
    #[must_use]
    pub fn pending_lines(&self) -> usize {
        self.line
    }

    /// Emit the unfinished frame, zero-padded, if it has any lines.
    pub fn flush(&mut self, mut emit: impl FnMut(&FrameAccumulator)) {
        if self.line > 0 {
            emit(&self.frame);
            self.frame = FrameAccumulator::new();
            self.line = 0;
        }
    }
}

/// What a tape load did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TapeLoadReport {
    pub blocks: usize,
    /// T-states executed, warm-up and typing included.
    pub cycles: u64,
    pub renders: u64,
    /// Loading-sound frames handed to the mailbox, the final partial one
    /// included.
    pub audio_frames: u64,
}

/// Read a whole tape image into memory, failing cleanly when it can't be
/// buffered.
pub fn read_image(path: &Path) -> Result<Vec<u8>, EngineError> {
    let mut file = File::open(path)?;
    let len = usize::try_from(file.metadata()?.len()).unwrap_or(usize::MAX);

    let mut image = Vec::new();
    image
        .try_reserve_exact(len)
        .map_err(|_| EngineError::OutOfMemory { bytes: len })?;
    file.read_to_end(&mut image)?;
    Ok(image)
}

/// Drives a machine through a tape load.
pub struct TapeLoader<'a> {
    config: &'a EngineConfig,
    settings: &'a AudioSettings,
    mailbox: &'a FrameMailbox,
}

impl<'a> TapeLoader<'a> {
    #[must_use]
    pub fn new(
        config: &'a EngineConfig,
        settings: &'a AudioSettings,
        mailbox: &'a FrameMailbox,
    ) -> Self {
        Self {
            config,
            settings,
            mailbox,
        }
    }

    /// Reset the machine and load `image` through the ROM.
    ///
    /// A malformed image fails before anything runs, leaving the machine in
    /// its post-reset state. An image with no blocks succeeds without
    /// running anything. `render` is called at throttled checkpoints and
    /// once after the last byte of every block.
    pub fn load<C: Cpu>(
        &self,
        spectrum: &mut Spectrum<C>,
        scheduler: &mut FrameScheduler,
        image: &[u8],
        render: &mut dyn FnMut(),
    ) -> Result<TapeLoadReport, EngineError> {
        spectrum.reset();

        let tap = TapFile::parse(image)?;
        if tap.blocks.is_empty() {
            info!("tape image has no blocks");
            return Ok(TapeLoadReport::default());
        }
        info!("tape image: {} blocks", tap.blocks.len());

        let mut deck = Deck {
            spectrum,
            scheduler,
            audio: TapeAudio::new(),
            settings: self.settings,
            mailbox: self.mailbox,
            volume_offset: self.config.tape_volume_offset,
            throttle: self.config.render_throttle.max(1),
            render_counter: 0,
            render,
            report: TapeLoadReport::default(),
        };

        deck.boot(self.config.warmup_frames, u64::from(self.config.key_hold_frames))?;
        for (index, block) in tap.blocks.iter().enumerate() {
            describe_block(index, block);
            deck.play(block)?;
            deck.report.blocks += 1;
        }
        deck.flush_audio();

        info!(
            "tape loaded: {} blocks, {} T-states",
            deck.report.blocks, deck.report.cycles
        );
        Ok(deck.report)
    }
}

fn describe_block(index: usize, block: &TapBlock) {
    match block.header() {
        Some(header) => info!(
            "block {index}: {:?} \"{}\", {} bytes",
            header.kind, header.name, header.data_length
        ),
        None => debug!(
            "block {index}: flag ${:02X}, {} bytes",
            block.flag(),
            block.len()
        ),
    }
    if !block.checksum_valid() {
        warn!("block {index}: checksum mismatch, playing it anyway");
    }
}

/// The machine plus everything that listens to the tape signal.
struct Deck<'s, 'r, C: Cpu> {
    spectrum: &'s mut Spectrum<C>,
    scheduler: &'s mut FrameScheduler,
    audio: TapeAudio,
    settings: &'s AudioSettings,
    mailbox: &'s FrameMailbox,
    volume_offset: u8,
    throttle: u32,
    render_counter: u32,
    render: &'r mut dyn FnMut(),
    report: TapeLoadReport,
}

impl<C: Cpu> Deck<'_, '_, C> {
    /// Let the ROM start up, then type `LOAD ""` and ENTER.
    fn boot(&mut self, warmup_frames: u32, hold: u64) -> Result<(), EngineError> {
        for _ in 0..warmup_frames {
            self.frame()?;
        }

        let mut keys = InputQueue::load_command(hold);
        let span = keys.span(hold);
        for frame in 0..span {
            keys.process(frame, &mut self.spectrum.bus_mut().keyboard);
            self.frame()?;
        }
        debug!("typed LOAD \"\" over {span} frames");
        Ok(())
    }

    fn frame(&mut self) -> Result<(), EngineError> {
        let report = self.scheduler.run_frame(self.spectrum, None)?;
        self.report.cycles += report.cycles;
        Ok(())
    }

    /// Play one block, restoring the border afterwards even if the CPU
    /// fails part way.
    fn play(&mut self, block: &TapBlock) -> Result<(), EngineError> {
        let border = self.spectrum.bus().border();
        let result = self.send(block);
        self.spectrum.bus_mut().set_border(border);
        result
    }

    fn send(&mut self, block: &TapBlock) -> Result<(), EngineError> {
        for event in PulseProgram::for_block(block).events(block.bytes()) {
            match event {
                SignalEvent::Edge(ticks) => {
                    self.run_for(ticks)?;
                    self.spectrum.bus_mut().toggle_ear();
                }
                SignalEvent::Run(ticks) => self.run_for(ticks)?,
                SignalEvent::Low => self.spectrum.bus_mut().set_ear(false),
                SignalEvent::Phase(BlockPhase::Pilot) => {
                    self.spectrum.bus_mut().set_border(timing::PILOT_BORDER);
                }
                SignalEvent::Phase(BlockPhase::Data) => {
                    self.spectrum.bus_mut().set_border(timing::DATA_BORDER);
                }
                SignalEvent::Checkpoint => self.try_render(),
                SignalEvent::BlockEnd => self.force_render(),
            }
        }
        Ok(())
    }

    fn run_for(&mut self, ticks: u32) -> Result<(), EngineError> {
        let (used, _) = self.scheduler.step(self.spectrum, ticks)?;
        self.report.cycles += u64::from(used);

        let ear = self.spectrum.bus().ear();
        let volume = self.settings.tape_volume(self.volume_offset);
        let mailbox = self.mailbox;
        let mut emitted = 0;
        self.audio.advance(ticks, ear, volume, |frame| {
            mailbox.submit(frame);
            emitted += 1;
        });
        self.report.audio_frames += emitted;
        Ok(())
    }

    /// Hand over the unfinished tail of the loading sound.
    fn flush_audio(&mut self) {
        let mailbox = self.mailbox;
        let report = &mut self.report;
        self.audio.flush(|frame| {
            mailbox.submit(frame);
            report.audio_frames += 1;
        });
    }

    fn try_render(&mut self) {
        self.render_counter += 1;
        if self.render_counter >= self.throttle {
            self.render_counter = 0;
            self.force_render();
        }
    }

    fn force_render(&mut self) {
        (self.render)();
        self.report.renders += 1;
    }
}

/// Render a tape's signal straight to audio, without a CPU.
///
/// Each block is played as the loader would hear it. `tape_volume` scales
/// the line levels; `volume` is the playback volume applied on rendering.
/// Returns the number of frames written.
pub fn render_tape_audio(
    tap: &TapFile,
    tape_volume: u8,
    volume: u8,
    sink: &mut dyn AudioSink,
) -> Result<u64, EngineError> {
    let mut audio = TapeAudio::new();
    let mut renderer = BeeperRenderer::new();
    let mut samples: SampleFrame = [0; SAMPLES_PER_FRAME];
    let mut frames = 0u64;
    let mut ear = false;
    let mut result = Ok(());

    let mut emit = |frame: &FrameAccumulator| {
        if result.is_ok() {
            renderer.render(frame, volume, &mut samples);
            result = sink.submit(&samples, SAMPLE_RATE);
            frames += 1;
        }
    };

    for block in &tap.blocks {
        for event in PulseProgram::for_block(block).events(block.bytes()) {
            match event {
                SignalEvent::Edge(ticks) => {
                    audio.advance(ticks, ear, tape_volume, &mut emit);
                    ear = !ear;
                }
                SignalEvent::Run(ticks) => audio.advance(ticks, ear, tape_volume, &mut emit),
                SignalEvent::Low => ear = false,
                SignalEvent::Phase(_) | SignalEvent::Checkpoint | SignalEvent::BlockEnd => {}
            }
        }
    }
    audio.flush(&mut emit);

    result?;
    Ok(frames)
}
