//! Headless capture: beeper and tape audio to WAV files.

use std::path::Path;

use emu_core::Cpu;
use format_spectrum_tap::TapFile;
use log::info;

use crate::audio::{SAMPLE_RATE, WavSink};
use crate::config::EngineConfig;
use crate::context::EngineContext;
use crate::error::EngineError;
use crate::tape;

/// Run `frames` frames and record the beeper to a WAV file (mono, 16 kHz,
/// 16-bit PCM).
///
/// Every frame goes through the same mailbox and render loop as live
/// playback; the WAV sink never reports itself busy, so this runs as fast
/// as the CPU unit does.
pub fn record_audio<C: Cpu>(
    ctx: &mut EngineContext<C>,
    frames: u32,
    path: &Path,
) -> Result<u64, EngineError> {
    let mut sink = WavSink::create(path, SAMPLE_RATE)?;
    let mut audio = ctx.audio_loop();

    for _ in 0..frames {
        ctx.run_frame()?;
        audio.cycle(&mut sink)?;
    }

    let written = sink.frames();
    sink.finalize()?;
    info!("recorded {written} frames to {}", path.display());
    Ok(written)
}

/// Render a tape image's signal to a WAV file at the loading volume the
/// config implies.
pub fn save_tape_audio(
    tap: &TapFile,
    config: &EngineConfig,
    path: &Path,
) -> Result<u64, EngineError> {
    let volume = if config.sound_enabled { config.volume } else { 0 };
    let tape_volume = volume.saturating_sub(config.tape_volume_offset);

    let mut sink = WavSink::create(path, SAMPLE_RATE)?;
    let frames = tape::render_tape_audio(tap, tape_volume, volume, &mut sink)?;
    sink.finalize()?;

    info!(
        "{} blocks rendered to {} ({frames} frames, {:.1} s)",
        tap.blocks.len(),
        path.display(),
        frames as f64 / 50.0
    );
    Ok(frames)
}
