//! Audio output sinks.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::EngineError;

/// Where rendered frames go.
///
/// `submit` must not block; the render loop polls `is_playing` and only
/// submits once the previous frame has finished.
pub trait AudioSink {
    fn submit(&mut self, samples: &[i16], sample_rate: u32) -> Result<(), EngineError>;

    /// Whether the last submitted frame is still playing.
    fn is_playing(&self) -> bool;
}

/// Discards audio, counting frames. Never reports playback in progress.
#[derive(Debug, Default)]
pub struct NullSink {
    frames: u64,
}

impl NullSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl AudioSink for NullSink {
    fn submit(&mut self, _samples: &[i16], _sample_rate: u32) -> Result<(), EngineError> {
        self.frames += 1;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        false
    }
}

/// Writes every frame to a mono 16-bit WAV stream.
pub struct WavSink<W: Write + Seek> {
    writer: WavWriter<W>,
    sample_rate: u32,
    frames: u64,
}

impl WavSink<BufWriter<File>> {
    /// Create (or truncate) a WAV file.
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self, EngineError> {
        Ok(Self {
            writer: WavWriter::create(path, wav_spec(sample_rate))?,
            sample_rate,
            frames: 0,
        })
    }
}

impl<W: Write + Seek> WavSink<W> {
    pub fn new(writer: W, sample_rate: u32) -> Result<Self, EngineError> {
        Ok(Self {
            writer: WavWriter::new(writer, wav_spec(sample_rate))?,
            sample_rate,
            frames: 0,
        })
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Patch the header lengths and flush.
    pub fn finalize(self) -> Result<(), EngineError> {
        self.writer.finalize()?;
        Ok(())
    }
}

impl<W: Write + Seek> AudioSink for WavSink<W> {
    fn submit(&mut self, samples: &[i16], sample_rate: u32) -> Result<(), EngineError> {
        if sample_rate != self.sample_rate {
            log::warn!(
                "WAV sink opened at {} Hz, frame submitted at {sample_rate} Hz",
                self.sample_rate
            );
        }
        for &sample in samples {
            self.writer.write_sample(sample)?;
        }
        self.frames += 1;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        false
    }
}

fn wav_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}
