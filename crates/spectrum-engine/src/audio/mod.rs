//! Beeper audio pipeline.
//!
//! The primary context produces one [`FrameAccumulator`] per 50 Hz frame and
//! drops it in a [`FrameMailbox`]. The audio context runs an
//! [`AudioRenderLoop`]: it takes the newest frame (or silence), renders it to
//! 320 samples at 16 kHz with a [`BeeperRenderer`], waits for the sink to
//! finish the previous buffer, flips the [`AudioDoubleBuffer`] and submits.
//!
//! [`FrameAccumulator`]: crate::scheduler::FrameAccumulator

mod buffer;
#[cfg(feature = "native")]
mod device;
mod mailbox;
mod render_loop;
mod renderer;
mod settings;
mod sink;

pub use buffer::{AudioDoubleBuffer, BufferId};
#[cfg(feature = "native")]
pub use device::CpalSink;
pub use mailbox::FrameMailbox;
pub use render_loop::AudioRenderLoop;
pub use renderer::BeeperRenderer;
pub use settings::AudioSettings;
pub use sink::{AudioSink, NullSink, WavSink};

/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 16_000;

/// Samples per 50 Hz frame.
pub const SAMPLES_PER_FRAME: usize = 320;

/// Peak sample magnitude at full volume.
pub const PEAK_AMPLITUDE: f32 = 9000.0;

/// Samples faded in and out at each end of a frame (3 ms).
pub const FADE_SAMPLES: usize = 48;

/// Highest volume level.
pub const MAX_VOLUME: u8 = 10;

/// One frame of PCM.
pub type SampleFrame = [i16; SAMPLES_PER_FRAME];
