//! The audio context's consumer loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error};

use super::{
    AudioDoubleBuffer, AudioSettings, AudioSink, BeeperRenderer, FrameMailbox, SAMPLE_RATE,
};
use crate::error::EngineError;
use crate::scheduler::FrameAccumulator;

/// How long to sleep between `is_playing` polls.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Pulls frames from the mailbox and plays them through a sink, one frame
/// per cycle.
pub struct AudioRenderLoop {
    mailbox: FrameMailbox,
    settings: Arc<AudioSettings>,
    renderer: BeeperRenderer,
    buffers: AudioDoubleBuffer,
    frames: u64,
    silent_frames: u64,
}

impl AudioRenderLoop {
    #[must_use]
    pub fn new(mailbox: FrameMailbox, settings: Arc<AudioSettings>) -> Self {
        Self {
            mailbox,
            settings,
            renderer: BeeperRenderer::new(),
            buffers: AudioDoubleBuffer::new(),
            frames: 0,
            silent_frames: 0,
        }
    }

    /// One playback cycle: render the newest frame (silence if none is
    /// waiting) into the active buffer, wait until the sink has finished the
    /// previous one, flip and submit.
    ///
    /// Returns whether a real frame was played.
    pub fn cycle(&mut self, sink: &mut dyn AudioSink) -> Result<bool, EngineError> {
        let frame = self.mailbox.take();
        let fresh = frame.is_some();
        match frame {
            Some(frame) => self.render(&frame),
            None => self.buffers.active_mut().fill(0),
        }

        while sink.is_playing() {
            thread::sleep(POLL_INTERVAL);
        }

        let samples = self.buffers.flip();
        sink.submit(samples, SAMPLE_RATE)?;

        self.frames += 1;
        if !fresh {
            self.silent_frames += 1;
        }
        Ok(fresh)
    }

    fn render(&mut self, frame: &FrameAccumulator) {
        let volume = self.settings.effective_volume();
        self.renderer.render(frame, volume, self.buffers.active_mut());
    }

    /// Cycles run so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Cycles that had no frame waiting and played silence.
    #[must_use]
    pub fn silent_frames(&self) -> u64 {
        self.silent_frames
    }

    #[must_use]
    pub fn buffers(&self) -> &AudioDoubleBuffer {
        &self.buffers
    }

    /// Run on a dedicated thread until `stop` is set.
    ///
    /// The sink is built on the audio thread by `open_sink`, since device
    /// streams generally can't cross threads. The thread returns the number
    /// of cycles played, or the first sink error.
    pub fn spawn<S, F>(
        mut self,
        open_sink: F,
        stop: Arc<AtomicBool>,
    ) -> JoinHandle<Result<u64, EngineError>>
    where
        S: AudioSink,
        F: FnOnce() -> Result<S, EngineError> + Send + 'static,
    {
        thread::spawn(move || {
            let mut sink = open_sink()?;
            debug!("audio render loop started");
            while !stop.load(Ordering::Relaxed) {
                if let Err(e) = self.cycle(&mut sink) {
                    error!("audio render loop stopped: {e}");
                    return Err(e);
                }
            }
            debug!("audio render loop stopped after {} frames", self.frames);
            Ok(self.frames)
        })
    }
}
