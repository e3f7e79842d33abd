//! The engine as one explicit value.
//!
//! `EngineContext` owns the machine, its scheduler, the configuration and
//! the producer side of the audio hand-off. Callers drive it from the
//! primary context and spawn the audio side with [`EngineContext::audio_loop`].

use std::fs;
use std::path::Path;
use std::sync::Arc;

use emu_core::Cpu;
use log::error;

use crate::audio::{AudioRenderLoop, AudioSettings, FrameMailbox};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::scheduler::{FrameAccumulator, FrameReport, FrameScheduler};
use crate::snapshot::{self, SnapshotFormat};
use crate::spectrum::Spectrum;
use crate::tape::{self, TapeLoadReport, TapeLoader};

pub struct EngineContext<C: Cpu> {
    spectrum: Spectrum<C>,
    scheduler: FrameScheduler,
    config: EngineConfig,
    mailbox: FrameMailbox,
    settings: Arc<AudioSettings>,
    accumulator: FrameAccumulator,
    last_error: Option<String>,
}

impl<C: Cpu> EngineContext<C> {
    /// Wire `cpu` to a 48K machine with `rom` and apply `config`.
    pub fn new(cpu: C, rom: &[u8], config: EngineConfig) -> Result<Self, EngineError> {
        let mut spectrum = Spectrum::new(cpu, rom)?;
        spectrum.bus_mut().set_floating_bus(config.floating_bus);

        Ok(Self {
            spectrum,
            scheduler: FrameScheduler::new(config.diagnostic_line),
            settings: Arc::new(AudioSettings::new(config.volume, config.sound_enabled)),
            config,
            mailbox: FrameMailbox::new(),
            accumulator: FrameAccumulator::new(),
            last_error: None,
        })
    }

    /// Like [`EngineContext::new`], with the ROM read from `config.rom`.
    pub fn from_config(cpu: C, config: EngineConfig) -> Result<Self, EngineError> {
        let rom = config.read_rom()?;
        Self::new(cpu, &rom, config)
    }

    /// Run one frame and hand its beeper record to the audio context.
    pub fn run_frame(&mut self) -> Result<FrameReport, EngineError> {
        let result = self
            .scheduler
            .run_frame(&mut self.spectrum, Some(&mut self.accumulator));
        if result.is_ok() {
            self.mailbox.submit(&self.accumulator);
        }
        self.record(result)
    }

    /// Run one frame without producing audio.
    pub fn run_silent_frame(&mut self) -> Result<FrameReport, EngineError> {
        let result = self.scheduler.run_frame(&mut self.spectrum, None);
        self.record(result)
    }

    pub fn load_snapshot(
        &mut self,
        format: SnapshotFormat,
        data: &[u8],
    ) -> Result<(), EngineError> {
        let result = snapshot::load_snapshot(&mut self.spectrum, format, data);
        self.record(result)
    }

    /// Load a snapshot file, picking the format from its extension.
    pub fn load_snapshot_file(&mut self, path: &Path) -> Result<(), EngineError> {
        let result = SnapshotFormat::from_path(path).and_then(|format| {
            let data = fs::read(path)?;
            snapshot::load_snapshot(&mut self.spectrum, format, &data)
        });
        self.record(result)
    }

    /// Save the machine in either snapshot format.
    pub fn save_snapshot(&mut self, format: SnapshotFormat) -> Result<Vec<u8>, EngineError> {
        let result = match format {
            SnapshotFormat::Sna => snapshot::save_sna(&self.spectrum),
            SnapshotFormat::Z80 => Ok(snapshot::save_z80(&self.spectrum)),
        };
        self.record(result)
    }

    /// Load a TAP image through the ROM. See [`TapeLoader::load`].
    pub fn load_tape(
        &mut self,
        image: &[u8],
        render: &mut dyn FnMut(),
    ) -> Result<TapeLoadReport, EngineError> {
        let loader = TapeLoader::new(&self.config, &self.settings, &self.mailbox);
        let result = loader.load(&mut self.spectrum, &mut self.scheduler, image, render);
        self.record(result)
    }

    pub fn load_tape_file(
        &mut self,
        path: &Path,
        render: &mut dyn FnMut(),
    ) -> Result<TapeLoadReport, EngineError> {
        match tape::read_image(path) {
            Ok(image) => self.load_tape(&image, render),
            Err(e) => self.record(Err(e)),
        }
    }

    /// Message of the most recent failed operation; cleared by the next
    /// success.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn record<T>(&mut self, result: Result<T, EngineError>) -> Result<T, EngineError> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(e) => {
                error!("{e}");
                self.last_error = Some(e.to_string());
            }
        }
        result
    }

    /// The consumer half of the audio pipeline, sharing this context's
    /// mailbox and settings.
    #[must_use]
    pub fn audio_loop(&self) -> AudioRenderLoop {
        AudioRenderLoop::new(self.mailbox.clone(), Arc::clone(&self.settings))
    }

    #[must_use]
    pub fn spectrum(&self) -> &Spectrum<C> {
        &self.spectrum
    }

    pub fn spectrum_mut(&mut self) -> &mut Spectrum<C> {
        &mut self.spectrum
    }

    #[must_use]
    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn mailbox(&self) -> &FrameMailbox {
        &self.mailbox
    }

    #[must_use]
    pub fn settings(&self) -> &Arc<AudioSettings> {
        &self.settings
    }
}
