//! Real audio device output through cpal.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};
use log::error;
use ringbuf::{
    HeapRb,
    traits::{Consumer, Observer, Producer, Split},
};

use super::{AudioSink, SAMPLES_PER_FRAME};
use crate::error::EngineError;

/// Plays frames on the default output device.
///
/// Samples go through a ring buffer the cpal callback drains. The sink
/// counts as playing while more than one frame is still queued, which paces
/// the render loop to the device.
pub struct CpalSink {
    _stream: Stream,
    producer: ringbuf::HeapProd<f32>,
}

impl CpalSink {
    /// Open the default output device at `sample_rate`.
    ///
    /// Returns `None` if no device is available or it refuses the format.
    #[must_use]
    pub fn open(sample_rate: u32) -> Option<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device()?;

        let config = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        // Room for four frames; one frame of silence up front so the device
        // doesn't underrun before the first submit.
        let ring = HeapRb::<f32>::new(SAMPLES_PER_FRAME * 4);
        let (mut producer, mut consumer) = ring.split();
        for _ in 0..SAMPLES_PER_FRAME {
            let _ = producer.try_push(0.0);
        }

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for sample in data.iter_mut() {
                        *sample = consumer.try_pop().unwrap_or(0.0);
                    }
                },
                |err| error!("audio stream error: {err}"),
                None,
            )
            .ok()?;

        stream.play().ok()?;

        Some(Self {
            _stream: stream,
            producer,
        })
    }
}

impl AudioSink for CpalSink {
    fn submit(&mut self, samples: &[i16], _sample_rate: u32) -> Result<(), EngineError> {
        for &sample in samples {
            // A full ring drops the tail of the frame rather than blocking.
            if self
                .producer
                .try_push(f32::from(sample) / f32::from(i16::MAX))
                .is_err()
            {
                break;
            }
        }
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.producer.occupied_len() > SAMPLES_PER_FRAME
    }
}
