//! Accumulator to PCM conversion.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use super::{FADE_SAMPLES, MAX_VOLUME, PEAK_AMPLITUDE, SAMPLES_PER_FRAME, SampleFrame};
use crate::scheduler::{CYCLES_PER_LINE, FrameAccumulator, LINES_PER_FRAME};

/// Turns a frame's per-line beeper counts into 320 samples.
///
/// Each line's count becomes a duty cycle (count / 224), the 312 duty values
/// are linearly resampled to 320 points, mapped from [0, 1] to [-1, +1] and
/// scaled by the peak amplitude and volume. The first and last 48 samples
/// are faded to remove clicks at buffer boundaries.
pub struct BeeperRenderer {
    duty: [f32; LINES_PER_FRAME],
}

impl BeeperRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            duty: [0.0; LINES_PER_FRAME],
        }
    }

    /// Render `frame` at `volume` (0-10, 0 is silent) into `out`.
    pub fn render(&mut self, frame: &FrameAccumulator, volume: u8, out: &mut SampleFrame) {
        let scale = f32::from(volume.min(MAX_VOLUME)) / f32::from(MAX_VOLUME);

        for (duty, &count) in self.duty.iter_mut().zip(frame.lines()) {
            *duty = f32::from(count) / CYCLES_PER_LINE as f32;
        }

        let last_line = (LINES_PER_FRAME - 1) as f32;
        let last_sample = (SAMPLES_PER_FRAME - 1) as f32;
        for (s, sample) in out.iter_mut().enumerate() {
            let pos = s as f32 * last_line / last_sample;
            let i0 = pos as usize;
            let i1 = (i0 + 1).min(LINES_PER_FRAME - 1);
            let frac = pos - i0 as f32;
            let d = self.duty[i0] + (self.duty[i1] - self.duty[i0]) * frac;

            let v = 2.0 * d - 1.0;
            *sample = (v * PEAK_AMPLITUDE * scale) as i16;
        }

        let n = out.len();
        for i in 0..FADE_SAMPLES {
            let gain = i as f32 / FADE_SAMPLES as f32;
            out[i] = (f32::from(out[i]) * gain) as i16;
            out[n - 1 - i] = (f32::from(out[n - 1 - i]) * gain) as i16;
        }
    }
}

impl Default for BeeperRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(frame: &FrameAccumulator, volume: u8) -> SampleFrame {
        let mut out = [0i16; SAMPLES_PER_FRAME];
        BeeperRenderer::new().render(frame, volume, &mut out);
        out
    }

    #[test]
    fn half_duty_is_near_silent() {
        let out = render(&FrameAccumulator::filled(112), 10);
        assert!(out.iter().all(|&s| s.abs() <= 1), "{out:?}");
    }

    #[test]
    fn full_duty_is_positive_peak_between_fades() {
        let out = render(&FrameAccumulator::filled(224), 10);
        for &s in &out[FADE_SAMPLES..SAMPLES_PER_FRAME - FADE_SAMPLES] {
            assert_eq!(s, 9000);
        }
    }

    #[test]
    fn idle_beeper_is_negative_and_scaled_by_volume() {
        let out = render(&FrameAccumulator::new(), 5);
        assert_eq!(out[SAMPLES_PER_FRAME / 2], -4500);
    }

    #[test]
    fn volume_zero_is_silence() {
        let out = render(&FrameAccumulator::filled(224), 0);
        assert!(out.iter().all(|&s| s == 0));
    }

    #[test]
    fn fade_edges_start_at_zero_and_ramp() {
        let out = render(&FrameAccumulator::filled(224), 10);
        assert_eq!(out[0], 0);
        assert_eq!(out[SAMPLES_PER_FRAME - 1], 0);
        assert!(out[1] > 0 && out[1] < out[FADE_SAMPLES - 1]);
        assert!(out[FADE_SAMPLES - 1] < 9000);
    }

    #[test]
    fn resampling_interpolates_a_step() {
        let mut frame = FrameAccumulator::new();
        for line in 156..LINES_PER_FRAME {
            frame.set(line, 224);
        }
        let out = render(&frame, 10);
        assert_eq!(out[100], -9000);
        assert_eq!(out[220], 9000);
        // Rising through the middle.
        assert!(out[159] < out[161]);
    }
}
