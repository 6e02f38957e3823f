//! The output buffer: additive placement, fades, WAV writing.

use crate::error::{Error, Result};
use crate::sample::Sample;
use crate::SAMPLE_RATE;
use std::path::Path;

/// An owned stereo mix buffer.
///
/// Accumulation is plain unclamped `f32` addition; values are only clamped
/// to `[-1, 1]` when converting to 16-bit output in [`AudioBuffer::save`].
#[derive(Clone, Debug)]
pub struct AudioBuffer {
    left: Vec<f32>,
    right: Vec<f32>,
}

impl AudioBuffer {
    /// Allocate a silent buffer of the given length in frames.
    pub fn new(frames: usize) -> Self {
        AudioBuffer {
            left: vec![0.0; frames],
            right: vec![0.0; frames],
        }
    }

    /// Number of frames in the buffer.
    pub fn frame_count(&self) -> usize {
        self.left.len()
    }

    /// Duration of the buffer in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.frame_count() as f64 / SAMPLE_RATE as f64
    }

    /// Left channel frames.
    pub fn left(&self) -> &[f32] {
        &self.left
    }

    /// Right channel frames.
    pub fn right(&self) -> &[f32] {
        &self.right
    }

    /// Additively place a sample into the buffer starting at frame `at`.
    ///
    /// Copies from `source_offset` for up to `copy_len` frames (`None` means
    /// the whole sample), clipped to both source and destination bounds.
    /// Each frame is scaled by `volume`, and the last `fadeout` frames of
    /// the copied span (the whole span if shorter) ramp linearly to zero.
    pub fn add(
        &mut self,
        at: usize,
        source: &Sample,
        source_offset: usize,
        copy_len: Option<usize>,
        volume: f32,
        fadeout: usize,
    ) {
        if at >= self.frame_count() || source_offset >= source.frame_count() {
            return;
        }
        let span = (source.frame_count() - source_offset)
            .min(self.frame_count() - at)
            .min(copy_len.unwrap_or(usize::MAX));

        let fade_len = fadeout.min(span);
        let fade_start = span - fade_len;

        for i in 0..span {
            let mut gain = volume;
            if i >= fade_start {
                gain *= (span - i) as f32 / fade_len as f32;
            }
            self.left[at + i] += source.left()[source_offset + i] * gain;
            self.right[at + i] += source.right()[source_offset + i] * gain;
        }
    }

    /// Linearly fade the last `frames` of the buffer to zero.
    pub fn fade_samples(&mut self, frames: usize) {
        let len = self.frame_count();
        let fade = frames.min(len);
        if fade == 0 {
            return;
        }
        for i in len - fade..len {
            let gain = (len - i) as f32 / fade as f32;
            self.left[i] *= gain;
            self.right[i] *= gain;
        }
    }

    /// Write the buffer as a 16-bit stereo WAV file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let write_err = |source| Error::WavWrite {
            path: path.to_path_buf(),
            source,
        };

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).map_err(write_err)?;
        for i in 0..self.frame_count() {
            writer
                .write_sample(to_i16(self.left[i]))
                .map_err(write_err)?;
            writer
                .write_sample(to_i16(self.right[i]))
                .map_err(write_err)?;
        }
        writer.finalize().map_err(write_err)?;
        Ok(())
    }
}

fn to_i16(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
