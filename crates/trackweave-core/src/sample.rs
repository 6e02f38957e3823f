//! Recorded samples: WAV decoding and pitch stretching.

use crate::error::{Error, Result};
use std::path::Path;

/// A decoded stereo sample.
///
/// Frames are stored as one `f32` vector per channel. Mono files are
/// duplicated into both channels on load so the mixer never has to care.
#[derive(Clone, Debug)]
pub struct Sample {
    left: Vec<f32>,
    right: Vec<f32>,
}

impl Sample {
    /// Build a sample directly from channel data.
    ///
    /// The shorter channel determines the frame count.
    pub fn from_frames(left: Vec<f32>, right: Vec<f32>) -> Self {
        let mut sample = Sample { left, right };
        let frames = sample.left.len().min(sample.right.len());
        sample.left.truncate(frames);
        sample.right.truncate(frames);
        sample
    }

    /// Decode a WAV file into a sample.
    ///
    /// Accepts integer (scaled to `[-1, 1]`) and float formats, mono or
    /// stereo. Anything else is a [`Error::UnsupportedChannels`] or
    /// [`Error::SampleLoad`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let load_err = |source| Error::SampleLoad {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = hound::WavReader::open(path).map_err(load_err)?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(load_err)?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(load_err)?
            }
        };

        match spec.channels {
            1 => Ok(Sample {
                left: interleaved.clone(),
                right: interleaved,
            }),
            2 => {
                let left = interleaved.iter().step_by(2).copied().collect();
                let right = interleaved.iter().skip(1).step_by(2).copied().collect();
                Ok(Sample { left, right })
            }
            channels => Err(Error::UnsupportedChannels {
                path: path.to_path_buf(),
                channels,
            }),
        }
    }

    /// Number of frames in the sample.
    pub fn frame_count(&self) -> usize {
        self.left.len()
    }

    /// Left channel frames.
    pub fn left(&self) -> &[f32] {
        &self.left
    }

    /// Right channel frames.
    pub fn right(&self) -> &[f32] {
        &self.right
    }

    /// Resample by a frequency ratio, changing the perceived pitch.
    ///
    /// The result is `ratio` times as long as the source: a ratio below 1
    /// shortens the sample and raises its pitch. Linear interpolation;
    /// reads past the end blend towards silence.
    pub fn stretched_relative(&self, ratio: f64) -> Sample {
        let new_len = (self.frame_count() as f64 * ratio).round() as usize;
        let mut left = Vec::with_capacity(new_len);
        let mut right = Vec::with_capacity(new_len);

        for i in 0..new_len {
            let pos = i as f64 / ratio;
            left.push(lerp_at(&self.left, pos));
            right.push(lerp_at(&self.right, pos));
        }

        Sample { left, right }
    }
}

/// Linearly interpolated read at a fractional frame position.
fn lerp_at(frames: &[f32], pos: f64) -> f32 {
    let idx = pos as usize;
    let frac = (pos - idx as f64) as f32;
    let a = frames.get(idx).copied().unwrap_or(0.0);
    let b = frames.get(idx + 1).copied().unwrap_or(0.0);
    a + (b - a) * frac
}
