//! Trackweave core: render plain-text musical scores into a mixed WAV.
//!
//! Instruments are built from short per-note recordings; any note without
//! a recording is synthesized by pitch-stretching the nearest one. Scores
//! are line-oriented text where each line advances a sample cursor and
//! note tokens become timed placements.
//!
//! # Pipeline
//!
//! 1. Build an [`InstrumentBank`] from a catalog file
//!    ([`InstrumentBank::from_catalog`]).
//! 2. Run a [`ScoreParser`] over each score file, collecting
//!    [`Insertion`]s.
//! 3. [`render`] the insertions into an [`AudioBuffer`] and save it.

pub mod buffer;
pub mod error;
pub mod instrument;
pub mod note;
pub mod render;
pub mod sample;
pub mod score;

pub use buffer::AudioBuffer;
pub use error::{Error, Result};
pub use instrument::{Instrument, InstrumentBank};
pub use render::render;
pub use sample::Sample;
pub use score::{Insertion, ScoreParser};

/// Output sample rate in Hz. Timing throughout the crate is in samples at
/// this rate.
pub const SAMPLE_RATE: u32 = 44100;
