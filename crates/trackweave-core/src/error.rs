//! Error types for the Trackweave core library.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while loading instruments, parsing scores and rendering.
///
/// Recoverable conditions (bad tokens in a score, unresolvable insertions)
/// are reported as diagnostics and never surface here; this enum covers the
/// failures a caller has to act on.
#[derive(Error, Debug)]
pub enum Error {
    /// Input/output error while reading a catalog or score file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A note token did not match the `C4` / `C#4` / `Cb4` grammar.
    #[error("invalid note format: \"{0}\"")]
    NoteFormat(String),

    /// A note token parsed but fell outside the 0-127 table.
    #[error("note \"{0}\" is outside the range 0-127")]
    NoteRange(String),

    /// A sample file could not be decoded.
    #[error("failed to load sample {path}: {source}")]
    SampleLoad {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    /// A sample file had a channel layout we cannot place.
    #[error("unsupported channel count {channels} in {path}")]
    UnsupportedChannels { path: PathBuf, channels: u16 },

    /// The rendered buffer could not be written.
    #[error("failed to write {path}: {source}")]
    WavWrite {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    /// An insertion referenced an instrument the catalog never defined.
    #[error("unknown instrument \"{0}\"")]
    InstrumentNotFound(String),

    /// An insertion referenced an instrument with no samples loaded.
    #[error("instrument \"{0}\" has no samples loaded")]
    InstrumentEmpty(String),

    /// No loaded sample was found while synthesizing a note. Unreachable for
    /// a ready instrument; seeing this means the bank is corrupted.
    #[error("no reference note found for instrument \"{instrument}\" note {note}")]
    NoReferenceNote { instrument: String, note: u8 },

    /// The scores produced no insertions, so there is no output to size.
    #[error("nothing to render: the scores produced no insertions")]
    NothingToRender,
}
