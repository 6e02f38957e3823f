//! Note name parsing and standard-tuning frequencies.
//!
//! Note tokens are two or three characters: a letter `A`-`G` (case
//! insensitive), an octave digit, and an optional `#` or `b` accidental that
//! may sit before or after the digit. `C4`, `C#4`, `C4#`, `Cb4` and `C4b`
//! are all accepted. The result is a MIDI note number (60 = middle C).

use crate::error::{Error, Result};

/// Number of entries in the note table.
pub const NOTE_COUNT: usize = 128;

/// Parse a note name into a MIDI note number (0-127).
pub fn name_to_index(name: &str) -> Result<u8> {
    let bytes = name.as_bytes();

    let (letter, digit, accidental) = match bytes.len() {
        2 => (bytes[0], bytes[1], 0i32),
        3 => {
            if bytes[1] == b'#' || bytes[1] == b'b' {
                (bytes[0], bytes[2], accidental_shift(bytes[1]))
            } else if bytes[2] == b'#' || bytes[2] == b'b' {
                (bytes[0], bytes[1], accidental_shift(bytes[2]))
            } else {
                return Err(Error::NoteFormat(name.to_string()));
            }
        }
        _ => return Err(Error::NoteFormat(name.to_string())),
    };

    if !digit.is_ascii_digit() {
        return Err(Error::NoteFormat(name.to_string()));
    }
    let octave = (digit - b'0') as i32;

    let letter_offset = match letter.to_ascii_uppercase() {
        b'C' => 0,
        b'D' => 2,
        b'E' => 4,
        b'F' => 5,
        b'G' => 7,
        b'A' => 9,
        b'B' => 11,
        _ => return Err(Error::NoteFormat(name.to_string())),
    };

    let index = 12 * (octave + 1) + letter_offset + accidental;
    if !(0..NOTE_COUNT as i32).contains(&index) {
        return Err(Error::NoteRange(name.to_string()));
    }

    Ok(index as u8)
}

fn accidental_shift(c: u8) -> i32 {
    if c == b'#' {
        1
    } else {
        -1
    }
}

/// Frequency of a MIDI note in Hz, equal temperament with A4 = 440.
///
/// Only ratios of these values are consumed, for computing stretch factors.
pub fn frequency(note: u8) -> f64 {
    440.0 * 2.0_f64.powf((note as f64 - 69.0) / 12.0)
}
