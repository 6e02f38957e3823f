//! Sizing the output buffer and mixing resolved insertions into it.

use crate::buffer::AudioBuffer;
use crate::error::{Error, Result};
use crate::instrument::InstrumentBank;
use crate::note;
use crate::score::Insertion;
use crate::SAMPLE_RATE;

/// Trailing silence after the last insertion, in samples (five seconds).
///
/// Insertion lengths are deliberately not considered when sizing: `l:` can
/// be far longer than any actual note.
pub const GRACE_PERIOD: usize = 5 * SAMPLE_RATE as usize;

/// Global fade applied over the tail of the mix (one second).
pub const FINAL_FADE: usize = SAMPLE_RATE as usize;

/// Mix all insertions into a freshly allocated buffer.
///
/// The buffer spans the latest insertion timing plus [`GRACE_PERIOD`];
/// with no insertions at all there is nothing to size, which is an error.
/// Insertions that cannot be resolved (unknown or empty instrument, bad
/// note name) are reported and skipped; every other insertion renders
/// normally. Placement order is immaterial: mixing is purely additive.
pub fn render(bank: &mut InstrumentBank, insertions: &[Insertion]) -> Result<AudioBuffer> {
    let last = insertions
        .iter()
        .map(|ins| ins.timing)
        .max()
        .ok_or(Error::NothingToRender)?;

    let mut buffer = AudioBuffer::new(last + GRACE_PERIOD);
    log::info!(
        "rendering {} insertion(s) into {} samples",
        insertions.len(),
        buffer.frame_count()
    );

    for ins in insertions {
        if let Err(e) = place(&mut buffer, bank, ins) {
            log::warn!(
                "skipping insertion of {} {}: {}",
                ins.instrument,
                ins.note,
                e
            );
        }
    }

    buffer.fade_samples(FINAL_FADE);
    Ok(buffer)
}

fn place(buffer: &mut AudioBuffer, bank: &mut InstrumentBank, ins: &Insertion) -> Result<()> {
    let note = note::name_to_index(&ins.note)?;
    let sample = bank.resolve(&ins.instrument, note)?;
    buffer.add(ins.timing, sample, 0, ins.length, ins.volume, ins.fadeout);
    Ok(())
}
