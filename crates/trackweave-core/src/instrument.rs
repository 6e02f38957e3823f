//! Sampled instruments and the instrument bank.
//!
//! An [`Instrument`] owns a 128-slot note table. Slots filled from the
//! catalog carry a loaded flag; every other note is synthesized on first
//! use by pitch-stretching the nearest loaded sample, and memoized so the
//! stretch runs at most once per note.

use crate::error::{Error, Result};
use crate::note::{self, NOTE_COUNT};
use crate::sample::Sample;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One instrument: recorded samples plus lazily synthesized neighbors.
#[derive(Clone, Debug)]
pub struct Instrument {
    name: String,
    slots: Vec<Option<Sample>>,
    loaded: [bool; NOTE_COUNT],
    ready: bool,
}

impl Instrument {
    /// Create an empty instrument.
    pub fn new(name: impl Into<String>) -> Self {
        Instrument {
            name: name.into(),
            slots: vec![None; NOTE_COUNT],
            loaded: [false; NOTE_COUNT],
            ready: false,
        }
    }

    /// Instrument name as it appears in catalogs and scores.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once at least one recorded sample has been added.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// True if the note was filled from a recording (not synthesized).
    pub fn is_loaded(&self, note: u8) -> bool {
        self.loaded[note as usize]
    }

    /// Add a recorded sample for a note, marking it usable as a reference.
    pub fn add_sample(&mut self, note: u8, sample: Sample) {
        self.slots[note as usize] = Some(sample);
        self.loaded[note as usize] = true;
        self.ready = true;
    }

    /// Resolve a note to a sample, synthesizing and memoizing on a miss.
    ///
    /// The reference is the nearest loaded note by index distance; equal
    /// distances favor the lower (flatter) index. The reference sample is
    /// stretched by `frequency(reference) / frequency(target)`.
    pub fn resolve(&mut self, note: u8) -> Result<&Sample> {
        if !self.ready {
            return Err(Error::InstrumentEmpty(self.name.clone()));
        }

        let idx = note as usize;
        if self.slots[idx].is_none() {
            let no_reference = || Error::NoReferenceNote {
                instrument: self.name.clone(),
                note,
            };
            let reference = self.reference_note(note).ok_or_else(no_reference)?;
            let ratio = note::frequency(reference) / note::frequency(note);
            let stretched = self.slots[reference as usize]
                .as_ref()
                .ok_or_else(no_reference)?
                .stretched_relative(ratio);
            log::debug!(
                "{}: synthesized note {} from reference {} (ratio {:.4})",
                self.name,
                note,
                reference,
                ratio
            );
            self.slots[idx] = Some(stretched);
        }

        self.slots[idx].as_ref().ok_or_else(|| Error::NoReferenceNote {
            instrument: self.name.clone(),
            note,
        })
    }

    /// Symmetric expanding search for the nearest loaded note.
    ///
    /// At each distance the lower index is checked first, so ties go flat.
    fn reference_note(&self, note: u8) -> Option<u8> {
        let mut lo = note as i32;
        let mut hi = note as i32;
        loop {
            lo -= 1;
            hi += 1;
            if lo >= 0 && self.loaded[lo as usize] {
                return Some(lo as u8);
            }
            if hi < NOTE_COUNT as i32 && self.loaded[hi as usize] {
                return Some(hi as u8);
            }
            if lo <= 0 && hi >= NOTE_COUNT as i32 - 1 {
                return None;
            }
        }
    }
}

/// All instruments, keyed by name, built once from the catalog.
#[derive(Clone, Debug, Default)]
pub struct InstrumentBank {
    instruments: HashMap<String, Instrument>,
    default_instrument: Option<String>,
}

impl InstrumentBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bank from a catalog file.
    ///
    /// Each line holds exactly three whitespace-separated fields:
    /// `instrument noteName samplePath`. Lines of any other shape are
    /// silently ignored. Sample paths are resolved relative to the catalog
    /// file. A sample that fails to load is reported and skipped; an
    /// unreadable catalog is an error.
    pub fn from_catalog(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let mut bank = InstrumentBank::new();
        for line in text.lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let &[name, note_name, file] = fields.as_slice() else {
                continue;
            };
            if let Err(e) = bank.register(name, note_name, base.join(file)) {
                log::warn!("couldn't add {} to {}: {}", file, name, e);
            }
        }

        log::info!("loaded {} instrument(s) from {}", bank.len(), path.display());
        Ok(bank)
    }

    /// Load a sample file and store it under `(name, note_name)`.
    ///
    /// The instrument entry (and the bank's default-instrument record) is
    /// created before the sample is decoded, so a failed load still leaves
    /// the name registered - empty until a later line succeeds.
    pub fn register(
        &mut self,
        name: &str,
        note_name: &str,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        if self.default_instrument.is_none() {
            self.default_instrument = Some(name.to_string());
        }
        let instrument = self
            .instruments
            .entry(name.to_string())
            .or_insert_with(|| Instrument::new(name));

        let note = note::name_to_index(note_name)?;
        let sample = Sample::load(path)?;
        instrument.add_sample(note, sample);
        Ok(())
    }

    /// Add a prebuilt instrument to the bank.
    pub fn insert(&mut self, instrument: Instrument) {
        if self.default_instrument.is_none() {
            self.default_instrument = Some(instrument.name().to_string());
        }
        self.instruments
            .insert(instrument.name().to_string(), instrument);
    }

    /// The first instrument named by the catalog, used as the parser's
    /// initial active instrument.
    pub fn default_instrument(&self) -> Option<&str> {
        self.default_instrument.as_deref()
    }

    /// True if the name is a registered instrument.
    pub fn contains(&self, name: &str) -> bool {
        self.instruments.contains_key(name)
    }

    /// Look up an instrument without resolving anything.
    pub fn get(&self, name: &str) -> Option<&Instrument> {
        self.instruments.get(name)
    }

    /// Number of registered instruments.
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    /// True if no instrument has been registered.
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Resolve `(instrument, note)` to a sample via [`Instrument::resolve`].
    pub fn resolve(&mut self, name: &str, note: u8) -> Result<&Sample> {
        match self.instruments.get_mut(name) {
            Some(instrument) => instrument.resolve(note),
            None => Err(Error::InstrumentNotFound(name.to_string())),
        }
    }
}
