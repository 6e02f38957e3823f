//! Score parsing and timeline building.
//!
//! A score is plain text processed line by line. Each line advances a
//! cursor by the current jump value; note tokens on a line become timed
//! [`Insertion`]s at the cursor. Settings (`j:`, `o:`, `d:`, `v:`, `l:`,
//! `f:`) mutate the parser state, instrument names switch the active
//! instrument, and a single level of `( ... )` brackets scopes changes to
//! the current line. Comments start with `//`.
//!
//! Bad tokens are diagnostics, never errors: the parser reports them with
//! their line number and keeps going.

use crate::instrument::InstrumentBank;
use crate::note;
use rand::rngs::ThreadRng;
use rand::Rng;

/// Samples the cursor advances per line until a `j:` setting applies
/// (a quarter second at 44.1 kHz).
pub const DEFAULT_JUMP: usize = 11025;

/// Default tail fadeout of each placed note, in samples.
pub const DEFAULT_FADEOUT: usize = 100;

/// A timed request to place one note of one instrument into the mix.
///
/// Immutable once emitted. The instrument is referenced by name and
/// resolved at render time.
#[derive(Clone, Debug, PartialEq)]
pub struct Insertion {
    /// Instrument name, looked up in the bank when rendering.
    pub instrument: String,
    /// Note name exactly as written in the score.
    pub note: String,
    /// Placement in samples from the start of the output.
    pub timing: usize,
    /// Volume multiplier (1.0 = as recorded).
    pub volume: f32,
    /// How many frames of the resolved sample to copy; `None` = all.
    pub length: Option<usize>,
    /// Tail fadeout of the copied span, in samples.
    pub fadeout: usize,
}

/// Mutable parser state; one per score file, plus a transient scratch copy
/// while inside a bracket scope.
#[derive(Clone, Debug)]
struct ParserState {
    line: u32,
    position: usize,
    jump: usize,
    instrument: String,
    volume: f32,
    drunk: i64,
    offset: usize,
    length: Option<usize>,
    fadeout: usize,
}

impl ParserState {
    fn initial(instrument: Option<&str>) -> Self {
        ParserState {
            line: 0,
            position: 0,
            jump: DEFAULT_JUMP,
            instrument: instrument.unwrap_or_default().to_string(),
            volume: 1.0,
            drunk: 0,
            offset: 0,
            length: None,
            fadeout: DEFAULT_FADEOUT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SettingKind {
    Jump,
    Offset,
    Jitter,
    Volume,
    Length,
    Fadeout,
}

/// Lexical classification of one token, done before any state changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token<'t> {
    BracketOpen,
    BracketClose,
    Instrument(&'t str),
    Setting(SettingKind, &'t str),
    Note(&'t str),
    Unknown(&'t str),
}

/// Classify a token. Precedence: brackets, then registered instrument
/// names, then settings, then note names; everything else is unknown.
fn classify<'t>(token: &'t str, bank: &InstrumentBank) -> Token<'t> {
    match token {
        "(" => return Token::BracketOpen,
        ")" => return Token::BracketClose,
        _ => {}
    }
    if bank.contains(token) {
        return Token::Instrument(token);
    }
    const SETTINGS: [(&str, SettingKind); 6] = [
        ("j:", SettingKind::Jump),
        ("o:", SettingKind::Offset),
        ("d:", SettingKind::Jitter),
        ("v:", SettingKind::Volume),
        ("l:", SettingKind::Length),
        ("f:", SettingKind::Fadeout),
    ];
    for (prefix, kind) in SETTINGS {
        if let Some(value) = token.strip_prefix(prefix) {
            return Token::Setting(kind, value);
        }
    }
    if note::name_to_index(token).is_ok() {
        return Token::Note(token);
    }
    Token::Unknown(token)
}

/// Builds a timeline of insertions from score text.
pub struct ScoreParser<'a, R: Rng> {
    bank: &'a InstrumentBank,
    state: ParserState,
    rng: R,
    insertions: Vec<Insertion>,
}

impl<'a> ScoreParser<'a, ThreadRng> {
    /// Create a parser with initial state: the bank's default instrument,
    /// volume 1.0, the default jump and fadeout, no jitter or offset,
    /// unbounded copy length.
    pub fn new(bank: &'a InstrumentBank) -> Self {
        Self::with_rng(bank, rand::rng())
    }
}

impl<'a, R: Rng> ScoreParser<'a, R> {
    /// Like [`ScoreParser::new`] with a caller-supplied RNG for the jitter
    /// draws.
    pub fn with_rng(bank: &'a InstrumentBank, rng: R) -> Self {
        ScoreParser {
            bank,
            state: ParserState::initial(bank.default_instrument()),
            rng,
            insertions: Vec::new(),
        }
    }

    /// Feed a whole score, line by line.
    pub fn feed(&mut self, text: &str) {
        for line in text.lines() {
            self.feed_line(line);
        }
    }

    /// Process one score line.
    ///
    /// Whatever happens on the line, it ends by advancing the outer state:
    /// `line += 1; position += jump`. An unclosed bracket's scratch state
    /// dies with the line.
    pub fn feed_line(&mut self, line: &str) {
        let text = match line.find("//") {
            Some(i) => &line[..i],
            None => line,
        };
        // Brackets are significant even when glued to other tokens.
        let text = text.replace('(', " ( ").replace(')', " ) ");

        let mut scope: Option<ParserState> = None;

        for raw in text.split_whitespace() {
            match classify(raw, self.bank) {
                Token::BracketOpen => {
                    // One level only; a second open inside a scope is a no-op.
                    if scope.is_none() {
                        scope = Some(self.state.clone());
                    }
                }
                Token::BracketClose => {
                    if scope.is_some() {
                        // Scratch edits are dropped, never merged back.
                        scope = None;
                    } else {
                        log::warn!("line {}: unknown token \"{}\"", self.state.line, raw);
                    }
                }
                Token::Instrument(name) => {
                    let state = scope.as_mut().unwrap_or(&mut self.state);
                    state.instrument = name.to_string();
                }
                Token::Setting(kind, value) => {
                    let line_no = self.state.line;
                    let state = scope.as_mut().unwrap_or(&mut self.state);
                    if !apply_setting(state, kind, value) {
                        log::warn!("line {}: bad token \"{}\"", line_no, raw);
                    }
                }
                Token::Note(name) => {
                    let bound = scope.as_ref().unwrap_or(&self.state).drunk;
                    let jitter = jitter_below(&mut self.rng, bound);
                    let state = scope.as_ref().unwrap_or(&self.state);
                    let insertion = Insertion {
                        instrument: state.instrument.clone(),
                        note: name.to_string(),
                        timing: state.position + jitter + state.offset,
                        volume: state.volume,
                        length: state.length,
                        fadeout: state.fadeout,
                    };
                    self.insertions.push(insertion);
                }
                Token::Unknown(token) => {
                    log::warn!("line {}: unknown token \"{}\"", self.state.line, token);
                }
            }
        }

        self.state.line += 1;
        self.state.position += self.state.jump;
    }

    /// Current cursor position in samples.
    pub fn position(&self) -> usize {
        self.state.position
    }

    /// Insertions emitted so far.
    pub fn insertions(&self) -> &[Insertion] {
        &self.insertions
    }

    /// Consume the parser, returning the timeline.
    pub fn into_insertions(self) -> Vec<Insertion> {
        self.insertions
    }
}

/// Apply a setting's payload to the state; false means the payload did not
/// parse and the setting is unchanged.
fn apply_setting(state: &mut ParserState, kind: SettingKind, value: &str) -> bool {
    match kind {
        SettingKind::Jump => parse_into(value, &mut state.jump),
        SettingKind::Offset => parse_into(value, &mut state.offset),
        SettingKind::Jitter => parse_into(value, &mut state.drunk),
        SettingKind::Volume => parse_into(value, &mut state.volume),
        SettingKind::Fadeout => parse_into(value, &mut state.fadeout),
        SettingKind::Length => match value.parse() {
            Ok(v) => {
                state.length = Some(v);
                true
            }
            Err(_) => false,
        },
    }
}

fn parse_into<T: std::str::FromStr>(value: &str, slot: &mut T) -> bool {
    match value.parse() {
        Ok(v) => {
            *slot = v;
            true
        }
        Err(_) => false,
    }
}

/// Uniform draw in `[0, bound)`, or 0 for a non-positive bound.
fn jitter_below(rng: &mut impl Rng, bound: i64) -> usize {
    if bound <= 0 {
        0
    } else {
        rng.random_range(0..bound) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::{Instrument, InstrumentBank};
    use crate::sample::Sample;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_bank() -> InstrumentBank {
        let mut bank = InstrumentBank::new();
        for name in ["piano", "cello"] {
            let mut instrument = Instrument::new(name);
            instrument.add_sample(60, Sample::from_frames(vec![0.5; 100], vec![0.5; 100]));
            bank.insert(instrument);
        }
        bank
    }

    fn parser(bank: &InstrumentBank) -> ScoreParser<'_, StdRng> {
        ScoreParser::with_rng(bank, StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_classify_precedence() {
        let mut bank = test_bank();
        assert_eq!(classify("(", &bank), Token::BracketOpen);
        assert_eq!(classify(")", &bank), Token::BracketClose);
        assert_eq!(classify("piano", &bank), Token::Instrument("piano"));
        assert_eq!(
            classify("j:5000", &bank),
            Token::Setting(SettingKind::Jump, "5000")
        );
        assert_eq!(classify("C4", &bank), Token::Note("C4"));
        assert_eq!(classify("xyzzy", &bank), Token::Unknown("xyzzy"));
        // A registered instrument name shadows a note name.
        bank.insert(Instrument::new("C4"));
        assert_eq!(classify("C4", &bank), Token::Instrument("C4"));
    }

    #[test]
    fn test_notes_emit_insertions_at_line_position() {
        let bank = test_bank();
        let mut p = parser(&bank);
        p.feed_line("C4 D4");
        let inserts = p.insertions();
        assert_eq!(inserts.len(), 2);
        assert_eq!(inserts[0].note, "C4");
        assert_eq!(inserts[1].note, "D4");
        for ins in inserts {
            assert_eq!(ins.instrument, "piano");
            assert_eq!(ins.timing, 0);
            assert_eq!(ins.volume, 1.0);
            assert_eq!(ins.length, None);
            assert_eq!(ins.fadeout, DEFAULT_FADEOUT);
        }
    }

    #[test]
    fn test_cursor_sums_jump_in_effect_per_line() {
        let bank = test_bank();
        let mut p = parser(&bank);
        p.feed_line(""); // advances by the default jump
        p.feed_line("j:100"); // new jump applies to this line's advance
        p.feed_line("");
        assert_eq!(p.position(), DEFAULT_JUMP + 100 + 100);
    }

    #[test]
    fn test_jitter_and_offset_never_move_cursor() {
        let bank = test_bank();
        let mut p = parser(&bank);
        p.feed_line("o:500 d:0 C4");
        assert_eq!(p.insertions()[0].timing, 500);
        assert_eq!(p.position(), DEFAULT_JUMP);
    }

    #[test]
    fn test_jitter_draws_below_bound() {
        let bank = test_bank();
        let mut p = parser(&bank);
        for _ in 0..50 {
            p.feed_line("j:0 d:100 C4");
        }
        for ins in p.insertions() {
            assert!(ins.timing < 100, "timing {} out of jitter range", ins.timing);
        }
    }

    #[test]
    fn test_negative_jitter_bound_means_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(jitter_below(&mut rng, -5), 0);
        assert_eq!(jitter_below(&mut rng, 0), 0);
        assert_eq!(jitter_below(&mut rng, 1), 0);
    }

    #[test]
    fn test_bracket_scope_discards_changes() {
        let bank = test_bank();
        let mut p = parser(&bank);
        p.feed_line("v:0.5 ( v:1.0 C4 ) D4");
        let inserts = p.insertions();
        assert_eq!(inserts[0].volume, 1.0);
        assert_eq!(inserts[1].volume, 0.5);
    }

    #[test]
    fn test_unclosed_bracket_discarded_at_line_end() {
        let bank = test_bank();
        let mut p = parser(&bank);
        p.feed_line("v:0.5 ( v:1.0 C4");
        p.feed_line("D4");
        let inserts = p.insertions();
        assert_eq!(inserts[0].volume, 1.0);
        assert_eq!(inserts[1].volume, 0.5);
    }

    #[test]
    fn test_second_open_bracket_is_noop() {
        let bank = test_bank();
        let mut p = parser(&bank);
        p.feed_line("( v:0.3 ( C4 ) D4");
        let inserts = p.insertions();
        assert_eq!(inserts[0].volume, 0.3);
        assert_eq!(inserts[1].volume, 1.0);
    }

    #[test]
    fn test_brackets_tokenize_without_spaces() {
        let bank = test_bank();
        let mut p = parser(&bank);
        p.feed_line("(v:0.5 C4)D4");
        let inserts = p.insertions();
        assert_eq!(inserts.len(), 2);
        assert_eq!(inserts[0].volume, 0.5);
        assert_eq!(inserts[1].volume, 1.0);
    }

    #[test]
    fn test_comment_stripped() {
        let bank = test_bank();
        let mut p = parser(&bank);
        p.feed_line("C4 // D4 E4");
        assert_eq!(p.insertions().len(), 1);
    }

    #[test]
    fn test_malformed_setting_keeps_previous_value() {
        let bank = test_bank();
        let mut p = parser(&bank);
        p.feed_line("v:loud C4");
        assert_eq!(p.insertions()[0].volume, 1.0);
    }

    #[test]
    fn test_unknown_token_changes_nothing() {
        let bank = test_bank();
        let mut p = parser(&bank);
        p.feed_line("xyzzy C4");
        let inserts = p.insertions();
        assert_eq!(inserts.len(), 1);
        assert_eq!(inserts[0].volume, 1.0);
        assert_eq!(inserts[0].timing, 0);
    }

    #[test]
    fn test_instrument_switch_persists_across_lines() {
        let bank = test_bank();
        let mut p = parser(&bank);
        p.feed_line("cello C4");
        p.feed_line("D4");
        let inserts = p.insertions();
        assert_eq!(inserts[0].instrument, "cello");
        assert_eq!(inserts[1].instrument, "cello");
    }

    #[test]
    fn test_instrument_switch_inside_scope_does_not_leak() {
        let bank = test_bank();
        let mut p = parser(&bank);
        p.feed_line("( cello C4 ) D4");
        let inserts = p.insertions();
        assert_eq!(inserts[0].instrument, "cello");
        assert_eq!(inserts[1].instrument, "piano");
    }

    #[test]
    fn test_length_and_fadeout_settings() {
        let bank = test_bank();
        let mut p = parser(&bank);
        p.feed_line("l:500 f:32 C4");
        let ins = &p.insertions()[0];
        assert_eq!(ins.length, Some(500));
        assert_eq!(ins.fadeout, 32);
    }

    #[test]
    fn test_empty_bank_leaves_instrument_unset() {
        let bank = InstrumentBank::new();
        let mut p = parser(&bank);
        p.feed_line("C4");
        assert_eq!(p.insertions()[0].instrument, "");
    }
}
