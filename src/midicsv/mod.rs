mod export;
mod notes;
mod parser;
mod source;
mod timing;
mod types;

use std::path::Path;

use tracing::warn;

pub use export::{notes_to_string, rows_to_string, write_notes, write_rows, NOTES_HEADER};
pub use notes::pair_notes;
pub use parser::{parse_csv, parse_row, split_fields};
pub use source::{input_kind, load_csv_text, smf_to_csv, Converter, InputKind};
pub use timing::{annotate, tempo_change, Annotated, TempoState, TimeConverter};
pub use types::{
    Conversion, EventRow, MidiCsvError, MidiNote, Note, ParsedCsv, RowError, RowErrorKind, Tick,
    TimedRow, TimingError, TrackId, DEFAULT_TEMPO,
};

use crate::config::Config;

/// Loads midicsv data and times every row
#[derive(Debug, Clone)]
pub struct MidiCsvProcessor {
    converter: Converter,
    default_tempo: u32,
}

impl Default for MidiCsvProcessor {
    fn default() -> Self {
        MidiCsvProcessor {
            converter: Converter::default(),
            default_tempo: DEFAULT_TEMPO,
        }
    }
}

impl MidiCsvProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_converter(converter: Converter) -> Self {
        MidiCsvProcessor {
            converter,
            ..Self::default()
        }
    }

    pub fn from_config(config: &Config) -> Self {
        MidiCsvProcessor {
            converter: config.converter.converter(),
            default_tempo: config.timing.default_tempo,
        }
    }

    /// Tempo in microseconds per quarter note used before the first `Tempo` row
    pub fn with_default_tempo(mut self, tempo: u32) -> Self {
        self.default_tempo = tempo;
        self
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Reads a `.csv` or binary MIDI file and times its rows
    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> Result<Conversion, MidiCsvError> {
        let text = load_csv_text(path.as_ref(), &self.converter)?;
        self.process_csv(&text)
    }

    /// Times the rows of midicsv text
    pub fn process_csv(&self, text: &str) -> Result<Conversion, MidiCsvError> {
        let parsed = parse_csv(text)?;
        let ticks_per_quarter = parsed.ticks_per_quarter.ok_or(MidiCsvError::MissingHeader)?;

        for err in &parsed.errors {
            warn!("Skipping row: {}", err);
        }

        let annotated = annotate(parsed.rows, ticks_per_quarter, self.default_tempo)?;

        let mut skipped = parsed.errors;
        skipped.extend(annotated.skipped);
        skipped.sort_by_key(|err| err.line);

        Ok(Conversion {
            ticks_per_quarter,
            rows: annotated.rows,
            skipped,
        })
    }
}

/// Processes a file with the default settings
pub fn process_file<P: AsRef<Path>>(path: P) -> Result<Conversion, MidiCsvError> {
    MidiCsvProcessor::new().process_file(path)
}

impl Conversion {
    pub fn notes(&self) -> Vec<Note> {
        pair_notes(&self.rows)
    }

    pub fn to_csv(&self, precision: usize) -> String {
        rows_to_string(&self.rows, precision)
    }

    pub fn notes_csv(&self, precision: usize) -> String {
        notes_to_string(&self.notes(), precision)
    }
}
