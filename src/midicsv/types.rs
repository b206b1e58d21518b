use std::fmt;
use std::io;

pub type Tick = u64;
pub type TrackId = u32;
pub type MidiNote = u8;

/// Tempo used until the first `Tempo` row (120 BPM)
pub const DEFAULT_TEMPO: u32 = 500_000;

pub const HEADER: &str = "Header";
pub const TEMPO: &str = "Tempo";
pub const NOTE_ON: &str = "Note_on_c";
pub const NOTE_OFF: &str = "Note_off_c";

/// One record of midicsv output
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    /// 1-based line number in the source text
    pub line: usize,
    pub track: TrackId,
    /// Absolute tick from the start of the track
    pub tick: Tick,
    pub event_type: String,
    /// Remaining fields, trimmed, with quoted strings unescaped
    pub params: Vec<String>,
    /// The row exactly as it appeared in the input
    pub raw: String,
}

impl EventRow {
    pub fn is_tempo(&self) -> bool {
        self.event_type == TEMPO
    }

    pub fn is_header(&self) -> bool {
        self.event_type == HEADER
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Parses the parameter at `index` as a number, `None` if absent or malformed
    pub fn numeric_param<T: std::str::FromStr>(&self, index: usize) -> Option<T> {
        self.param(index).and_then(|p| p.parse().ok())
    }
}

/// An event row annotated with its absolute time
#[derive(Debug, Clone, PartialEq)]
pub struct TimedRow {
    pub row: EventRow,
    pub seconds: f64,
}

/// Result of splitting midicsv text into rows
#[derive(Debug, Default)]
pub struct ParsedCsv {
    /// Ticks per quarter note from the first `Header` row
    pub ticks_per_quarter: Option<u32>,
    pub rows: Vec<EventRow>,
    pub errors: Vec<RowError>,
}

/// A note assembled from a note-on/note-off pair
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub track: TrackId,
    pub channel: u8,
    pub pitch: MidiNote,
    pub velocity: u8,
    pub start_ticks: Tick,
    pub start_secs: f64,
    pub dur_ticks: Tick,
    pub dur_secs: f64,
}

const NOTE_LETTERS: [&str; 12] = ["C", "C", "D", "D", "E", "F", "F", "G", "G", "A", "A", "B"];
const SHARPS: [&str; 12] = ["", "#", "", "#", "", "", "#", "", "#", "", "#", ""];

impl Note {
    pub fn octave(&self) -> i32 {
        (self.pitch / 12) as i32 - 1
    }

    /// Letter, octave and sharp sign, e.g. `C4#` for pitch 61
    pub fn full_note_octave(&self) -> String {
        let class = (self.pitch % 12) as usize;
        format!("{}{}{}", NOTE_LETTERS[class], self.octave(), SHARPS[class])
    }
}

/// Everything produced from one input file
#[derive(Debug)]
pub struct Conversion {
    pub ticks_per_quarter: u32,
    /// Rows in their original order
    pub rows: Vec<TimedRow>,
    /// Rows that were skipped
    pub skipped: Vec<RowError>,
}

/// Fatal errors for a whole run
#[derive(Debug, thiserror::Error)]
pub enum MidiCsvError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("MIDI parsing error: {0}")]
    MidiParse(#[from] midly::Error),

    #[error("File with extension '{0}' not supported, use .mid, .midi, .kar or .csv")]
    UnsupportedExtension(String),

    #[error("Could not run converter '{command}': {source}")]
    ConverterUnavailable {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Converter '{command}' failed: {status}")]
    ConverterFailed { command: String, status: String },

    #[error("No Header row found in input")]
    MissingHeader,

    #[error("Invalid ticks per quarter note in header: {0}")]
    InvalidDivision(String),

    #[error("Unsupported timing format: only metrical (ticks per quarter note) files can be converted")]
    UnsupportedTiming,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timing error: {0}")]
    Timing(#[from] TimingError),
}

/// Errors raised by the tempo accumulator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimingError {
    #[error("tick {tick} precedes the last tempo change at tick {last_change}")]
    TickBeforeTempoChange { tick: Tick, last_change: Tick },
}

/// A single row that was reported and skipped
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct RowError {
    pub line: usize,
    pub kind: RowErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowErrorKind {
    TooFewFields(usize),
    InvalidTrack(String),
    InvalidTick(String),
    InvalidTempo(String),
}

impl fmt::Display for RowErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowErrorKind::TooFewFields(count) => {
                write!(f, "expected at least 3 fields, found {}", count)
            }
            RowErrorKind::InvalidTrack(value) => write!(f, "invalid track '{}'", value),
            RowErrorKind::InvalidTick(value) => write!(f, "invalid tick '{}'", value),
            RowErrorKind::InvalidTempo(value) => write!(f, "invalid tempo '{}'", value),
        }
    }
}
