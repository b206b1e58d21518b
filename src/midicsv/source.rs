use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use tracing::info;

use super::types::MidiCsvError;

/// How an input file gets turned into midicsv text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Csv,
    Midi,
}

/// Where binary MIDI files are converted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Converter {
    /// Run an external program that prints midicsv text for the given path
    External(String),
    /// Decode in process with midly
    Builtin,
}

impl Default for Converter {
    fn default() -> Self {
        Converter::External("midicsv".to_string())
    }
}

pub fn input_kind(path: &Path) -> Result<InputKind, MidiCsvError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => Ok(InputKind::Csv),
        "mid" | "midi" | "kar" => Ok(InputKind::Midi),
        _ => Err(MidiCsvError::UnsupportedExtension(extension)),
    }
}

/// Reads `path` as midicsv text, converting binary MIDI files first
pub fn load_csv_text(path: &Path, converter: &Converter) -> Result<String, MidiCsvError> {
    if !path.exists() {
        return Err(MidiCsvError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Input file not found: {}", path.display()),
        )));
    }

    match input_kind(path)? {
        InputKind::Csv => {
            info!("File: {}", path.display());
            Ok(decode_text(fs::read(path)?))
        }
        InputKind::Midi => match converter {
            Converter::External(command) => {
                info!("File: {} (via {})", path.display(), command);
                run_external(command, path)
            }
            Converter::Builtin => {
                info!("File: {} (built-in decoder)", path.display());
                smf_to_csv(&fs::read(path)?)
            }
        },
    }
}

fn run_external(command: &str, path: &Path) -> Result<String, MidiCsvError> {
    let output = Command::new(command).arg(path).output().map_err(|source| {
        MidiCsvError::ConverterUnavailable {
            command: command.to_string(),
            source,
        }
    })?;

    if !output.status.success() {
        let stderr = decode_text(output.stderr);
        return Err(MidiCsvError::ConverterFailed {
            command: command.to_string(),
            status: format!("{} {}", output.status, stderr.trim()).trim().to_string(),
        });
    }

    Ok(decode_text(output.stdout))
}

/// UTF-8 if possible, otherwise ISO-8859-1 with one char per byte
fn decode_text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|err| latin1(err.as_bytes()))
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Renders a Standard MIDI File as midicsv text.
///
/// Covers the header, track framing, tempo, time and key signatures, channel
/// messages and the common text events. Other events are left out since they
/// carry nothing needed for timing.
pub fn smf_to_csv(midi_data: &[u8]) -> Result<String, MidiCsvError> {
    let smf = Smf::parse(midi_data)?;

    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(ticks) => ticks.as_int(),
        Timing::Timecode(..) => return Err(MidiCsvError::UnsupportedTiming),
    };
    let format = match smf.header.format {
        Format::SingleTrack => 0,
        Format::Parallel => 1,
        Format::Sequential => 2,
    };

    let mut csv = String::new();
    // Writing to a String can't fail
    let _ = writeln!(
        csv,
        "0, 0, Header, {}, {}, {}",
        format,
        smf.tracks.len(),
        ticks_per_quarter
    );

    for (index, track) in smf.tracks.iter().enumerate() {
        let number = index + 1;
        let mut tick: u64 = 0;
        let mut ended = false;
        let _ = writeln!(csv, "{}, 0, Start_track", number);

        for event in track {
            tick += u64::from(event.delta.as_int());
            let body = match event.kind {
                TrackEventKind::Midi { channel, message } => {
                    Some(midi_message(channel.as_int(), message))
                }
                TrackEventKind::Meta(MetaMessage::EndOfTrack) => {
                    ended = true;
                    Some("End_track".to_string())
                }
                TrackEventKind::Meta(meta) => meta_message(meta),
                _ => None,
            };
            if let Some(body) = body {
                let _ = writeln!(csv, "{}, {}, {}", number, tick, body);
            }
        }

        if !ended {
            let _ = writeln!(csv, "{}, {}, End_track", number, tick);
        }
    }

    csv.push_str("0, 0, End_of_file\n");
    Ok(csv)
}

fn midi_message(channel: u8, message: MidiMessage) -> String {
    match message {
        MidiMessage::NoteOn { key, vel } => {
            format!("Note_on_c, {}, {}, {}", channel, key.as_int(), vel.as_int())
        }
        MidiMessage::NoteOff { key, vel } => {
            format!("Note_off_c, {}, {}, {}", channel, key.as_int(), vel.as_int())
        }
        MidiMessage::Aftertouch { key, vel } => {
            format!("Poly_aftertouch_c, {}, {}, {}", channel, key.as_int(), vel.as_int())
        }
        MidiMessage::Controller { controller, value } => {
            format!("Control_c, {}, {}, {}", channel, controller.as_int(), value.as_int())
        }
        MidiMessage::ProgramChange { program } => {
            format!("Program_c, {}, {}", channel, program.as_int())
        }
        MidiMessage::ChannelAftertouch { vel } => {
            format!("Channel_aftertouch_c, {}, {}", channel, vel.as_int())
        }
        MidiMessage::PitchBend { bend } => {
            format!("Pitch_bend_c, {}, {}", channel, bend.0.as_int())
        }
    }
}

fn meta_message(meta: MetaMessage) -> Option<String> {
    let text = |tag: &str, bytes: &[u8]| format!("{}, {}", tag, quote(bytes));

    match meta {
        MetaMessage::Tempo(tempo) => Some(format!("Tempo, {}", tempo.as_int())),
        MetaMessage::TimeSignature(numerator, denominator, clocks, notes) => Some(format!(
            "Time_signature, {}, {}, {}, {}",
            numerator, denominator, clocks, notes
        )),
        MetaMessage::KeySignature(key, minor) => Some(format!(
            "Key_signature, {}, \"{}\"",
            key,
            if minor { "minor" } else { "major" }
        )),
        MetaMessage::Text(bytes) => Some(text("Text_t", bytes)),
        MetaMessage::Copyright(bytes) => Some(text("Copyright_t", bytes)),
        MetaMessage::TrackName(bytes) => Some(text("Title_t", bytes)),
        MetaMessage::InstrumentName(bytes) => Some(text("Instrument_name_t", bytes)),
        MetaMessage::Lyric(bytes) => Some(text("Lyric_t", bytes)),
        MetaMessage::Marker(bytes) => Some(text("Marker_t", bytes)),
        MetaMessage::CuePoint(bytes) => Some(text("Cue_point_t", bytes)),
        _ => None,
    }
}

fn quote(bytes: &[u8]) -> String {
    format!("\"{}\"", latin1(bytes).replace('"', "\"\""))
}
