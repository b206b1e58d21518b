use std::io::{self, Write};

use super::types::{Note, TimedRow};

pub const NOTES_HEADER: &str =
    "start_ticks,start_secs,dur_ticks,dur_secs,pitch,fullNoteOctave,velocity,part";

/// Writes each row as it was read, with its time in seconds appended
pub fn write_rows<W: Write>(rows: &[TimedRow], precision: usize, writer: &mut W) -> io::Result<()> {
    for timed in rows {
        writeln!(writer, "{}, {:.*}", timed.row.raw, precision, timed.seconds)?;
    }
    writer.flush()
}

pub fn write_notes<W: Write>(notes: &[Note], precision: usize, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "{}", NOTES_HEADER)?;
    for note in notes {
        writeln!(
            writer,
            "{},{:.*},{},{:.*},{},{},{},{}",
            note.start_ticks,
            precision,
            note.start_secs,
            note.dur_ticks,
            precision,
            note.dur_secs,
            note.pitch,
            note.full_note_octave(),
            note.velocity,
            note.track
        )?;
    }
    writer.flush()
}

pub fn rows_to_string(rows: &[TimedRow], precision: usize) -> String {
    let mut buffer = Vec::new();
    // Writing to a Vec can't fail
    let _ = write_rows(rows, precision, &mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn notes_to_string(notes: &[Note], precision: usize) -> String {
    let mut buffer = Vec::new();
    let _ = write_notes(notes, precision, &mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}
