// Built-in MIDI decoding tests
//
// These tests build small Standard MIDI Files in memory with midly and check
// the midicsv text the built-in decoder renders for them.

use midly::num::{u14, u15, u24, u28, u4, u7};
use midly::{
    Format, Fps, Header, MetaMessage, MidiMessage, PitchBend, Smf, Timing, TrackEvent,
    TrackEventKind,
};

use midicsv_time::midicsv::{smf_to_csv, MidiCsvError, MidiCsvProcessor};

use test_utils::assert_close;

fn event(delta: u32, kind: TrackEventKind<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind,
    }
}

fn note_on(delta: u32, key: u8, vel: u8) -> TrackEvent<'static> {
    event(
        delta,
        TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            },
        },
    )
}

fn to_bytes(smf: &Smf) -> Vec<u8> {
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes).expect("write SMF to memory");
    bytes
}

/// Build a two-track file: a tempo track and a note track.
fn two_track_file() -> Vec<u8> {
    let mut smf = Smf::new(Header::new(Format::Parallel, Timing::Metrical(u15::new(480))));
    smf.tracks.push(vec![
        event(0, TrackEventKind::Meta(MetaMessage::TrackName(b"Tempo \"map\""))),
        event(0, TrackEventKind::Meta(MetaMessage::TimeSignature(3, 2, 24, 8))),
        event(0, TrackEventKind::Meta(MetaMessage::KeySignature(-2, true))),
        event(960, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(250_000)))),
        event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
    ]);
    smf.tracks.push(vec![
        event(
            0,
            TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::ProgramChange {
                    program: u7::new(65),
                },
            },
        ),
        note_on(0, 60, 100),
        note_on(960, 60, 0),
        event(
            0,
            TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::PitchBend {
                    bend: PitchBend(u14::new(8192)),
                },
            },
        ),
        note_on(0, 62, 100),
        event(
            480,
            TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::NoteOff {
                    key: u7::new(62),
                    vel: u7::new(64),
                },
            },
        ),
        event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
    ]);
    to_bytes(&smf)
}

/// Test the rendered midicsv text.
///
/// This test verifies:
/// - The header carries format, track count and resolution
/// - Tracks are numbered from 1 with absolute ticks
/// - Meta and channel events use midicsv's names and field order
/// - Quotes in text events are doubled
#[test]
fn test_smf_to_csv_rows() {
    let csv = smf_to_csv(&two_track_file()).expect("decode SMF");
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(
        lines,
        vec![
            "0, 0, Header, 1, 2, 480",
            "1, 0, Start_track",
            "1, 0, Title_t, \"Tempo \"\"map\"\"\"",
            "1, 0, Time_signature, 3, 2, 24, 8",
            "1, 0, Key_signature, -2, \"minor\"",
            "1, 960, Tempo, 250000",
            "1, 960, End_track",
            "2, 0, Start_track",
            "2, 0, Program_c, 0, 65",
            "2, 0, Note_on_c, 0, 60, 100",
            "2, 960, Note_on_c, 0, 60, 0",
            "2, 960, Pitch_bend_c, 0, 8192",
            "2, 960, Note_on_c, 0, 62, 100",
            "2, 1440, Note_off_c, 0, 62, 64",
            "2, 1440, End_track",
            "0, 0, End_of_file",
        ]
    );
}

/// Test timing of decoded text.
///
/// This test verifies:
/// - The note in track 2 after the tempo change in track 1 uses the new tempo
#[test]
fn test_decoded_file_timing() {
    let csv = smf_to_csv(&two_track_file()).expect("decode SMF");
    let conversion = MidiCsvProcessor::new()
        .process_csv(&csv)
        .expect("Failed to process decoded CSV");

    let notes = conversion.notes();
    assert_eq!(notes.len(), 2);
    assert_close(notes[0].dur_secs, 1.0);
    assert_close(notes[1].start_secs, 1.0);
    // 480 ticks at 240 BPM
    assert_close(notes[1].dur_secs, 0.25);
}

/// Test that SMPTE timing is rejected.
#[test]
fn test_timecode_files_rejected() {
    let mut smf = Smf::new(Header::new(Format::SingleTrack, Timing::Timecode(Fps::Fps25, 40)));
    smf.tracks.push(vec![event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack))]);

    assert!(matches!(
        smf_to_csv(&to_bytes(&smf)),
        Err(MidiCsvError::UnsupportedTiming)
    ));
}

/// Test that bytes which aren't a MIDI file are a parse error.
#[test]
fn test_garbage_is_parse_error() {
    assert!(matches!(
        smf_to_csv(b"definitely not a midi file"),
        Err(MidiCsvError::MidiParse(_))
    ));
}
