use std::collections::{HashMap, VecDeque};

use tracing::debug;

use super::types::{MidiNote, Note, TimedRow, TrackId, NOTE_OFF, NOTE_ON};

type NoteKey = (TrackId, u8, MidiNote);

enum NoteEdge {
    On { key: NoteKey, velocity: u8 },
    Off { key: NoteKey },
}

/// Pairs note-on rows with their note-off rows.
///
/// A note-off (or a note-on with velocity 0) ends the oldest sounding note
/// with the same track, channel and pitch that started on an earlier tick.
/// Notes that never end are dropped. The result is ordered by start tick,
/// then track.
pub fn pair_notes(rows: &[TimedRow]) -> Vec<Note> {
    let mut sounding: HashMap<NoteKey, VecDeque<(&TimedRow, u8)>> = HashMap::new();
    let mut notes = Vec::new();

    for timed in rows {
        match note_edge(timed) {
            Some(NoteEdge::On { key, velocity }) => {
                sounding.entry(key).or_default().push_back((timed, velocity));
            }
            Some(NoteEdge::Off { key }) => {
                let Some(queue) = sounding.get_mut(&key) else {
                    continue;
                };
                let Some(position) = queue.iter().position(|(on, _)| on.row.tick < timed.row.tick)
                else {
                    continue;
                };
                if let Some((on, velocity)) = queue.remove(position) {
                    notes.push(Note {
                        track: key.0,
                        channel: key.1,
                        pitch: key.2,
                        velocity,
                        start_ticks: on.row.tick,
                        start_secs: on.seconds,
                        dur_ticks: timed.row.tick - on.row.tick,
                        dur_secs: timed.seconds - on.seconds,
                    });
                }
            }
            None => {}
        }
    }

    let unfinished: usize = sounding.values().map(VecDeque::len).sum();
    if unfinished > 0 {
        debug!("Dropping {} notes without a matching note off", unfinished);
    }

    notes.sort_by_key(|note| (note.start_ticks, note.track));
    notes
}

fn note_edge(timed: &TimedRow) -> Option<NoteEdge> {
    let row = &timed.row;
    let is_on = row.event_type == NOTE_ON;
    if !is_on && row.event_type != NOTE_OFF {
        return None;
    }

    let channel = row.numeric_param::<u8>(0);
    let pitch = row.numeric_param::<MidiNote>(1);
    let velocity = row.numeric_param::<u8>(2);
    let (Some(channel), Some(pitch), Some(velocity)) = (channel, pitch, velocity) else {
        debug!("line {}: ignoring unreadable {} row", row.line, row.event_type);
        return None;
    };

    let key = (row.track, channel, pitch);
    if is_on && velocity > 0 {
        Some(NoteEdge::On { key, velocity })
    } else {
        Some(NoteEdge::Off { key })
    }
}
