use std::collections::HashMap;

use tracing::{debug, warn};

use super::types::{
    EventRow, MidiCsvError, RowError, RowErrorKind, Tick, TimedRow, TimingError, TrackId,
    DEFAULT_TEMPO,
};

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// The active tempo and the elapsed time at which it took effect.
///
/// Elapsed time is kept as an exact count of `1 / (1_000_000 * ticks_per_quarter)`
/// second units so that long files with many tempo changes don't drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoState {
    ticks_per_quarter: u32,
    /// Microseconds per quarter note
    tempo: u32,
    last_change_tick: Tick,
    accumulated: u128,
}

impl TempoState {
    pub fn new(ticks_per_quarter: u32) -> Self {
        Self::with_tempo(ticks_per_quarter, DEFAULT_TEMPO)
    }

    pub fn with_tempo(ticks_per_quarter: u32, tempo: u32) -> Self {
        TempoState {
            ticks_per_quarter,
            tempo,
            last_change_tick: 0,
            accumulated: 0,
        }
    }

    pub fn ticks_per_quarter(&self) -> u32 {
        self.ticks_per_quarter
    }

    /// Current tempo in microseconds per quarter note
    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    pub fn bpm(&self) -> f64 {
        60.0 * MICROS_PER_SECOND / self.tempo as f64
    }

    pub fn last_change_tick(&self) -> Tick {
        self.last_change_tick
    }

    pub fn accumulated_seconds(&self) -> f64 {
        self.to_seconds(self.accumulated)
    }

    pub fn seconds_per_tick(&self) -> f64 {
        self.tempo as f64 / (MICROS_PER_SECOND * self.ticks_per_quarter as f64)
    }

    /// Absolute time of `tick` under the current tempo
    pub fn seconds_at(&self, tick: Tick) -> Result<f64, TimingError> {
        self.units_at(tick).map(|units| self.to_seconds(units))
    }

    /// Makes `tempo` active from `tick` on.
    ///
    /// Returns the time of the change itself, which is measured with the
    /// tempo that was active before it.
    pub fn change_tempo(&mut self, tick: Tick, tempo: u32) -> Result<f64, TimingError> {
        let units = self.units_at(tick)?;
        self.accumulated = units;
        self.last_change_tick = tick;
        self.tempo = tempo;
        Ok(self.to_seconds(units))
    }

    fn units_at(&self, tick: Tick) -> Result<u128, TimingError> {
        let delta = tick
            .checked_sub(self.last_change_tick)
            .ok_or(TimingError::TickBeforeTempoChange {
                tick,
                last_change: self.last_change_tick,
            })?;
        Ok(self.accumulated + delta as u128 * self.tempo as u128)
    }

    fn to_seconds(&self, units: u128) -> f64 {
        units as f64 / (MICROS_PER_SECOND * self.ticks_per_quarter as f64)
    }
}

/// Reads the new tempo from a `Tempo` row.
///
/// Returns `None` for rows that aren't tempo changes.
pub fn tempo_change(row: &EventRow) -> Option<Result<u32, RowError>> {
    if !row.is_tempo() {
        return None;
    }

    let value = row.param(0).unwrap_or_default();
    Some(match value.parse::<u32>() {
        Ok(tempo) if tempo > 0 => Ok(tempo),
        _ => Err(RowError {
            line: row.line,
            kind: RowErrorKind::InvalidTempo(value.to_string()),
        }),
    })
}

/// Single pass over rows in tick order, timing each one
#[derive(Debug, Clone)]
pub struct TimeConverter {
    state: TempoState,
}

impl TimeConverter {
    pub fn new(ticks_per_quarter: u32) -> Self {
        TimeConverter {
            state: TempoState::new(ticks_per_quarter),
        }
    }

    pub fn with_tempo(ticks_per_quarter: u32, tempo: u32) -> Self {
        TimeConverter {
            state: TempoState::with_tempo(ticks_per_quarter, tempo),
        }
    }

    pub fn state(&self) -> &TempoState {
        &self.state
    }

    /// Times `row` and, if it is a valid tempo change, applies it.
    ///
    /// A `Tempo` row with an unreadable value is timed like any other row and
    /// leaves the tempo unchanged.
    pub fn convert(&mut self, row: &EventRow) -> Result<f64, TimingError> {
        match tempo_change(row) {
            Some(Ok(tempo)) => {
                let seconds = self.state.change_tempo(row.tick, tempo)?;
                debug!(
                    tick = row.tick,
                    tempo,
                    bpm = self.state.bpm(),
                    seconds,
                    "tempo change"
                );
                Ok(seconds)
            }
            _ => self.state.seconds_at(row.tick),
        }
    }

    pub fn convert_row(&mut self, row: EventRow) -> Result<TimedRow, TimingError> {
        let seconds = self.convert(&row)?;
        Ok(TimedRow { row, seconds })
    }
}

/// Rows of a whole file with their times, plus the rows that were dropped
#[derive(Debug, Default)]
pub struct Annotated {
    pub rows: Vec<TimedRow>,
    pub skipped: Vec<RowError>,
}

/// Times every row of a file on one shared tempo timeline.
///
/// midicsv lists tracks one after another, each starting again at tick 0,
/// while tempo changes apply to every track. Rows are therefore visited in
/// tick order (file order among equal ticks) and returned in file order.
pub fn annotate(
    rows: Vec<EventRow>,
    ticks_per_quarter: u32,
    default_tempo: u32,
) -> Result<Annotated, MidiCsvError> {
    let mut skipped = Vec::new();
    let rows: Vec<EventRow> = rows
        .into_iter()
        .filter(|row| match tempo_change(row) {
            Some(Err(err)) => {
                warn!("Skipping row: {}", err);
                skipped.push(err);
                false
            }
            _ => true,
        })
        .collect();

    warn_on_tick_regressions(&rows);

    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by_key(|&index| rows[index].tick);

    let mut converter = TimeConverter::with_tempo(ticks_per_quarter, default_tempo);
    let mut seconds = vec![0.0; rows.len()];
    for index in order {
        seconds[index] = converter.convert(&rows[index])?;
    }

    let rows = rows
        .into_iter()
        .zip(seconds)
        .map(|(row, seconds)| TimedRow { row, seconds })
        .collect();

    Ok(Annotated { rows, skipped })
}

fn warn_on_tick_regressions(rows: &[EventRow]) {
    let mut last_tick: HashMap<TrackId, Tick> = HashMap::new();
    for row in rows {
        if let Some(&previous) = last_tick.get(&row.track) {
            if row.tick < previous {
                warn!(
                    "line {}: tick {} in track {} is earlier than the previous tick {}",
                    row.line, row.tick, row.track, previous
                );
            }
        }
        last_tick.insert(row.track, row.tick);
    }
}
