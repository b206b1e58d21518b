use super::types::{EventRow, MidiCsvError, ParsedCsv, RowError, RowErrorKind};

/// Splits midicsv text into event rows.
///
/// Blank lines are ignored. Rows that can't be read are collected in
/// `ParsedCsv::errors` and left out of `ParsedCsv::rows`. The first `Header`
/// row supplies the ticks per quarter note; a malformed one is fatal.
pub fn parse_csv(text: &str) -> Result<ParsedCsv, MidiCsvError> {
    let mut parsed = ParsedCsv::default();

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        match parse_row(index + 1, line) {
            Ok(row) => {
                if row.is_header() && parsed.ticks_per_quarter.is_none() {
                    parsed.ticks_per_quarter = Some(header_division(&row)?);
                }
                parsed.rows.push(row);
            }
            Err(err) => parsed.errors.push(err),
        }
    }

    Ok(parsed)
}

/// Parses a single midicsv line
pub fn parse_row(line: usize, text: &str) -> Result<EventRow, RowError> {
    let fields = split_fields(text);
    if fields.len() < 3 {
        return Err(RowError {
            line,
            kind: RowErrorKind::TooFewFields(fields.len()),
        });
    }

    let mut fields = fields.into_iter();
    // Length checked above
    let track_field = fields.next().unwrap_or_default();
    let tick_field = fields.next().unwrap_or_default();
    let event_type = fields.next().unwrap_or_default();

    let track = track_field.parse().map_err(|_| RowError {
        line,
        kind: RowErrorKind::InvalidTrack(track_field.clone()),
    })?;
    let tick = tick_field.parse().map_err(|_| RowError {
        line,
        kind: RowErrorKind::InvalidTick(tick_field.clone()),
    })?;

    Ok(EventRow {
        line,
        track,
        tick,
        event_type,
        params: fields.collect(),
        raw: text.trim_end().to_string(),
    })
}

/// Splits a line on commas, honouring quoted strings.
///
/// Whitespace around each field is dropped. A field starting with `"` runs
/// to the matching closing quote and may contain commas; `""` inside it is a
/// literal quote.
pub fn split_fields(text: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut chars = text.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut field = String::new();
        let quoted = chars.next_if_eq(&'"').is_some();
        if quoted {
            while let Some(c) = chars.next() {
                if c != '"' {
                    field.push(c);
                } else if chars.next_if_eq(&'"').is_some() {
                    field.push('"');
                } else {
                    break;
                }
            }
        }

        let mut more = false;
        for c in chars.by_ref() {
            if c == ',' {
                more = true;
                break;
            }
            // Text after a closing quote is dropped
            if !quoted {
                field.push(c);
            }
        }

        fields.push(if quoted { field } else { field.trim().to_string() });
        if !more {
            return fields;
        }
    }
}

fn header_division(row: &EventRow) -> Result<u32, MidiCsvError> {
    let field = row
        .param(2)
        .ok_or_else(|| MidiCsvError::InvalidDivision(format!("missing on line {}", row.line)))?;

    match field.parse::<i64>() {
        Ok(division) if division > 0 && division <= u32::MAX as i64 => Ok(division as u32),
        _ => Err(MidiCsvError::InvalidDivision(field.to_string())),
    }
}
