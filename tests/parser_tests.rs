// midicsv row parsing tests
//
// These tests cover splitting midicsv text into event rows:
// - Field splitting, including quoted text with commas and doubled quotes
// - Reporting malformed rows without stopping
// - Reading the ticks per quarter note from the header

use midicsv_time::midicsv::{parse_csv, parse_row, split_fields, MidiCsvError, RowErrorKind};

/// Test plain field splitting with midicsv's ", " separators.
#[test]
fn test_split_plain_fields() {
    assert_eq!(
        split_fields("2, 480, Note_on_c, 0, 60, 100"),
        vec!["2", "480", "Note_on_c", "0", "60", "100"]
    );
    assert_eq!(split_fields("1,0,Start_track"), vec!["1", "0", "Start_track"]);
    assert_eq!(split_fields("  3 ,  7 , End_track  "), vec!["3", "7", "End_track"]);
}

/// Test quoted text fields.
///
/// This test verifies:
/// - Commas inside quotes don't split the field
/// - Doubled quotes become a literal quote
/// - Spaces inside quotes are kept
#[test]
fn test_split_quoted_fields() {
    assert_eq!(
        split_fields(r#"1, 0, Title_t, "Piano, left hand""#),
        vec!["1", "0", "Title_t", "Piano, left hand"]
    );
    assert_eq!(
        split_fields(r#"1, 0, Text_t, "say ""hi"" ", 5"#),
        vec!["1", "0", "Text_t", r#"say "hi" "#, "5"]
    );
    assert_eq!(
        split_fields(r#"1, 0, Key_signature, 0, "major""#),
        vec!["1", "0", "Key_signature", "0", "major"]
    );
}

/// Test a well-formed row.
#[test]
fn test_parse_row_fields() {
    let row = parse_row(7, "2, 1440, Note_off_c, 1, 64, 0  ").expect("valid row");

    assert_eq!(row.line, 7);
    assert_eq!(row.track, 2);
    assert_eq!(row.tick, 1440);
    assert_eq!(row.event_type, "Note_off_c");
    assert_eq!(row.params, vec!["1", "64", "0"]);
    assert_eq!(row.raw, "2, 1440, Note_off_c, 1, 64, 0");
    assert_eq!(row.numeric_param::<u8>(1), Some(64));
    assert_eq!(row.numeric_param::<u8>(5), None);
}

/// Test the reasons a row can be rejected.
#[test]
fn test_parse_row_errors() {
    let err = parse_row(3, "1, 960").expect_err("too few fields");
    assert_eq!(err.line, 3);
    assert_eq!(err.kind, RowErrorKind::TooFewFields(2));

    let err = parse_row(4, "1, abc, Note_on_c, 0, 60, 100").expect_err("bad tick");
    assert_eq!(err.kind, RowErrorKind::InvalidTick("abc".to_string()));

    let err = parse_row(5, "-1, 0, Note_on_c, 0, 60, 100").expect_err("bad track");
    assert_eq!(err.kind, RowErrorKind::InvalidTrack("-1".to_string()));

    let err = parse_row(6, "1, -20, Note_on_c, 0, 60, 100").expect_err("negative tick");
    assert_eq!(err.kind, RowErrorKind::InvalidTick("-20".to_string()));

    assert_eq!(err.to_string(), "line 6: invalid tick '-20'");
}

/// Test parsing a whole file.
///
/// This test verifies:
/// - The header's ticks per quarter note is picked up
/// - Blank lines are ignored without being reported
/// - Malformed rows are reported with their line numbers and left out
#[test]
fn test_parse_csv_collects_rows_and_errors() {
    let text = "0, 0, Header, 1, 1, 96\n\
                1, 0, Start_track\n\
                \n\
                1, xyz, Note_on_c, 0, 60, 100\n\
                1, 96, Note_on_c, 0, 60, 0\n\
                1, 96\n\
                1, 96, End_track\n";

    let parsed = parse_csv(text).expect("valid header");

    assert_eq!(parsed.ticks_per_quarter, Some(96));
    let lines: Vec<usize> = parsed.rows.iter().map(|row| row.line).collect();
    assert_eq!(lines, vec![1, 2, 5, 7]);
    let error_lines: Vec<usize> = parsed.errors.iter().map(|err| err.line).collect();
    assert_eq!(error_lines, vec![4, 6]);
}

/// Test that only the first header counts.
#[test]
fn test_parse_csv_first_header_wins() {
    let text = "1, 0, Start_track\n0, 0, Header, 0, 1, 240\n0, 0, Header, 0, 1, 960\n";
    let parsed = parse_csv(text).expect("valid header");
    assert_eq!(parsed.ticks_per_quarter, Some(240));
    assert_eq!(parsed.rows.len(), 3);
}

/// Test input without a header.
#[test]
fn test_parse_csv_without_header() {
    let parsed = parse_csv("1, 0, Start_track\n1, 0, End_track\n").expect("no header is not an error here");
    assert_eq!(parsed.ticks_per_quarter, None);
}

/// Test fatal header problems.
///
/// This test verifies:
/// - A non-numeric, zero, negative or missing division is fatal
#[test]
fn test_parse_csv_bad_division() {
    for header in [
        "0, 0, Header, 1, 1, abc",
        "0, 0, Header, 1, 1, 0",
        "0, 0, Header, 1, 1, -25",
        "0, 0, Header, 1, 1",
    ] {
        let result = parse_csv(header);
        assert!(
            matches!(result, Err(MidiCsvError::InvalidDivision(_))),
            "{} should be rejected",
            header
        );
    }
}
