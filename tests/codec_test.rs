// ABOUTME: Integration tests for the wire codec's public decode/encode surface
// ABOUTME: Covers the round-trip and BOM-idempotency properties plus scenarios S1/S2
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

use std::time::Duration;

use eventline::{decode_all, encode_to_string, Event};

#[test]
fn round_trip_preserves_data_id_type_and_retry() {
    let event = Event::builder()
        .id("42")
        .unwrap()
        .event_type("tick")
        .unwrap()
        .retry(Duration::from_secs(1))
        .data("hello")
        .data("world")
        .build();

    let wire = encode_to_string(&event);
    let decoded = decode_all(wire.as_bytes()).unwrap();

    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].event.id(), Some("42"));
    assert_eq!(decoded[0].event.event_type(), Some("tick"));
    assert_eq!(decoded[0].event.retry(), Some(Duration::from_secs(1)));
    assert_eq!(decoded[0].event.data(), vec!["hello", "world"]);
}

#[test]
fn round_trip_of_multiline_data_chunk() {
    let event = Event::builder().data("line one\nline two").build();
    let wire = encode_to_string(&event);
    let decoded = decode_all(wire.as_bytes()).unwrap();
    assert_eq!(decoded[0].event.data(), vec!["line one", "line two"]);
}

#[test]
fn bom_stripped_once_does_not_change_decoded_events() {
    let raw = b"data: hi\n\n";
    let mut with_bom = vec![0xEF, 0xBB, 0xBF];
    with_bom.extend_from_slice(raw);

    let without = decode_all(raw).unwrap();
    let with = decode_all(&with_bom).unwrap();
    assert_eq!(without, with);
}

#[test]
fn a_second_leading_bom_is_treated_as_data_and_drops_the_contaminated_field() {
    let mut doubled_bom = vec![0xEF, 0xBB, 0xBF, 0xEF, 0xBB, 0xBF];
    doubled_bom.extend_from_slice(b"data: hi\n\n");
    let decoded = decode_all(&doubled_bom).unwrap();
    // The second BOM contaminates the "data" field name on the very next
    // line, so the only recognized line is the blank boundary: no events.
    assert!(decoded.is_empty());
}

#[test]
fn scenario_s1_decode() {
    let input = b"id:\0\nretry:x\ndata: Hello World!\n\n";
    let decoded = decode_all(input).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].event.id(), None);
    assert_eq!(decoded[0].event.retry(), None);
    assert_eq!(decoded[0].event.data(), vec!["Hello World!"]);
}

#[test]
fn scenario_s2_encode() {
    let event = Event::builder()
        .id("example_id")
        .unwrap()
        .event_type("test_event")
        .unwrap()
        .retry(Duration::from_secs(5))
        .data("This is an example\nOf an event")
        .data("")
        .data("a string here")
        .comment("This test should pass")
        .data("Important data\nImportant again\r\rVery important\r\n")
        .build();

    let expected = "id: example_id\n\
        event: test_event\n\
        retry: 5000\n\
        data: This is an example\n\
        data: Of an event\n\
        data: \n\
        data: a string here\n\
        : This test should pass\n\
        data: Important data\n\
        data: Important again\n\
        data: \n\
        data: Very important\n\
        data: \n\n";

    assert_eq!(encode_to_string(&event), expected);
}

#[test]
fn truncated_event_reports_unexpected_end_of_input() {
    // No trailing newline: the line itself never completes, so bytes stay
    // buffered and the missing boundary is reported rather than silently
    // dropped.
    let input = b"data: partial line";
    let err = decode_all(input).unwrap_err();
    assert!(matches!(err, eventline::EventlineError::UnexpectedEndOfInput));
}
