// ABOUTME: Field-level tokenization for a single SSE line
// ABOUTME: Recognizes data/event/id/retry fields and comment lines, ignoring everything else
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! Parses a single, terminator-stripped line of an SSE stream into a
//! [`ParsedLine`].

/// The recognized field names of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldName {
    /// `data:`
    Data,
    /// `event:`
    Event,
    /// `id:`
    Id,
    /// `retry:`
    Retry,
}

/// The result of classifying one non-blank line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// A recognized field and its value (leading single space already stripped).
    Field(FieldName, String),
    /// A `:`-prefixed comment line, value is the text after the colon.
    Comment(String),
    /// An unrecognized field name; the line carries no meaning.
    Ignored,
}

/// Strip a single leading space from `value`, if present.
fn strip_one_leading_space(value: &str) -> String {
    value.strip_prefix(' ').unwrap_or(value).to_owned()
}

/// Classify one line (without its trailing terminator).
#[must_use]
pub fn parse_line(line: &str) -> ParsedLine {
    if let Some(rest) = line.strip_prefix(':') {
        return ParsedLine::Comment(strip_one_leading_space(rest));
    }

    let (name, value) = match line.find(':') {
        Some(idx) => (&line[..idx], &line[idx + 1..]),
        None => (line, ""),
    };

    // Fast-path rejection: no recognized name is longer than "retry" (5 bytes).
    if name.len() > 5 {
        return ParsedLine::Ignored;
    }

    let value = strip_one_leading_space(value);
    match name {
        "data" => ParsedLine::Field(FieldName::Data, value),
        "event" => ParsedLine::Field(FieldName::Event, value),
        "id" => ParsedLine::Field(FieldName::Id, value),
        "retry" => ParsedLine::Field(FieldName::Retry, value),
        _ => ParsedLine::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_colon() {
        assert_eq!(
            parse_line("data:data with : inside"),
            ParsedLine::Field(FieldName::Data, "data with : inside".to_owned())
        );
    }

    #[test]
    fn no_colon_is_the_whole_name() {
        assert_eq!(parse_line("non-standard field"), ParsedLine::Ignored);
    }

    #[test]
    fn strips_single_leading_space_only() {
        assert_eq!(
            parse_line("data:  two spaces"),
            ParsedLine::Field(FieldName::Data, " two spaces".to_owned())
        );
    }

    #[test]
    fn long_name_is_fast_path_ignored() {
        assert_eq!(parse_line("retryx: value"), ParsedLine::Ignored);
    }

    #[test]
    fn comment_strips_one_leading_space() {
        assert_eq!(
            parse_line(": hello"),
            ParsedLine::Comment("hello".to_owned())
        );
    }

    #[test]
    fn unrecognized_short_name_is_ignored() {
        assert_eq!(parse_line("xyz: value"), ParsedLine::Ignored);
    }
}
