// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! Byte-range requests, as specified by RFC 9110 section 14.
//!
//! Parsing is strict: a single malformed or unsatisfiable item invalidates
//! the whole `Range` header, which results in `416 Range Not Satisfiable`.
//!
//! # References
//! * [RFC 9110 Section 14](https://www.rfc-editor.org/rfc/rfc9110.html#name-range-requests)

use std::fmt::{Display, Formatter};

use crate::abnf::is_digits;

/// The maximum amount of ranges a single `Range` header may contain. More
/// than this makes the request unsatisfiable.
pub const MAX_RANGES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Range {
    StartPointToEnd { start: u64 },
    Points {
        start: u64,
        end: u64,
    },
    Suffix { suffix: u64 },
}

impl Range {
    fn parse(value: &str) -> Option<Range> {
        let (start, end) = value.split_once('-')?;
        let (start, end) = (start.trim(), end.trim());

        match (start.is_empty(), end.is_empty()) {
            (true, true) => None,
            (true, false) => Some(Range::Suffix { suffix: parse_number(end)? }),
            (false, true) => Some(Range::StartPointToEnd { start: parse_number(start)? }),
            (false, false) => Some(Range::Points { start: parse_number(start)?, end: parse_number(end)? }),
        }
    }

    /// Resolves the range against the length of the resource. Returns `None`
    /// when the range isn't fully inside the resource.
    #[must_use]
    pub fn resolve(&self, complete_length: u64) -> Option<ByteRange> {
        let range = match *self {
            Range::StartPointToEnd { start } => ByteRange { first: start, last: complete_length.checked_sub(1)? },
            Range::Points { start, end } => ByteRange { first: start, last: end },
            Range::Suffix { suffix } => {
                if suffix == 0 || suffix > complete_length {
                    return None;
                }
                ByteRange { first: complete_length - suffix, last: complete_length - 1 }
            }
        };

        if range.first <= range.last && range.last < complete_length {
            Some(range)
        } else {
            None
        }
    }
}

fn parse_number(value: &str) -> Option<u64> {
    if is_digits(value) {
        value.parse().ok()
    } else {
        None
    }
}

/// An inclusive range of bytes inside a resource: `first ≤ last < length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteRange {
    pub first: u64,
    pub last: u64,
}

impl ByteRange {
    /// The amount of bytes in this range, which is never zero.
    #[must_use]
    pub fn length(&self) -> u64 {
        self.last - self.first + 1
    }
}

/// A `Range` header with an item that isn't a valid `int-range` or
/// `suffix-range`, or with more than [`MAX_RANGES`] items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedRange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRangeList {
    pub ranges: Vec<Range>,
}

/// The outcome of evaluating a `Range` header against a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeRequest {
    /// The header doesn't describe byte ranges, so it is ignored and the full
    /// resource is sent.
    Ignored,

    /// The header is malformed or can't be satisfied (416).
    Unsatisfiable,

    /// One or more ranges, in the order in which the client asked for them.
    Satisfiable(Vec<ByteRange>),
}

impl HttpRangeList {
    /// Parses the `Range` header. Returns `None` if the unit isn't `bytes`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Result<Self, MalformedRange>> {
        let (unit, set) = value.trim().split_once('=')?;
        if !unit.trim().eq_ignore_ascii_case("bytes") {
            return None;
        }

        let mut ranges = Vec::new();
        for range in set.split(',') {
            if ranges.len() == MAX_RANGES {
                return Some(Err(MalformedRange));
            }

            match Range::parse(range) {
                Some(range) => ranges.push(range),
                None => return Some(Err(MalformedRange)),
            }
        }

        Some(Ok(Self { ranges }))
    }

    /// Resolves every range against the length of the resource. If any of
    /// them falls outside, none of them are returned.
    #[must_use]
    pub fn resolve(&self, complete_length: u64) -> Option<Vec<ByteRange>> {
        self.ranges.iter()
            .map(|range| range.resolve(complete_length))
            .collect()
    }
}

/// Evaluates a `Range` header value against a resource of `complete_length`
/// bytes.
#[must_use]
pub fn evaluate_range_header(value: &str, complete_length: u64) -> RangeRequest {
    let list = match HttpRangeList::parse(value) {
        None => return RangeRequest::Ignored,
        Some(Err(MalformedRange)) => return RangeRequest::Unsatisfiable,
        Some(Ok(list)) => list,
    };

    match list.resolve(complete_length) {
        Some(ranges) => RangeRequest::Satisfiable(ranges),
        None => RangeRequest::Unsatisfiable,
    }
}

/// The `Content-Range` header field indicates where in a full body a partial
/// message belongs.
///
/// ### References
/// * [RFC 9110](https://httpwg.org/specs/rfc9110.html#field.content-range)
/// * [MDN `Content-Range` header](https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers/Content-Range)
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentRangeHeaderValue {
    Range {
        /// The start of the range, inclusive.
        start: u64,

        /// The end of the range, inclusive.
        end: u64,

        /// Complete length of the **resource**, not the body.
        complete_length: u64,
    },

    /// Used for 416 Range Not Satisfiable.
    ///
    /// ### RFC 9110, section 14.4:
    /// > A server generating a 416 (Range Not Satisfiable) response to a
    /// byte-range request SHOULD send a Content-Range header field with an
    /// unsatisfied-range value, as in the following example:
    /// > ```text
    /// > Content-Range: bytes */1234`
    /// > ```
    ///
    /// Written without the unit, as `*/1234`.
    Unsatisfied {
        /// The complete length of the resource.
        complete_length: u64
    },
}

impl ContentRangeHeaderValue {
    #[must_use]
    pub fn for_range(range: ByteRange, complete_length: u64) -> Self {
        Self::Range { start: range.first, end: range.last, complete_length }
    }
}

impl Display for ContentRangeHeaderValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Range { start, end, complete_length } => write!(f, "bytes {start}-{end}/{complete_length}"),
            Self::Unsatisfied { complete_length } => write!(f, "*/{complete_length}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SIZE: u64 = 1000;

    fn satisfiable(ranges: &[(u64, u64)]) -> RangeRequest {
        RangeRequest::Satisfiable(ranges.iter().map(|(first, last)| ByteRange { first: *first, last: *last }).collect())
    }

    #[rstest]
    #[case("bytes=0-499", &[(0, 499)])]
    #[case("bytes=500-", &[(500, 999)])]
    #[case("bytes=-100", &[(900, 999)])]
    #[case("bytes=-1000", &[(0, 999)])]
    #[case("bytes=0-0", &[(0, 0)])]
    #[case("bytes=999-999", &[(999, 999)])]
    #[case("bytes=0-499,500-999", &[(0, 499), (500, 999)])]
    #[case("bytes=0-499, 500-999", &[(0, 499), (500, 999)])]
    #[case("bytes=500-999,0-10", &[(500, 999), (0, 10)])]
    fn test_satisfiable(#[case] header: &str, #[case] expected: &[(u64, u64)]) {
        assert_eq!(evaluate_range_header(header, SIZE), satisfiable(expected));
    }

    #[rstest]
    #[case("bytes=2000-3000")]
    #[case("bytes=a-b")]
    #[case("bytes=500-100")]
    #[case("bytes=0-1000")]
    #[case("bytes=1000-")]
    #[case("bytes=-0")]
    #[case("bytes=-1001")]
    #[case("bytes=-")]
    #[case("bytes=")]
    #[case("bytes=0-499,")]
    #[case("bytes=0-499,a-b")]
    #[case("bytes=+1-2")]
    #[case("bytes=99999999999999999999999-")]
    fn test_unsatisfiable(#[case] header: &str) {
        assert_eq!(evaluate_range_header(header, SIZE), RangeRequest::Unsatisfiable);
    }

    #[rstest]
    #[case("items=0-5")]
    #[case("0-5")]
    fn test_ignored(#[case] header: &str) {
        assert_eq!(evaluate_range_header(header, SIZE), RangeRequest::Ignored);
    }

    #[test]
    fn test_range_cap() {
        let header = format!("bytes={}", vec!["0-0"; MAX_RANGES].join(","));
        assert!(matches!(evaluate_range_header(&header, SIZE), RangeRequest::Satisfiable(ranges) if ranges.len() == MAX_RANGES));

        let header = format!("bytes={}", vec!["0-0"; MAX_RANGES + 1].join(","));
        assert_eq!(evaluate_range_header(&header, SIZE), RangeRequest::Unsatisfiable);
    }

    #[test]
    fn test_empty_resource() {
        assert_eq!(evaluate_range_header("bytes=0-", 0), RangeRequest::Unsatisfiable);
        assert_eq!(evaluate_range_header("bytes=-5", 0), RangeRequest::Unsatisfiable);
    }

    #[test]
    fn test_parse_keeps_client_order() {
        let list = HttpRangeList::parse("bytes=5-,-3").unwrap().unwrap();
        assert_eq!(list.ranges, [Range::StartPointToEnd { start: 5 }, Range::Suffix { suffix: 3 }]);
        assert_eq!(list.resolve(10), Some(vec![ByteRange { first: 5, last: 9 }, ByteRange { first: 7, last: 9 }]));
    }

    #[test]
    fn test_content_range_display() {
        let range = ContentRangeHeaderValue::for_range(ByteRange { first: 0, last: 499 }, SIZE);
        assert_eq!(range.to_string(), "bytes 0-499/1000");
        assert_eq!(ContentRangeHeaderValue::Unsatisfied { complete_length: SIZE }.to_string(), "*/1000");
    }

    #[test]
    fn test_byte_range_len() {
        assert_eq!(ByteRange { first: 0, last: 499 }.length(), 500);
        assert_eq!(ByteRange { first: 900, last: 999 }.length(), 100);
    }
}
