// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! This module provides support for the HTTP Lists `#rule` ABNF extension,
//! and the weighted lists used for proactive content negotiation (`Accept`,
//! `Accept-Charset`, `Accept-Encoding` and `Accept-Language`).
//!
//! # Definition for Recipients
//! ```text
//! #element => [ element ] *( OWS "," OWS [ element ] )
//! ```
//!
//! # References
//! * [RFC 9110 Section 5.6.1](https://www.rfc-editor.org/rfc/rfc9110.html#section-5.6.1)
//! * [RFC 9110 Section 12.5](https://www.rfc-editor.org/rfc/rfc9110.html#name-content-negotiation-fields)

use std::cmp::Ordering;

use unicase::UniCase;

use crate::{syntax::is_whitespace_character, abnf};

struct HttpListElementIterator<'a> {
    value: &'a str,
}

impl<'a> Iterator for HttpListElementIterator<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.value.is_empty() {
            return None;
        }

        while let Some((element, rest)) = self.value.split_once(',') {
            self.value = rest.trim_matches(is_whitespace_character);

            let result = element.trim_matches(is_whitespace_character);
            if !result.is_empty() {
                return Some(result);
            }
        }

        if self.value.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.value))
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct HttpWeightedValue<'a> {
    pub name: &'a str,
    pub weight: f32,
}

struct HttpWeightedListValueIterator<'a> {
    inner: HttpListElementIterator<'a>,
}

impl<'a> Iterator for HttpWeightedListValueIterator<'a> {
    type Item = HttpWeightedValue<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.inner.next()?;

        let mut parameters = value.split(';');
        let name = parameters.next()?.trim_matches(is_whitespace_character);

        // Media ranges may carry other parameters before the weight, e.g.
        // `text/html;level=1;q=0.5`.
        let weight = parameters
            .map(|parameter| parameter.trim_matches(is_whitespace_character))
            .find_map(|parameter| parameter.strip_prefix("q=").or_else(|| parameter.strip_prefix("Q=")))
            .map(parse_quality_value)
            .unwrap_or(1.0);

        Some(HttpWeightedValue { name, weight })
    }
}

/// This function parses a field-value and returns an iterator of list elements
/// for HTTP. The iterator will never return the empty string, as those cannot
/// occur in HTTP lists and will be ignored.
///
/// # Definition for Recipients
/// ```text
/// #element => [ element ] *( OWS "," OWS [ element ] )
/// ```
///
/// # References
/// * [RFC 9110 Section 5.6.1](https://www.rfc-editor.org/rfc/rfc9110.html#section-5.6.1)
pub fn parse_http_list(value: &str) -> impl Iterator<Item = &'_ str> {
    HttpListElementIterator { value }
}

/// This function parses a field-value and returns an iterator of weighted list
/// elements. Weights are optional, and will default to `1.0`.
///
/// # Definition
/// ```text
/// weight = OWS ";" OWS "q=" qvalue
/// qvalue = ( "0" [ "." 0*3DIGIT ] )
///        / ( "1" [ "." 0*3("0") ] )
/// ```
///
/// # References
/// * [RFC 9110 Section 12.4.2](https://www.rfc-editor.org/rfc/rfc9110.html#name-quality-values)
pub fn parse_http_weighted_list(value: &str) -> impl Iterator<Item = HttpWeightedValue<'_>> {
    HttpWeightedListValueIterator {
        inner: HttpListElementIterator { value }
    }
}

/// Parses the field-value into the preference order of the client: sorted
/// by descending weight, where elements of the same weight keep the order in
/// which they were sent. Elements with a weight of `0` are "not acceptable"
/// and are left out.
#[must_use]
pub fn parse_preference_list(value: &str) -> Vec<HttpWeightedValue<'_>> {
    let mut list: Vec<_> = parse_http_weighted_list(value)
        .filter(|entry| entry.weight > 0.0)
        .collect();

    // `sort_by` is stable, which keeps the header order for equal weights.
    list.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));
    list
}

/// Picks the candidate that the client prefers the most.
///
/// The `preferences` are walked from most to least preferred (see
/// [`parse_preference_list`]), and the first one that is (case-insensitively)
/// one of the `candidates` is returned. When no candidate was requested by the
/// client, the first candidate is returned as the best available default.
/// Only an empty list of candidates yields `None`.
pub fn negotiate<'c, I, S>(preferences: I, candidates: &'c [S]) -> Option<&'c str>
        where I: IntoIterator,
              I::Item: AsRef<str>,
              S: AsRef<str> {
    for preference in preferences {
        let preferred = UniCase::ascii(preference.as_ref());
        if let Some(candidate) = candidates.iter().find(|candidate| UniCase::ascii(candidate.as_ref()) == preferred) {
            return Some(candidate.as_ref());
        }
    }

    candidates.first().map(AsRef::as_ref)
}

/// Parses a `qvalue` as defined by
/// [RFC 9110, section 12.4.2](https://www.rfc-editor.org/rfc/rfc9110.html#name-quality-values).
///
/// # Definition
/// ```text
/// qvalue = ( "0" [ "." 0*3DIGIT ] )
///        / ( "1" [ "." 0*3("0") ] )
/// ```
///
/// # Invalid Syntax
/// The sender MUST NOT generate these values, but there isn't an explicit
/// definition of what should be done if an endpoint receives these. In that
/// case, we should go with the default value of `1.0`.
fn parse_quality_value(value: &str) -> f32 {
    const DEFAULT_VALUE_FOR_INVALID_SYNTAX: f32 = 1.0;

    // Length restrictions
    if value.is_empty() || value.len() > 5 {
        return DEFAULT_VALUE_FOR_INVALID_SYNTAX;
    }

    if matches!(value, "0" | "0." | "0.0") {
        return 0.0;
    }

    let mut characters = value.chars();

    // This covers valid cases and invalid cases, since it can never be more
    // than `1.0`.
    match characters.next() {
        Some('1') => return 1.0,
        Some('0') => (),
        _ => return DEFAULT_VALUE_FOR_INVALID_SYNTAX,
    }

    if characters.next() != Some('.') {
        return DEFAULT_VALUE_FOR_INVALID_SYNTAX;
    }

    let mut fractional = 0.0;
    for (idx, character) in value[2..].char_indices().take(3) {
        if let Some(digit) = abnf::parse_digit_character(character) {
            fractional += digit as f32 * 10_f32.powi(-(idx as i32 + 1));
        }
    }

    fractional
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use float_cmp::approx_eq;

    const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

    #[rstest]
    #[case("en-US", &["en-US"])]
    #[case("foo,bar", &["foo", "bar"])]
    #[case("foo , bar,", &["foo", "bar"])]
    #[case("foo , ,bar,charlie", &["foo", "bar", "charlie"])]
    #[case("", &[])]
    #[case(",", &[])]
    #[case(",     ,", &[])]
    #[case(",     ,  ", &[])]
    #[case("gzip, br, deflate", &["gzip", "br", "deflate"])]
    fn test_parse_http_list(#[case] input: &str, #[case] expected: &[&str]) {
        assert_eq!(parse_http_list(input).collect::<Vec<&str>>(), expected.to_vec());
    }

    #[rstest]
    #[case("gzip", &[HttpWeightedValue{ name: "gzip", weight: 1.0 }])]
    #[case("*", &[HttpWeightedValue{ name: "*", weight: 1.0 }])]
    #[case("*;q=1.0", &[HttpWeightedValue{ name: "*", weight: 1.0 }])]
    #[case("*;q=0.001", &[HttpWeightedValue{ name: "*", weight: 0.001 }])]
    #[case("*;q=0.0", &[HttpWeightedValue{ name: "*", weight: 0.0 }])]
    #[case("gzip;q=0.5", &[HttpWeightedValue{ name: "gzip", weight: 0.5 }])]
    #[case("gzip ; q=0.5", &[HttpWeightedValue{ name: "gzip", weight: 0.5 }])]
    #[case("text/html;level=1;q=0.2", &[HttpWeightedValue{ name: "text/html", weight: 0.2 }])]
    #[case("gzip, br;q=0.1, deflate;q=not-a-weight", &[HttpWeightedValue{ name: "gzip", weight: 1.0 },
            HttpWeightedValue{ name: "br", weight: 0.1 }, HttpWeightedValue{ name: "deflate", weight: 1.0 }])]
    fn test_parse_http_weighted_list(#[case] input: &str, #[case] expected: &[HttpWeightedValue<'static>]) {
        assert_eq!(parse_http_weighted_list(input).collect::<Vec<_>>(), expected.to_vec());
    }

    #[test]
    fn test_parse_preference_list_sorts_stably() {
        let names: Vec<&str> = parse_preference_list("a;q=0.5, b, c;q=0.5, d;q=0, e")
            .iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, ["b", "e", "a", "c"]);
    }

    #[rstest]
    #[case(BROWSER_ACCEPT, &["application/xml", "text/html"], Some("text/html"))]
    #[case(BROWSER_ACCEPT, &["application/xml", "application/json"], Some("application/xml"))]
    #[case(BROWSER_ACCEPT, &["foo", "bar"], Some("foo"))]
    #[case(BROWSER_ACCEPT, &[], None)]
    #[case("en-US, nl;q=0.9", &["NL", "en-us"], Some("en-us"))]
    #[case("gzip;q=0, br", &["gzip"], Some("gzip"))]
    #[case("", &["utf-8", "iso-8859-1"], Some("utf-8"))]
    fn test_negotiate(#[case] header: &str, #[case] candidates: &[&str], #[case] expected: Option<&str>) {
        let preferences = parse_preference_list(header);
        assert_eq!(negotiate(preferences.iter().map(|entry| entry.name), candidates), expected);
    }

    #[rstest]
    #[case("0", 0.0)]
    #[case("0.", 0.0)]
    #[case("0.0", 0.0)]
    #[case("0.00", 0.0)]
    #[case("0.000", 0.0)]
    #[case("1", 1.0)]
    #[case("1.", 1.0)]
    #[case("1.000", 1.0)]
    #[case("0.5", 0.5)]
    #[case("0.05", 0.05)]
    #[case("0.001", 0.001)]
    #[case("0.123", 0.123)]
    #[case("0.089", 0.089)]
    fn test_parse_quality_value_valid(#[case] input: &str, #[case] expected: f32) {
        let outcome = parse_quality_value(input);
        assert!(approx_eq!(f32, outcome, expected, ulps = 3), "Incorrect, outcome={outcome}, expected={expected} for input=\"{input}\"");
    }

    #[rstest]
    #[case("ABCFDGNSDG")]
    #[case("")]
    #[case("-0.0")]
    #[case("+0.0")]
    #[case("+1")]
    #[case("0.000005")]
    #[case("-.582")]
    #[case("2")]
    #[case("2.001")]
    fn test_parse_quality_value_invalid(#[case] input: &str) {
        let outcome = parse_quality_value(input);
        assert!(approx_eq!(f32, outcome, 1.0, ulps = 3), "Incorrect, outcome={outcome}");
    }
}
