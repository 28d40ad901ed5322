// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::{
    borrow::Cow,
    time::SystemTime,
};

use indexmap::IndexMap;
use messaggero_resources::MediaType;

use crate::{
    canonicalize,
    date::fmt_http_date,
    syntax::{validate_field_content, validate_token},
    ContentRangeHeaderValue,
    HeaderName,
    ValidationError,
};

/// Converts a value into the identity of a header, together with the name it
/// is displayed with on the wire.
pub trait IntoHeaderName {
    fn into_header_name(self) -> (HeaderName, String);
}

impl IntoHeaderName for HeaderName {
    fn into_header_name(self) -> (HeaderName, String) {
        let display = self.canonical().into_owned();
        (self, display)
    }
}

impl IntoHeaderName for &HeaderName {
    fn into_header_name(self) -> (HeaderName, String) {
        self.clone().into_header_name()
    }
}

impl IntoHeaderName for &str {
    fn into_header_name(self) -> (HeaderName, String) {
        (HeaderName::from(self), canonicalize(self))
    }
}

impl IntoHeaderName for String {
    fn into_header_name(self) -> (HeaderName, String) {
        let display = canonicalize(&self);
        (HeaderName::from(self), display)
    }
}

impl IntoHeaderName for &String {
    fn into_header_name(self) -> (HeaderName, String) {
        self.as_str().into_header_name()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct HeaderEntry {
    display: String,
    values: Vec<String>,
}

/// The headers of a message: an ordered map of case-insensitive names to
/// the ordered list of values sent for that name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderMap {
    headers: IndexMap<HeaderName, HeaderEntry>,
}

impl HeaderMap {
    pub fn new() -> HeaderMap {
        HeaderMap::default()
    }

    /// Adds a value to the header, keeping the values that are already
    /// present. This is used for headers that can be duplicated, such as
    /// `Set-Cookie` and `Link`.
    pub fn append(&mut self, header_name: impl IntoHeaderName, value: impl Into<String>) {
        let (name, display) = header_name.into_header_name();
        self.headers.entry(name)
            .or_insert_with(|| HeaderEntry { display, values: Vec::new() })
            .values
            .push(value.into());
    }

    /// Replaces all the values of the header with the given value.
    pub fn set(&mut self, header_name: impl IntoHeaderName, value: impl Into<String>) {
        let (name, display) = header_name.into_header_name();
        let value = value.into();
        match self.headers.get_mut(&name) {
            Some(entry) => {
                entry.display = display;
                entry.values.clear();
                entry.values.push(value);
            }
            None => {
                self.headers.insert(name, HeaderEntry { display, values: vec![value] });
            }
        }
    }

    /// [`append`](Self::append), after checking that the name is a token and
    /// the value doesn't contain line breaks or other control characters.
    pub fn try_append(&mut self, header_name: impl IntoHeaderName, value: impl Into<String>) -> Result<(), ValidationError> {
        let (name, display) = header_name.into_header_name();
        let value = value.into();
        validate_field(&display, &value)?;
        self.headers.entry(name)
            .or_insert_with(|| HeaderEntry { display, values: Vec::new() })
            .values
            .push(value);
        Ok(())
    }

    /// [`set`](Self::set), with the checks of [`try_append`](Self::try_append).
    pub fn try_set(&mut self, header_name: impl IntoHeaderName, value: impl Into<String>) -> Result<(), ValidationError> {
        let (name, display) = header_name.into_header_name();
        let value = value.into();
        validate_field(&display, &value)?;
        self.headers.insert(name, HeaderEntry { display, values: vec![value] });
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, header_name: impl IntoHeaderName) -> bool {
        let (name, _) = header_name.into_header_name();
        self.headers.contains_key(&name)
    }

    /// Returns the most recently added value of the header.
    #[must_use]
    pub fn get(&self, header_name: impl IntoHeaderName) -> Option<&str> {
        self.get_all(header_name).last().map(String::as_str)
    }

    /// Returns the value of the header at the given index, in the order in
    /// which they were added.
    #[must_use]
    pub fn get_at(&self, header_name: impl IntoHeaderName, index: usize) -> Option<&str> {
        self.get_all(header_name).get(index).map(String::as_str)
    }

    /// Returns every value of the header, in the order in which they were
    /// added.
    #[must_use]
    pub fn get_all(&self, header_name: impl IntoHeaderName) -> &[String] {
        let (name, _) = header_name.into_header_name();
        match self.headers.get(&name) {
            Some(entry) => &entry.values[..],
            None => &[],
        }
    }

    /// Returns the values of the header joined into a single comma-separated
    /// field value.
    #[must_use]
    pub fn get_line(&self, header_name: impl IntoHeaderName) -> Option<String> {
        let values = self.get_all(header_name);
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    /// The amount of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Iterates over the display name and values of every header.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.headers.values().map(|entry| (entry.display.as_str(), entry.values.as_slice()))
    }

    /// Iterates over the header lines as they must be sent on the wire:
    /// multiline headers produce one line per value, all other headers are
    /// comma-joined into a single line.
    pub fn wire_lines(&self) -> impl Iterator<Item = (&str, Cow<'_, str>)> {
        self.headers.iter().flat_map(|(name, entry)| {
            let lines: Vec<Cow<'_, str>> = if name.is_multiline() {
                entry.values.iter().map(|value| Cow::Borrowed(value.as_str())).collect()
            } else if entry.values.len() == 1 {
                vec![Cow::Borrowed(entry.values[0].as_str())]
            } else {
                vec![Cow::Owned(entry.values.join(", "))]
            };

            lines.into_iter().map(move |line| (entry.display.as_str(), line))
        })
    }

    pub fn remove(&mut self, header_name: impl IntoHeaderName) {
        let (name, _) = header_name.into_header_name();
        self.headers.shift_remove(&name);
    }
}

fn validate_field(name: &str, value: &str) -> Result<(), ValidationError> {
    validate_token(name)?;
    validate_field_content(value.as_bytes())
}

//
// Header-specific methods
//
impl HeaderMap {
    pub fn set_content_length(&mut self, length: u64) {
        self.set(HeaderName::ContentLength, length.to_string());
    }

    pub fn set_content_range(&mut self, range: ContentRangeHeaderValue) {
        self.set(HeaderName::ContentRange, range.to_string());
    }

    pub fn set_content_type(&mut self, media_type: &MediaType) {
        self.set(HeaderName::ContentType, media_type.as_str());
    }

    pub fn set_date(&mut self, date_time: SystemTime) {
        self.set(HeaderName::Date, fmt_http_date(date_time));
    }

    pub fn set_last_modified(&mut self, date_time: SystemTime) {
        self.set(HeaderName::LastModified, fmt_http_date(date_time));
    }

    /// Parses the header as a date, as specified by RFC 9110 section 5.6.7.
    #[must_use]
    pub fn get_date(&self, header_name: impl IntoHeaderName) -> Option<SystemTime> {
        self.get(header_name)
            .and_then(|value| httpdate::parse_http_date(value).ok())
    }
}
