// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! This module contains HTTP syntax semantics, valid across all representations
//! of HTTP, and the syntax of the few related grammars (cookies, hostnames)
//! this crate has to validate.
//!
//! # References
//! * [RFC 9110](https://www.rfc-editor.org/rfc/rfc9110.html)
//! * [RFC 6265](https://www.rfc-editor.org/rfc/rfc6265.html)
//! * [RFC 1123](https://www.rfc-editor.org/rfc/rfc1123.html)

use std::net::Ipv6Addr;

use crate::{
    abnf,
    ValidationError,
};

/// Validate a field character. Note that in HTTP, UTF-8 is optional (US-ASCII),
/// and isn't used before validating the content.
///
/// ```text
/// field-vchar    = VCHAR / obs-text
/// ```
#[inline]
fn is_field_value_character(byte: u8) -> bool {
    abnf::is_visible_character(byte) || validate_obs_text(byte)
}

/// Is the given character a character that can occur (anywhere) in the string?
/// This is useful for early exits, but use [`validate_token`] after the
/// token is parsed.
///
/// ```text
/// tchar          = "!" / "#" / "$" / "%" / "&" / "'" / "*"
///                / "+" / "-" / "." / "^" / "_" / "`" / "|" / "~"
///                / DIGIT / ALPHA
///                ; any VCHAR, except delimiters
/// ```
#[inline]
pub fn is_token_character(byte: u8) -> bool {
    validate_token_character(byte).is_ok()
}

/// Returns whether or not the character is whitespace according to the HTTP
/// specification. This is in effect just `U+0020 SPACE` and `U+0009 CHARACTER
/// TABULATION`.
///
/// # Definition
/// ```text
/// OWS            = *( SP / HTAB )
///                ; optional whitespace
/// RWS            = 1*( SP / HTAB )
///                ; required whitespace
/// BWS            = OWS
///                ; "bad" whitespace
/// ```
///
/// # References
/// * [RFC 9110 Section 5.6.3](https://www.rfc-editor.org/rfc/rfc9110.html#name-whitespace)
#[inline]
pub fn is_whitespace_character(character: char) -> bool {
    character == ' ' || character == '\t'
}

/// Validate obs-text.
/// ```text
/// obs-text       = %x80-FF
/// ```
#[inline]
fn validate_obs_text(byte: u8) -> bool {
    matches!(byte, 0x80..=0xFF)
}

/// Validate a field value. Note that in HTTP, UTF-8 is optional (US-ASCII),
/// and isn't used before validating the content.
pub fn validate_field_content(value: &[u8]) -> Result<(), ValidationError> {
    if value.iter().all(|byte| is_field_value_character(*byte) || *byte == b' ' || *byte == b'\t') {
        Ok(())
    } else {
        Err(ValidationError::FieldValueContainsInvalidCharacters)
    }
}

pub fn validate_token(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::TokenEmpty);
    }

    for character in value.bytes() {
        validate_token_character(character)?;
    }

    Ok(())
}

/// Validate a token character.
///
/// ```text
/// tchar          = "!" / "#" / "$" / "%" / "&" / "'" / "*"
///                / "+" / "-" / "." / "^" / "_" / "`" / "|" / "~"
///                / DIGIT / ALPHA
///                ; any VCHAR, except delimiters
/// ```
fn validate_token_character(character: u8) -> Result<(), ValidationError> {
    match character {
        b' ' | b'\t' => Err(ValidationError::TokenContainsWhitespace),

        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
        b'^' | b'_' | b'`' | b'|' | b'~' => Ok(()),

        b'0'..=b'9' => Ok(()),
        b'A'..=b'Z' => Ok(()),
        b'a'..=b'z' => Ok(()),

        b'"' | b'(' | b')' | b',' | b'/' | b':' | b';' | b'<' | b'=' | b'>' |
        b'?' | b'@' | b'[' | b'\\' | b']' | b'{' | b'}' => Err(ValidationError::TokenContainsDelimiter),

        _ => Err(ValidationError::TokenContainsNonVisibleAscii),
    }
}

/// Is the byte allowed in an (unquoted) cookie value?
///
/// ```text
/// cookie-octet      = %x21 / %x23-2B / %x2D-3A / %x3C-5B / %x5D-7E
///                       ; US-ASCII characters excluding CTLs,
///                       ; whitespace DQUOTE, comma, semicolon,
///                       ; and backslash
/// ```
///
/// # References
/// * [RFC 6265 Section 4.1.1](https://www.rfc-editor.org/rfc/rfc6265.html#section-4.1.1)
#[inline]
pub fn is_cookie_octet(byte: u8) -> bool {
    matches!(byte, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

/// Validates a hostname, as used in URLs and in the `Host` header.
///
/// Registered names follow RFC 1123: at most 253 characters, dot-separated
/// labels of 1 to 63 letters, digits and hyphens, where a label never starts
/// or ends with a hyphen. IPv6 literals must be enclosed in brackets.
#[must_use]
pub fn is_valid_hostname(host: &str) -> bool {
    if let Some(literal) = host.strip_prefix('[') {
        return literal.strip_suffix(']')
            .map(|address| address.parse::<Ipv6Addr>().is_ok())
            .unwrap_or(false);
    }

    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() || host.len() > 253 {
        return false;
    }

    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'-')
    })
}
