// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! Various Augmented BNF (ABNF) tools and utilities.
//!
//! # Ranges
//! Ranges are inclusive:
//! ```text
//! DIGIT       =  %x30-39
//! ```
//! is equivalent to:
//! ```text
//! DIGIT       =  "0" / "1" / "2" / "3" / "4" / "5" / "6" /
//!                "7" / "8" / "9"
//! ```
//!
//! # References
//! * [RFC 5234 Augmented BNF for Syntax Specifications: ABNF](https://www.rfc-editor.org/rfc/rfc5234.html)

/// Is the character a visible (printing) character.
///
/// ```text
/// VCHAR          =  %x21-7E
/// ```
#[inline]
pub fn is_visible_character(byte: u8) -> bool {
    matches!(byte, 0x21..=0x7E)
}

/// Parses a single decimal digit.
///
/// ```text
/// DIGIT          =  %x30-39
/// ```
#[inline]
pub fn parse_digit_character(character: char) -> Option<u8> {
    character.to_digit(10).map(|digit| digit as u8)
}

/// Returns whether the string is a non-empty sequence of `DIGIT`s. Unlike
/// [`str::parse`], this rejects leading `+` signs.
#[inline]
pub fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}
