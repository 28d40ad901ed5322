// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use strum_macros::AsRefStr;
use thiserror::Error;

/// Malformed input supplied by the caller or by the peer.
///
/// These are always reported synchronously and are never silently corrected,
/// except where a documented default applies (e.g. a missing quality value
/// defaulting to `1.0`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, AsRefStr, Error)]
pub enum ValidationError {
    /// The `Host` of the request isn't in the list of allowed hosts.
    ///
    /// ## Example:
    /// ```text
    /// Host: evil.tld
    /// ```
    #[error("host \"{0}\" is not allowed")]
    InvalidHost(String),

    /// The method isn't one of the methods known to this library.
    ///
    /// ## Example:
    /// ```text
    /// FROBNICATE / HTTP/1.1
    /// ```
    #[error("unsupported request method \"{0}\"")]
    InvalidMethod(String),

    /// The protocol isn't one of `HTTP/1.0`, `HTTP/1.1`, `HTTP/2`, `HTTP/2.0`
    /// or `HTTP/3`.
    #[error("unsupported protocol \"{0}\"")]
    InvalidProtocol(String),

    /// Status codes must be in the range `100..=599`.
    #[error("status code {0} is outside of 100..=599")]
    InvalidStatusCode(u16),

    /// The status code has no registered reason phrase, so the caller must
    /// supply one.
    #[error("status code {0} is unknown and requires a reason phrase")]
    UnknownStatusRequiresReason(u16),

    /// Ports must be in the range `1..=65535`.
    #[error("port {0} is outside of 1..=65535")]
    InvalidPort(u32),

    #[error("invalid URL \"{0}\"")]
    InvalidUrl(String),

    /// Redirect status codes must be in the range `300..=308`.
    #[error("redirect code {0} is outside of 300..=308")]
    InvalidRedirectCode(u16),

    #[error("malformed cookie: {0}")]
    MalformedCookie(String),

    /// `SameSite` must be one of `Strict`, `Lax`, `None` or `Unset`.
    #[error("invalid SameSite value \"{0}\"")]
    InvalidSameSite(String),

    #[error("token is empty")]
    TokenEmpty,

    #[error("token contains a delimiter")]
    TokenContainsDelimiter,

    #[error("token contains a non-visible character")]
    TokenContainsNonVisibleAscii,

    #[error("token contains whitespace")]
    TokenContainsWhitespace,

    #[error("field value contains invalid characters")]
    FieldValueContainsInvalidCharacters,
}
