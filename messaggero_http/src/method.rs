// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use phf::phf_map;

use crate::ValidationError;

/// The request methods known to this library. Requests with any other method
/// are rejected with [`ValidationError::InvalidMethod`].
///
/// # References
/// * [RFC 9110 - Section 9. Methods](https://www.rfc-editor.org/rfc/rfc9110.html#section-9)
/// * [IANA Hypertext Transfer Protocol (HTTP) Method Registry](https://www.iana.org/assignments/http-methods/http-methods.xhtml)
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    Connect,
    Copy,
    Delete,
    Get,
    Head,
    Lock,
    MkCol,
    Move,
    Options,
    Patch,
    Post,
    PropFind,
    PropPatch,
    Put,
    Search,
    Trace,
    Unlock,
}

static METHOD_MAP: phf::Map<&'static str, Method> = phf_map!(
    "CONNECT" => Method::Connect,
    "COPY" => Method::Copy,
    "DELETE" => Method::Delete,
    "GET" => Method::Get,
    "HEAD" => Method::Head,
    "LOCK" => Method::Lock,
    "MKCOL" => Method::MkCol,
    "MOVE" => Method::Move,
    "OPTIONS" => Method::Options,
    "PATCH" => Method::Patch,
    "POST" => Method::Post,
    "PROPFIND" => Method::PropFind,
    "PROPPATCH" => Method::PropPatch,
    "PUT" => Method::Put,
    "SEARCH" => Method::Search,
    "TRACE" => Method::Trace,
    "UNLOCK" => Method::Unlock,
);

impl Method {
    /// Parses a method token.
    ///
    /// # Notes
    /// Methods are case-sensitive, as per
    /// [RFC 9110 - Section 9.1](https://www.rfc-editor.org/rfc/rfc9110.html#section-9.1-5):
    /// > The method token is case-sensitive because it might be used as a
    /// > gateway to object-based systems with case-sensitive method names. By
    /// > convention, standardized methods are defined in all-uppercase US-ASCII
    /// > letters.
    pub fn parse(value: &str) -> Result<Method, ValidationError> {
        METHOD_MAP.get(value)
            .copied()
            .ok_or_else(|| ValidationError::InvalidMethod(value.to_owned()))
    }

    /// Get the method in string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Copy => "COPY",
            Self::Delete => "DELETE",
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Lock => "LOCK",
            Self::MkCol => "MKCOL",
            Self::Move => "MOVE",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Post => "POST",
            Self::PropFind => "PROPFIND",
            Self::PropPatch => "PROPPATCH",
            Self::Put => "PUT",
            Self::Search => "SEARCH",
            Self::Trace => "TRACE",
            Self::Unlock => "UNLOCK",
        }
    }

    /// Safe methods are essentially read-only.
    ///
    /// # References
    /// * [RFC 9110 - Section 9.2.1](https://www.rfc-editor.org/rfc/rfc9110.html#name-safe-methods)
    #[must_use]
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Options | Self::Trace | Self::PropFind | Self::Search)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
