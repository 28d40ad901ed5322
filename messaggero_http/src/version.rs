// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use crate::ValidationError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpVersion {
    Http10,
    Http11,
    Http2,
    Http3,
}

impl HttpVersion {
    /// Parses the protocol as it is found in the `SERVER_PROTOCOL` variable.
    /// Both `HTTP/2` and `HTTP/2.0` are in use for the second version.
    ///
    /// # References
    /// * [RFC 3875 Section 4.1.16](https://www.rfc-editor.org/rfc/rfc3875.html#section-4.1.16)
    pub fn parse(value: &str) -> Result<HttpVersion, ValidationError> {
        match value {
            "HTTP/1.0" => Ok(Self::Http10),
            "HTTP/1.1" => Ok(Self::Http11),
            "HTTP/2" | "HTTP/2.0" => Ok(Self::Http2),
            "HTTP/3" => Ok(Self::Http3),
            _ => Err(ValidationError::InvalidProtocol(value.to_owned())),
        }
    }

    /// Formats the [`HttpVersion`] to a HTTP-Version, as specified by RFC 9112.
    ///
    /// # References
    /// * [RFC 9112 Section 2.3](https://www.rfc-editor.org/rfc/rfc9112.html#name-http-version)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http10 => "HTTP/1.0",
            Self::Http11 => "HTTP/1.1",
            Self::Http2 => "HTTP/2",
            Self::Http3 => "HTTP/3",
        }
    }
}

impl Default for HttpVersion {
    fn default() -> Self {
        Self::Http11
    }
}

impl std::fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("HTTP/1.0", HttpVersion::Http10)]
    #[case("HTTP/1.1", HttpVersion::Http11)]
    #[case("HTTP/2", HttpVersion::Http2)]
    #[case("HTTP/2.0", HttpVersion::Http2)]
    #[case("HTTP/3", HttpVersion::Http3)]
    fn test_parse(#[case] input: &str, #[case] expected: HttpVersion) {
        assert_eq!(HttpVersion::parse(input), Ok(expected));
    }

    #[rstest]
    #[case("HTTP/0.9")]
    #[case("http/1.1")]
    #[case("SPDY/3")]
    fn test_parse_invalid(#[case] input: &str) {
        assert_eq!(HttpVersion::parse(input), Err(ValidationError::InvalidProtocol(input.to_owned())));
    }
}
