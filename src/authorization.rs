// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! Parsing of the `Authorization` header.
//!
//! # References
//! * [RFC 7617 The 'Basic' HTTP Authentication Scheme](https://www.rfc-editor.org/rfc/rfc7617.html)
//! * [RFC 7616 HTTP Digest Access Authentication](https://www.rfc-editor.org/rfc/rfc7616.html)

use base64::{engine::general_purpose::STANDARD, Engine};
use strum_macros::AsRefStr;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, AsRefStr)]
pub enum Authorization {
    Basic {
        username: String,
        password: String,
    },
    Digest(DigestCredentials),
}

/// The parameters of a `Digest` authorization. Parameters the client didn't
/// send are `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DigestCredentials {
    pub username: Option<String>,
    pub realm: Option<String>,
    pub nonce: Option<String>,
    pub uri: Option<String>,
    pub response: Option<String>,
    pub opaque: Option<String>,
    pub qop: Option<String>,
    pub nc: Option<String>,
    pub cnonce: Option<String>,
}

impl Authorization {
    /// Parses the value of the `Authorization` header. Unknown schemes and
    /// credentials that can't be decoded result in `None`.
    pub fn parse(value: &str) -> Option<Authorization> {
        let value = value.trim();
        let (scheme, credentials) = value.split_once(' ').unwrap_or((value, ""));
        let credentials = credentials.trim();

        if scheme.eq_ignore_ascii_case("Basic") {
            parse_basic(credentials)
        } else if scheme.eq_ignore_ascii_case("Digest") {
            Some(Authorization::Digest(parse_digest(credentials)))
        } else {
            debug!("Unsupported authorization scheme \"{scheme}\"");
            None
        }
    }
}

fn parse_basic(credentials: &str) -> Option<Authorization> {
    let decoded = match STANDARD.decode(credentials) {
        Ok(decoded) => decoded,
        Err(error) => {
            debug!("Undecodable Basic credentials: {error}");
            return None;
        }
    };

    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Authorization::Basic {
        username: username.to_owned(),
        password: password.to_owned(),
    })
}

fn parse_digest(credentials: &str) -> DigestCredentials {
    let mut result = DigestCredentials::default();

    for parameter in split_outside_quotes(credentials) {
        let Some((key, value)) = parameter.split_once('=') else {
            continue;
        };

        let value = unquote(value.trim());
        let slot = match key.trim().to_ascii_lowercase().as_str() {
            "username" => &mut result.username,
            "realm" => &mut result.realm,
            "nonce" => &mut result.nonce,
            "uri" => &mut result.uri,
            "response" => &mut result.response,
            "opaque" => &mut result.opaque,
            "qop" => &mut result.qop,
            "nc" => &mut result.nc,
            "cnonce" => &mut result.cnonce,
            _ => continue,
        };
        *slot = Some(value);
    }

    result
}

/// Splits the list on commas that aren't inside a quoted-string.
fn split_outside_quotes(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (index, character) in value.char_indices() {
        match character {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(value[start..index].trim());
                start = index + 1;
            }
            _ => (),
        }
    }

    parts.push(value[start..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

/// Removes the quotes around a quoted-string and resolves its escapes.
fn unquote(value: &str) -> String {
    let Some(inner) = value.strip_prefix('"').and_then(|value| value.strip_suffix('"')) else {
        return value.to_owned();
    };

    let mut result = String::with_capacity(inner.len());
    let mut characters = inner.chars();
    while let Some(character) = characters.next() {
        if character == '\\' {
            if let Some(escaped) = characters.next() {
                result.push(escaped);
            }
        } else {
            result.push(character);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_basic() {
        // "Aladdin:open sesame"
        assert_eq!(
            Authorization::parse("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="),
            Some(Authorization::Basic { username: "Aladdin".to_owned(), password: "open sesame".to_owned() })
        );
    }

    #[test]
    fn test_basic_splits_on_first_colon() {
        // "user:pa:ss"
        assert_eq!(
            Authorization::parse("basic dXNlcjpwYTpzcw=="),
            Some(Authorization::Basic { username: "user".to_owned(), password: "pa:ss".to_owned() })
        );
    }

    #[rstest]
    #[case("Basic !!!notbase64")]
    #[case("Basic dXNlcg==")]
    #[case("Bearer abc.def.ghi")]
    #[case("")]
    fn test_no_auth_type(#[case] header: &str) {
        assert_eq!(Authorization::parse(header), None);
    }

    #[test]
    fn test_digest() {
        let header = r#"Digest username="Mufasa", realm="http-auth@example.org", uri="/dir/index.html", algorithm=MD5, nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v", nc=00000001, cnonce="f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ", qop=auth, response="8ca523f5e9506fed4657c9700eebdbec", opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS""#;

        let Some(Authorization::Digest(credentials)) = Authorization::parse(header) else {
            panic!("expected Digest credentials");
        };

        assert_eq!(credentials.username.as_deref(), Some("Mufasa"));
        assert_eq!(credentials.realm.as_deref(), Some("http-auth@example.org"));
        assert_eq!(credentials.uri.as_deref(), Some("/dir/index.html"));
        assert_eq!(credentials.nonce.as_deref(), Some("7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v"));
        assert_eq!(credentials.nc.as_deref(), Some("00000001"));
        assert_eq!(credentials.cnonce.as_deref(), Some("f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ"));
        assert_eq!(credentials.qop.as_deref(), Some("auth"));
        assert_eq!(credentials.response.as_deref(), Some("8ca523f5e9506fed4657c9700eebdbec"));
        assert_eq!(credentials.opaque.as_deref(), Some("FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS"));
    }

    #[test]
    fn test_digest_quoted_comma() {
        let Some(Authorization::Digest(credentials)) = Authorization::parse(r#"Digest realm="a, \"b\"", username=bob"#) else {
            panic!("expected Digest credentials");
        };

        assert_eq!(credentials.realm.as_deref(), Some(r#"a, "b""#));
        assert_eq!(credentials.username.as_deref(), Some("bob"));
        assert_eq!(credentials.nonce, None);
    }
}
