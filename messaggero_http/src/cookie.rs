// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! HTTP State Management Mechanism (cookies).
//!
//! # References
//! * [RFC 6265](https://www.rfc-editor.org/rfc/rfc6265.html)

use std::{
    fmt::{Display, Formatter},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use indexmap::IndexMap;
use strum_macros::AsRefStr;
use tracing::trace;

use crate::{
    date::{clamp_to_http_date, fmt_http_date, http_date_after},
    syntax::{is_cookie_octet, is_whitespace_character, validate_token},
    HeaderName,
    HeaderSink,
    ValidationError,
};

/// The `SameSite` attribute of a cookie.
///
/// # References
/// * [draft-ietf-httpbis-rfc6265bis Section 4.1.2.7](https://datatracker.ietf.org/doc/html/draft-ietf-httpbis-rfc6265bis#name-the-samesite-attribute)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr)]
pub enum SameSite {
    Strict,
    Lax,
    None,
    Unset,
}

impl SameSite {
    /// Parses the value case-insensitively into its normalized form.
    pub fn parse(value: &str) -> Result<SameSite, ValidationError> {
        let value = value.trim_matches(is_whitespace_character);
        [SameSite::Strict, SameSite::Lax, SameSite::None, SameSite::Unset]
            .into_iter()
            .find(|same_site| same_site.as_ref().eq_ignore_ascii_case(value))
            .ok_or_else(|| ValidationError::InvalidSameSite(value.to_owned()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    expires: Option<SystemTime>,
    domain: Option<String>,
    path: Option<String>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
}

impl Cookie {
    /// Creates a session cookie without any attributes. The name must be a
    /// token and the value must consist of cookie-octets: there is no escaping
    /// convention for cookie values, so those are rejected.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Cookie, ValidationError> {
        let cookie = Cookie::unchecked(name.into(), value.into());
        validate_name(&cookie.name)?;
        validate_value(&cookie.value)?;
        Ok(cookie)
    }

    fn unchecked(name: String, value: String) -> Cookie {
        Cookie {
            name,
            value,
            expires: None,
            domain: None,
            path: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    /// Creates the cookie that instructs the user agent to remove the cookie
    /// with the given name: an empty value that expired at the Unix epoch.
    #[must_use]
    pub fn removal(name: impl Into<String>) -> Cookie {
        let mut cookie = Cookie::unchecked(name.into(), String::new());
        cookie.expires = Some(UNIX_EPOCH);
        cookie
    }

    /// Sets the expiry date, clamped to the dates an HTTP date can express.
    #[must_use]
    pub fn with_expires(mut self, expires: SystemTime) -> Self {
        self.expires = Some(clamp_to_http_date(expires));
        self
    }

    /// Sets `expires` to `max_age` from now.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.expires = Some(http_date_after(SystemTime::now(), max_age));
        self
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires(&self) -> Option<SystemTime> {
        self.expires
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn is_http_only(&self) -> bool {
        self.http_only
    }

    pub fn same_site(&self) -> Option<SameSite> {
        self.same_site
    }

    /// Checks the cookie as a whole. Browsers reject `SameSite=None` on
    /// cookies that aren't `Secure`, so that combination is refused as well.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        validate_value(&self.value)?;

        if let Some(path) = &self.path {
            validate_attribute("path", path)?;
        }

        if let Some(domain) = &self.domain {
            validate_attribute("domain", domain)?;
        }

        if self.same_site == Some(SameSite::None) && !self.secure {
            return Err(ValidationError::MalformedCookie(
                format!("cookie \"{}\" has SameSite=None but isn't secure", self.name)
            ));
        }

        Ok(())
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }

    #[must_use]
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        matches!(self.expires, Some(expires) if now > expires)
    }

    /// Serializes the cookie to the value of a `Set-Cookie` header.
    #[must_use]
    pub fn serialize(&self) -> String {
        self.serialize_at(SystemTime::now())
    }

    /// Serializes the cookie, computing `Max-Age` relative to `now`. An
    /// expiry date in the past results in `Max-Age=0`.
    #[must_use]
    pub fn serialize_at(&self, now: SystemTime) -> String {
        let mut line = format!("{}={}", self.name, self.value);

        if let Some(expires) = self.expires {
            let max_age = expires.duration_since(now).unwrap_or(Duration::ZERO);
            line.push_str("; expires=");
            line.push_str(&fmt_http_date(expires));
            line.push_str(&format!("; Max-Age={}", max_age.as_secs()));
        }

        if let Some(path) = &self.path {
            line.push_str("; path=");
            line.push_str(path);
        }

        if let Some(domain) = &self.domain {
            line.push_str("; domain=");
            line.push_str(domain);
        }

        if self.secure {
            line.push_str("; secure");
        }

        if self.http_only {
            line.push_str("; HttpOnly");
        }

        if let Some(same_site) = self.same_site {
            line.push_str("; SameSite=");
            line.push_str(same_site.as_ref());
        }

        line
    }

    /// Emits the cookie as a `Set-Cookie` header. Returns `false` when the
    /// headers have already been sent, in which case nothing is emitted.
    pub fn send(&self, sink: &mut impl HeaderSink) -> bool {
        if sink.headers_sent() {
            return false;
        }

        sink.emit_header(HeaderName::SetCookie.to_string_h1(), &self.serialize());
        true
    }

    /// Parses the value of a `Set-Cookie` header. Attributes are matched
    /// case-insensitively and unknown attributes are ignored. When both
    /// `expires` and `Max-Age` are present, `expires` is used, because
    /// `Max-Age` is derived from it on serialization.
    pub fn parse_set_cookie_line(line: &str) -> Result<Cookie, ValidationError> {
        let mut segments = line.split(';');

        let pair = segments.next().unwrap_or_default();
        let (name, value) = pair.split_once('=')
            .ok_or_else(|| ValidationError::MalformedCookie(format!("missing '=' in \"{pair}\"")))?;

        let name = name.trim_matches(is_whitespace_character);
        validate_name(name).map_err(|_| ValidationError::MalformedCookie(format!("invalid name \"{name}\"")))?;

        let value = value.trim_matches(is_whitespace_character);
        let value = value.strip_prefix('"')
            .and_then(|value| value.strip_suffix('"'))
            .unwrap_or(value);

        let mut cookie = Cookie::unchecked(name.to_owned(), value.to_owned());
        let mut max_age = None;

        for segment in segments {
            let (key, value) = match segment.split_once('=') {
                Some((key, value)) => (key, value.trim_matches(is_whitespace_character)),
                None => (segment, ""),
            };
            let key = key.trim_matches(is_whitespace_character).to_ascii_lowercase();

            match key.as_str() {
                "expires" => {
                    let expires = httpdate::parse_http_date(value)
                        .map_err(|_| ValidationError::MalformedCookie(format!("invalid expires \"{value}\"")))?;
                    cookie.expires = Some(clamp_to_http_date(expires));
                }
                "max-age" => {
                    let seconds: i64 = value.parse()
                        .map_err(|_| ValidationError::MalformedCookie(format!("invalid Max-Age \"{value}\"")))?;
                    max_age = Some(seconds);
                }
                "domain" => cookie.domain = Some(value.to_owned()),
                "path" => cookie.path = Some(value.to_owned()),
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                "samesite" => cookie.same_site = Some(SameSite::parse(value)?),
                "" => (),
                _ => trace!("Ignoring unknown cookie attribute \"{key}\""),
            }
        }

        if let (None, Some(seconds)) = (cookie.expires, max_age) {
            cookie.expires = Some(match u64::try_from(seconds) {
                Ok(seconds) if seconds > 0 => http_date_after(SystemTime::now(), Duration::from_secs(seconds)),
                _ => UNIX_EPOCH,
            });
        }

        Ok(cookie)
    }
}

impl Display for Cookie {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// Parses the request-side `Cookie` header: `name=value` pairs separated by
/// `;`, without attributes. Pairs without a `=` are skipped, and values are
/// percent-decoded. The last occurrence of a name wins.
#[must_use]
pub fn parse_cookie_header_line(line: &str) -> IndexMap<String, Cookie> {
    let mut cookies = IndexMap::new();

    for segment in line.split(';') {
        let Some((name, value)) = segment.split_once('=') else {
            trace!("Skipping cookie pair without '=': \"{segment}\"");
            continue;
        };

        let name = name.trim_matches(is_whitespace_character);
        if name.is_empty() {
            continue;
        }

        let value = value.trim_matches(is_whitespace_character);
        let value = match urlencoding::decode(value) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => value.to_owned(),
        };

        cookies.insert(name.to_owned(), Cookie::unchecked(name.to_owned(), value));
    }

    cookies
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    validate_token(name)
        .map_err(|_| ValidationError::MalformedCookie(format!("invalid cookie name \"{name}\"")))
}

/// `path-value` and `domain-value` may hold any CHAR except CTLs or `;`.
fn validate_attribute(attribute: &str, value: &str) -> Result<(), ValidationError> {
    if value.bytes().all(|byte| !byte.is_ascii_control() && byte.is_ascii() && byte != b';') {
        Ok(())
    } else {
        Err(ValidationError::MalformedCookie(format!("invalid {attribute} \"{value}\"")))
    }
}

fn validate_value(value: &str) -> Result<(), ValidationError> {
    if value.bytes().all(is_cookie_octet) {
        Ok(())
    } else {
        Err(ValidationError::MalformedCookie(format!("invalid cookie value \"{value}\"")))
    }
}
