// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! A parsed absolute URL, as used for the target of a request and for
//! redirect locations.
//!
//! The path is stored as a list of decoded segments, and the query as an
//! ordered map using `application/x-www-form-urlencoded` semantics, so that
//! a URL built through the setters survives a serialize-then-parse cycle.
//!
//! # References
//! * [RFC 3986](https://www.rfc-editor.org/rfc/rfc3986.html)

use std::{
    borrow::Cow,
    fmt::{Display, Formatter},
};

use indexmap::IndexMap;

use crate::{
    syntax::is_valid_hostname,
    ValidationError,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Url {
    scheme: String,
    user: Option<String>,
    pass: Option<String>,
    host: String,
    port: Option<u16>,
    path: Vec<String>,
    query: IndexMap<String, String>,
    fragment: Option<String>,
}

impl Url {
    /// Creates the URL `<scheme>://<host>/`.
    pub fn new(scheme: &str, host: &str) -> Result<Url, ValidationError> {
        let mut url = Url {
            scheme: String::new(),
            user: None,
            pass: None,
            host: String::new(),
            port: None,
            path: Vec::new(),
            query: IndexMap::new(),
            fragment: None,
        };
        url.set_scheme(scheme)?;
        url.set_host(host)?;
        Ok(url)
    }

    /// Parses an absolute URL of the form
    /// `scheme://[user[:pass]@]host[:port][/path][?query][#fragment]`.
    pub fn parse(input: &str) -> Result<Url, ValidationError> {
        let invalid = || ValidationError::InvalidUrl(input.to_owned());

        let (rest, fragment) = match input.split_once('#') {
            Some((rest, fragment)) => (rest, Some(decode(fragment).into_owned())),
            None => (input, None),
        };

        let (scheme, rest) = rest.split_once("://").ok_or_else(invalid)?;

        let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
        let (authority, rest) = rest.split_at(authority_end);

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        let (user_info, host_port) = match authority.rsplit_once('@') {
            Some((user_info, host_port)) => (Some(user_info), host_port),
            None => (None, authority),
        };

        let (host, port) = split_host_port(host_port).ok_or_else(invalid)?;

        let mut url = Url::new(scheme, host).map_err(|error| match error {
            ValidationError::InvalidHost(_) => error,
            _ => invalid(),
        })?;

        if let Some(port) = port {
            let port: u32 = port.parse().map_err(|_| invalid())?;
            url.set_port(port)?;
        }

        if let Some(user_info) = user_info {
            match user_info.split_once(':') {
                Some((user, pass)) => url.set_user_info(&decode(user), Some(&decode(pass))),
                None => url.set_user_info(&decode(user_info), None),
            }
        }

        url.set_path(path);
        if let Some(query) = query {
            url.set_query_string(query);
        }
        url.fragment = fragment;

        Ok(url)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Sets the scheme, which is normalized to lowercase.
    pub fn set_scheme(&mut self, scheme: &str) -> Result<(), ValidationError> {
        let valid = scheme.starts_with(|character: char| character.is_ascii_alphabetic())
            && scheme.bytes().all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'+' | b'-' | b'.'));
        if !valid {
            return Err(ValidationError::InvalidUrl(format!("invalid scheme \"{scheme}\"")));
        }

        self.scheme = scheme.to_ascii_lowercase();
        Ok(())
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn pass(&self) -> Option<&str> {
        self.pass.as_deref()
    }

    pub fn set_user_info(&mut self, user: &str, pass: Option<&str>) {
        self.user = Some(user.to_owned());
        self.pass = pass.map(str::to_owned);
    }

    pub fn clear_user_info(&mut self) {
        self.user = None;
        self.pass = None;
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Sets the host, which must be a valid hostname (RFC 1123) or a
    /// bracketed IPv6 literal. Hostnames are case-insensitive and stored in
    /// lowercase.
    pub fn set_host(&mut self, host: &str) -> Result<(), ValidationError> {
        if !is_valid_hostname(host) {
            return Err(ValidationError::InvalidHost(host.to_owned()));
        }

        self.host = host.to_ascii_lowercase();
        Ok(())
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn set_port(&mut self, port: u32) -> Result<(), ValidationError> {
        match u16::try_from(port) {
            Ok(port) if port != 0 => {
                self.port = Some(port);
                Ok(())
            }
            _ => Err(ValidationError::InvalidPort(port)),
        }
    }

    pub fn clear_port(&mut self) {
        self.port = None;
    }

    /// Returns the port when it isn't the default port of the scheme.
    fn effective_port(&self) -> Option<u16> {
        match (self.scheme.as_str(), self.port) {
            ("http", Some(80)) | ("https", Some(443)) => None,
            (_, port) => port,
        }
    }

    pub fn path_segments(&self) -> &[String] {
        &self.path
    }

    /// Returns the path with a leading slash; the root path is `/`.
    #[must_use]
    pub fn path(&self) -> String {
        let mut path = String::from("/");
        let segments: Vec<Cow<'_, str>> = self.path.iter().map(|segment| urlencoding::encode(segment)).collect();
        path.push_str(&segments.join("/"));
        path
    }

    /// Sets the path from its (percent-encoded) string form. Empty segments
    /// are dropped, so leading, trailing and duplicate slashes vanish.
    pub fn set_path(&mut self, path: &str) {
        self.path = path.split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| decode(segment).into_owned())
            .collect();
    }

    /// Sets the path from already decoded segments.
    pub fn set_path_segments<I, S>(&mut self, segments: I)
            where I: IntoIterator<Item = S>,
                  S: Into<String> {
        self.path = segments.into_iter()
            .map(Into::into)
            .filter(|segment| !segment.is_empty())
            .collect();
    }

    pub fn query(&self) -> &IndexMap<String, String> {
        &self.query
    }

    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Replaces the query with the given (decoded) pairs.
    pub fn set_query<I, K, V>(&mut self, pairs: I)
            where I: IntoIterator<Item = (K, V)>,
                  K: Into<String>,
                  V: Into<String> {
        self.query = pairs.into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
    }

    /// Replaces the query by parsing an `application/x-www-form-urlencoded`
    /// string, with or without the leading `?`.
    pub fn set_query_string(&mut self, query: &str) {
        self.query = parse_form_urlencoded(query);
    }

    /// Adds or replaces a single query parameter. A replaced parameter keeps
    /// its position.
    pub fn add_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.insert(key.into(), value.into());
    }

    pub fn remove_query(&mut self, key: &str) -> Option<String> {
        self.query.shift_remove(key)
    }

    /// Returns the encoded query string, without the leading `?`.
    #[must_use]
    pub fn query_string(&self) -> String {
        self.query.iter()
            .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn set_fragment(&mut self, fragment: Option<&str>) {
        self.fragment = fragment.map(str::to_owned);
    }

    /// `scheme://host[:port]`, where the port is only present if it isn't the
    /// default of the scheme.
    #[must_use]
    pub fn origin(&self) -> String {
        match self.effective_port() {
            Some(port) => format!("{}://{}:{port}", self.scheme, self.host),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }

    /// The origin followed by the given path, without credentials, query or
    /// fragment.
    #[must_use]
    pub fn base_url(&self, path: &str) -> String {
        format!("{}/{}", self.origin(), path.trim_start_matches('/'))
    }

    #[must_use]
    pub fn serialize(&self) -> String {
        let mut result = format!("{}://", self.scheme);

        if let Some(user) = &self.user {
            result.push_str(&urlencoding::encode(user));
            if let Some(pass) = &self.pass {
                result.push(':');
                result.push_str(&urlencoding::encode(pass));
            }
            result.push('@');
        }

        result.push_str(&self.host);
        if let Some(port) = self.effective_port() {
            result.push_str(&format!(":{port}"));
        }

        result.push_str(&self.path());

        if !self.query.is_empty() {
            result.push('?');
            result.push_str(&self.query_string());
        }

        if let Some(fragment) = &self.fragment {
            result.push('#');
            result.push_str(&urlencoding::encode(fragment));
        }

        result
    }
}

impl Display for Url {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl std::str::FromStr for Url {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Url::parse(s)
    }
}

/// Splits `host[:port]`, taking care of the colons inside IPv6 literals.
fn split_host_port(value: &str) -> Option<(&str, Option<&str>)> {
    if value.starts_with('[') {
        let end = value.find(']')? + 1;
        let (host, rest) = value.split_at(end);
        return match rest {
            "" => Some((host, None)),
            _ => rest.strip_prefix(':').map(|port| (host, Some(port))),
        };
    }

    match value.split_once(':') {
        Some((host, port)) => Some((host, Some(port))),
        None => Some((value, None)),
    }
}

fn decode(value: &str) -> Cow<'_, str> {
    match urlencoding::decode(value) {
        Ok(decoded) => decoded,
        Err(_) => Cow::Borrowed(value),
    }
}

/// Parses an `application/x-www-form-urlencoded` string into an ordered map.
/// Later duplicates of a key replace the earlier value.
#[must_use]
pub fn parse_form_urlencoded(input: &str) -> IndexMap<String, String> {
    let input = input.strip_prefix('?').unwrap_or(input);

    input.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = key.replace('+', " ");
            let value = value.replace('+', " ");
            (decode(&key).into_owned(), decode(&value).into_owned())
        })
        .collect()
}
