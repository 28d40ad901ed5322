// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use indexmap::IndexMap;
use messaggero_http::{
    Cookie,
    HeaderMap,
    HttpVersion,
    IntoHeaderName,
    ValidationError,
};

/// The parts shared by requests and responses.
#[derive(Clone, Debug, Default)]
pub struct Message {
    pub version: HttpVersion,
    pub headers: HeaderMap,

    /// Cookies by name. Setting a cookie with an existing name replaces it.
    pub cookies: IndexMap<String, Cookie>,
    pub body: Vec<u8>,
}

/// Accessors for everything a [`Message`] carries, implemented by both
/// [`Request`](crate::Request) and [`Response`](crate::Response).
pub trait HttpMessage {
    fn message(&self) -> &Message;

    fn message_mut(&mut self) -> &mut Message;

    fn protocol(&self) -> HttpVersion {
        self.message().version
    }

    fn headers(&self) -> &HeaderMap {
        &self.message().headers
    }

    /// The last value of the header.
    fn header(&self, name: impl IntoHeaderName) -> Option<&str> {
        self.message().headers.get(name)
    }

    fn header_at(&self, name: impl IntoHeaderName, index: usize) -> Option<&str> {
        self.message().headers.get_at(name, index)
    }

    fn headers_for(&self, name: impl IntoHeaderName) -> &[String] {
        self.message().headers.get_all(name)
    }

    fn has_header(&self, name: impl IntoHeaderName) -> bool {
        self.message().headers.contains(name)
    }

    /// Replaces the header. Values with line breaks or other control
    /// characters are refused.
    fn set_header(&mut self, name: impl IntoHeaderName, value: impl Into<String>) -> Result<(), ValidationError> {
        self.message_mut().headers.try_set(name, value)
    }

    fn append_header(&mut self, name: impl IntoHeaderName, value: impl Into<String>) -> Result<(), ValidationError> {
        self.message_mut().headers.try_append(name, value)
    }

    fn remove_header(&mut self, name: impl IntoHeaderName) {
        self.message_mut().headers.remove(name);
    }

    fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.message().cookies.get(name)
    }

    fn cookies(&self) -> &IndexMap<String, Cookie> {
        &self.message().cookies
    }

    fn body(&self) -> &[u8] {
        &self.message().body
    }

    fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.message_mut().body = body.into();
    }
}
