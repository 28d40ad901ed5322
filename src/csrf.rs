// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! Cross-site request forgery protection with the synchronizer token
//! pattern: a random token is kept in the session and every unsafe request
//! must echo it, either as a form field or as a header.
//!
//! # References
//! * [OWASP Cross-Site Request Forgery Prevention Cheat Sheet](https://cheatsheetseries.owasp.org/cheatsheets/Cross-Site_Request_Forgery_Prevention_Cheat_Sheet.html#synchronizer-token-pattern)

use messaggero_http::Method;
use rand::RngCore;
use serde_json::Value;
use tracing::warn;

use crate::{
    config::CsrfSettings,
    message::HttpMessage,
    request::Request,
    session::ActiveSession,
};

const TOKEN_LENGTH: usize = 32;

pub struct AntiCsrf<'a, 's> {
    session: &'a mut ActiveSession<'s>,
    settings: CsrfSettings,
}

impl<'a, 's> AntiCsrf<'a, 's> {
    pub fn new(session: &'a mut ActiveSession<'s>, settings: CsrfSettings) -> Self {
        Self { session, settings }
    }

    fn stored_token(&self) -> Option<String> {
        match self.session.get(&self.settings.session_key) {
            Some(Value::String(token)) if !token.is_empty() => Some(token),
            _ => None,
        }
    }

    /// The token of this session, generated on first use.
    pub fn token(&mut self) -> String {
        match self.stored_token() {
            Some(token) => token,
            None => self.regenerate(),
        }
    }

    /// Replaces the token, e.g. after the user logged in.
    pub fn regenerate(&mut self) -> String {
        let mut bytes = [0; TOKEN_LENGTH];
        rand::thread_rng().fill_bytes(&mut bytes);

        let token = hex::encode(bytes);

        self.session.set(&self.settings.session_key, Value::String(token.clone()));
        token
    }

    /// The `<input>` element to place inside forms.
    pub fn hidden_field(&mut self) -> String {
        let token = self.token();
        format!(
            "<input type=\"hidden\" name=\"{}\" value=\"{token}\">",
            escape_attribute(&self.settings.token_name)
        )
    }

    /// Checks the token the request carries. Safe methods don't need one.
    pub fn verify(&self, request: &Request) -> bool {
        if matches!(request.method(), Method::Get | Method::Head | Method::Options | Method::Trace) {
            return true;
        }

        let Some(expected) = self.stored_token() else {
            warn!("No CSRF token in the session for a {} request", request.method());
            return false;
        };

        let submitted = request.post_value(&self.settings.token_name)
            .or_else(|| request.header(self.settings.header_name.as_str()));

        match submitted {
            Some(submitted) if constant_time_eq(submitted.as_bytes(), expected.as_bytes()) => true,
            Some(_) => {
                warn!("CSRF token mismatch for {} {}", request.method(), request.url().path());
                false
            }
            None => {
                warn!("Missing CSRF token for {} {}", request.method(), request.url().path());
                false
            }
        }
    }
}

/// Takes the same time wherever the inputs differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0, |difference, (x, y)| difference | (x ^ y)) == 0
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
