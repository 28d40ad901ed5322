// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::time::Duration;

/// Settings that influence how a [`Request`](crate::Request) is derived
/// from the environment.
#[derive(Clone, Debug, Default)]
pub struct RequestSettings {
    /// The hosts this application answers for. Requests for another `Host`
    /// are rejected before anything else is parsed. An empty list allows
    /// every host.
    pub allowed_hosts: Vec<String>,

    /// Honour the `X-HTTP-Method-Override` header on `POST` requests, for
    /// clients that can't send other methods (e.g. HTML forms).
    pub allow_method_override: bool,
}

/// Options for serving a file with [`Response::set_download`](crate::Response::set_download).
#[derive(Clone, Debug)]
pub struct DownloadOptions {
    /// `Content-Disposition: inline` instead of `attachment`.
    pub inline: bool,

    /// Whether `Range` requests are honoured.
    pub accept_ranges: bool,

    /// Pause between two chunks, to limit the bandwidth of a download.
    pub delay: Option<Duration>,

    /// The size of the chunks the file is read and written in.
    pub read_length: usize,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            inline: false,
            accept_ranges: true,
            delay: None,
            read_length: 1024,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CsrfSettings {
    /// The name of the form field carrying the token.
    pub token_name: String,

    /// The header AJAX requests can carry the token in.
    pub header_name: String,

    /// The key under which the token is stored in the session.
    pub session_key: String,
}

impl Default for CsrfSettings {
    fn default() -> Self {
        Self {
            token_name: String::from("csrf_token"),
            header_name: String::from("X-CSRF-Token"),
            session_key: String::from("_csrf_token"),
        }
    }
}
