// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

/// The primitive through which the status line and header fields of a
/// response reach the connection.
pub trait HeaderSink {
    /// Whether the head of the response has already been written out. After
    /// that point, no more header fields can be emitted.
    fn headers_sent(&self) -> bool;

    /// Sets the status line, e.g. `HTTP/1.1 200 OK`.
    fn emit_status_line(&mut self, line: &str);

    fn emit_header(&mut self, name: &str, value: &str);
}
