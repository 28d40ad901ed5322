// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::io::AsyncWrite;

pub use messaggero_http::HeaderSink;

/// The connection a response is written to. The head is emitted through the
/// [`HeaderSink`] half, the body through [`AsyncWrite`].
pub trait Transport: HeaderSink + AsyncWrite + Unpin + Send {
    /// Whether the peer is still connected. Streaming stops as soon as this
    /// returns `false`.
    fn is_connected(&self) -> bool;
}

/// A [`Transport`] that collects the response in memory, formatted as an
/// HTTP/1.1 message. The head is written out on the first write or flush,
/// after which [`HeaderSink::headers_sent`] reports `true`.
#[derive(Debug, Default)]
pub struct BufferedTransport {
    status_line: Option<String>,
    headers: Vec<(String, String)>,
    head_length: Option<usize>,
    output: Vec<u8>,
    disconnect_after: Option<usize>,
}

impl BufferedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a peer that goes away once `bytes` of the body have been
    /// written.
    #[must_use]
    pub fn with_disconnect_after(mut self, bytes: usize) -> Self {
        self.disconnect_after = Some(bytes);
        self
    }

    pub fn status_line(&self) -> Option<&str> {
        self.status_line.as_deref()
    }

    /// Every emitted header, in order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The last value emitted for the header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .rev()
            .find(|(header_name, _)| header_name.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The bytes of the body written so far.
    pub fn body(&self) -> &[u8] {
        match self.head_length {
            Some(length) => &self.output[length..],
            None => &[],
        }
    }

    /// The complete message as it would appear on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.output
    }

    fn write_head(&mut self) {
        if self.head_length.is_some() {
            return;
        }

        let status_line = self.status_line.as_deref().unwrap_or("HTTP/1.1 200 OK");
        let mut head = String::with_capacity(1024);
        head.push_str(status_line);
        head.push_str("\r\n");

        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }

        head.push_str("\r\n");

        self.output.extend_from_slice(head.as_bytes());
        self.head_length = Some(self.output.len());
    }
}

impl HeaderSink for BufferedTransport {
    fn headers_sent(&self) -> bool {
        self.head_length.is_some()
    }

    fn emit_status_line(&mut self, line: &str) {
        self.status_line = Some(line.to_owned());
    }

    fn emit_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_owned(), value.to_owned()));
    }
}

impl AsyncWrite for BufferedTransport {
    fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        this.write_head();
        this.output.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.get_mut().write_head();
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.poll_flush(cx)
    }
}

impl Transport for BufferedTransport {
    fn is_connected(&self) -> bool {
        match self.disconnect_after {
            Some(limit) => self.body().len() < limit,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_head_is_written_on_first_write() {
        let mut transport = BufferedTransport::new();
        transport.emit_status_line("HTTP/1.1 404 Not Found");
        transport.emit_header("Content-Length", "2");
        assert!(!transport.headers_sent());

        transport.write_all(b"no").await.unwrap();
        assert!(transport.headers_sent());
        assert_eq!(transport.as_bytes(), b"HTTP/1.1 404 Not Found\r\nContent-Length: 2\r\n\r\nno");
        assert_eq!(transport.body(), b"no");
        assert_eq!(transport.header("content-length"), Some("2"));
    }

    #[tokio::test]
    async fn test_flush_writes_head() {
        let mut transport = BufferedTransport::new();
        transport.flush().await.unwrap();
        assert!(transport.headers_sent());
        assert_eq!(transport.as_bytes(), b"HTTP/1.1 200 OK\r\n\r\n");
    }

    #[tokio::test]
    async fn test_disconnect_after() {
        let mut transport = BufferedTransport::new().with_disconnect_after(4);
        assert!(transport.is_connected());
        transport.write_all(b"abc").await.unwrap();
        assert!(transport.is_connected());
        transport.write_all(b"d").await.unwrap();
        assert!(!transport.is_connected());
    }
}
