// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::{
    path::Path,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use messaggero_http::{
    date::{fmt_http_date, http_date_after},
    reason_phrase,
    validate_status_code,
    Cookie,
    HeaderName,
    Method,
    ValidationError,
};
use messaggero_resources::MediaType;
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::{
    config::DownloadOptions,
    download::{RangeDownload, TransferOutcome},
    error::{Result, SequenceViolation},
    message::{HttpMessage, Message},
    request::Request,
    session::ActiveSession,
    transport::Transport,
};

const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

/// What the response needs to know about the request it answers.
#[derive(Clone, Debug)]
struct RequestContext {
    method: Method,
    range: Option<String>,
}

#[derive(Debug)]
pub struct Response {
    message: Message,
    status_code: u16,
    reason: Option<String>,
    context: RequestContext,
    sent: bool,
    download: Option<RangeDownload>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            message: Message::default(),
            status_code: 200,
            reason: None,
            context: RequestContext {
                method: Method::Get,
                range: None,
            },
            sent: false,
            download: None,
        }
    }
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the response to `request`, answering in the same protocol.
    pub fn for_request(request: &Request) -> Self {
        let mut response = Self::default();
        response.message.version = request.protocol();
        response.context = RequestContext {
            method: request.method(),
            range: request.range().map(str::to_owned),
        };
        response
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn set_status_code(&mut self, code: u16) -> Result<()> {
        validate_status_code(code)?;
        self.status_code = code;
        self.reason = None;
        Ok(())
    }

    /// Sets the status with a custom reason phrase. Codes the library doesn't
    /// know a reason for must be given one.
    pub fn set_status_line(&mut self, code: u16, reason: Option<&str>) -> Result<()> {
        validate_status_code(code)?;
        if reason.is_none() && reason_phrase(code).is_none() {
            return Err(ValidationError::UnknownStatusRequiresReason(code).into());
        }

        self.status_code = code;
        self.reason = reason.map(str::to_owned);
        Ok(())
    }

    pub fn status_line(&self) -> String {
        let reason = match &self.reason {
            Some(reason) => reason.clone(),
            None => reason_phrase(self.status_code).map(|reason| reason.into_owned()).unwrap_or_default(),
        };
        format!("{} {} {reason}", self.message.version, self.status_code)
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Redirects to `location`. Without an explicit code, a `GET` is answered
    /// with `307 Temporary Redirect` and everything else with
    /// `303 See Other`.
    pub fn redirect(&mut self, location: &str, code: Option<u16>) -> Result<()> {
        let code = match code {
            Some(code) if (300..=308).contains(&code) => code,
            Some(code) => return Err(ValidationError::InvalidRedirectCode(code).into()),
            None if self.context.method == Method::Get => 307,
            None => 303,
        };

        self.set_header(HeaderName::Location, location)?;
        self.set_status_code(code)
    }

    /// Redirects, leaving `flash` in the session for the next request.
    pub fn redirect_with_flash(&mut self, location: &str, flash: Value, session: &mut ActiveSession<'_>, code: Option<u16>) -> Result<()> {
        self.redirect(location, code)?;
        if !is_empty_flash(&flash) {
            session.set_flash(flash);
        }
        Ok(())
    }

    pub fn set_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.message.body = serde_json::to_vec(value)?;
        self.message.headers.set_content_type(&MediaType::JSON);
        Ok(())
    }

    /// Adds the cookie, replacing a cookie with the same name.
    pub fn set_cookie(&mut self, cookie: Cookie) -> Result<()> {
        cookie.validate()?;
        self.message.cookies.insert(cookie.name().to_owned(), cookie);
        Ok(())
    }

    /// Tells the client to remove the cookie.
    pub fn delete_cookie(&mut self, name: &str) {
        self.message.cookies.insert(name.to_owned(), Cookie::removal(name));
    }

    pub fn no_cache(&mut self) {
        let headers = &mut self.message.headers;
        headers.set(HeaderName::CacheControl, "no-store, no-cache, must-revalidate, max-age=0");
        headers.set(HeaderName::Pragma, "no-cache");
        headers.set(HeaderName::Expires, fmt_http_date(UNIX_EPOCH));
    }

    pub fn set_cache(&mut self, max_age: Duration, public: bool) {
        let visibility = if public { "public" } else { "private" };
        let headers = &mut self.message.headers;
        headers.set(HeaderName::CacheControl, format!("{visibility}, max-age={}", max_age.as_secs()));
        headers.set(HeaderName::Expires, fmt_http_date(http_date_after(SystemTime::now(), max_age)));
        headers.remove(HeaderName::Pragma);
    }

    /// Sets the `Content-Type`. A `charset` replaces the one the media type
    /// carries.
    pub fn set_content_type(&mut self, media_type: &MediaType, charset: Option<&str>) -> Result<()> {
        let value = match charset {
            Some(charset) => format!("{}; charset={charset}", media_type.essence()),
            None => media_type.as_str().to_owned(),
        };
        self.set_header(HeaderName::ContentType, value)?;
        Ok(())
    }

    pub fn set_last_modified(&mut self, date_time: SystemTime) {
        self.message.headers.set_last_modified(date_time);
    }

    /// Makes the file the body of this response, honouring the `Range`
    /// header of the request.
    pub async fn set_download(&mut self, path: impl AsRef<Path>, options: DownloadOptions) -> Result<()> {
        let download = RangeDownload::open(path, options, self.context.range.as_deref()).await?;
        self.set_status_code(download.status_code())?;
        self.download = Some(download);
        Ok(())
    }

    pub fn download(&self) -> Option<&RangeDownload> {
        self.download.as_ref()
    }

    /// Sends the head and the body. A response can only be sent once.
    pub async fn send<T: Transport>(&mut self, transport: &mut T) -> Result<TransferOutcome> {
        if self.sent {
            return Err(SequenceViolation::AlreadySent.into());
        }

        if transport.headers_sent() {
            return Err(SequenceViolation::HeadersAlreadySent.into());
        }

        self.sent = true;

        let headers = &mut self.message.headers;
        if !headers.contains(HeaderName::Date) {
            headers.set_date(SystemTime::now());
        }

        match &self.download {
            Some(download) => download.apply_headers(headers),
            None => headers.set_content_length(self.message.body.len() as u64),
        }

        if !headers.contains(HeaderName::ContentType) {
            headers.set(HeaderName::ContentType, DEFAULT_CONTENT_TYPE);
        }

        let status_line = self.status_line();
        debug!("Sending \"{status_line}\"");
        transport.emit_status_line(&status_line);

        for (name, value) in self.message.headers.wire_lines() {
            transport.emit_header(name, &value);
        }

        for cookie in self.message.cookies.values() {
            if !cookie.send(transport) {
                return Err(SequenceViolation::HeadersAlreadySent.into());
            }
        }

        #[cfg(feature = "debugging")]
        let start_body = std::time::Instant::now();

        let outcome = if self.context.method == Method::Head {
            TransferOutcome::Completed
        } else if let Some(download) = &mut self.download {
            download.transfer(transport).await?
        } else {
            transport.write_all(&self.message.body).await?;
            TransferOutcome::Completed
        };

        if outcome == TransferOutcome::Completed {
            transport.flush().await?;
        }

        #[cfg(feature = "debugging")]
        debug!("Body of \"{status_line}\" sent in {}ms ({outcome:?})", start_body.elapsed().as_millis());

        Ok(outcome)
    }
}

impl HttpMessage for Response {
    fn message(&self) -> &Message {
        &self.message
    }

    fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }
}

fn is_empty_flash(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(string) => string.is_empty(),
        Value::Array(array) => array.is_empty(),
        Value::Object(object) => object.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use serde_json::json;

    use crate::{
        environment::Environment,
        session::MemorySessionStore,
        transport::BufferedTransport,
        Error,
        RequestSettings,
    };

    fn request(method: &str) -> Request {
        let environment = Environment::default()
            .with_server("REQUEST_METHOD", method)
            .with_header("Host", "example.com");
        Request::from_environment(environment, &RequestSettings::default()).unwrap()
    }

    #[rstest]
    #[case(99, false)]
    #[case(100, true)]
    #[case(418, true)]
    #[case(599, true)]
    #[case(600, false)]
    fn test_set_status_code(#[case] code: u16, #[case] valid: bool) {
        let mut response = Response::new();
        assert_eq!(response.set_status_code(code).is_ok(), valid);
    }

    #[test]
    fn test_status_line() {
        let mut response = Response::new();
        assert_eq!(response.status_line(), "HTTP/1.1 200 OK");

        response.set_status_line(404, Some("Nothing Here")).unwrap();
        assert_eq!(response.status_line(), "HTTP/1.1 404 Nothing Here");

        let result = response.set_status_line(599, None);
        assert!(matches!(result, Err(Error::Validation(ValidationError::UnknownStatusRequiresReason(599)))));

        response.set_status_line(599, Some("Network Timeout")).unwrap();
        assert_eq!(response.status_line(), "HTTP/1.1 599 Network Timeout");
    }

    #[test]
    fn test_answers_in_request_protocol() {
        let environment = Environment::default()
            .with_server("SERVER_PROTOCOL", "HTTP/1.0")
            .with_header("Host", "example.com");
        let request = Request::from_environment(environment, &RequestSettings::default()).unwrap();
        assert_eq!(Response::for_request(&request).status_line(), "HTTP/1.0 200 OK");
    }

    #[rstest]
    #[case("GET", None, 307)]
    #[case("POST", None, 303)]
    #[case("PUT", None, 303)]
    #[case("GET", Some(301), 301)]
    #[case("POST", Some(308), 308)]
    fn test_redirect(#[case] method: &str, #[case] code: Option<u16>, #[case] expected: u16) {
        let mut response = Response::for_request(&request(method));
        response.redirect("/login", code).unwrap();
        assert_eq!(response.status_code(), expected);
        assert_eq!(response.header(HeaderName::Location), Some("/login"));
    }

    #[rstest]
    #[case(200)]
    #[case(309)]
    fn test_invalid_redirect_code(#[case] code: u16) {
        let mut response = Response::new();
        let result = response.redirect("/", Some(code));
        assert!(matches!(result, Err(Error::Validation(ValidationError::InvalidRedirectCode(c))) if c == code));
    }

    #[test]
    fn test_redirect_with_flash() {
        let mut store = MemorySessionStore::new();
        let mut session = ActiveSession::new(&mut store).unwrap();

        let mut response = Response::for_request(&request("POST"));
        response.redirect_with_flash("/", json!({}), &mut session, None).unwrap();
        assert_eq!(session.get(crate::session::FLASH_KEY), None);

        response.redirect_with_flash("/", json!({"notice": "Saved"}), &mut session, None).unwrap();
        assert_eq!(session.take_flash(), Some(json!({"notice": "Saved"})));
    }

    #[tokio::test]
    async fn test_header_injection_is_refused() {
        let mut response = Response::new();
        let result = response.set_header("X-Note", "a\r\nSet-Cookie: admin=1");
        assert!(matches!(result, Err(ValidationError::FieldValueContainsInvalidCharacters)));

        let result = response.redirect("/next\r\nSet-Cookie: admin=1", None);
        assert!(matches!(result, Err(Error::Validation(ValidationError::FieldValueContainsInvalidCharacters))));
        assert_eq!(response.status_code(), 200);

        let mut transport = BufferedTransport::new();
        response.send(&mut transport).await.unwrap();
        assert!(transport.headers().iter().all(|(name, _)| name != "Set-Cookie" && name != "X-Note" && name != "Location"));
    }

    #[test]
    fn test_cache_far_future() {
        let mut response = Response::new();
        response.set_cache(Duration::MAX, false);
        assert_eq!(response.header(HeaderName::Expires), Some("Fri, 31 Dec 9999 23:59:59 GMT"));
    }

    #[test]
    fn test_set_json() {
        let mut response = Response::new();
        response.set_json(&json!({"ok": true})).unwrap();
        assert_eq!(response.body(), br#"{"ok":true}"#);
        assert_eq!(response.header(HeaderName::ContentType), Some("application/json; charset=utf-8"));
    }

    #[test]
    fn test_content_type_charset() {
        let mut response = Response::new();
        response.set_content_type(&MediaType::PLAIN_TEXT, Some("iso-8859-1")).unwrap();
        assert_eq!(response.header("content-type"), Some("text/plain; charset=iso-8859-1"));

        let result = response.set_content_type(&MediaType::PLAIN_TEXT, Some("utf-8\r\nX-Injected: 1"));
        assert!(matches!(result, Err(Error::Validation(ValidationError::FieldValueContainsInvalidCharacters))));
        assert_eq!(response.header("content-type"), Some("text/plain; charset=iso-8859-1"));
    }

    #[test]
    fn test_cache_headers() {
        let mut response = Response::new();
        response.no_cache();
        assert_eq!(response.header(HeaderName::Pragma), Some("no-cache"));

        response.set_cache(Duration::from_secs(3600), true);
        assert_eq!(response.header(HeaderName::CacheControl), Some("public, max-age=3600"));
        assert!(!response.has_header(HeaderName::Pragma));
        assert!(response.has_header(HeaderName::Expires));
    }

    #[test]
    fn test_cookie_without_secure_same_site_none() {
        let mut response = Response::new();
        let cookie = Cookie::new("id", "1").unwrap().with_same_site(messaggero_http::SameSite::None);
        assert!(response.set_cookie(cookie).is_err());
    }

    #[tokio::test]
    async fn test_send() {
        let mut response = Response::new();
        response.set_body("<p>Hi</p>");
        response.set_cookie(Cookie::new("session", "abc").unwrap().with_http_only(true)).unwrap();
        response.append_header("Link", "</a.css>; rel=preload").unwrap();
        response.append_header("Link", "</b.js>; rel=preload").unwrap();

        let mut transport = BufferedTransport::new();
        let outcome = response.send(&mut transport).await.unwrap();

        assert_eq!(outcome, TransferOutcome::Completed);
        assert_eq!(transport.status_line(), Some("HTTP/1.1 200 OK"));
        assert_eq!(transport.header("Content-Type"), Some("text/html; charset=UTF-8"));
        assert_eq!(transport.header("Content-Length"), Some("9"));
        assert_eq!(transport.header("Set-Cookie"), Some("session=abc; HttpOnly"));
        assert!(transport.header("Date").is_some());
        assert_eq!(transport.headers().iter().filter(|(name, _)| name == "Link").count(), 2);
        assert_eq!(transport.body(), b"<p>Hi</p>");
    }

    #[tokio::test]
    async fn test_send_twice() {
        let mut response = Response::new();
        let mut transport = BufferedTransport::new();
        response.send(&mut transport).await.unwrap();

        let result = response.send(&mut BufferedTransport::new()).await;
        assert!(matches!(result, Err(Error::Sequence(SequenceViolation::AlreadySent))));
    }

    #[tokio::test]
    async fn test_headers_already_sent() {
        let mut transport = BufferedTransport::new();
        transport.flush().await.unwrap();

        let result = Response::new().send(&mut transport).await;
        assert!(matches!(result, Err(Error::Sequence(SequenceViolation::HeadersAlreadySent))));
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let mut response = Response::for_request(&request("HEAD"));
        response.set_body("body");

        let mut transport = BufferedTransport::new();
        response.send(&mut transport).await.unwrap();
        assert_eq!(transport.header("Content-Length"), Some("4"));
        assert!(transport.body().is_empty());
    }
}
