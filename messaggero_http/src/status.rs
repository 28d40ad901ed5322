// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::{
    borrow::Cow,
    sync::{PoisonError, RwLock},
};

use hashbrown::HashMap;
use lazy_static::lazy_static;
use phf::phf_map;

use crate::ValidationError;

/// RFC 9110: https://httpwg.org/specs/rfc9110.html#status.codes
/// IANA: https://www.iana.org/assignments/http-status-codes/http-status-codes.xhtml
/// MDN: https://developer.mozilla.org/en-US/docs/Web/HTTP/Status
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum StatusCode {
    Continue = 100,
    SwitchingProtocols = 101,
    Processing = 102,
    EarlyHints = 103,

    Ok = 200,
    Created = 201,
    Accepted = 202,
    NonAuthoritativeInformation = 203,
    NoContent = 204,
    ResetContent = 205,
    PartialContent = 206,
    MultiStatus = 207,
    AlreadyReported = 208,
    IMUsed = 226,

    MultipleChoices = 300,
    MovedPermanently = 301,
    Found = 302,
    SeeOther = 303,
    NotModified = 304,
    UseProxy = 305,

    TemporaryRedirect = 307,
    PermanentRedirect = 308,

    BadRequest = 400,
    Unauthorized = 401,
    PaymentRequired = 402,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    NotAcceptable = 406,
    ProxyAuthenticationRequired = 407,
    RequestTimeout = 408,
    Conflict = 409,
    Gone = 410,
    LengthRequired = 411,
    PreconditionFailed = 412,
    ContentTooLarge = 413,
    URITooLong = 414,
    UnsupportedMediaType = 415,
    RangeNotSatisfiable = 416,
    ExpectationFailed = 417,
    IMATeapot = 418,

    MisdirectedRequest = 421,
    UnprocessableContent = 422,
    Locked = 423,
    FailedDependency = 424,
    TooEarly = 425,
    UpgradeRequired = 426,
    PreconditionRequired = 428,
    TooManyRequests = 429,

    RequestHeaderFieldsTooLarge = 431,
    UnavailableForLegalReasons = 451,

    InternalServerError = 500,
    NotImplemented = 501,
    BadGateway = 502,
    ServiceUnavailable = 503,
    GatewayTimeout = 504,
    HTTPVersionNotSupported = 505,
    VariantAlsoNegotiates = 506,
    InsufficientStorage = 507,
    LoopDetected = 508,
    NotExtended = 510,
    NetworkAuthenticationRequired = 511,
}

static STATUS_CODE_MAP: phf::Map<u16, StatusCode> = phf_map! {
    100u16 => StatusCode::Continue,
    101u16 => StatusCode::SwitchingProtocols,
    102u16 => StatusCode::Processing,
    103u16 => StatusCode::EarlyHints,
    200u16 => StatusCode::Ok,
    201u16 => StatusCode::Created,
    202u16 => StatusCode::Accepted,
    203u16 => StatusCode::NonAuthoritativeInformation,
    204u16 => StatusCode::NoContent,
    205u16 => StatusCode::ResetContent,
    206u16 => StatusCode::PartialContent,
    207u16 => StatusCode::MultiStatus,
    208u16 => StatusCode::AlreadyReported,
    226u16 => StatusCode::IMUsed,
    300u16 => StatusCode::MultipleChoices,
    301u16 => StatusCode::MovedPermanently,
    302u16 => StatusCode::Found,
    303u16 => StatusCode::SeeOther,
    304u16 => StatusCode::NotModified,
    305u16 => StatusCode::UseProxy,
    307u16 => StatusCode::TemporaryRedirect,
    308u16 => StatusCode::PermanentRedirect,
    400u16 => StatusCode::BadRequest,
    401u16 => StatusCode::Unauthorized,
    402u16 => StatusCode::PaymentRequired,
    403u16 => StatusCode::Forbidden,
    404u16 => StatusCode::NotFound,
    405u16 => StatusCode::MethodNotAllowed,
    406u16 => StatusCode::NotAcceptable,
    407u16 => StatusCode::ProxyAuthenticationRequired,
    408u16 => StatusCode::RequestTimeout,
    409u16 => StatusCode::Conflict,
    410u16 => StatusCode::Gone,
    411u16 => StatusCode::LengthRequired,
    412u16 => StatusCode::PreconditionFailed,
    413u16 => StatusCode::ContentTooLarge,
    414u16 => StatusCode::URITooLong,
    415u16 => StatusCode::UnsupportedMediaType,
    416u16 => StatusCode::RangeNotSatisfiable,
    417u16 => StatusCode::ExpectationFailed,
    418u16 => StatusCode::IMATeapot,
    421u16 => StatusCode::MisdirectedRequest,
    422u16 => StatusCode::UnprocessableContent,
    423u16 => StatusCode::Locked,
    424u16 => StatusCode::FailedDependency,
    425u16 => StatusCode::TooEarly,
    426u16 => StatusCode::UpgradeRequired,
    428u16 => StatusCode::PreconditionRequired,
    429u16 => StatusCode::TooManyRequests,
    431u16 => StatusCode::RequestHeaderFieldsTooLarge,
    451u16 => StatusCode::UnavailableForLegalReasons,
    500u16 => StatusCode::InternalServerError,
    501u16 => StatusCode::NotImplemented,
    502u16 => StatusCode::BadGateway,
    503u16 => StatusCode::ServiceUnavailable,
    504u16 => StatusCode::GatewayTimeout,
    505u16 => StatusCode::HTTPVersionNotSupported,
    506u16 => StatusCode::VariantAlsoNegotiates,
    507u16 => StatusCode::InsufficientStorage,
    508u16 => StatusCode::LoopDetected,
    510u16 => StatusCode::NotExtended,
    511u16 => StatusCode::NetworkAuthenticationRequired,
};

lazy_static! {
    /// Reason phrases for codes that aren't in the IANA registry, registered
    /// by the application at startup.
    static ref CUSTOM_REASONS: RwLock<HashMap<u16, String>> = RwLock::new(HashMap::new());
}

impl StatusCode {
    #[must_use]
    pub fn from_u16(code: u16) -> Option<StatusCode> {
        STATUS_CODE_MAP.get(&code).copied()
    }

    #[must_use]
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    #[must_use]
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Continue => "Continue",
            StatusCode::SwitchingProtocols => "Switching Protocols",
            StatusCode::Processing => "Processing",
            StatusCode::EarlyHints => "Early Hints",

            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::Accepted => "Accepted",
            StatusCode::NonAuthoritativeInformation => "Non-Authoritative Information",
            StatusCode::NoContent => "No Content",
            StatusCode::ResetContent => "Reset Content",
            StatusCode::PartialContent => "Partial Content",
            StatusCode::MultiStatus => "Multi-Status",
            StatusCode::AlreadyReported => "Already Reported",
            StatusCode::IMUsed => "IM Used",
            StatusCode::MultipleChoices => "Multiple Choices",
            StatusCode::MovedPermanently => "Moved Permanently",
            StatusCode::Found => "Found",
            StatusCode::SeeOther => "See Other",
            StatusCode::NotModified => "Not Modified",
            StatusCode::UseProxy => "Use Proxy",
            StatusCode::TemporaryRedirect => "Temporary Redirect",
            StatusCode::PermanentRedirect => "Permanent Redirect",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::PaymentRequired => "Payment Required",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::NotAcceptable => "Not Acceptable",
            StatusCode::ProxyAuthenticationRequired => "Proxy Authentication Required",
            StatusCode::RequestTimeout => "Request Timeout",
            StatusCode::Conflict => "Conflict",
            StatusCode::Gone => "Gone",
            StatusCode::LengthRequired => "Length Required",
            StatusCode::PreconditionFailed => "Precondition Failed",
            StatusCode::ContentTooLarge => "Payload Too Large",
            StatusCode::URITooLong => "URI Too Long",
            StatusCode::UnsupportedMediaType => "Unsupported Media Type",
            StatusCode::RangeNotSatisfiable => "Range Not Satisfiable",
            StatusCode::ExpectationFailed => "Expectation Failed",
            StatusCode::IMATeapot => "I'm a teapot",
            StatusCode::MisdirectedRequest => "Misdirected Request",
            StatusCode::UnprocessableContent => "Unprocessable Entity",
            StatusCode::Locked => "Locked",
            StatusCode::FailedDependency => "Failed Dependency",
            StatusCode::TooEarly => "Too Early",
            StatusCode::UpgradeRequired => "Upgrade Required",
            StatusCode::PreconditionRequired => "Precondition Required",
            StatusCode::TooManyRequests => "Too Many Requests",
            StatusCode::RequestHeaderFieldsTooLarge => "Request Header Fields Too Large",
            StatusCode::UnavailableForLegalReasons => "Unavailable For Legal Reasons",

            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::BadGateway => "Bad Gateway",
            StatusCode::ServiceUnavailable => "Service Unavailable",
            StatusCode::GatewayTimeout => "Gateway Timeout",
            StatusCode::HTTPVersionNotSupported => "HTTP Version Not Supported",
            StatusCode::VariantAlsoNegotiates => "Variant Also Negotiates",
            StatusCode::InsufficientStorage => "Insufficient Storage",
            StatusCode::LoopDetected => "Loop Detected",
            StatusCode::NotExtended => "Not Extended",
            StatusCode::NetworkAuthenticationRequired => "Network Authentication Required",
        }
    }
}

/// Checks that the code is in the range `100..=599`.
pub fn validate_status_code(code: u16) -> Result<(), ValidationError> {
    if (100..=599).contains(&code) {
        Ok(())
    } else {
        Err(ValidationError::InvalidStatusCode(code))
    }
}

/// Returns the reason phrase for the status code: the registered phrase, or
/// otherwise the one from the IANA registry.
#[must_use]
pub fn reason_phrase(code: u16) -> Option<Cow<'static, str>> {
    let custom = CUSTOM_REASONS.read().unwrap_or_else(PoisonError::into_inner);
    if let Some(reason) = custom.get(&code) {
        return Some(Cow::Owned(reason.clone()));
    }

    StatusCode::from_u16(code).map(|status| Cow::Borrowed(status.reason_phrase()))
}

/// Registers a reason phrase for a (non-standard) status code, process-wide.
/// This is meant to be done at startup, before requests are handled.
pub fn register_reason(code: u16, reason: impl Into<String>) -> Result<(), ValidationError> {
    validate_status_code(code)?;
    CUSTOM_REASONS.write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(code, reason.into());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_table_consistency() {
        for (code, status) in STATUS_CODE_MAP.entries() {
            assert_eq!(*code, status.as_u16());
        }
    }

    #[rstest]
    #[case(99, false)]
    #[case(100, true)]
    #[case(599, true)]
    #[case(600, false)]
    fn test_validate_status_code(#[case] code: u16, #[case] valid: bool) {
        assert_eq!(validate_status_code(code).is_ok(), valid);
    }

    #[rstest]
    #[case(200, Some("OK"))]
    #[case(404, Some("Not Found"))]
    #[case(416, Some("Range Not Satisfiable"))]
    #[case(299, None)]
    fn test_reason_phrase(#[case] code: u16, #[case] expected: Option<&str>) {
        assert_eq!(reason_phrase(code).as_deref(), expected);
    }

    #[test]
    fn test_register_reason() {
        assert_eq!(reason_phrase(599), None);
        register_reason(599, "Network Connect Timeout Error").unwrap();
        assert_eq!(reason_phrase(599).as_deref(), Some("Network Connect Timeout Error"));

        assert_eq!(register_reason(600, "Nope"), Err(ValidationError::InvalidStatusCode(600)));
    }
}
