// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::{
    borrow::Cow,
    sync::{PoisonError, RwLock},
};

use hashbrown::{HashMap, HashSet};
use lazy_static::lazy_static;
use phf::phf_map;
use unicase::UniCase;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeaderName {
    /// A header name without a dedicated variant, stored in lowercase.
    Other(String),

    Accept,
    AcceptCharset,
    AcceptEncoding,
    AcceptLanguage,
    AcceptRanges,
    AccessControlAllowCredentials,
    AccessControlAllowHeaders,
    AccessControlAllowMethods,
    AccessControlAllowOrigin,
    AccessControlExposeHeaders,
    AccessControlMaxAge,
    AccessControlRequestHeaders,
    AccessControlRequestMethod,
    Age,
    Allow,
    AltSvc,
    Authorization,
    CacheControl,
    Connection,
    ContentDisposition,
    ContentEncoding,
    ContentLanguage,
    ContentLength,
    ContentLocation,
    ContentMD5,
    ContentRange,
    ContentSecurityPolicy,
    ContentSecurityPolicyReportOnly,
    ContentType,
    Cookie,
    Date,
    DNT,
    ETag,
    Expect,
    Expires,
    Forwarded,
    From,
    Host,
    IfMatch,
    IfModifiedSince,
    IfNoneMatch,
    IfRange,
    IfUnmodifiedSince,
    KeepAlive,
    LastModified,
    Link,
    Location,
    MaxForwards,
    Origin,
    P3P,
    Pragma,
    ProxyAuthenticate,
    ProxyAuthorization,
    Range,
    Referer,
    ReferrerPolicy,
    Refresh,
    RetryAfter,
    Server,
    SetCookie,
    StrictTransportSecurity,
    TE,
    Trailer,
    TransferEncoding,
    Upgrade,
    UpgradeInsecureRequests,
    UserAgent,
    Vary,
    Via,
    Warning,
    WwwAuthenticate,
    XContentTypeOptions,
    XCsrfToken,
    XForwardedFor,
    XForwardedHost,
    XForwardedProto,
    XFrameOptions,
    XHttpMethodOverride,
    XPoweredBy,
    XRequestedWith,
    XXSSProtection,
}

static STRING_TO_HEADER_NAME_MAP: phf::Map<UniCase<&'static str>, HeaderName> = phf_map!(
    UniCase::ascii("accept") => HeaderName::Accept,
    UniCase::ascii("accept-charset") => HeaderName::AcceptCharset,
    UniCase::ascii("accept-encoding") => HeaderName::AcceptEncoding,
    UniCase::ascii("accept-language") => HeaderName::AcceptLanguage,
    UniCase::ascii("accept-ranges") => HeaderName::AcceptRanges,
    UniCase::ascii("access-control-allow-credentials") => HeaderName::AccessControlAllowCredentials,
    UniCase::ascii("access-control-allow-headers") => HeaderName::AccessControlAllowHeaders,
    UniCase::ascii("access-control-allow-methods") => HeaderName::AccessControlAllowMethods,
    UniCase::ascii("access-control-allow-origin") => HeaderName::AccessControlAllowOrigin,
    UniCase::ascii("access-control-expose-headers") => HeaderName::AccessControlExposeHeaders,
    UniCase::ascii("access-control-max-age") => HeaderName::AccessControlMaxAge,
    UniCase::ascii("access-control-request-headers") => HeaderName::AccessControlRequestHeaders,
    UniCase::ascii("access-control-request-method") => HeaderName::AccessControlRequestMethod,
    UniCase::ascii("age") => HeaderName::Age,
    UniCase::ascii("allow") => HeaderName::Allow,
    UniCase::ascii("alt-svc") => HeaderName::AltSvc,
    UniCase::ascii("authorization") => HeaderName::Authorization,
    UniCase::ascii("cache-control") => HeaderName::CacheControl,
    UniCase::ascii("connection") => HeaderName::Connection,
    UniCase::ascii("content-disposition") => HeaderName::ContentDisposition,
    UniCase::ascii("content-encoding") => HeaderName::ContentEncoding,
    UniCase::ascii("content-language") => HeaderName::ContentLanguage,
    UniCase::ascii("content-length") => HeaderName::ContentLength,
    UniCase::ascii("content-location") => HeaderName::ContentLocation,
    UniCase::ascii("content-md5") => HeaderName::ContentMD5,
    UniCase::ascii("content-range") => HeaderName::ContentRange,
    UniCase::ascii("content-security-policy") => HeaderName::ContentSecurityPolicy,
    UniCase::ascii("content-security-policy-report-only") => HeaderName::ContentSecurityPolicyReportOnly,
    UniCase::ascii("content-type") => HeaderName::ContentType,
    UniCase::ascii("cookie") => HeaderName::Cookie,
    UniCase::ascii("date") => HeaderName::Date,
    UniCase::ascii("dnt") => HeaderName::DNT,
    UniCase::ascii("etag") => HeaderName::ETag,
    UniCase::ascii("expect") => HeaderName::Expect,
    UniCase::ascii("expires") => HeaderName::Expires,
    UniCase::ascii("forwarded") => HeaderName::Forwarded,
    UniCase::ascii("from") => HeaderName::From,
    UniCase::ascii("host") => HeaderName::Host,
    UniCase::ascii("if-match") => HeaderName::IfMatch,
    UniCase::ascii("if-modified-since") => HeaderName::IfModifiedSince,
    UniCase::ascii("if-none-match") => HeaderName::IfNoneMatch,
    UniCase::ascii("if-range") => HeaderName::IfRange,
    UniCase::ascii("if-unmodified-since") => HeaderName::IfUnmodifiedSince,
    UniCase::ascii("keep-alive") => HeaderName::KeepAlive,
    UniCase::ascii("last-modified") => HeaderName::LastModified,
    UniCase::ascii("link") => HeaderName::Link,
    UniCase::ascii("location") => HeaderName::Location,
    UniCase::ascii("max-forwards") => HeaderName::MaxForwards,
    UniCase::ascii("origin") => HeaderName::Origin,
    UniCase::ascii("p3p") => HeaderName::P3P,
    UniCase::ascii("pragma") => HeaderName::Pragma,
    UniCase::ascii("proxy-authenticate") => HeaderName::ProxyAuthenticate,
    UniCase::ascii("proxy-authorization") => HeaderName::ProxyAuthorization,
    UniCase::ascii("range") => HeaderName::Range,
    UniCase::ascii("referer") => HeaderName::Referer,
    UniCase::ascii("referrer-policy") => HeaderName::ReferrerPolicy,
    UniCase::ascii("refresh") => HeaderName::Refresh,
    UniCase::ascii("retry-after") => HeaderName::RetryAfter,
    UniCase::ascii("server") => HeaderName::Server,
    UniCase::ascii("set-cookie") => HeaderName::SetCookie,
    UniCase::ascii("strict-transport-security") => HeaderName::StrictTransportSecurity,
    UniCase::ascii("te") => HeaderName::TE,
    UniCase::ascii("trailer") => HeaderName::Trailer,
    UniCase::ascii("transfer-encoding") => HeaderName::TransferEncoding,
    UniCase::ascii("upgrade") => HeaderName::Upgrade,
    UniCase::ascii("upgrade-insecure-requests") => HeaderName::UpgradeInsecureRequests,
    UniCase::ascii("user-agent") => HeaderName::UserAgent,
    UniCase::ascii("vary") => HeaderName::Vary,
    UniCase::ascii("via") => HeaderName::Via,
    UniCase::ascii("warning") => HeaderName::Warning,
    UniCase::ascii("www-authenticate") => HeaderName::WwwAuthenticate,
    UniCase::ascii("x-content-type-options") => HeaderName::XContentTypeOptions,
    UniCase::ascii("x-csrf-token") => HeaderName::XCsrfToken,
    UniCase::ascii("x-forwarded-for") => HeaderName::XForwardedFor,
    UniCase::ascii("x-forwarded-host") => HeaderName::XForwardedHost,
    UniCase::ascii("x-forwarded-proto") => HeaderName::XForwardedProto,
    UniCase::ascii("x-frame-options") => HeaderName::XFrameOptions,
    UniCase::ascii("x-http-method-override") => HeaderName::XHttpMethodOverride,
    UniCase::ascii("x-powered-by") => HeaderName::XPoweredBy,
    UniCase::ascii("x-requested-with") => HeaderName::XRequestedWith,
    UniCase::ascii("x-xss-protection") => HeaderName::XXSSProtection,
);

/// Header names registered at runtime, in addition to the static table.
#[derive(Default)]
struct HeaderNameRegistry {
    /// lowercase name => canonical name
    canonical: HashMap<String, String>,

    /// lowercase names of headers that must not be comma-joined.
    multiline: HashSet<String>,
}

lazy_static! {
    static ref REGISTRY: RwLock<HeaderNameRegistry> = RwLock::new(HeaderNameRegistry::default());
}

/// Registers the canonical (display) form of a header name, so that
/// [`canonicalize`] returns `name` for every casing of it.
///
/// The registry is process-wide. Register names during startup, before
/// requests are being handled.
pub fn register(name: &str) {
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    registry.canonical.insert(name.to_ascii_lowercase(), name.to_owned());
}

/// Registers the header name like [`register`], and marks it as a header of
/// which every value must be emitted on its own line.
pub fn register_multiline(name: &str) {
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    let lowercase = name.to_ascii_lowercase();
    registry.canonical.insert(lowercase.clone(), name.to_owned());
    registry.multiline.insert(lowercase);
}

/// Returns the canonical form of the given header name. Names that are
/// neither known nor registered are returned unchanged.
///
/// ```
/// # use messaggero_http::canonicalize;
/// assert_eq!(canonicalize("content-TYPE"), "Content-Type");
/// assert_eq!(canonicalize("X-Custom-thing"), "X-Custom-thing");
/// ```
#[must_use]
pub fn canonicalize(name: &str) -> String {
    if let Some(header_name) = STRING_TO_HEADER_NAME_MAP.get(&UniCase::ascii(name)) {
        return header_name.to_string_h1().to_owned();
    }

    let registry = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    match registry.canonical.get(&name.to_ascii_lowercase()) {
        Some(canonical) => canonical.clone(),
        None => name.to_owned(),
    }
}

/// Returns whether the values of this header must be sent as separate lines,
/// instead of a single comma-separated line.
#[must_use]
pub fn is_multiline(name: &str) -> bool {
    HeaderName::from(name).is_multiline()
}

impl From<String> for HeaderName {
    #[must_use]
    fn from(mut value: String) -> Self {
        match STRING_TO_HEADER_NAME_MAP.get(&UniCase::ascii(&value)) {
            Some(header_name) => header_name.clone(),
            None => {
                value.make_ascii_lowercase();
                HeaderName::Other(value)
            }
        }
    }
}

impl From<&str> for HeaderName {
    #[must_use]
    fn from(value: &str) -> Self {
        match STRING_TO_HEADER_NAME_MAP.get(&UniCase::ascii(value)) {
            Some(header_name) => header_name.clone(),
            None => HeaderName::Other(value.to_ascii_lowercase()),
        }
    }
}

impl HeaderName {
    /// Returns whether the values of this header must be sent as separate
    /// lines. Comma-joining them would change their meaning, since their
    /// values may contain commas themselves (e.g. the `Expires` attribute of
    /// `Set-Cookie`).
    #[must_use]
    pub fn is_multiline(&self) -> bool {
        match self {
            HeaderName::SetCookie
                | HeaderName::WwwAuthenticate
                | HeaderName::ProxyAuthenticate
                | HeaderName::Link => true,
            HeaderName::Other(name) => {
                REGISTRY.read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .multiline
                    .contains(name.as_str())
            }
            _ => false,
        }
    }

    /// Get the name in the form it is sent on the wire.
    #[must_use]
    pub fn canonical(&self) -> Cow<'_, str> {
        match self {
            HeaderName::Other(name) => Cow::Owned(canonicalize(name)),
            _ => Cow::Borrowed(self.to_string_h1()),
        }
    }

    /// Get the lowercase format of the header.
    #[must_use]
    pub fn to_string_lowercase(&self) -> Cow<'static, str> {
        match self {
            HeaderName::Other(name) => Cow::Owned(name.clone()),
            _ => Cow::Owned(self.to_string_h1().to_ascii_lowercase()),
        }
    }

    #[must_use]
    pub fn to_string_h1(&self) -> &str {
        match self {
            HeaderName::Other(str) => str,

            HeaderName::Accept => "Accept",
            HeaderName::AcceptCharset => "Accept-Charset",
            HeaderName::AcceptEncoding => "Accept-Encoding",
            HeaderName::AcceptLanguage => "Accept-Language",
            HeaderName::AcceptRanges => "Accept-Ranges",
            HeaderName::AccessControlAllowCredentials => "Access-Control-Allow-Credentials",
            HeaderName::AccessControlAllowHeaders => "Access-Control-Allow-Headers",
            HeaderName::AccessControlAllowMethods => "Access-Control-Allow-Methods",
            HeaderName::AccessControlAllowOrigin => "Access-Control-Allow-Origin",
            HeaderName::AccessControlExposeHeaders => "Access-Control-Expose-Headers",
            HeaderName::AccessControlMaxAge => "Access-Control-Max-Age",
            HeaderName::AccessControlRequestHeaders => "Access-Control-Request-Headers",
            HeaderName::AccessControlRequestMethod => "Access-Control-Request-Method",
            HeaderName::Age => "Age",
            HeaderName::Allow => "Allow",
            HeaderName::AltSvc => "Alt-Svc",
            HeaderName::Authorization => "Authorization",
            HeaderName::CacheControl => "Cache-Control",
            HeaderName::Connection => "Connection",
            HeaderName::ContentDisposition => "Content-Disposition",
            HeaderName::ContentEncoding => "Content-Encoding",
            HeaderName::ContentLanguage => "Content-Language",
            HeaderName::ContentLength => "Content-Length",
            HeaderName::ContentLocation => "Content-Location",
            HeaderName::ContentMD5 => "Content-MD5",
            HeaderName::ContentRange => "Content-Range",
            HeaderName::ContentSecurityPolicy => "Content-Security-Policy",
            HeaderName::ContentSecurityPolicyReportOnly => "Content-Security-Policy-Report-Only",
            HeaderName::ContentType => "Content-Type",
            HeaderName::Cookie => "Cookie",
            HeaderName::Date => "Date",
            HeaderName::DNT => "DNT",
            HeaderName::ETag => "ETag",
            HeaderName::Expect => "Expect",
            HeaderName::Expires => "Expires",
            HeaderName::Forwarded => "Forwarded",
            HeaderName::From => "From",
            HeaderName::Host => "Host",
            HeaderName::IfMatch => "If-Match",
            HeaderName::IfModifiedSince => "If-Modified-Since",
            HeaderName::IfNoneMatch => "If-None-Match",
            HeaderName::IfRange => "If-Range",
            HeaderName::IfUnmodifiedSince => "If-Unmodified-Since",
            HeaderName::KeepAlive => "Keep-Alive",
            HeaderName::LastModified => "Last-Modified",
            HeaderName::Link => "Link",
            HeaderName::Location => "Location",
            HeaderName::MaxForwards => "Max-Forwards",
            HeaderName::Origin => "Origin",
            HeaderName::P3P => "P3P",
            HeaderName::Pragma => "Pragma",
            HeaderName::ProxyAuthenticate => "Proxy-Authenticate",
            HeaderName::ProxyAuthorization => "Proxy-Authorization",
            HeaderName::Range => "Range",
            HeaderName::Referer => "Referer",
            HeaderName::ReferrerPolicy => "Referrer-Policy",
            HeaderName::Refresh => "Refresh",
            HeaderName::RetryAfter => "Retry-After",
            HeaderName::Server => "Server",
            HeaderName::SetCookie => "Set-Cookie",
            HeaderName::StrictTransportSecurity => "Strict-Transport-Security",
            HeaderName::TE => "TE",
            HeaderName::Trailer => "Trailer",
            HeaderName::TransferEncoding => "Transfer-Encoding",
            HeaderName::Upgrade => "Upgrade",
            HeaderName::UpgradeInsecureRequests => "Upgrade-Insecure-Requests",
            HeaderName::UserAgent => "User-Agent",
            HeaderName::Vary => "Vary",
            HeaderName::Via => "Via",
            HeaderName::Warning => "Warning",
            HeaderName::WwwAuthenticate => "WWW-Authenticate",
            HeaderName::XContentTypeOptions => "X-Content-Type-Options",
            HeaderName::XCsrfToken => "X-CSRF-Token",
            HeaderName::XForwardedFor => "X-Forwarded-For",
            HeaderName::XForwardedHost => "X-Forwarded-Host",
            HeaderName::XForwardedProto => "X-Forwarded-Proto",
            HeaderName::XFrameOptions => "X-Frame-Options",
            HeaderName::XHttpMethodOverride => "X-HTTP-Method-Override",
            HeaderName::XPoweredBy => "X-Powered-By",
            HeaderName::XRequestedWith => "X-Requested-With",
            HeaderName::XXSSProtection => "X-XSS-Protection",
        }
    }
}
