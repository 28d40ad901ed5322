// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! HTTP dates (RFC 9110 section 5.6.7) can only express the years 1970
//! through 9999, while a [`SystemTime`] can lie outside of that, e.g. the
//! modification time of a file or an expiry computed from an untrusted
//! `Max-Age`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// `Fri, 31 Dec 9999 23:59:59 GMT`
const LATEST_HTTP_DATE_SECONDS: u64 = 253_402_300_799;

/// The latest moment an HTTP date can express.
#[must_use]
pub fn latest_http_date() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(LATEST_HTTP_DATE_SECONDS)
}

/// Whether the time can be formatted as an HTTP date.
#[must_use]
pub fn is_http_date(time: SystemTime) -> bool {
    time >= UNIX_EPOCH && time <= latest_http_date()
}

/// Clamps the time into the range of HTTP dates.
#[must_use]
pub fn clamp_to_http_date(time: SystemTime) -> SystemTime {
    time.clamp(UNIX_EPOCH, latest_http_date())
}

/// Adds the duration, saturating at the latest HTTP date.
#[must_use]
pub fn http_date_after(time: SystemTime, duration: Duration) -> SystemTime {
    time.checked_add(duration)
        .map(clamp_to_http_date)
        .unwrap_or_else(latest_http_date)
}

/// Formats the time as an IMF-fixdate, clamping it first.
#[must_use]
pub fn fmt_http_date(time: SystemTime) -> String {
    httpdate::fmt_http_date(clamp_to_http_date(time))
}
