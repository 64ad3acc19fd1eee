// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp normalization.
//!
//! Every timestamp written to the catalog is rendered as `%Y-%m-%d %H:%M:%S`
//! in UTC+08:00 (Asia/Shanghai, which has no daylight saving).

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

/// Hours east of UTC for rendered catalog timestamps.
pub const CATALOG_UTC_OFFSET_HOURS: i64 = 8;

/// Output format of every catalog timestamp.
pub const CATALOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders an instant in the catalog time zone.
pub fn format_catalog_time(instant: DateTime<Utc>) -> String {
    (instant.naive_utc() + TimeDelta::hours(CATALOG_UTC_OFFSET_HOURS))
        .format(CATALOG_TIME_FORMAT)
        .to_string()
}

/// The current processing time, rendered in the catalog time zone.
pub fn now_catalog_time() -> String {
    format_catalog_time(Utc::now())
}

/// Parses an ISO-like date-time token and renders it in the catalog time zone.
///
/// Tokens without an explicit offset are taken as UTC. Returns `None` if the
/// token is not a valid date-time.
pub fn normalize_timestamp(token: &str) -> Option<String> {
    let token = token.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return Some(format_catalog_time(dt.with_timezone(&Utc)));
    }
    if let Ok(dt) = DateTime::parse_from_str(token, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(format_catalog_time(dt.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(token, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| format_catalog_time(naive.and_utc()))
}
