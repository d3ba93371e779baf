//! Clock access
//!
//! Embargo decisions compare against `now()`; stored rows carry `stamp()`.

use chrono::{DateTime, SecondsFormat, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as RFC 3339 UTC with whole seconds, e.g. `2024-06-01T12:00:00Z`
pub fn stamp() -> String {
    stamp_of(now())
}

fn stamp_of(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
