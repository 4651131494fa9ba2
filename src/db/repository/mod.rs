//! Repository layer — entity-scoped database operations.
//!
//! One sub-module per aggregate plus the enrollment pivot. All public
//! functions are re-exported here.

mod client;
mod enrollment;
mod program;

use chrono::{NaiveDateTime, Timelike, Utc};
use uuid::Uuid;

use super::DatabaseError;

pub use client::*;
pub use enrollment::*;
pub use program::*;

/// Storage format for timestamp TEXT columns.
pub(crate) const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time truncated to whole seconds, so values survive the
/// TEXT round trip.
pub fn now_utc() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_default()
}
