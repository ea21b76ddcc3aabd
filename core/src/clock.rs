use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

const ISO_MILLIS_UTC: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
);

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or_default()
}

pub fn unix_seconds() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Current UTC time as `2026-01-31T12:00:00.000Z`.
pub fn now_iso() -> String {
    format_iso(OffsetDateTime::now_utc())
}

pub fn format_iso(at: OffsetDateTime) -> String {
    at.to_offset(time::UtcOffset::UTC)
        .format(ISO_MILLIS_UTC)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

pub fn format_unix_seconds(seconds: f64) -> String {
    let nanos = (seconds * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .map(format_iso)
        .unwrap_or_else(|_| seconds.to_string())
}

pub fn base36_suffix<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}
