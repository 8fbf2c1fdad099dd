//! Canonical ordering and text forms for deterministic hashing.
//!
//! ## Determinism Guarantees
//!
//! - Struct fields: excluded fields are dropped, the rest are ordered by name,
//!   byte-wise ascending. Declaration order never matters.
//! - Map entries: ordered by the canonical bytes of the key, ties broken by the
//!   canonical bytes of the value. Insertion and bucket order never matter.
//! - Sequences keep their positional order.
//! - Instants: RFC 3339 with nanosecond precision, trailing fractional zeros
//!   trimmed, `Z` for UTC and `±HH:MM` otherwise.
//!
//! Orderings are computed per value and never cached.

use chrono::{DateTime, FixedOffset, TimeZone, Timelike};

use crate::filter::include_field;
use crate::value::Field;

/// Included fields of a struct, in canonical order.
pub fn ordered_fields<'v, 'a>(fields: &'v [Field<'a>]) -> Vec<&'v Field<'a>> {
    let mut included: Vec<&Field<'a>> = fields
        .iter()
        .filter(|field| {
            let keep = include_field(field.marker);
            if !keep {
                tracing::debug!(field = field.name, type_name = field.type_name, "field excluded from identity");
            }
            keep
        })
        .collect();

    // Stable sort keeps declaration order for duplicate names.
    included.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    included
}

/// Encoded map entries `(key, value)`, in canonical order.
pub fn ordered_entries(mut entries: Vec<(Vec<u8>, Vec<u8>)>) -> Vec<(Vec<u8>, Vec<u8>)> {
    entries.sort_unstable();
    entries
}

/// Canonical text form of an instant.
///
/// # Example
///
/// ```rust
/// use chrono::{FixedOffset, TimeZone};
/// use destruct::canonical::format_instant;
///
/// let est = FixedOffset::west_opt(5 * 3600).unwrap();
/// let birth = est.with_ymd_and_hms(1967, 11, 27, 0, 0, 0).unwrap();
/// assert_eq!(format_instant(&birth), "1967-11-27T00:00:00-05:00");
/// ```
pub fn format_instant(instant: &DateTime<FixedOffset>) -> String {
    let mut text = instant.format("%Y-%m-%dT%H:%M:%S").to_string();

    // Leap seconds are carried as nanosecond >= 1e9.
    let nanos = instant.nanosecond() % 1_000_000_000;
    if nanos != 0 {
        let fraction = format!("{nanos:09}");
        text.push('.');
        text.push_str(fraction.trim_end_matches('0'));
    }

    if instant.offset().local_minus_utc() == 0 {
        text.push('Z');
    } else {
        text.push_str(&instant.format("%:z").to_string());
    }
    text
}

/// Zero instant, `0001-01-01T00:00:00Z`.
pub fn zero_instant() -> Option<DateTime<FixedOffset>> {
    FixedOffset::east_opt(0)?
        .with_ymd_and_hms(1, 1, 1, 0, 0, 0)
        .single()
}
