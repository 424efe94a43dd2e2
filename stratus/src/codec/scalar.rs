//! Order-preserving rendering of scalar values.
//!
//! Blob tags are compared byte-lexicographically by the server, so range
//! predicates on numbers and timestamps only work when the rendered form
//! sorts the same way the source domain does. Naked decimal integers of
//! varying length do not (`"10" < "9"`), hence the fixed-width forms here.

use chrono::{DateTime, Utc};

/// Sign prefix for negative integers. Must order below [`POSITIVE_PREFIX`]
/// in the tag alphabet.
const NEGATIVE_PREFIX: char = '-';

/// Sign prefix for non-negative integers. `+` is outside the tag alphabet;
/// `.` is the smallest allowed character that orders above `-`.
const POSITIVE_PREFIX: char = '.';

/// Digit width covering the full `i64` magnitude range.
const INTEGER_WIDTH: usize = 19;

const COMPLEMENT_BASE: u128 = 9_999_999_999_999_999_999;

/// Renders a signed integer in a fixed-width, sign-prefixed decimal form
/// whose byte-lexicographic order equals numeric order.
///
/// Non-negative values are zero-padded behind the positive prefix. Negative
/// values store the nines' complement of their magnitude behind the negative
/// prefix, so that larger magnitudes sort earlier.
pub fn encode_integer(value: i64) -> String {
    if value >= 0 {
        format!("{}{:0width$}", POSITIVE_PREFIX, value, width = INTEGER_WIDTH)
    } else {
        let complement = COMPLEMENT_BASE - value.unsigned_abs() as u128;
        format!(
            "{}{:0width$}",
            NEGATIVE_PREFIX,
            complement,
            width = INTEGER_WIDTH
        )
    }
}

/// Renders a timestamp in the canonical extended ISO-8601 UTC form.
///
/// The canonical form `YYYY-MM-DDTHH:MM:SS.sssZ` is fixed-width and built
/// entirely from tag-alphabet characters, so it passes through the tag
/// escaper unchanged and compares chronologically.
pub fn encode_timestamp(dt: &DateTime<Utc>) -> String {
    crate::common::canonical_iso_datetime(dt)
}
