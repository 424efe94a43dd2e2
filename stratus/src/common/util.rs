use crate::common::constants::{
    CONTAINER_NAME_PAD, MAX_CONTAINER_NAME_LEN, MIN_CONTAINER_NAME_LEN,
};
use chrono::{DateTime, SecondsFormat, Utc};

/// Sanitizes a collection name into a valid container identifier.
///
/// The name is lowercased, characters outside `[a-z0-9-]` are stripped, runs
/// of `-` are collapsed, leading/trailing `-` are removed, and the result is
/// clamped to the container name length bounds (padded on the right when too
/// short).
pub fn sanitize_container_name(collection: &str) -> String {
    let lowered = collection.to_lowercase();

    let mut sanitized = String::with_capacity(lowered.len());
    let mut last_was_dash = false;
    for ch in lowered.chars() {
        match ch {
            'a'..='z' | '0'..='9' => {
                sanitized.push(ch);
                last_was_dash = false;
            }
            '-' => {
                if !last_was_dash {
                    sanitized.push('-');
                }
                last_was_dash = true;
            }
            _ => {}
        }
    }

    let mut sanitized = sanitized.trim_matches('-').to_string();

    if sanitized.len() > MAX_CONTAINER_NAME_LEN {
        sanitized.truncate(MAX_CONTAINER_NAME_LEN);
        // truncation may expose a trailing dash again
        sanitized = sanitized.trim_end_matches('-').to_string();
    }
    while sanitized.len() < MIN_CONTAINER_NAME_LEN {
        sanitized.push(CONTAINER_NAME_PAD);
    }

    sanitized
}

/// Parses a string as an ISO-8601 / RFC 3339 timestamp.
///
/// Returns `None` when the string is not a well-formed timestamp. Offsets are
/// normalized to UTC so that `2024-01-01T01:00:00+01:00` and
/// `2024-01-01T00:00:00Z` compare equal.
pub fn parse_iso_datetime(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Renders a timestamp in the canonical extended ISO-8601 UTC form
/// `YYYY-MM-DDTHH:MM:SS.sssZ`.
///
/// The fixed millisecond precision keeps byte-lexicographic comparison of
/// rendered values consistent with chronological order.
pub fn canonical_iso_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
