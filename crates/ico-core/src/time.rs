//! # Time Module
//!
//! Parsing and formatting of the instants typed into sale forms.
//!
//! Sale administrators enter dates in a `datetime-local` control, which
//! yields a naive string such as `2024-02-06T15:30`. Those strings carry no
//! offset, so they are interpreted in the configured input offset (JST,
//! UTC+09:00, unless overridden). Strings that already carry an offset
//! (RFC 3339, e.g. database timestamps) are taken as-is.
//!
//! ```text
//! "2024-02-06T15:30"            ──(JST)──►  2024-02-06T06:30:00Z
//! "2024-02-06T15:30:00+00:00"   ─────────►  2024-02-06T15:30:00Z
//! ```

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

use crate::DEFAULT_INPUT_OFFSET_SECS;

/// Naive layouts accepted from form controls, most specific first.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// The default input offset (JST).
pub fn jst() -> FixedOffset {
    // 9 hours is always within chrono's ±24h range.
    FixedOffset::east_opt(DEFAULT_INPUT_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Parses a form date into a UTC instant.
///
/// ## Accepted Input
/// - RFC 3339 with an explicit offset or `Z`
/// - `YYYY-MM-DDTHH:MM[:SS]` or `YYYY-MM-DD HH:MM[:SS]` in `offset`
/// - `YYYY-MM-DD` (midnight in `offset`)
///
/// Returns `None` for anything else, including empty input.
///
/// ## Example
/// ```rust
/// use chrono::{FixedOffset, TimeZone, Utc};
/// use ico_core::time::parse_instant;
///
/// let utc = FixedOffset::east_opt(0).unwrap();
/// let t = parse_instant("2024-01-15T12:00", utc).unwrap();
/// assert_eq!(t, Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());
/// assert!(parse_instant("next tuesday", utc).is_none());
/// ```
pub fn parse_instant(input: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// [`parse_instant`] in JST.
pub fn parse_instant_jst(input: &str) -> Option<DateTime<Utc>> {
    parse_instant(input, jst())
}

/// Formats an instant for a `datetime-local` control: `YYYY-MM-DDTHH:MM`.
pub fn to_input_string(instant: DateTime<Utc>, offset: FixedOffset) -> String {
    instant
        .with_timezone(&offset)
        .format("%Y-%m-%dT%H:%M")
        .to_string()
}

/// Formats an instant for display: `YYYY-MM-DD HH:MM`.
pub fn format_display(instant: DateTime<Utc>, offset: FixedOffset) -> String {
    instant
        .with_timezone(&offset)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Unix seconds for a contract argument; `None` before 1970.
pub fn unix_seconds(instant: DateTime<Utc>) -> Option<u64> {
    u64::try_from(instant.timestamp()).ok()
}

/// Parses a `+HH:MM` / `-HH:MM` / `Z` offset string.
///
/// ## Example
/// ```rust
/// use ico_core::time::parse_offset;
///
/// assert_eq!(parse_offset("+09:00").unwrap().local_minus_utc(), 9 * 3600);
/// assert_eq!(parse_offset("Z").unwrap().local_minus_utc(), 0);
/// assert!(parse_offset("JST").is_none());
/// ```
pub fn parse_offset(input: &str) -> Option<FixedOffset> {
    let s = input.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match s.chars().next()? {
        '+' => (1, &s[1..]),
        '-' => (-1, &s[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(hours) || !two_digits(minutes) {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naive_input_is_jst() {
        let t = parse_instant_jst("2024-02-06T15:30").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 2, 6, 6, 30, 0).unwrap());

        let with_seconds = parse_instant_jst("2024-02-06 15:30:00").unwrap();
        assert_eq!(with_seconds, t);
    }

    #[test]
    fn test_rfc3339_keeps_its_offset() {
        let t = parse_instant_jst("2024-02-06T15:30:00Z").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 2, 6, 15, 30, 0).unwrap());
    }

    #[test]
    fn test_date_only_is_midnight() {
        let t = parse_instant_jst("2024-02-02").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 2, 1, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_instant_jst("").is_none());
        assert!(parse_instant_jst("2024-13-01T00:00").is_none());
        assert!(parse_instant_jst("yesterday").is_none());
    }

    #[test]
    fn test_formatting_round_trips_through_jst() {
        let t = Utc.with_ymd_and_hms(2024, 2, 6, 6, 30, 0).unwrap();
        assert_eq!(to_input_string(t, jst()), "2024-02-06T15:30");
        assert_eq!(format_display(t, jst()), "2024-02-06 15:30");
    }

    #[test]
    fn test_unix_seconds() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(unix_seconds(t), Some(1_704_067_200));
        let before_epoch = Utc.with_ymd_and_hms(1969, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(unix_seconds(before_epoch), None);
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("-05:30").unwrap().local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert!(parse_offset("+9").is_none());
        // A second sign must not flip the offset.
        assert!(parse_offset("+-1:00").is_none());
        assert!(parse_offset("-+9:00").is_none());
        assert!(parse_offset("+09:-5").is_none());
        assert!(parse_offset("+09:75").is_none());
    }
}
