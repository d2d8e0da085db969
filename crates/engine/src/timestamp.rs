//! RFC 3339 timestamps as stored on records.

use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

/// Format `at` as a second-precision UTC timestamp, e.g. `2026-01-31T09:05:00Z`.
///
/// Fixed width and always UTC, so stored timestamps sort lexicographically.
pub fn format_utc(at: OffsetDateTime) -> String {
    let at = at.to_offset(UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        at.year(),
        at.month() as u8,
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}

/// Parse a stored timestamp. Returns None for anything that is not RFC 3339.
pub fn parse(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn formats_in_utc() {
        assert_eq!(
            format_utc(datetime!(2026-03-04 05:06:07 UTC)),
            "2026-03-04T05:06:07Z"
        );
        assert_eq!(
            format_utc(datetime!(2026-03-04 01:00:00 +02:00)),
            "2026-03-03T23:00:00Z"
        );
    }

    #[test]
    fn parses_offsets_and_fractions() {
        let at = parse("2026-03-04T05:06:07.250+01:00").unwrap();
        assert_eq!(at.to_offset(UtcOffset::UTC).hour(), 4);
        assert!(parse("yesterday").is_none());
    }
}
