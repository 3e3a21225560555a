//! Injectable wall-clock. Pipeline entry points take `&dyn Clock` rather
//! than reading `OffsetDateTime::now_utc()` directly, so tests can fix the
//! timestamp a run is created under.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Fixed-instant clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Formats a run id as the ISO-8601 basic timestamp the design specifies:
/// `YYYY-MM-DDTHH-MM-SSZ`.
pub fn run_id_for(ts: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]T[hour]-[minute]-[second]Z");
    ts.to_offset(time::UtcOffset::UTC)
        .format(&format)
        .expect("fixed-width timestamp format never fails")
}

/// Formats a timestamp as RFC3339 UTC, the form `created_at`/`started_at`
/// fields in artifacts use.
pub fn rfc3339_utc(ts: OffsetDateTime) -> String {
    ts.to_offset(time::UtcOffset::UTC)
        .format(&Rfc3339)
        .expect("RFC3339 formatting never fails for a valid OffsetDateTime")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn run_id_matches_basic_iso8601_format() {
        let ts = datetime!(2025-01-01 12:00:00 UTC);
        assert_eq!(run_id_for(ts), "2025-01-01T12-00-00Z");
    }

    #[test]
    fn rfc3339_is_utc_with_z_suffix() {
        let ts = datetime!(2025-01-01 12:00:00 UTC);
        assert_eq!(rfc3339_utc(ts), "2025-01-01T12:00:00Z");
    }
}
