use chrono::{DateTime, SubsecRound, Utc};

/// UTC timestamp attached to documents, versions, and anchors.
pub type Timestamp = DateTime<Utc>;

/// Current wall-clock time, truncated to microseconds.
///
/// Truncation keeps persisted records byte-identical after a
/// serialize/deserialize cycle on every platform.
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}
