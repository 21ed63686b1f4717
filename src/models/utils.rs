//! Identity and clock helpers shared by every entity.

use chrono::{Duration, NaiveDateTime, Timelike, Utc};

use super::{ModelError, ModelResult};

/// Generate a fresh entity id (hyphenated UUID v4).
pub fn generate_entity_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current UTC time truncated to microseconds, the precision timestamps are
/// stored with.
pub fn current_timestamp() -> NaiveDateTime {
    truncate_to_micros(Utc::now().naive_utc())
}

/// Drop sub-microsecond precision.
pub fn truncate_to_micros(ts: NaiveDateTime) -> NaiveDateTime {
    let nanos = ts.nanosecond();
    ts.with_nanosecond(nanos - nanos % 1_000).unwrap_or(ts)
}

/// Next `updated_at` value after `previous`: now, or one microsecond past
/// `previous` if the clock hasn't moved far enough. Fails when `previous` is
/// already the latest representable instant.
pub fn next_timestamp(previous: NaiveDateTime) -> ModelResult<NaiveDateTime> {
    let now = current_timestamp();
    if now > previous {
        return Ok(now);
    }
    previous
        .checked_add_signed(Duration::microseconds(1))
        .ok_or(ModelError::TimestampOverflow { at: previous })
}
