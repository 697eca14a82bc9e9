use chrono::{DateTime, Utc};
use muster_domain::millis_to_datetime;
use time::OffsetDateTime;

pub fn millis_to_utc(ms: i64) -> OffsetDateTime {
    let nanos = i128::from(ms).saturating_mul(1_000_000);
    OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or_else(|_| OffsetDateTime::now_utc())
}

pub fn to_offset(value: &DateTime<Utc>) -> OffsetDateTime {
    millis_to_utc(value.timestamp_millis())
}

pub fn from_offset(value: OffsetDateTime) -> DateTime<Utc> {
    let millis = value.unix_timestamp_nanos() / 1_000_000;
    millis_to_datetime(i64::try_from(millis).unwrap_or(i64::MAX))
}
