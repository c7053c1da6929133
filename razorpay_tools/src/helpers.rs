use chrono::{DateTime, Utc};

/// Razorpay timestamps are Unix seconds.
pub fn timestamp_to_datetime(ts: Option<i64>) -> Option<DateTime<Utc>> {
    ts.and_then(|t| DateTime::from_timestamp(t, 0))
}
