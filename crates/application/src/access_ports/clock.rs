use chrono::{DateTime, Utc};

/// Time source used for invitation deadlines and assignment timestamps.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}
