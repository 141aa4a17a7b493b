/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Recruitment periods are calendar dates without a time component.
pub type Period = chrono::NaiveDate;
