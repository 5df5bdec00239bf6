/// Jobs are identified by UUID v4, minted at submission time.
pub type JobId = uuid::Uuid;

/// A stable object-store key referencing one persisted image.
pub type ImageRef = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
