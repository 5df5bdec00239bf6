//! Job lifecycle: record, status state machine, and the concurrent job table.
//!
//! A job moves `queued -> done` or `queued -> error` exactly once; terminal
//! states are sticky. The [`JobTable`] is the single source of truth for
//! status and is safe under concurrent insert, read, and completion from
//! many tasks. Its lock is held only for the map operation itself -- never
//! across a generation or storage call.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::types::{ImageRef, JobId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted; the runner has not yet recorded an outcome.
    Queued,
    /// Finished successfully; `result` holds the ordered image references.
    Done,
    /// Failed; `error` holds the failure description.
    Error,
}

impl JobStatus {
    /// Whether this status is terminal (`done` or `error`).
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Queued)
    }
}

/// The single terminal outcome a runner records for its job.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// Ordered references to the persisted output images.
    Done(Vec<ImageRef>),
    /// Human-readable description of the failure cause.
    Error(String),
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One submitted generation or edit request and its (eventual) outcome.
///
/// Exactly one of `result` / `error` / neither is set, matching
/// `status` being `done` / `error` / `queued` respectively.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    /// Ordered image references; present only when `status == done`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<ImageRef>>,
    /// Failure description; present only when `status == error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub submitted_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
}

impl JobRecord {
    /// Fresh record for a just-accepted submission.
    pub fn queued(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            result: None,
            error: None,
            submitted_at: chrono::Utc::now(),
            completed_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Process-wide mapping from job id to [`JobRecord`].
///
/// Created once at startup and shared behind an `Arc`. The dispatcher
/// inserts, the runner bound to a given id completes, pollers read.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly queued record.
    ///
    /// Ids are UUID v4, so a duplicate insert indicates a dispatcher bug
    /// rather than a recoverable condition; the collision is logged and the
    /// newer record wins.
    pub async fn insert(&self, record: JobRecord) {
        let mut jobs = self.jobs.write().await;
        if let Some(previous) = jobs.insert(record.id, record) {
            tracing::error!(job_id = %previous.id, "Duplicate job id inserted into job table");
        }
    }

    /// Record the terminal outcome for `id`.
    ///
    /// This is the only transition out of `queued`, and it happens at most
    /// once: completing an unknown id or an already-terminal record is a
    /// logged no-op. Returns whether the transition was applied.
    pub async fn complete(&self, id: JobId, outcome: JobOutcome) -> bool {
        let mut jobs = self.jobs.write().await;
        let Some(record) = jobs.get_mut(&id) else {
            tracing::warn!(job_id = %id, "Completion for unknown job id ignored");
            return false;
        };
        if record.status.is_terminal() {
            tracing::warn!(job_id = %id, status = ?record.status, "Completion for terminal job ignored");
            return false;
        }

        match outcome {
            JobOutcome::Done(refs) => {
                record.status = JobStatus::Done;
                record.result = Some(refs);
            }
            JobOutcome::Error(message) => {
                record.status = JobStatus::Error;
                record.error = Some(message);
            }
        }
        record.completed_at = Some(chrono::Utc::now());
        true
    }

    /// Point-in-time snapshot of the record for `id`.
    ///
    /// The clone is taken under the read lock, so a concurrent completion is
    /// observed either fully or not at all.
    pub async fn get(&self, id: JobId) -> Option<JobRecord> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// Number of jobs currently tracked (all states; nothing is evicted).
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
