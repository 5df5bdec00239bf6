//! Domain core for the caseforge image generation service.
//!
//! Holds the job lifecycle machinery (record, status state machine, and the
//! process-wide concurrent job table) plus generation-parameter policy:
//! defaults, bounds, seed selection, and prompt augmentation.

pub mod error;
pub mod job;
pub mod params;
pub mod types;
