//! Job execution engine.
//!
//! The [`dispatcher`] accepts validated submissions, mints ids, and spawns
//! one [`runner`] task per job; the runner drives the generation and
//! storage collaborators and records exactly one terminal outcome in the
//! job table.

pub mod dispatcher;
pub mod runner;

use caseforge_core::params::ExtraParams;
use caseforge_core::types::ImageRef;

/// Mask selection carried on an edit submission.
#[derive(Debug, Clone)]
pub enum MaskSpec {
    /// Storage key of an explicit mask image, resolved by the runner.
    Image(ImageRef),
    /// Natural-language description of the region to edit.
    Prompt(String),
}

/// A validated, resolved job payload handed from the submission handler to
/// the dispatcher.
///
/// `reference_images` empty selects the generate shape; non-empty selects
/// the edit/variation shape. `seed` is `None` until the dispatcher resolves
/// it (random when the caller supplied none).
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub reference_images: Vec<ImageRef>,
    pub mask: Option<MaskSpec>,
    pub batch_count: u32,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub cfg_scale: f64,
    pub seed: Option<i64>,
    pub similarity_strength: f64,
    /// Non-reserved free-form parameters, folded into the prompt in
    /// insertion order by the runner.
    pub extra_params: ExtraParams,
}
