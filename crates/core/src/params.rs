//! Generation parameter policy: defaults, bounds, seed selection, and
//! prompt augmentation.
//!
//! Bounds follow what the Nova Canvas backend accepts; submissions outside
//! them are rejected synchronously, before a job record is created.

use indexmap::IndexMap;
use rand::Rng;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults and bounds
// ---------------------------------------------------------------------------

/// Output edge length used when neither the caller nor a reference image
/// supplies one.
pub const DEFAULT_IMAGE_SIZE: u32 = 1024;
/// Images produced per job unless the caller asks for more.
pub const DEFAULT_BATCH_COUNT: u32 = 1;
/// Default classifier-free guidance scale.
pub const DEFAULT_CFG_SCALE: f64 = 8.0;
/// Default similarity strength for edit/variation jobs.
pub const DEFAULT_SIMILARITY_STRENGTH: f64 = 0.7;

pub const MAX_BATCH_COUNT: u32 = 5;
pub const MIN_CFG_SCALE: f64 = 1.1;
pub const MAX_CFG_SCALE: f64 = 10.0;
pub const MIN_IMAGE_SIZE: u32 = 320;
pub const MAX_IMAGE_SIZE: u32 = 4096;
/// Backend-accepted range for similarity strength.
pub const MIN_SIMILARITY_STRENGTH: f64 = 0.2;
pub const MAX_SIMILARITY_STRENGTH: f64 = 1.0;
/// Largest seed the backend accepts.
pub const MAX_SEED: i64 = 858_993_459;

/// Parameter keys consumed structurally rather than folded into the prompt.
pub const RESERVED_PARAMS: &[&str] = &["height", "width"];

/// Free-form generation parameters, in caller-supplied key order.
pub type ExtraParams = IndexMap<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Seed policy
// ---------------------------------------------------------------------------

/// Seed for a submission that did not specify one.
///
/// Drawn uniformly from `[1, MAX_SEED]` so seedless submissions are not
/// reproducibly identical, and never collide with an explicit seed of 0.
pub fn random_seed() -> i64 {
    rand::rng().random_range(1..=MAX_SEED)
}

// ---------------------------------------------------------------------------
// Prompt augmentation
// ---------------------------------------------------------------------------

/// Fold free-form parameters into the prompt as ` key:value` tokens.
///
/// Keys in [`RESERVED_PARAMS`] are consumed structurally (output dimensions)
/// and skipped here. Iteration order is the caller's key order, so the
/// augmented prompt is stable across identical submissions. String values
/// are appended verbatim; everything else renders as compact JSON.
pub fn augment_prompt(prompt: &str, parameters: &ExtraParams) -> String {
    let mut augmented = prompt.to_string();
    for (key, value) in parameters {
        if RESERVED_PARAMS.contains(&key.as_str()) {
            continue;
        }
        augmented.push(' ');
        augmented.push_str(key);
        augmented.push(':');
        match value {
            serde_json::Value::String(s) => augmented.push_str(s),
            other => augmented.push_str(&other.to_string()),
        }
    }
    augmented
}

/// Extract a reserved dimension (`height`/`width`) from free-form parameters.
///
/// Non-integer or out-of-type values are treated as absent; range checking
/// happens in [`validate_dimension`] once a value is resolved.
pub fn extract_dimension(parameters: &ExtraParams, key: &str) -> Option<u32> {
    parameters.get(key).and_then(|v| v.as_u64()).map(|v| v as u32)
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

pub fn validate_prompt(prompt: &str) -> Result<(), CoreError> {
    if prompt.trim().is_empty() {
        return Err(CoreError::Validation("prompt must not be empty".to_string()));
    }
    Ok(())
}

pub fn validate_batch_count(batch_count: u32) -> Result<(), CoreError> {
    if !(1..=MAX_BATCH_COUNT).contains(&batch_count) {
        return Err(CoreError::Validation(format!(
            "batch_count must be between 1 and {MAX_BATCH_COUNT}, got {batch_count}"
        )));
    }
    Ok(())
}

pub fn validate_cfg_scale(cfg_scale: f64) -> Result<(), CoreError> {
    if !(MIN_CFG_SCALE..=MAX_CFG_SCALE).contains(&cfg_scale) {
        return Err(CoreError::Validation(format!(
            "cfg_scale must be between {MIN_CFG_SCALE} and {MAX_CFG_SCALE}, got {cfg_scale}"
        )));
    }
    Ok(())
}

/// Validate an output dimension. `name` is `"height"` or `"width"` and is
/// used in the error message.
pub fn validate_dimension(name: &str, value: u32) -> Result<(), CoreError> {
    if !(MIN_IMAGE_SIZE..=MAX_IMAGE_SIZE).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{name} must be between {MIN_IMAGE_SIZE} and {MAX_IMAGE_SIZE}, got {value}"
        )));
    }
    Ok(())
}

pub fn validate_similarity_strength(strength: f64) -> Result<(), CoreError> {
    if !(MIN_SIMILARITY_STRENGTH..=MAX_SIMILARITY_STRENGTH).contains(&strength) {
        return Err(CoreError::Validation(format!(
            "similarity_strength must be between {MIN_SIMILARITY_STRENGTH} and \
             {MAX_SIMILARITY_STRENGTH}, got {strength}"
        )));
    }
    Ok(())
}

pub fn validate_seed(seed: i64) -> Result<(), CoreError> {
    if !(0..=MAX_SEED).contains(&seed) {
        return Err(CoreError::Validation(format!(
            "seed must be between 0 and {MAX_SEED}, got {seed}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
