//! Nova Canvas `InvokeModel` body builders.
//!
//! Three task types are used: `TEXT_IMAGE` for generate jobs,
//! `IMAGE_VARIATION` for edits without a mask, and `INPAINTING` for
//! mask-guided edits. Image payloads travel as base64 strings inside the
//! JSON body.

use base64::prelude::*;
use serde_json::json;

use crate::{ImageEditRequest, Mask, TextToImageRequest};

/// Body for a `TEXT_IMAGE` task.
pub fn text_to_image_body(request: &TextToImageRequest) -> serde_json::Value {
    json!({
        "taskType": "TEXT_IMAGE",
        "textToImageParams": {
            "text": request.prompt,
        },
        "imageGenerationConfig": {
            "numberOfImages": request.batch_count,
            "height": request.height,
            "width": request.width,
            "cfgScale": request.cfg_scale,
            "seed": request.seed,
        }
    })
}

/// Body for an `IMAGE_VARIATION` task (edit without a mask).
pub fn image_variation_body(request: &ImageEditRequest) -> serde_json::Value {
    let images: Vec<String> = request
        .reference_images
        .iter()
        .map(|bytes| BASE64_STANDARD.encode(bytes))
        .collect();

    let mut params = json!({
        "text": request.prompt,
        "images": images,
        "similarityStrength": request.similarity_strength,
    });
    if let Some(negative) = &request.negative_prompt {
        params["negativeText"] = json!(negative);
    }

    json!({
        "taskType": "IMAGE_VARIATION",
        "imageVariationParams": params,
        "imageGenerationConfig": {
            "numberOfImages": request.batch_count,
            "height": request.height,
            "width": request.width,
            "cfgScale": request.cfg_scale,
            "seed": request.seed,
        }
    })
}

/// Body for an `INPAINTING` task (mask-guided edit).
///
/// Inpainting operates on a single source image; the first reference image
/// is the edit target. `mask` must be present -- callers route mask-less
/// edits to [`image_variation_body`].
pub fn inpainting_body(request: &ImageEditRequest, mask: &Mask) -> serde_json::Value {
    let mut params = json!({
        "text": request.prompt,
        "image": BASE64_STANDARD.encode(&request.reference_images[0]),
    });
    match mask {
        Mask::Image(bytes) => params["maskImage"] = json!(BASE64_STANDARD.encode(bytes)),
        Mask::Prompt(text) => params["maskPrompt"] = json!(text),
    }
    if let Some(negative) = &request.negative_prompt {
        params["negativeText"] = json!(negative);
    }

    json!({
        "taskType": "INPAINTING",
        "inPaintingParams": params,
        "imageGenerationConfig": {
            "numberOfImages": request.batch_count,
            "height": request.height,
            "width": request.width,
            "cfgScale": request.cfg_scale,
            "seed": request.seed,
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
