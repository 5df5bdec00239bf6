//! Generation backend client for Amazon Nova Canvas on Bedrock.
//!
//! [`ImageGenerator`] is the seam the job engine calls through; the
//! production implementation is [`NovaCanvasClient`], which speaks the
//! Bedrock `InvokeModel` API. Request bodies live in [`request`] so their
//! JSON shapes are testable without AWS credentials.

pub mod client;
pub mod request;

pub use client::NovaCanvasClient;

use async_trait::async_trait;

/// Parameters for a text-to-image job.
#[derive(Debug, Clone)]
pub struct TextToImageRequest {
    /// Fully augmented prompt text.
    pub prompt: String,
    /// Number of images to produce.
    pub batch_count: u32,
    pub height: u32,
    pub width: u32,
    /// Classifier-free guidance scale.
    pub cfg_scale: f64,
    pub seed: i64,
}

/// Mask selecting the region an edit applies to.
#[derive(Debug, Clone)]
pub enum Mask {
    /// Explicit grayscale mask image (black = edit region).
    Image(Vec<u8>),
    /// Natural-language description of the region to edit.
    Prompt(String),
}

/// Parameters for an edit/variation job over resolved reference images.
#[derive(Debug, Clone)]
pub struct ImageEditRequest {
    pub prompt: String,
    /// Content the model should avoid producing.
    pub negative_prompt: Option<String>,
    /// Raw bytes of the resolved reference images, in submission order.
    pub reference_images: Vec<Vec<u8>>,
    /// When set, the backend runs a mask-guided edit instead of a variation.
    pub mask: Option<Mask>,
    pub batch_count: u32,
    pub height: u32,
    pub width: u32,
    pub cfg_scale: f64,
    pub seed: i64,
    /// How closely variations should track the reference images (0.2..=1.0).
    pub similarity_strength: f64,
}

/// Errors from the generation backend.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// The Bedrock request itself failed (auth, network, throttling).
    #[error("Bedrock request failed: {0}")]
    Request(String),

    /// The model ran and reported a generation failure.
    #[error("Image generation error: {0}")]
    Model(String),

    /// The response body could not be interpreted.
    #[error("Malformed generation response: {0}")]
    InvalidResponse(String),
}

/// A backend that turns prompts (and optionally reference images) into
/// raw image bytes. Failure is always signalled as an error, never as an
/// empty success.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate `batch_count` images from text alone. Returns raw image
    /// payloads in generation order.
    async fn generate(&self, request: &TextToImageRequest)
        -> Result<Vec<Vec<u8>>, GeneratorError>;

    /// Produce variations of (or mask-guided edits to) the reference
    /// images. Returns raw image payloads in generation order.
    async fn edit(&self, request: &ImageEditRequest) -> Result<Vec<Vec<u8>>, GeneratorError>;
}
