//! Bedrock `InvokeModel` client for Nova Canvas.

use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client as BedrockClient;
use aws_smithy_types::Blob;
use base64::prelude::*;
use serde::Deserialize;

use crate::request::{image_variation_body, inpainting_body, text_to_image_body};
use crate::{GeneratorError, ImageEditRequest, ImageGenerator, TextToImageRequest};

/// Model invoked for both generate and edit jobs.
pub const DEFAULT_MODEL_ID: &str = "amazon.nova-canvas-v1:0";

/// Production [`ImageGenerator`] backed by Bedrock Nova Canvas.
pub struct NovaCanvasClient {
    client: BedrockClient,
    model_id: String,
}

/// Body returned by Nova Canvas: base64 images on success, a non-null
/// `error` string on model-side failure.
#[derive(Debug, Deserialize)]
struct NovaCanvasResponse {
    #[serde(default)]
    images: Vec<String>,
    error: Option<String>,
}

impl NovaCanvasClient {
    /// Build a client from the ambient AWS environment (credentials chain,
    /// region) targeting `model_id`.
    pub async fn from_env(model_id: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: BedrockClient::new(&config),
            model_id: model_id.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn invoke(&self, body: serde_json::Value) -> Result<Vec<Vec<u8>>, GeneratorError> {
        let response = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body.to_string()))
            .send()
            .await
            .map_err(|e| GeneratorError::Request(e.into_service_error().to_string()))?;

        parse_response(response.body().as_ref())
    }
}

/// Interpret a Nova Canvas response body.
///
/// A non-null `error` field wins over any images also present; an empty
/// image list with no error is treated as malformed, so success always
/// carries at least one payload.
fn parse_response(body: &[u8]) -> Result<Vec<Vec<u8>>, GeneratorError> {
    let parsed: NovaCanvasResponse =
        serde_json::from_slice(body).map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;

    if let Some(error) = parsed.error {
        return Err(GeneratorError::Model(error));
    }
    if parsed.images.is_empty() {
        return Err(GeneratorError::InvalidResponse(
            "response contained no images and no error".to_string(),
        ));
    }

    parsed
        .images
        .iter()
        .map(|encoded| {
            BASE64_STANDARD
                .decode(encoded)
                .map_err(|e| GeneratorError::InvalidResponse(format!("bad image payload: {e}")))
        })
        .collect()
}

#[async_trait]
impl ImageGenerator for NovaCanvasClient {
    async fn generate(
        &self,
        request: &TextToImageRequest,
    ) -> Result<Vec<Vec<u8>>, GeneratorError> {
        tracing::info!(
            model_id = %self.model_id,
            batch_count = request.batch_count,
            "Invoking Nova Canvas text-to-image",
        );
        let images = self.invoke(text_to_image_body(request)).await?;
        tracing::info!(
            model_id = %self.model_id,
            generated = images.len(),
            "Nova Canvas returned images",
        );
        Ok(images)
    }

    async fn edit(&self, request: &ImageEditRequest) -> Result<Vec<Vec<u8>>, GeneratorError> {
        let body = match &request.mask {
            Some(mask) => inpainting_body(request, mask),
            None => image_variation_body(request),
        };
        tracing::info!(
            model_id = %self.model_id,
            references = request.reference_images.len(),
            masked = request.mask.is_some(),
            "Invoking Nova Canvas edit",
        );
        let images = self.invoke(body).await?;
        tracing::info!(
            model_id = %self.model_id,
            generated = images.len(),
            "Nova Canvas returned images",
        );
        Ok(images)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decodes_images_in_order() {
        let body = serde_json::json!({
            "images": [
                BASE64_STANDARD.encode([1u8, 2]),
                BASE64_STANDARD.encode([3u8, 4]),
            ]
        });
        let images = parse_response(body.to_string().as_bytes()).unwrap();
        assert_eq!(images, vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn parse_surfaces_model_error() {
        let body = serde_json::json!({
            "images": [],
            "error": "content policy violation"
        });
        let err = parse_response(body.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, GeneratorError::Model(msg) if msg.contains("content policy")));
    }

    #[test]
    fn parse_rejects_empty_success() {
        let body = serde_json::json!({ "images": [] });
        let err = parse_response(body.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidResponse(_)));
    }

    #[test]
    fn parse_rejects_undecodable_payload() {
        let body = serde_json::json!({ "images": ["not base64!!"] });
        let err = parse_response(body.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidResponse(_)));
    }

    #[test]
    fn parse_rejects_non_json_body() {
        let err = parse_response(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidResponse(_)));
    }
}
