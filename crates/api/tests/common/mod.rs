//! Shared test fixtures: stub collaborators, app construction, and HTTP
//! helpers.
//!
//! Tests exercise the real router, middleware stack, dispatcher, and
//! runner; only the two external collaborators are stubbed -- the
//! generation backend by [`StubGenerator`] and the object store by the
//! library's own in-memory backend.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tokio::sync::{Mutex, Semaphore};
use tower::ServiceExt;

use caseforge_api::config::{ServerConfig, StorageBackend};
use caseforge_api::engine::dispatcher::JobDispatcher;
use caseforge_api::router::build_app_router;
use caseforge_api::state::AppState;
use caseforge_bedrock::{
    GeneratorError, ImageEditRequest, ImageGenerator, TextToImageRequest,
};
use caseforge_core::job::JobTable;
use caseforge_storage::{MemoryObjectStore, ObjectStore};

/// 1x1 transparent PNG, used where a decodable reference image is needed.
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x62, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

// ---------------------------------------------------------------------------
// Stub generation backend
// ---------------------------------------------------------------------------

/// Scriptable [`ImageGenerator`] that records every request it receives.
///
/// On success it returns `batch_count` payloads named `stub-image-{i}`, so
/// output ordering is observable all the way through storage.
pub struct StubGenerator {
    fail_with: Option<String>,
    /// When set, each call consumes one permit before proceeding; tests
    /// release permits to let gated jobs finish.
    gate: Option<Arc<Semaphore>>,
    pub text_requests: Mutex<Vec<TextToImageRequest>>,
    pub edit_requests: Mutex<Vec<ImageEditRequest>>,
}

impl StubGenerator {
    pub fn succeeding() -> Self {
        Self {
            fail_with: None,
            gate: None,
            text_requests: Mutex::new(Vec::new()),
            edit_requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with the given model error message.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::succeeding()
        }
    }

    /// Calls block until a permit is released via [`StubGenerator::release`].
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::succeeding()
        }
    }

    /// Allow `n` gated calls to proceed.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Seeds observed across all recorded requests, in call order.
    pub async fn seeds(&self) -> Vec<i64> {
        let mut seeds: Vec<i64> = self.text_requests.lock().await.iter().map(|r| r.seed).collect();
        seeds.extend(self.edit_requests.lock().await.iter().map(|r| r.seed));
        seeds
    }

    async fn pass_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("stub gate closed").forget();
        }
    }

    fn respond(&self, batch_count: u32) -> Result<Vec<Vec<u8>>, GeneratorError> {
        if let Some(message) = &self.fail_with {
            return Err(GeneratorError::Model(message.clone()));
        }
        Ok((0..batch_count)
            .map(|i| format!("stub-image-{i}").into_bytes())
            .collect())
    }
}

#[async_trait]
impl ImageGenerator for StubGenerator {
    async fn generate(
        &self,
        request: &TextToImageRequest,
    ) -> Result<Vec<Vec<u8>>, GeneratorError> {
        self.text_requests.lock().await.push(request.clone());
        self.pass_gate().await;
        self.respond(request.batch_count)
    }

    async fn edit(&self, request: &ImageEditRequest) -> Result<Vec<Vec<u8>>, GeneratorError> {
        self.edit_requests.lock().await.push(request.clone());
        self.pass_gate().await;
        self.respond(request.batch_count)
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// A fully wired app plus handles to its internals for assertions.
pub struct TestApp {
    pub router: Router,
    pub jobs: Arc<JobTable>,
    pub store: Arc<MemoryObjectStore>,
    pub generator: Arc<StubGenerator>,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        model_id: "stub-model".to_string(),
        generation_timeout_secs: 5,
        max_concurrent_jobs: 4,
        storage_backend: StorageBackend::Memory,
        storage_root: "unused".to_string(),
        s3_bucket: None,
    }
}

/// Build the full application with the default execution capacity.
pub fn build_test_app(generator: StubGenerator) -> TestApp {
    build_test_app_with(generator, 4, Duration::from_secs(5))
}

/// Build the full application with a custom execution capacity.
pub fn build_test_app_with_capacity(
    generator: StubGenerator,
    max_concurrent_jobs: usize,
) -> TestApp {
    build_test_app_with(generator, max_concurrent_jobs, Duration::from_secs(5))
}

/// Build the full application router with all middleware layers, a stubbed
/// generation backend, and an in-memory object store.
///
/// This mirrors the wiring in `main.rs` so integration tests exercise the
/// same middleware stack and engine that production uses.
pub fn build_test_app_with(
    generator: StubGenerator,
    max_concurrent_jobs: usize,
    generation_timeout: Duration,
) -> TestApp {
    let config = test_config();
    let generator = Arc::new(generator);
    let store = Arc::new(MemoryObjectStore::new());
    let jobs = Arc::new(JobTable::new());

    let dispatcher = Arc::new(JobDispatcher::new(
        Arc::clone(&jobs),
        Arc::clone(&generator) as Arc<dyn ImageGenerator>,
        Arc::clone(&store) as Arc<dyn ObjectStore>,
        max_concurrent_jobs,
        generation_timeout,
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        jobs: Arc::clone(&jobs),
        dispatcher,
    };

    TestApp {
        router: build_app_router(state, &config),
        jobs,
        store,
        generator,
    }
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// GET the status snapshot for a job and return the `data` payload.
pub async fn poll_job(app: &Router, id: &str) -> serde_json::Value {
    let response = get(app.clone(), &format!("/api/v1/images/generations/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let mut json = body_json(response).await;
    json["data"].take()
}

/// Poll until the job leaves `queued` (or fail the test after ~2 seconds).
pub async fn poll_until_terminal(app: &Router, id: &str) -> serde_json::Value {
    for _ in 0..200 {
        let data = poll_job(app, id).await;
        if data["status"] != "queued" {
            return data;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} did not reach a terminal state in time");
}
