/// Which object store backend the service persists images to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Files under `storage_root` on the local disk (dev default).
    Local,
    /// An S3 bucket named by `s3_bucket`.
    S3,
    /// Process-local memory; contents vanish on restart.
    Memory,
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for in-flight jobs to drain (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Bedrock model invoked for generation and edits.
    pub model_id: String,
    /// Deadline for a single generation backend call (default: `300`).
    pub generation_timeout_secs: u64,
    /// How many jobs may execute concurrently; later jobs queue-wait.
    pub max_concurrent_jobs: usize,
    /// Object store backend selection.
    pub storage_backend: StorageBackend,
    /// Root directory for the local storage backend.
    pub storage_root: String,
    /// Bucket for the S3 storage backend; required when it is selected.
    pub s3_bucket: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                    |
    /// |---------------------------|----------------------------|
    /// | `HOST`                    | `0.0.0.0`                  |
    /// | `PORT`                    | `3000`                     |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `30`                       |
    /// | `BEDROCK_MODEL_ID`        | `amazon.nova-canvas-v1:0`  |
    /// | `GENERATION_TIMEOUT_SECS` | `300`                      |
    /// | `MAX_CONCURRENT_JOBS`     | `4`                        |
    /// | `STORAGE_BACKEND`         | `local`                    |
    /// | `STORAGE_ROOT`            | `generated_images`         |
    /// | `S3_BUCKET`               | unset                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let model_id = std::env::var("BEDROCK_MODEL_ID")
            .unwrap_or_else(|_| caseforge_bedrock::client::DEFAULT_MODEL_ID.into());

        let generation_timeout_secs: u64 = std::env::var("GENERATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("GENERATION_TIMEOUT_SECS must be a valid u64");

        let max_concurrent_jobs: usize = std::env::var("MAX_CONCURRENT_JOBS")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("MAX_CONCURRENT_JOBS must be a valid usize");
        assert!(
            max_concurrent_jobs > 0,
            "MAX_CONCURRENT_JOBS must be at least 1"
        );

        let storage_backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".into())
            .to_lowercase()
            .as_str()
        {
            "local" => StorageBackend::Local,
            "s3" => StorageBackend::S3,
            "memory" => StorageBackend::Memory,
            other => panic!("STORAGE_BACKEND must be local, s3, or memory (got '{other}')"),
        };

        let storage_root =
            std::env::var("STORAGE_ROOT").unwrap_or_else(|_| "generated_images".into());

        let s3_bucket = std::env::var("S3_BUCKET").ok();
        if storage_backend == StorageBackend::S3 {
            assert!(
                s3_bucket.is_some(),
                "S3_BUCKET must be set when STORAGE_BACKEND=s3"
            );
        }

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            model_id,
            generation_timeout_secs,
            max_concurrent_jobs,
            storage_backend,
            storage_root,
            s3_bucket,
        }
    }
}
