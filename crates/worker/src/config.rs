//! Worker configuration loaded from environment variables.

use std::time::Duration;

use basin_events::NotificationTarget;
use basin_store::Scheme;

/// Worker configuration.
///
/// All fields except `DATABASE_URL` have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Postgres connection string (`DATABASE_URL`, required).
    pub database_url: String,
    /// Root of the run workspace tree (default: `/srv/basin`).
    pub results_root: String,
    /// Artifact destination scheme, `s3` or `file` (default: `file`).
    pub artifact_scheme: Scheme,
    /// S3 bucket for uploads; unused for the `file` scheme.
    pub artifact_bucket: String,
    /// Key prefix, or an absolute directory for the `file` scheme
    /// (default: `{results_root}/uploads`).
    pub artifact_prefix: String,
    /// Standardizer container image.
    pub standardizer_image: String,
    /// External services notified on run completion, parsed from the
    /// `NOTIFICATION_TARGETS` env var (a JSON array).
    pub notification_targets: Vec<NotificationTarget>,
    /// Maximum runs executed concurrently (default: `4`).
    pub concurrency: usize,
    /// Queue polling interval (default: 1000 ms).
    pub poll_interval: Duration,
    /// Wall-clock limit per container execution, in seconds; `0` disables
    /// the limit (default: `0`).
    pub exec_timeout: Option<Duration>,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                   |
    /// |------------------------|---------------------------|
    /// | `DATABASE_URL`         | (required)                |
    /// | `RESULTS_ROOT`         | `/srv/basin`              |
    /// | `ARTIFACT_SCHEME`      | `file`                    |
    /// | `ARTIFACT_BUCKET`      | (empty)                   |
    /// | `ARTIFACT_PREFIX`      | `{results_root}/uploads`  |
    /// | `STANDARDIZER_IMAGE`   | `basin/standardize:latest`|
    /// | `NOTIFICATION_TARGETS` | `[]`                      |
    /// | `WORKER_CONCURRENCY`   | `4`                       |
    /// | `POLL_INTERVAL_MS`     | `1000`                    |
    /// | `EXEC_TIMEOUT_SECS`    | `0` (unlimited)           |
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let results_root =
            std::env::var("RESULTS_ROOT").unwrap_or_else(|_| "/srv/basin".into());

        let artifact_scheme = match std::env::var("ARTIFACT_SCHEME")
            .unwrap_or_else(|_| "file".into())
            .as_str()
        {
            "s3" => Scheme::S3,
            "file" => Scheme::File,
            other => anyhow::bail!("ARTIFACT_SCHEME must be \"s3\" or \"file\", got {other:?}"),
        };

        let artifact_bucket = std::env::var("ARTIFACT_BUCKET").unwrap_or_default();
        if artifact_scheme == Scheme::S3 && artifact_bucket.is_empty() {
            anyhow::bail!("ARTIFACT_BUCKET must be set when ARTIFACT_SCHEME is \"s3\"");
        }

        let artifact_prefix = std::env::var("ARTIFACT_PREFIX")
            .unwrap_or_else(|_| format!("{results_root}/uploads"));

        let standardizer_image = std::env::var("STANDARDIZER_IMAGE")
            .unwrap_or_else(|_| "basin/standardize:latest".into());

        let notification_targets: Vec<NotificationTarget> =
            match std::env::var("NOTIFICATION_TARGETS") {
                Ok(raw) => serde_json::from_str(&raw)
                    .map_err(|e| anyhow::anyhow!("NOTIFICATION_TARGETS is not valid JSON: {e}"))?,
                Err(_) => Vec::new(),
            };

        let concurrency: usize = std::env::var("WORKER_CONCURRENCY")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .map_err(|_| anyhow::anyhow!("WORKER_CONCURRENCY must be a valid usize"))?;

        let poll_interval_ms: u64 = std::env::var("POLL_INTERVAL_MS")
            .unwrap_or_else(|_| "1000".into())
            .parse()
            .map_err(|_| anyhow::anyhow!("POLL_INTERVAL_MS must be a valid u64"))?;

        let exec_timeout_secs: u64 = std::env::var("EXEC_TIMEOUT_SECS")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .map_err(|_| anyhow::anyhow!("EXEC_TIMEOUT_SECS must be a valid u64"))?;

        Ok(Self {
            database_url,
            results_root,
            artifact_scheme,
            artifact_bucket,
            artifact_prefix,
            standardizer_image,
            notification_targets,
            concurrency: concurrency.max(1),
            poll_interval: Duration::from_millis(poll_interval_ms),
            exec_timeout: (exec_timeout_secs > 0).then(|| Duration::from_secs(exec_timeout_secs)),
        })
    }
}
