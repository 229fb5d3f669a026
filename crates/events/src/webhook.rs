//! Webhook notification with exponential-backoff retry.
//!
//! [`WebhookNotifier`] POSTs the finished run document to the target's
//! success or failure endpoint. Failed attempts are retried up to three
//! times with exponential backoff (1 s, 2 s, 4 s).

use std::time::Duration;

use async_trait::async_trait;

use basin_core::run::ModelRun;

use crate::{NotificationTarget, RunNotifier};

/// Placeholder in endpoint URLs replaced with the finished run's id.
const RUN_ID_PLACEHOLDER: &str = "{run_id}";

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook notification failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// WebhookNotifier
// ---------------------------------------------------------------------------

/// Delivers run outcomes to one external service over HTTP.
pub struct WebhookNotifier {
    target: NotificationTarget,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Create a notifier for `target` with a pre-configured HTTP client.
    pub fn new(target: NotificationTarget) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { target, client }
    }

    /// Resolve the `{run_id}` placeholder in an endpoint URL.
    fn resolve_endpoint(endpoint: &str, run_id: &str) -> String {
        endpoint.replace(RUN_ID_PLACEHOLDER, run_id)
    }

    /// Deliver the run document to `url` with retry.
    ///
    /// Retries up to 3 times with exponential backoff before giving up.
    /// Returns `Ok(())` on the first successful attempt.
    async fn deliver(&self, url: &str, run: &ModelRun) -> Result<(), WebhookError> {
        self.deliver_with_backoff(url, run, &RETRY_DELAYS_SECS).await
    }

    /// One attempt per backoff entry plus a final attempt. The error of
    /// the final attempt is the one callers see.
    async fn deliver_with_backoff(
        &self,
        url: &str,
        run: &ModelRun,
        delays_secs: &[u64],
    ) -> Result<(), WebhookError> {
        for (attempt, delay_secs) in delays_secs.iter().enumerate() {
            match self.try_send(url, run).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        target = %self.target.name,
                        url,
                        error = %e,
                        "notification attempt failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
                }
            }
        }

        match self.try_send(url, run).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(
                    target = %self.target.name,
                    url,
                    error = %e,
                    "notification failed after all retries"
                );
                Err(e)
            }
        }
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, url: &str, run: &ModelRun) -> Result<(), WebhookError> {
        let mut request = self.client.post(url).json(run);
        if let Some(username) = &self.target.username {
            request = request.basic_auth(username, self.target.password.as_deref());
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl RunNotifier for WebhookNotifier {
    fn name(&self) -> &str {
        &self.target.name
    }

    async fn notify_success(&self, run: &ModelRun) -> Result<(), WebhookError> {
        let url = Self::resolve_endpoint(&self.target.success_endpoint, &run.id);
        self.deliver(&url, run).await
    }

    async fn notify_failure(&self, run: &ModelRun) -> Result<(), WebhookError> {
        let url = Self::resolve_endpoint(&self.target.failure_endpoint, &run.id);
        self.deliver(&url, run).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
