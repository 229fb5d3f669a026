//! Run-completion notification infrastructure.
//!
//! External services register a pair of endpoints and are told when a run
//! reaches a terminal state:
//!
//! - [`RunNotifier`]: the delivery capability, one implementor per target.
//! - [`WebhookNotifier`]: HTTP POST delivery with retry and optional
//!   basic auth.
//! - [`notify_all`]: fault-isolated fan-out across every registered
//!   target; a failing target never affects the run outcome.

pub mod webhook;

use async_trait::async_trait;
use serde::Deserialize;

use basin_core::run::ModelRun;

pub use webhook::{WebhookError, WebhookNotifier};

/// One external service interested in run outcomes.
///
/// Endpoints may contain the literal placeholder `{run_id}`, replaced at
/// delivery time with the id of the finished run.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationTarget {
    pub name: String,
    pub success_endpoint: String,
    pub failure_endpoint: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Capability for announcing a run's terminal state to one target.
#[async_trait]
pub trait RunNotifier: Send + Sync {
    fn name(&self) -> &str;
    async fn notify_success(&self, run: &ModelRun) -> Result<(), WebhookError>;
    async fn notify_failure(&self, run: &ModelRun) -> Result<(), WebhookError>;
}

/// Announce `run` to every target, logging failures instead of raising.
///
/// Notification is best effort. The run has already reached its terminal
/// state by the time this is called, so a dead endpoint must not turn a
/// finished run into a failed one.
pub async fn notify_all(notifiers: &[Box<dyn RunNotifier>], run: &ModelRun, succeeded: bool) {
    for notifier in notifiers {
        let result = if succeeded {
            notifier.notify_success(run).await
        } else {
            notifier.notify_failure(run).await
        };
        if let Err(e) = result {
            tracing::warn!(
                target = notifier.name(),
                run_id = %run.id,
                error = %e,
                "run notification failed"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
