//! The typed job payload built at submission time.
//!
//! Everything a worker needs to execute a run is frozen into the payload
//! when the job is enqueued: the model document, the caller's parameter
//! values, the already-substituted directive command, and the mount plan.
//! Re-reading the model registry during execution would race with model
//! edits made after submission.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use basin_core::model::Model;
use basin_core::mounts::MountPlan;
use basin_core::run::RunParameter;

/// Pipeline identity embedded in every job key.
pub const PIPELINE_NAME: &str = "model-xform";

/// Logical job key for one run of one model.
///
/// The unique partial index on active jobs makes this the idempotency key:
/// at most one live job per `(model, run)` pair.
pub fn job_key(model_id: &str, run_id: &str) -> String {
    format!("{PIPELINE_NAME}:{model_id}:{run_id}")
}

/// The frozen execution plan for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunJobPayload {
    pub run_id: String,
    pub model: Model,
    #[serde(default)]
    pub parameters: Vec<RunParameter>,
    /// Directive command with every parameter value spliced in.
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,
    pub plan: MountPlan,
    /// Spatial aggregation level passed through to the standardize
    /// capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_level: Option<String>,
}

impl RunJobPayload {
    pub fn job_key(&self) -> String {
        job_key(&self.model.id, &self.run_id)
    }

    /// Parameter assignments as a name -> value map for substitution.
    pub fn parameter_map(&self) -> BTreeMap<String, serde_json::Value> {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect()
    }
}
