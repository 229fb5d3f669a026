//! Registry document types for model runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::Timestamp;

/// Lifecycle status of a run.
///
/// A run is created `Pending`, moves to `Running` once its job is claimed,
/// and reaches exactly one of the terminal states. It is never mutated
/// after reaching a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Success,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Success | RunStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }
}

/// One user-supplied parameter assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunParameter {
    pub name: String,
    pub value: serde_json::Value,
}

/// An uploaded accessory artifact: public URL plus its descriptor caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryArtifact {
    pub file: String,
    pub caption: String,
}

/// One execution instance of a model with a fixed parameter assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRun {
    pub id: String,
    pub model_id: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub parameters: Vec<RunParameter>,
    pub status: RunStatus,
    pub created_at: Timestamp,
    /// Public URLs of the standardized output shards, set at Exit.
    #[serde(default)]
    pub data_paths: Vec<String>,
    /// Uploaded accessory URL + caption pairs, set at Exit.
    #[serde(default)]
    pub pre_gen_output_paths: Vec<AccessoryArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<Timestamp>,
}

impl ModelRun {
    /// Parameter assignments as a name -> value map for substitution.
    pub fn parameter_map(&self) -> BTreeMap<String, serde_json::Value> {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(RunStatus::Success.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RunStatus::Failed).unwrap(), "\"failed\"");
    }

    #[test]
    fn parameter_map_keeps_last_assignment_per_name() {
        let run = ModelRun {
            id: "r1".to_string(),
            model_id: "m1".to_string(),
            model_name: String::new(),
            parameters: vec![
                RunParameter { name: "x".to_string(), value: serde_json::json!(1) },
                RunParameter { name: "x".to_string(), value: serde_json::json!(2) },
            ],
            status: RunStatus::Pending,
            created_at: chrono::Utc::now(),
            data_paths: vec![],
            pre_gen_output_paths: vec![],
            executed_at: None,
        };
        assert_eq!(run.parameter_map()["x"], serde_json::json!(2));
    }
}
