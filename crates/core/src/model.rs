//! Registry document types for registered models.
//!
//! A [`Model`] describes everything needed to execute one run: the container
//! image, the parameterized launch [`Directive`], parameterized
//! [`ConfigFile`]s, and the declared [`OutputFileDescriptor`]s and
//! [`AccessoryFileDescriptor`]s the container is expected to produce.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// The declared type of a model parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    Str,
    Int,
    Float,
    Bool,
}

/// A single declared model parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub parameter_type: ParameterType,
    /// Used when the submitter supplies no value. `null` counts as absent.
    #[serde(default)]
    pub default_value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<serde_json::Value>>,
}

/// A parameter annotation anchored to a byte range of a base text.
///
/// `start..end` addresses the placeholder inside the directive command or a
/// config file's raw content. Spans within one text must not overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedSpan {
    pub start: usize,
    pub end: usize,
    pub annotation: Parameter,
}

/// The parameterized command line used to launch the model container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    pub command: String,
    #[serde(default)]
    pub parameters: Vec<AnnotatedSpan>,
}

/// A parameterized config file the model reads at a fixed container path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Absolute path inside the container, including the file name.
    pub path: String,
    /// Raw templated content; spans in `parameters` index into it.
    pub content: String,
    #[serde(default)]
    pub parameters: Vec<AnnotatedSpan>,
}

impl ConfigFile {
    /// Leaf file name of the container path.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Describes one output file a model writes during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFileDescriptor {
    pub id: String,
    /// Directory inside the container the model writes to.
    pub output_directory: String,
    /// File path relative to `output_directory`.
    pub path: String,
    pub file_type: String,
    /// Opaque standardization mapping, persisted verbatim for the
    /// standardize capability.
    pub transform: serde_json::Value,
}

/// Describes one accessory (pre-generated) file a model may produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessoryFileDescriptor {
    pub id: String,
    /// Absolute container path; the leaf may be a glob pattern.
    pub path: String,
    #[serde(default)]
    pub caption: String,
}

impl AccessoryFileDescriptor {
    /// Leaf filename (or glob pattern) of the accessory path.
    pub fn leaf(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Container directory the accessory is written to.
    pub fn parent_dir(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[..idx],
            None => "",
        }
    }
}

/// A registered model document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub name: String,
    /// Container image, e.g. `registry.example.com/models/maxhop:0.3`.
    pub image: String,
    pub directive: Directive,
    #[serde(default)]
    pub configs: Vec<ConfigFile>,
    #[serde(default)]
    pub outputs: Vec<OutputFileDescriptor>,
    #[serde(default)]
    pub accessories: Vec<AccessoryFileDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

impl Model {
    /// All declared parameters across the directive and every config file.
    pub fn declared_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.directive
            .parameters
            .iter()
            .chain(self.configs.iter().flat_map(|c| c.parameters.iter()))
            .map(|span| &span.annotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_name_is_the_path_leaf() {
        let config = ConfigFile {
            path: "/model/settings/config.json".to_string(),
            content: String::new(),
            parameters: vec![],
        };
        assert_eq!(config.file_name(), "config.json");
    }

    #[test]
    fn accessory_leaf_and_parent() {
        let accessory = AccessoryFileDescriptor {
            id: "acc-1".to_string(),
            path: "/outputs/media/chart.png".to_string(),
            caption: "A chart".to_string(),
        };
        assert_eq!(accessory.leaf(), "chart.png");
        assert_eq!(accessory.parent_dir(), "/outputs/media");
    }

    #[test]
    fn parameter_type_serializes_lowercase() {
        let json = serde_json::to_string(&ParameterType::Float).unwrap();
        assert_eq!(json, "\"float\"");
    }
}
