//! Deduplicated volume-mount planning for one run.
//!
//! The container runtime rejects (or silently ignores) a second bind to a
//! container path that is already bound, so the planner creates exactly one
//! mount per distinct container directory. When several output descriptors
//! share an `output_directory`, the first descriptor encountered becomes
//! the *representative* for that directory: every descriptor sharing it
//! resolves its file location through the representative's id, never its
//! own. Accessory descriptors all share one host `accessories/` directory,
//! deduplicated by container parent directory. Config-file mounts are
//! mechanical single-file binds.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::Model;
use crate::workspace::RunWorkspace;

/// Container path the run's results directory is bound to inside the
/// standardize container.
pub const STANDARDIZE_DATA_MOUNT: &str = "/tmp";

/// Container path the run's mapper directory is bound to inside the
/// standardize container.
pub const STANDARDIZE_MAPPER_MOUNT: &str = "/mappers";

/// A bind from a host-visible path to a path inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    pub host_path: PathBuf,
    pub container_path: String,
}

impl Mount {
    pub fn new(host_path: impl Into<PathBuf>, container_path: impl Into<String>) -> Self {
        Self {
            host_path: host_path.into(),
            container_path: container_path.into(),
        }
    }
}

/// One standardize-stage input: a data file plus its mapper, both as paths
/// inside the standardize container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardizeInput {
    pub input_file: String,
    pub mapper: String,
}

/// The planner's output for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MountPlan {
    /// Deduplicated mounts for the model container, in planning order.
    pub mounts: Vec<Mount>,
    /// `output_directory -> representative descriptor id`, first wins.
    pub output_dir_owners: Vec<(String, String)>,
    /// Standardize inputs resolved through the representative ids.
    pub standardize_inputs: Vec<StandardizeInput>,
}

impl MountPlan {
    /// Representative descriptor id for an output directory, if planned.
    pub fn owner_of(&self, output_directory: &str) -> Option<&str> {
        self.output_dir_owners
            .iter()
            .find(|(dir, _)| dir == output_directory)
            .map(|(_, id)| id.as_str())
    }
}

/// Host file name of the persisted mapper for one output descriptor.
pub fn mapper_file_name(descriptor_id: &str) -> String {
    format!("mapper_{descriptor_id}.json")
}

/// Plan the mounts, representative map, and standardize inputs for a run.
pub fn plan(run_id: &str, model: &Model, workspace: &RunWorkspace) -> MountPlan {
    let mut plan = MountPlan::default();

    // Output-file descriptors: one mount per distinct output directory,
    // keyed under the representative id on the host side.
    for output in &model.outputs {
        let representative = match plan.owner_of(&output.output_directory) {
            Some(id) => id.to_string(),
            None => {
                plan.output_dir_owners
                    .push((output.output_directory.clone(), output.id.clone()));
                output.id.clone()
            }
        };

        push_unique(
            &mut plan.mounts,
            Mount::new(
                workspace.run_dir(run_id).join(&representative),
                output.output_directory.clone(),
            ),
        );

        plan.standardize_inputs.push(StandardizeInput {
            input_file: format!(
                "{STANDARDIZE_DATA_MOUNT}/{representative}/{}",
                output.path
            ),
            mapper: format!("{STANDARDIZE_MAPPER_MOUNT}/{}", mapper_file_name(&output.id)),
        });
    }

    // Accessory descriptors: every parent directory binds the one shared
    // host accessories directory.
    for accessory in &model.accessories {
        push_unique(
            &mut plan.mounts,
            Mount::new(
                workspace.accessories_dir(run_id),
                accessory.parent_dir().to_string(),
            ),
        );
    }

    // Config files: single-file binds of the rehydrated configs.
    for config in &model.configs {
        push_unique(
            &mut plan.mounts,
            Mount::new(
                workspace.configs_dir(run_id).join(config.file_name()),
                config.path.clone(),
            ),
        );
    }

    plan
}

/// Append a mount unless its container path is already bound.
fn push_unique(mounts: &mut Vec<Mount>, mount: Mount) {
    if !mounts.iter().any(|m| m.container_path == mount.container_path) {
        mounts.push(mount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccessoryFileDescriptor, Directive, OutputFileDescriptor};

    fn output(id: &str, dir: &str, path: &str) -> OutputFileDescriptor {
        OutputFileDescriptor {
            id: id.to_string(),
            output_directory: dir.to_string(),
            path: path.to_string(),
            file_type: "csv".to_string(),
            transform: serde_json::json!({}),
        }
    }

    fn accessory(id: &str, path: &str) -> AccessoryFileDescriptor {
        AccessoryFileDescriptor {
            id: id.to_string(),
            path: path.to_string(),
            caption: String::new(),
        }
    }

    fn model(
        outputs: Vec<OutputFileDescriptor>,
        accessories: Vec<AccessoryFileDescriptor>,
        configs: Vec<crate::model::ConfigFile>,
    ) -> Model {
        Model {
            id: "m1".to_string(),
            name: "test".to_string(),
            image: "example/model:1".to_string(),
            directive: Directive { command: String::new(), parameters: vec![] },
            configs,
            outputs,
            accessories,
            created_at: None,
        }
    }

    fn workspace() -> RunWorkspace {
        RunWorkspace::new("/srv/basin")
    }

    #[test]
    fn shared_output_directory_yields_one_mount() {
        let model = model(
            vec![
                output("out-a", "/results", "a.csv"),
                output("out-b", "/results", "b.csv"),
            ],
            vec![],
            vec![],
        );

        let plan = plan("r1", &model, &workspace());

        let result_mounts: Vec<_> = plan
            .mounts
            .iter()
            .filter(|m| m.container_path == "/results")
            .collect();
        assert_eq!(result_mounts.len(), 1);
        assert_eq!(
            result_mounts[0].host_path,
            PathBuf::from("/srv/basin/results/r1/out-a")
        );
    }

    #[test]
    fn later_descriptors_resolve_through_the_representative() {
        let model = model(
            vec![
                output("out-a", "/results", "a.csv"),
                output("out-b", "/results", "b.csv"),
            ],
            vec![],
            vec![],
        );

        let plan = plan("r1", &model, &workspace());

        assert_eq!(plan.owner_of("/results"), Some("out-a"));
        assert_eq!(plan.standardize_inputs.len(), 2);
        // Both inputs locate their file under the representative id, but
        // each keeps its own mapper.
        assert_eq!(plan.standardize_inputs[0].input_file, "/tmp/out-a/a.csv");
        assert_eq!(plan.standardize_inputs[1].input_file, "/tmp/out-a/b.csv");
        assert_eq!(plan.standardize_inputs[0].mapper, "/mappers/mapper_out-a.json");
        assert_eq!(plan.standardize_inputs[1].mapper, "/mappers/mapper_out-b.json");
    }

    #[test]
    fn distinct_output_directories_each_get_a_mount() {
        let model = model(
            vec![
                output("out-a", "/results", "a.csv"),
                output("out-b", "/other", "b.csv"),
            ],
            vec![],
            vec![],
        );

        let plan = plan("r1", &model, &workspace());
        assert_eq!(plan.mounts.len(), 2);
        assert_eq!(plan.owner_of("/other"), Some("out-b"));
    }

    #[test]
    fn accessory_parent_dirs_deduplicate_onto_shared_host_dir() {
        let model = model(
            vec![],
            vec![
                accessory("acc-1", "/outputs/media/a.png"),
                accessory("acc-2", "/outputs/media/b.png"),
                accessory("acc-3", "/outputs/extra/c.png"),
            ],
            vec![],
        );

        let plan = plan("r1", &model, &workspace());

        assert_eq!(plan.mounts.len(), 2);
        for mount in &plan.mounts {
            assert_eq!(
                mount.host_path,
                PathBuf::from("/srv/basin/results/r1/accessories")
            );
        }
    }

    #[test]
    fn config_files_get_single_file_binds() {
        let config = crate::model::ConfigFile {
            path: "/model/etc/settings.yaml".to_string(),
            content: String::new(),
            parameters: vec![],
        };
        let model = model(vec![], vec![], vec![config]);

        let plan = plan("r1", &model, &workspace());

        assert_eq!(plan.mounts.len(), 1);
        assert_eq!(plan.mounts[0].container_path, "/model/etc/settings.yaml");
        assert_eq!(
            plan.mounts[0].host_path,
            PathBuf::from("/srv/basin/model_configs/r1/settings.yaml")
        );
    }

    #[test]
    fn container_path_collisions_keep_the_first_mount() {
        // An accessory living inside an already-mounted output directory
        // must not produce a second bind to the same container path.
        let model = model(
            vec![output("out-a", "/results", "a.csv")],
            vec![accessory("acc-1", "/results/chart.png")],
            vec![],
        );

        let plan = plan("r1", &model, &workspace());

        assert_eq!(plan.mounts.len(), 1);
        assert_eq!(
            plan.mounts[0].host_path,
            PathBuf::from("/srv/basin/results/r1/out-a")
        );
    }
}
