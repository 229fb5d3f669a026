//! Run-scoped filesystem layout under the results root.
//!
//! Every run owns a directory tree keyed by its id:
//!
//! ```text
//! {results_root}/
//!   results/{run_id}/              model output dirs + standardized shards
//!   results/{run_id}/accessories/  shared host dir for accessory mounts
//!   model_configs/{run_id}/        rehydrated config files
//!   mappers/{run_id}/              mapper_{descriptor_id}.json files
//!   logs/{run_id}/{stage}.log      per-stage pipeline logs
//! ```
//!
//! The model container may execute as a different user than the worker, so
//! directories and rehydrated files are created with permissive (0o777)
//! mode.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File-name suffix of standardized output shards.
pub const SHARD_SUFFIX: &str = ".parquet.gzip";

/// Separator embedded into uploaded accessory file names so Exit can
/// recover the descriptor id from the name alone.
pub const ACCESSORY_ID_SEPARATOR: &str = "__basin__";

/// Leaf name of the run-summary artifact written at Exit.
const SUMMARY_FILE: &str = "run_summary.json";

/// Resolves the run-scoped paths under a configured results root.
#[derive(Debug, Clone)]
pub struct RunWorkspace {
    root: PathBuf,
}

impl RunWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host directory the model's output-directory mounts resolve under.
    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root.join("results").join(run_id)
    }

    /// Shared host directory bound to every accessory parent directory.
    pub fn accessories_dir(&self, run_id: &str) -> PathBuf {
        self.run_dir(run_id).join("accessories")
    }

    /// Host directory the rehydrated config files are written to.
    pub fn configs_dir(&self, run_id: &str) -> PathBuf {
        self.root.join("model_configs").join(run_id)
    }

    /// Host directory the per-descriptor mapper files are written to.
    pub fn mappers_dir(&self, run_id: &str) -> PathBuf {
        self.root.join("mappers").join(run_id)
    }

    /// Directory holding one log file per pipeline stage.
    pub fn logs_dir(&self, run_id: &str) -> PathBuf {
        self.root.join("logs").join(run_id)
    }

    pub fn stage_log_path(&self, run_id: &str, stage: &str) -> PathBuf {
        self.logs_dir(run_id).join(format!("{stage}.log"))
    }

    /// The final artifact whose presence (without the writing marker)
    /// means the run is done.
    pub fn summary_path(&self, run_id: &str) -> PathBuf {
        self.run_dir(run_id).join(SUMMARY_FILE)
    }
}

/// Create `dir` (and parents) with permissive mode so a container running
/// as an arbitrary uid can write into it.
pub fn create_permissive_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    set_permissive(dir)
}

/// Loosen permissions on an existing path.
pub fn set_permissive(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o777))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_scoped_by_run_id() {
        let ws = RunWorkspace::new("/srv/basin");
        assert_eq!(ws.run_dir("r1"), PathBuf::from("/srv/basin/results/r1"));
        assert_eq!(
            ws.accessories_dir("r1"),
            PathBuf::from("/srv/basin/results/r1/accessories")
        );
        assert_eq!(
            ws.configs_dir("r1"),
            PathBuf::from("/srv/basin/model_configs/r1")
        );
        assert_eq!(ws.mappers_dir("r1"), PathBuf::from("/srv/basin/mappers/r1"));
        assert_eq!(
            ws.stage_log_path("r1", "model-task"),
            PathBuf::from("/srv/basin/logs/r1/model-task.log")
        );
    }

    #[test]
    fn create_permissive_dir_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a/b/c");
        create_permissive_dir(&dir).unwrap();
        create_permissive_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }
}
