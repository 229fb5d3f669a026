//! The pipeline's stages, one module per stage.

pub mod accessory_upload;
pub mod mapper_fetch;
pub mod model_exec;
pub mod rehydrate;
pub mod result_upload;
pub mod terminal;
pub mod transform;

/// The strictly ordered pipeline stages.
///
/// `Exit` and `Fail` are the two terminal stages; exactly one of them runs
/// for every claimed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Rehydrate,
    ModelExec,
    MapperFetch,
    Transform,
    AccessoryUpload,
    ResultUpload,
    Exit,
    Fail,
}

impl Stage {
    /// Every stage, in execution order.
    pub const ALL: [Stage; 8] = [
        Stage::Rehydrate,
        Stage::ModelExec,
        Stage::MapperFetch,
        Stage::Transform,
        Stage::AccessoryUpload,
        Stage::ResultUpload,
        Stage::Exit,
        Stage::Fail,
    ];

    /// File stem of the stage's log under `logs/{run_id}/`.
    pub fn file_stem(self) -> &'static str {
        match self {
            Stage::Rehydrate => "rehydrate",
            Stage::ModelExec => "model-exec",
            Stage::MapperFetch => "mapper-fetch",
            Stage::Transform => "transform",
            Stage::AccessoryUpload => "accessory-upload",
            Stage::ResultUpload => "result-upload",
            Stage::Exit => "exit",
            Stage::Fail => "fail",
        }
    }

    /// Human-readable name used by the log-listing endpoint.
    pub fn display_name(self) -> &'static str {
        match self {
            Stage::Rehydrate => "Parameter expansion",
            Stage::ModelExec => "Model run",
            Stage::MapperFetch => "Mapper fetch",
            Stage::Transform => "Standardize output",
            Stage::AccessoryUpload => "Accessory upload",
            Stage::ResultUpload => "Result upload",
            Stage::Exit => "Finalize",
            Stage::Fail => "Failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_file_stems_are_distinct() {
        let mut stems: Vec<_> = Stage::ALL.iter().map(|s| s.file_stem()).collect();
        stems.sort();
        stems.dedup();
        assert_eq!(stems.len(), Stage::ALL.len());
    }
}
