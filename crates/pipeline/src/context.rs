//! Shared per-run state handed to every stage.

use std::fs::OpenOptions;
use std::io::{self, Write};

use basin_core::workspace::{self, RunWorkspace};

use crate::payload::RunJobPayload;
use crate::stages::Stage;

/// Everything a stage needs beyond its injected capabilities.
pub struct StageContext<'a> {
    pub payload: &'a RunJobPayload,
    pub workspace: &'a RunWorkspace,
}

impl StageContext<'_> {
    pub fn run_id(&self) -> &str {
        &self.payload.run_id
    }

    /// Append a line of human-readable text to the stage's log file.
    ///
    /// The logs directory is created lazily so early failures still get a
    /// log file for the API to serve.
    pub fn log(&self, stage: Stage, text: &str) -> io::Result<()> {
        let dir = self.workspace.logs_dir(self.run_id());
        workspace::create_permissive_dir(&dir)?;

        let path = self.workspace.stage_log_path(self.run_id(), stage.file_stem());
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{text}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basin_core::model::{Directive, Model};
    use basin_core::mounts::MountPlan;

    fn payload() -> RunJobPayload {
        RunJobPayload {
            run_id: "r1".to_string(),
            model: Model {
                id: "m1".to_string(),
                name: "test".to_string(),
                image: "example/model:1".to_string(),
                directive: Directive { command: String::new(), parameters: vec![] },
                configs: vec![],
                outputs: vec![],
                accessories: vec![],
                created_at: None,
            },
            parameters: vec![],
            command: String::new(),
            workdir: None,
            plan: MountPlan::default(),
            admin_level: None,
        }
    }

    #[test]
    fn log_appends_lines_to_the_stage_file() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = RunWorkspace::new(tmp.path());
        let payload = payload();
        let ctx = StageContext { payload: &payload, workspace: &ws };

        ctx.log(Stage::Rehydrate, "wrote 2 config files").unwrap();
        ctx.log(Stage::Rehydrate, "done").unwrap();

        let text =
            std::fs::read_to_string(ws.stage_log_path("r1", Stage::Rehydrate.file_stem())).unwrap();
        assert_eq!(text, "wrote 2 config files\ndone\n");
    }
}
