//! MapperFetch: persist each output descriptor's transform mapping.
//!
//! Transform locates the right mapping for each standardized input through
//! the descriptor-id-keyed file name, so every descriptor gets its own
//! `mapper_{id}.json` even when several share an output directory.

use basin_core::mounts::mapper_file_name;
use basin_core::workspace;

use crate::context::StageContext;
use crate::stages::Stage;
use crate::StageError;

pub async fn run(ctx: &StageContext<'_>) -> Result<(), StageError> {
    let mappers_dir = ctx.workspace.mappers_dir(ctx.run_id());
    workspace::create_permissive_dir(&mappers_dir)?;

    for output in &ctx.payload.model.outputs {
        let path = mappers_dir.join(mapper_file_name(&output.id));
        let bytes = serde_json::to_vec_pretty(&output.transform)
            .map_err(|e| StageError::Transform(e.to_string()))?;
        std::fs::write(&path, bytes)?;
        ctx.log(
            Stage::MapperFetch,
            &format!("wrote mapper for descriptor {}", output.id),
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use basin_core::model::{Directive, Model, OutputFileDescriptor};
    use basin_core::mounts::MountPlan;
    use basin_core::workspace::RunWorkspace;
    use serde_json::json;

    #[tokio::test]
    async fn every_descriptor_gets_its_own_mapper_file() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = RunWorkspace::new(tmp.path());
        let payload = crate::RunJobPayload {
            run_id: "r1".to_string(),
            model: Model {
                id: "m1".to_string(),
                name: "test".to_string(),
                image: "example/model:1".to_string(),
                directive: Directive { command: String::new(), parameters: vec![] },
                configs: vec![],
                outputs: vec![
                    OutputFileDescriptor {
                        id: "out-a".to_string(),
                        output_directory: "/results".to_string(),
                        path: "a.csv".to_string(),
                        file_type: "csv".to_string(),
                        transform: json!({"col": "value_a"}),
                    },
                    OutputFileDescriptor {
                        id: "out-b".to_string(),
                        output_directory: "/results".to_string(),
                        path: "b.csv".to_string(),
                        file_type: "csv".to_string(),
                        transform: json!({"col": "value_b"}),
                    },
                ],
                accessories: vec![],
                created_at: None,
            },
            parameters: vec![],
            command: String::new(),
            workdir: None,
            plan: MountPlan::default(),
            admin_level: None,
        };
        let ctx = StageContext { payload: &payload, workspace: &ws };

        run(&ctx).await.unwrap();

        let a: serde_json::Value = serde_json::from_slice(
            &std::fs::read(ws.mappers_dir("r1").join("mapper_out-a.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(a, json!({"col": "value_a"}));
        assert!(ws.mappers_dir("r1").join("mapper_out-b.json").exists());
    }
}
