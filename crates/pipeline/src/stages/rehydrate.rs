//! Rehydrate: materialize the run's workspace and config files.
//!
//! Substitutes the run's parameter values into every config template and
//! writes the results under the run-scoped config directory. Also creates
//! the host directories the mount plan binds into the container. The model
//! container may execute as an arbitrary uid, so everything is created
//! with permissive mode.

use basin_core::template;
use basin_core::workspace;

use crate::context::StageContext;
use crate::stages::Stage;
use crate::StageError;

pub async fn run(ctx: &StageContext<'_>) -> Result<(), StageError> {
    let run_id = ctx.run_id();
    let ws = ctx.workspace;
    let values = ctx.payload.parameter_map();

    // Host sides of the output-directory mounts, keyed by representative id.
    for (_, representative) in &ctx.payload.plan.output_dir_owners {
        workspace::create_permissive_dir(&ws.run_dir(run_id).join(representative))?;
    }
    workspace::create_permissive_dir(&ws.accessories_dir(run_id))?;
    workspace::create_permissive_dir(&ws.mappers_dir(run_id))?;

    let configs_dir = ws.configs_dir(run_id);
    workspace::create_permissive_dir(&configs_dir)?;

    for config in &ctx.payload.model.configs {
        let rendered = template::substitute(&config.content, &config.parameters, &values)?;
        let path = configs_dir.join(config.file_name());
        std::fs::write(&path, rendered)?;
        workspace::set_permissive(&path)?;
        ctx.log(Stage::Rehydrate, &format!("rehydrated {}", config.path))?;
    }

    tracing::debug!(
        run_id,
        configs = ctx.payload.model.configs.len(),
        "workspace rehydrated"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use basin_core::model::{
        AnnotatedSpan, ConfigFile, Directive, Model, Parameter, ParameterType,
    };
    use basin_core::mounts::{self, MountPlan};
    use basin_core::run::RunParameter;
    use basin_core::workspace::RunWorkspace;
    use serde_json::json;

    fn config_model() -> Model {
        Model {
            id: "m1".to_string(),
            name: "test".to_string(),
            image: "example/model:1".to_string(),
            directive: Directive { command: String::new(), parameters: vec![] },
            configs: vec![ConfigFile {
                path: "/model/etc/settings.conf".to_string(),
                content: "iterations={{n}}".to_string(),
                parameters: vec![AnnotatedSpan {
                    start: 11,
                    end: 16,
                    annotation: Parameter {
                        name: "n".to_string(),
                        parameter_type: ParameterType::Int,
                        default_value: json!(null),
                        min: None,
                        max: None,
                        choices: None,
                    },
                }],
            }],
            outputs: vec![],
            accessories: vec![],
            created_at: None,
        }
    }

    #[tokio::test]
    async fn writes_substituted_configs_into_the_run_scope() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = RunWorkspace::new(tmp.path());
        let model = config_model();
        let plan = mounts::plan("r1", &model, &ws);
        let payload = crate::RunJobPayload {
            run_id: "r1".to_string(),
            model,
            parameters: vec![RunParameter { name: "n".to_string(), value: json!(500) }],
            command: String::new(),
            workdir: None,
            plan,
            admin_level: None,
        };
        let ctx = StageContext { payload: &payload, workspace: &ws };

        run(&ctx).await.unwrap();

        let written =
            std::fs::read_to_string(ws.configs_dir("r1").join("settings.conf")).unwrap();
        assert_eq!(written, "iterations=500");
        assert!(ws.accessories_dir("r1").is_dir());
        assert!(ws.mappers_dir("r1").is_dir());
    }

    #[tokio::test]
    async fn unresolvable_parameter_is_a_parameter_resolution_error() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = RunWorkspace::new(tmp.path());
        let model = config_model();
        let plan = mounts::plan("r1", &model, &ws);
        let payload = crate::RunJobPayload {
            run_id: "r1".to_string(),
            model,
            parameters: vec![],
            command: String::new(),
            workdir: None,
            plan,
            admin_level: None,
        };
        let ctx = StageContext { payload: &payload, workspace: &ws };

        let err = run(&ctx).await.unwrap_err();
        assert!(matches!(err, StageError::ParameterResolution(_)));
    }
}
