//! Builds the run document and job payload for one submission.
//!
//! Kept free of HTTP and database concerns so the full submission path
//! (validation, substitution, mount planning) is unit testable.

use std::fmt::Write as _;

use basin_core::model::Model;
use basin_core::mounts;
use basin_core::params::{self, ParameterViolation};
use basin_core::run::{ModelRun, RunParameter, RunStatus};
use basin_core::template::{self, TemplateError};
use basin_core::workspace::RunWorkspace;
use basin_pipeline::RunJobPayload;

/// Why a submission was rejected before enqueueing.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("invalid parameters: {}", format_violations(.0))]
    InvalidParameters(Vec<ParameterViolation>),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

fn format_violations(violations: &[ParameterViolation]) -> String {
    let mut out = String::new();
    for (i, v) in violations.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        let _ = write!(out, "{v}");
    }
    out
}

/// One validated submission, ready to persist and enqueue.
#[derive(Debug)]
pub struct Submission {
    pub run: ModelRun,
    pub payload: RunJobPayload,
}

/// Validate the caller's parameter values against the model, substitute
/// the directive, plan the mounts, and assemble the run + payload pair.
pub fn build(
    run_id: String,
    model: Model,
    parameters: Vec<RunParameter>,
    workdir: Option<String>,
    admin_level: Option<String>,
    workspace: &RunWorkspace,
) -> Result<Submission, SubmissionError> {
    let values: std::collections::BTreeMap<_, _> = parameters
        .iter()
        .map(|p| (p.name.clone(), p.value.clone()))
        .collect();

    let violations = params::validate_values(&model, &values);
    if !violations.is_empty() {
        return Err(SubmissionError::InvalidParameters(violations));
    }

    // Substituting the directive here also proves every config span is
    // resolvable in principle; configs themselves are rehydrated by the
    // worker against the same values.
    let command =
        template::substitute(&model.directive.command, &model.directive.parameters, &values)?;
    for config in &model.configs {
        template::substitute(&config.content, &config.parameters, &values)?;
    }

    let plan = mounts::plan(&run_id, &model, workspace);

    let run = ModelRun {
        id: run_id.clone(),
        model_id: model.id.clone(),
        model_name: model.name.clone(),
        parameters: parameters.clone(),
        status: RunStatus::Running,
        created_at: chrono::Utc::now(),
        data_paths: vec![],
        pre_gen_output_paths: vec![],
        executed_at: None,
    };

    let payload = RunJobPayload {
        run_id,
        model,
        parameters,
        command,
        workdir,
        plan,
        admin_level,
    };

    Ok(Submission { run, payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use basin_core::model::{
        AnnotatedSpan, Directive, OutputFileDescriptor, Parameter, ParameterType,
    };
    use serde_json::json;

    fn int_param(name: &str) -> Parameter {
        Parameter {
            name: name.to_string(),
            parameter_type: ParameterType::Int,
            default_value: json!(null),
            min: Some(1.0),
            max: Some(100.0),
            choices: None,
        }
    }

    fn model() -> Model {
        Model {
            id: "dmc".to_string(),
            name: "DMC".to_string(),
            image: "example/dmc:1".to_string(),
            directive: Directive {
                command: "echo {{x}}".to_string(),
                parameters: vec![AnnotatedSpan {
                    start: 5,
                    end: 10,
                    annotation: int_param("x"),
                }],
            },
            configs: vec![],
            outputs: vec![
                OutputFileDescriptor {
                    id: "out-a".to_string(),
                    output_directory: "/results".to_string(),
                    path: "a.csv".to_string(),
                    file_type: "csv".to_string(),
                    transform: json!({}),
                },
                OutputFileDescriptor {
                    id: "out-b".to_string(),
                    output_directory: "/results".to_string(),
                    path: "b.csv".to_string(),
                    file_type: "csv".to_string(),
                    transform: json!({}),
                },
            ],
            accessories: vec![],
            created_at: None,
        }
    }

    fn param(name: &str, value: serde_json::Value) -> RunParameter {
        RunParameter { name: name.to_string(), value }
    }

    #[test]
    fn builds_a_runnable_submission() {
        let ws = RunWorkspace::new("/srv/basin");
        let submission = build(
            "r1".to_string(),
            model(),
            vec![param("x", json!(42))],
            None,
            None,
            &ws,
        )
        .unwrap();

        assert_eq!(submission.payload.command, "echo 42");
        assert_eq!(submission.run.status, RunStatus::Running);
        assert_eq!(submission.payload.job_key(), "model-xform:dmc:r1");

        // Shared output directory collapsed to one mount through out-a.
        assert_eq!(submission.payload.plan.mounts.len(), 1);
        assert_eq!(submission.payload.plan.owner_of("/results"), Some("out-a"));
    }

    #[test]
    fn out_of_range_value_is_rejected_with_details() {
        let ws = RunWorkspace::new("/srv/basin");
        let err = build(
            "r1".to_string(),
            model(),
            vec![param("x", json!(1000))],
            None,
            None,
            &ws,
        )
        .unwrap_err();

        assert!(matches!(err, SubmissionError::InvalidParameters(_)));
        assert!(err.to_string().contains("x"));
    }

    #[test]
    fn missing_required_parameter_is_a_template_error() {
        let ws = RunWorkspace::new("/srv/basin");
        let err = build("r1".to_string(), model(), vec![], None, None, &ws).unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Template(TemplateError::MissingParameterValue { .. })
        ));
    }
}
