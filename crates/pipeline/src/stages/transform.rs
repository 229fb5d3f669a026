//! Transform: standardize every mapped output file.
//!
//! Drives the [`Standardize`] capability once per planned input, collecting
//! the produced tabular shards and merging the per-input column rename
//! maps.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::capabilities::Standardize;
use crate::context::StageContext;
use crate::stages::Stage;
use crate::StageError;

/// Everything Transform hands downstream.
#[derive(Debug, Default)]
pub struct TransformOutput {
    pub shards: Vec<PathBuf>,
    pub rename_map: BTreeMap<String, String>,
}

pub async fn run(
    ctx: &StageContext<'_>,
    standardize: &dyn Standardize,
) -> Result<TransformOutput, StageError> {
    let mut output = TransformOutput::default();
    let admin_level = ctx.payload.admin_level.as_deref();

    for input in &ctx.payload.plan.standardize_inputs {
        let outcome = standardize
            .standardize(ctx.run_id(), input, admin_level)
            .await?;

        ctx.log(
            Stage::Transform,
            &format!(
                "standardized {} into {} shard(s)",
                input.input_file,
                outcome.shards.len()
            ),
        )?;

        output.shards.extend(outcome.shards);
        output.rename_map.extend(outcome.rename_map);
    }

    Ok(output)
}
