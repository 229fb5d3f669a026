//! AccessoryUpload: publish the model's pre-generated files.
//!
//! The model writes accessories (charts, reports, media) into the shared
//! accessory mount. Each descriptor's leaf filename is treated as a glob
//! pattern against that directory; matches are renamed to embed the
//! descriptor id and uploaded keyed by run id. A descriptor with zero
//! matches logs a warning and contributes nothing.

use basin_core::run::AccessoryArtifact;
use basin_core::workspace::ACCESSORY_ID_SEPARATOR;
use basin_store::ObjectStore;

use crate::artifacts::ArtifactLocation;
use crate::context::StageContext;
use crate::stages::Stage;
use crate::StageError;

pub async fn run(
    ctx: &StageContext<'_>,
    store: &dyn ObjectStore,
    location: &ArtifactLocation,
) -> Result<Vec<AccessoryArtifact>, StageError> {
    let accessories_dir = ctx.workspace.accessories_dir(ctx.run_id());
    let mut uploaded = Vec::new();

    for descriptor in &ctx.payload.model.accessories {
        let pattern = accessories_dir.join(descriptor.leaf());
        let matches: Vec<_> = glob::glob(&pattern.to_string_lossy())
            .map_err(|e| StageError::Transform(e.to_string()))?
            .filter_map(Result::ok)
            .collect();

        if matches.is_empty() {
            tracing::warn!(
                run_id = ctx.run_id(),
                descriptor = %descriptor.id,
                pattern = %descriptor.leaf(),
                "no accessory files matched"
            );
            ctx.log(
                Stage::AccessoryUpload,
                &format!("no files matched {} for {}", descriptor.leaf(), descriptor.id),
            )?;
            continue;
        }

        for path in matches {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let renamed = format!("{}{ACCESSORY_ID_SEPARATOR}{file_name}", descriptor.id);

            let bytes = tokio::fs::read(&path).await?;
            let uri = location.uri_for(ctx.run_id(), &renamed);
            store.put(&uri, bytes).await?;

            ctx.log(Stage::AccessoryUpload, &format!("uploaded {renamed}"))?;
            uploaded.push(AccessoryArtifact {
                file: store.public_url(&uri),
                caption: descriptor.caption.clone(),
            });
        }
    }

    Ok(uploaded)
}
