//! ResultUpload: publish the standardized shards.

use std::path::PathBuf;

use basin_store::ObjectStore;

use crate::artifacts::ArtifactLocation;
use crate::context::StageContext;
use crate::stages::Stage;
use crate::StageError;

/// Upload every shard keyed by run id, returning their public URLs in
/// shard order.
pub async fn run(
    ctx: &StageContext<'_>,
    store: &dyn ObjectStore,
    location: &ArtifactLocation,
    shards: &[PathBuf],
) -> Result<Vec<String>, StageError> {
    let mut data_paths = Vec::with_capacity(shards.len());

    for shard in shards {
        let file_name = shard
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let bytes = tokio::fs::read(shard).await?;
        let uri = location.uri_for(ctx.run_id(), &file_name);
        store.put(&uri, bytes).await?;

        ctx.log(Stage::ResultUpload, &format!("uploaded {file_name}"))?;
        data_paths.push(store.public_url(&uri));
    }

    Ok(data_paths)
}
