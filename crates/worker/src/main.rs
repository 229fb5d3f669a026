use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use basin_core::workspace::RunWorkspace;
use basin_events::{RunNotifier, WebhookNotifier};
use basin_pipeline::{
    ArtifactLocation, ContainerStandardize, PgRegistry, PipelineExecutor,
};
use basin_runtime::DockerRuntime;
use basin_store::{S3Store, Scheme, StoreRouter};
use basin_worker::{JobDispatcher, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "basin_worker=debug,basin_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env()?;
    let pool = basin_db::create_pool(&config.database_url).await?;

    let workspace = RunWorkspace::new(&config.results_root);
    let runtime = Arc::new(DockerRuntime::new());

    let s3 = match config.artifact_scheme {
        Scheme::S3 => Some(S3Store::from_env().await),
        Scheme::File => None,
    };
    let store = Arc::new(StoreRouter::new(s3));

    let artifacts = ArtifactLocation {
        scheme: config.artifact_scheme,
        bucket: config.artifact_bucket.clone(),
        prefix: config.artifact_prefix.clone(),
    };

    let standardize = Arc::new(ContainerStandardize::new(
        runtime.clone(),
        config.standardizer_image.clone(),
        workspace.clone(),
        config.exec_timeout,
    ));

    let notifiers: Vec<Box<dyn RunNotifier>> = config
        .notification_targets
        .iter()
        .cloned()
        .map(|target| Box::new(WebhookNotifier::new(target)) as Box<dyn RunNotifier>)
        .collect();

    let executor = Arc::new(PipelineExecutor::new(
        runtime,
        store,
        standardize,
        Arc::new(PgRegistry::new(pool.clone())),
        Arc::new(notifiers),
        workspace,
        artifacts,
        config.exec_timeout,
    ));

    let dispatcher = JobDispatcher::new(pool, executor, config.concurrency)
        .with_poll_interval(config.poll_interval);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal_cancel.cancel();
        }
    });

    dispatcher.run(cancel).await;
    Ok(())
}
