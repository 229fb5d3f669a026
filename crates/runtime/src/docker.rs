//! Docker-backed [`ContainerRuntime`].
//!
//! Shells out to the `docker` CLI via [`tokio::process::Command`]. The
//! container runs with `--rm` so nothing is left behind, and the child
//! handle uses `kill_on_drop(true)` so a timeout also kills the local
//! `docker run` client.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::{ContainerRuntime, ExecutionOutput, ExecutionSpec, RuntimeError};

/// Maximum combined log size captured per stream (10 MiB).
///
/// Output exceeding this limit is truncated to prevent memory exhaustion
/// from extremely verbose model containers.
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Runs containers through the local Docker daemon.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    /// Docker binary, normally just `docker` resolved via PATH.
    binary: String,
}

impl Default for DockerRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerRuntime {
    pub fn new() -> Self {
        Self {
            binary: "docker".to_string(),
        }
    }

    /// Argument vector for `docker run`, kept separate from the spawn so it
    /// can be unit tested without a Docker daemon.
    fn build_args(spec: &ExecutionSpec) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--name".to_string(),
            spec.name.clone(),
        ];
        for mount in &spec.mounts {
            args.push("-v".to_string());
            args.push(format!(
                "{}:{}",
                mount.host_path.display(),
                mount.container_path
            ));
        }
        if let Some(workdir) = &spec.workdir {
            args.push("-w".to_string());
            args.push(workdir.clone());
        }
        args.push(spec.image.clone());
        args.push("/bin/sh".to_string());
        args.push("-c".to_string());
        args.push(spec.command.clone());
        args
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn execute(&self, spec: &ExecutionSpec) -> Result<ExecutionOutput, RuntimeError> {
        let args = Self::build_args(spec);
        tracing::info!(container = %spec.name, image = %spec.image, "launching container");

        let mut cmd = Command::new(&self.binary);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let mut child = cmd.spawn()?;

        // Read stdout/stderr in spawned tasks so `child.wait()` (which
        // borrows `&mut child`) can run concurrently.
        let stdout_handle = child.stdout.take();
        let stderr_handle = child.stderr.take();
        let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
        let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

        let status = match spec.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(result) => result?,
                Err(_elapsed) => {
                    // `child` is dropped here, which kills the docker client
                    // because of `kill_on_drop(true)`.
                    return Err(RuntimeError::Timeout {
                        elapsed_ms: start.elapsed().as_millis() as u64,
                    });
                }
            },
            None => child.wait().await?,
        };

        let stdout_bytes = stdout_task.await.unwrap_or_default();
        let stderr_bytes = stderr_task.await.unwrap_or_default();
        let mut logs = String::from_utf8_lossy(&stdout_bytes).into_owned();
        if !stderr_bytes.is_empty() {
            if !logs.is_empty() && !logs.ends_with('\n') {
                logs.push('\n');
            }
            logs.push_str(&String::from_utf8_lossy(&stderr_bytes));
        }

        let exit_code = status.code().unwrap_or(-1);
        tracing::info!(
            container = %spec.name,
            exit_code,
            duration_ms = start.elapsed().as_millis() as u64,
            "container finished"
        );

        Ok(ExecutionOutput { exit_code, logs })
    }
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}
