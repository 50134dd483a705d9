//! Sandbox Runner (spec §4.1): one bounded execution of a compiled program
//! against one test case input, inside a Docker container.
//!
//! Grounded in the teacher's own `bollard` usage (`ContainerManager` in
//! `src/benchmark/container.rs`), generalized from its exec-based
//! `/usr/bin/time -v` approach to the protocol the spec asks for directly:
//! attach stdin on container start, sample peak RSS via `docker stats` every
//! 50 ms, and classify the exit by signal rather than shelling through
//! `timeout`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bollard::models::{ContainerCreateBody, HostConfig};
use bollard::query_parameters::{
    AttachContainerOptionsBuilder, CreateContainerOptionsBuilder, InspectContainerOptions,
    RemoveContainerOptionsBuilder, StartContainerOptions, StatsOptionsBuilder,
};
use bollard::Docker;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use olympus_common::{AppError, AppResult, Verdict};

use crate::verdict::{classify, RunOutcome};

const SAMPLE_INTERVAL: Duration = Duration::from_millis(50);

/// Everything the runner needs for one bounded execution.
pub struct SandboxSpec<'a> {
    pub image: &'a str,
    /// Host directory mounted at `/workspace` in the container.
    pub host_workdir: &'a Path,
    /// Already rendered, e.g. `"./code > out.txt 2> err.txt"` (spec §4.1 step 2).
    pub shell_command: String,
    pub time_limit_secs: f64,
    pub memory_limit_mib: i64,
    /// Number of CPUs, e.g. `1.0` for a test run, `2.0` for the compile step.
    pub cpu_quota: f64,
    pub input: &'a str,
    pub expected_output: &'a str,
}

/// Owned counterpart of [`SandboxSpec`], used at the [`SandboxExecutor`]
/// trait boundary so the Judge Engine can be exercised against a `mockall`
/// mock without borrowing into caller-owned buffers.
#[derive(Debug, Clone)]
pub struct ExecSpec {
    pub image: String,
    pub host_workdir: PathBuf,
    pub shell_command: String,
    pub time_limit_secs: f64,
    pub memory_limit_mib: i64,
    pub cpu_quota: f64,
    pub input: String,
    pub expected_output: String,
}

/// One bounded sandboxed execution (spec §4.1). Abstracted behind a trait so
/// `minos::engine::JudgeEngine` can be tested with a `mockall` mock instead
/// of a real Docker daemon.
#[cfg_attr(any(test, feature = "test-support"), mockall::automock)]
#[async_trait]
pub trait SandboxExecutor: Send + Sync {
    async fn execute(&self, spec: ExecSpec) -> AppResult<(Verdict, f64, i32)>;
}

#[derive(Clone)]
pub struct SandboxRunner {
    docker: Docker,
}

#[async_trait]
impl SandboxExecutor for SandboxRunner {
    async fn execute(&self, spec: ExecSpec) -> AppResult<(Verdict, f64, i32)> {
        self.run(SandboxSpec {
            image: &spec.image,
            host_workdir: &spec.host_workdir,
            shell_command: spec.shell_command,
            time_limit_secs: spec.time_limit_secs,
            memory_limit_mib: spec.memory_limit_mib,
            cpu_quota: spec.cpu_quota,
            input: &spec.input,
            expected_output: &spec.expected_output,
        })
        .await
    }
}

impl SandboxRunner {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Runs one execution and always destroys the container before returning
    /// (spec §4.1 step 6), regardless of how the run ended.
    pub async fn run(&self, spec: SandboxSpec<'_>) -> AppResult<(Verdict, f64, i32)> {
        let container_id = self.create(&spec).await?;
        let outcome = self.run_inner(&container_id, &spec).await;

        let remove_options = RemoveContainerOptionsBuilder::default().force(true).build();
        if let Err(e) = self
            .docker
            .remove_container(&container_id, Some(remove_options))
            .await
        {
            tracing::warn!(container_id, error = %e, "failed to remove sandbox container");
        }

        outcome
    }

    async fn create(&self, spec: &SandboxSpec<'_>) -> AppResult<String> {
        let mem_bytes = spec.memory_limit_mib * 1024 * 1024;

        let host_config = HostConfig {
            memory: Some(mem_bytes),
            memory_swap: Some(mem_bytes * 2),
            cpu_period: Some(100_000),
            cpu_quota: Some((spec.cpu_quota * 100_000.0) as i64),
            network_mode: Some("none".to_string()),
            binds: Some(vec![format!("{}:/workspace", spec.host_workdir.display())]),
            ..Default::default()
        };

        let body = ContainerCreateBody {
            image: Some(spec.image.to_string()),
            cmd: Some(vec![
                "/bin/sh".to_string(),
                "-c".to_string(),
                spec.shell_command.clone(),
            ]),
            working_dir: Some("/workspace".to_string()),
            open_stdin: Some(true),
            attach_stdin: Some(true),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = CreateContainerOptionsBuilder::default().build();
        let container = self
            .docker
            .create_container(Some(options), body)
            .await
            .map_err(|e| AppError::SandboxError(format!("create_container: {e}")))?;

        Ok(container.id)
    }

    async fn run_inner(
        &self,
        container_id: &str,
        spec: &SandboxSpec<'_>,
    ) -> AppResult<(Verdict, f64, i32)> {
        let attach_options = AttachContainerOptionsBuilder::default()
            .stdin(true)
            .stdout(true)
            .stderr(true)
            .stream(true)
            .build();

        let mut attach = self
            .docker
            .attach_container(container_id, Some(attach_options))
            .await
            .map_err(|e| AppError::SandboxError(format!("attach_container: {e}")))?;

        self.docker
            .start_container(container_id, None::<StartContainerOptions>)
            .await
            .map_err(|e| AppError::SandboxError(format!("start_container: {e}")))?;

        let mut stdin_payload = spec.input.as_bytes().to_vec();
        stdin_payload.push(b'\n');
        attach
            .input
            .write_all(&stdin_payload)
            .await
            .map_err(|e| AppError::SandboxError(format!("stdin write: {e}")))?;
        let _ = attach.input.shutdown().await;

        let peak_bytes = Arc::new(AtomicI64::new(0));
        let sampler = tokio::spawn(sample_peak_rss(
            self.docker.clone(),
            container_id.to_string(),
            peak_bytes.clone(),
        ));

        let start = Instant::now();
        let wait_result = timeout(
            Duration::from_secs_f64(spec.time_limit_secs),
            self.docker.wait_container(
                container_id,
                None::<bollard::query_parameters::WaitContainerOptions>,
            ).collect::<Vec<_>>(),
        )
        .await;
        let elapsed = start.elapsed().as_secs_f64();

        sampler.abort();
        let peak_mib = (peak_bytes.load(Ordering::Relaxed) / (1024 * 1024)) as i32;

        if wait_result.is_err() {
            return Ok((Verdict::Tle, spec.time_limit_secs, peak_mib));
        }

        let inspect = self
            .docker
            .inspect_container(container_id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| AppError::SandboxError(format!("inspect_container: {e}")))?;

        let state = inspect.state.unwrap_or_default();
        let exit_code = state.exit_code.unwrap_or(-1) as i32;
        let oom_killed = state.oom_killed.unwrap_or(false);

        let verdict = if oom_killed {
            Verdict::Mle
        } else if exit_code == 0 {
            let out_path = spec.host_workdir.join("out.txt");
            let stdout = tokio::fs::read_to_string(&out_path)
                .await
                .unwrap_or_default();
            classify(
                RunOutcome::Exited {
                    code: 0,
                    stdout: &stdout,
                },
                spec.expected_output,
            )
        } else if exit_code >= 128 {
            classify(
                RunOutcome::Killed {
                    signal: exit_code,
                },
                spec.expected_output,
            )
        } else {
            classify(
                RunOutcome::Exited {
                    code: exit_code,
                    stdout: "",
                },
                spec.expected_output,
            )
        };

        Ok((verdict, elapsed, peak_mib))
    }
}

async fn sample_peak_rss(docker: Docker, container_id: String, peak: Arc<AtomicI64>) {
    let options = StatsOptionsBuilder::default().stream(true).build();
    let mut stream = docker.stats(&container_id, Some(options));

    while let Some(sample) = stream.next().await {
        let Ok(stats) = sample else { break };
        if let Some(usage) = stats.memory_stats.and_then(|m| m.usage) {
            peak.fetch_max(usage as i64, Ordering::Relaxed);
        }
        tokio::time::sleep(SAMPLE_INTERVAL).await;
    }
}
