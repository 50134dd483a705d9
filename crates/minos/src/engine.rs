//! Judge Engine (spec §4.2): judges one submission end to end — materialize
//! source, compile once, run every testcase through the Sandbox Runner,
//! return the ordered per-test outcomes for aggregation.

use std::path::PathBuf;
use std::sync::Arc;

use olympus_common::{AppError, AppResult, Verdict};
use olympus_store::{LanguageConfig, Problem};
use uuid::Uuid;

use crate::sandbox::{ExecSpec, SandboxExecutor};

const COMPILE_TIME_LIMIT_SECS: f64 = 5.0;
const COMPILE_MEMORY_LIMIT_MIB: i64 = 128;
const COMPILE_CPU_QUOTA: f64 = 2.0;
const RUN_CPU_QUOTA: f64 = 1.0;

pub struct JudgeEngine<S: SandboxExecutor = crate::sandbox::SandboxRunner> {
    sandbox: Arc<S>,
    judge_root: PathBuf,
}

/// `Err` only for fatal (submission-level) failures; a per-test failure is
/// always a `Verdict` in the returned list, never an `Err`.
impl<S: SandboxExecutor> JudgeEngine<S> {
    pub fn new(sandbox: S, judge_root: PathBuf) -> Self {
        Self {
            sandbox: Arc::new(sandbox),
            judge_root,
        }
    }

    /// Returns the ordered (verdict, wall-time, peak-RSS-MiB) list, length
    /// `problem.testcases.len()`. Directory is always cleaned up on exit.
    pub async fn judge(
        &self,
        submission_id: Uuid,
        language: &LanguageConfig,
        problem: &Problem,
        source: &str,
    ) -> AppResult<Vec<(Verdict, f64, i32)>> {
        let workdir = self.judge_root.join(submission_id.to_string());
        tokio::fs::create_dir_all(&workdir)
            .await
            .map_err(|e| AppError::SandboxError(format!("create working directory: {e}")))?;

        let result = self.judge_inner(language, problem, source, &workdir).await;

        if let Err(e) = tokio::fs::remove_dir_all(&workdir).await {
            tracing::warn!(submission_id = %submission_id, error = %e, "failed to remove working directory");
        }

        result
    }

    async fn judge_inner(
        &self,
        language: &LanguageConfig,
        problem: &Problem,
        source: &str,
        workdir: &std::path::Path,
    ) -> AppResult<Vec<(Verdict, f64, i32)>> {
        let src_path = workdir.join(format!("code.{}", language.file_ext));
        tokio::fs::write(&src_path, source)
            .await
            .map_err(|e| AppError::SandboxError(format!("write source: {e}")))?;

        let src_arg = format!("/workspace/code.{}", language.file_ext);
        let exe_arg = "/workspace/code".to_string();

        if let Some(compile_cmd) = &language.compile_cmd {
            let rendered = render_template(compile_cmd, &src_arg, &exe_arg);
            let shell_command = format!("{rendered} > out.txt 2> err.txt");

            let (verdict, _, _) = self
                .sandbox
                .execute(ExecSpec {
                    image: language.image.clone(),
                    host_workdir: workdir.to_path_buf(),
                    shell_command,
                    time_limit_secs: COMPILE_TIME_LIMIT_SECS,
                    memory_limit_mib: COMPILE_MEMORY_LIMIT_MIB,
                    cpu_quota: COMPILE_CPU_QUOTA,
                    input: String::new(),
                    expected_output: String::new(),
                })
                .await?;

            // The compile sandbox doesn't run user input; any non-AC/WA
            // classification here just means "non-zero exit" per §4.1 step 2.
            if verdict != Verdict::Ac && verdict != Verdict::Wa {
                return Ok(vec![(Verdict::Ce, 0.0, 0); problem.testcases.len()]);
            }
        }

        let time_limit_secs = problem.time_limit_seconds.unwrap_or(language.time_limit_seconds);
        let memory_limit_mib = problem.memory_limit_mib.unwrap_or(language.memory_limit_mib);

        let run_cmd = render_template(&language.run_cmd, &src_arg, &exe_arg);

        let mut results = Vec::with_capacity(problem.testcases.len());
        for testcase in &problem.testcases {
            let shell_command = format!("{run_cmd} > out.txt 2> err.txt");
            let outcome = self
                .sandbox
                .execute(ExecSpec {
                    image: language.image.clone(),
                    host_workdir: workdir.to_path_buf(),
                    shell_command,
                    time_limit_secs,
                    memory_limit_mib: memory_limit_mib as i64,
                    cpu_quota: RUN_CPU_QUOTA,
                    input: testcase.input.clone(),
                    expected_output: testcase.expected_output.clone(),
                })
                .await?;
            results.push(outcome);
        }

        Ok(results)
    }
}

/// Renders `{src}`/`{exe}` placeholders; any other `{...}` is left literal
/// (spec §8 P6).
pub fn render_template(template: &str, src: &str, exe: &str) -> String {
    template.replace("{src}", src).replace("{exe}", exe)
}
