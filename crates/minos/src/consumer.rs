//! Judge Queue worker pool (spec §4.5): K cooperative workers pulling tasks
//! from the shared `olympus_store::JudgeQueue`, each dispatch bounded by a
//! counting semaphore, shut down by draining with a grace period.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use olympus_common::AppResult;
use olympus_store::{CatalogLookup, JudgeQueue, JudgeTask, SubmissionStore};

use crate::engine::JudgeEngine;
use crate::metrics;
use crate::sandbox::SandboxExecutor;
use crate::verdict::aggregate;

#[derive(Clone)]
pub struct WorkerPool<S: SandboxExecutor = crate::sandbox::SandboxRunner> {
    queue: JudgeQueue,
    store: SubmissionStore,
    lookup: CatalogLookup,
    engine: Arc<JudgeEngine<S>>,
    worker_count: usize,
    pop_timeout_secs: f64,
    shutdown_grace: Duration,
}

impl<S: SandboxExecutor + 'static> WorkerPool<S> {
    pub fn new(
        queue: JudgeQueue,
        store: SubmissionStore,
        lookup: CatalogLookup,
        engine: JudgeEngine<S>,
        worker_count: usize,
        pop_timeout_secs: f64,
        shutdown_grace: Duration,
    ) -> Self {
        Self {
            queue,
            store,
            lookup,
            engine: Arc::new(engine),
            worker_count,
            pop_timeout_secs,
            shutdown_grace,
        }
    }

    /// Spawns `worker_count` worker tasks. Idempotent in the sense that
    /// calling it again spawns an independent pool against the same queue.
    pub fn start(&self) -> WorkerHandle {
        let running = Arc::new(AtomicBool::new(true));
        let semaphore = Arc::new(Semaphore::new(self.worker_count));

        let handles: Vec<JoinHandle<()>> = (0..self.worker_count)
            .map(|id| {
                let queue = self.queue.clone();
                let store = self.store.clone();
                let lookup = self.lookup.clone();
                let engine = self.engine.clone();
                let running = running.clone();
                let semaphore = semaphore.clone();
                let pop_timeout_secs = self.pop_timeout_secs;
                tokio::spawn(async move {
                    worker_loop(id, queue, store, lookup, engine, running, semaphore, pop_timeout_secs).await;
                })
            })
            .collect();

        WorkerHandle {
            running,
            handles,
            grace: self.shutdown_grace,
        }
    }
}

/// `while running: task := pop_tail(queue); if none: continue; acquire
/// worker-slot semaphore; try dispatch(task); finally release` (spec §4.5).
async fn worker_loop<S: SandboxExecutor>(
    id: usize,
    queue: JudgeQueue,
    store: SubmissionStore,
    lookup: CatalogLookup,
    engine: Arc<JudgeEngine<S>>,
    running: Arc<AtomicBool>,
    semaphore: Arc<Semaphore>,
    pop_timeout_secs: f64,
) {
    tracing::info!(worker_id = id, "judge worker started");

    while running.load(Ordering::SeqCst) {
        let task = match queue.pop_tail(pop_timeout_secs).await {
            Ok(Some(task)) => task,
            Ok(None) => continue,
            Err(e) => {
                tracing::error!(worker_id = id, error = %e, "queue pop failed");
                tokio::time::sleep(Duration::from_millis(500)).await;
                continue;
            }
        };

        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };

        metrics::ACTIVE_JOBS.inc();
        dispatch(&task, &store, &lookup, &engine).await;
        metrics::ACTIVE_JOBS.dec();
        drop(permit);
    }

    tracing::info!(worker_id = id, "judge worker stopped");
}

/// Runs the Judge Engine for one task and commits the result (spec §4.5
/// "Dispatch"). JUDGE and REJUDGE are handled identically: the queue storage
/// layer is responsible for the PENDING-reset difference between them.
async fn dispatch<S: SandboxExecutor>(
    task: &JudgeTask,
    store: &SubmissionStore,
    lookup: &CatalogLookup,
    engine: &JudgeEngine<S>,
) {
    tracing::info!(
        submission_id = %task.submission_id,
        kind = ?task.kind,
        "dispatching judge task"
    );

    match dispatch_inner(task, store, lookup, engine).await {
        Ok(()) => {
            metrics::JOBS_PROCESSED.inc();
        }
        Err(e) => {
            tracing::error!(submission_id = %task.submission_id, error = %e, "judge dispatch failed");
            metrics::JOBS_FAILED.inc();
            if let Err(e) = store
                .update_status(task.submission_id, "ERROR", None, None, None)
                .await
            {
                tracing::error!(submission_id = %task.submission_id, error = %e, "failed to record ERROR status");
            }
        }
    }
}

async fn dispatch_inner<S: SandboxExecutor>(
    task: &JudgeTask,
    store: &SubmissionStore,
    lookup: &CatalogLookup,
    engine: &JudgeEngine<S>,
) -> AppResult<()> {
    use olympus_common::AppError;

    let user_id: i64 = task
        .user_id
        .parse()
        .map_err(|_| AppError::InternalError(format!("invalid user_id {}", task.user_id)))?;

    let language = lookup
        .get_language(&task.language)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("language {} disappeared mid-judge", task.language)))?;

    let problem = lookup
        .get_problem(&task.problem_id)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("problem {} disappeared mid-judge", task.problem_id)))?;

    let results = engine
        .judge(task.submission_id, &language, &problem, &task.code)
        .await?;

    for (verdict, _, _) in &results {
        metrics::record_verdict(verdict.as_str());
    }
    if let Some(max_time) = results.iter().map(|(_, t, _)| *t).fold(None, |acc: Option<f64>, t| {
        Some(acc.map_or(t, |a| a.max(t)))
    }) {
        let max_mem = results.iter().map(|(_, _, m)| *m).max().unwrap_or(0);
        metrics::record_execution(&task.problem_id, max_time, (max_mem as u64) * 1024 * 1024);
    }

    let agg = aggregate(&results);

    store
        .update_status(
            task.submission_id,
            "SUCCESS",
            Some(agg.score),
            Some(agg.counts),
            Some(&agg.tests),
        )
        .await?;

    store
        .upsert_resolve(&task.problem_id, user_id, &task.language, agg.score == agg.counts)
        .await?;

    Ok(())
}

/// Handle returned by [`WorkerPool::start`]; `stop` signals drain and blocks
/// until every worker returns, aborting stragglers after the grace period
/// (spec §5 "Worker shutdown cancels any in-flight task after a grace period").
pub struct WorkerHandle {
    running: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
    grace: Duration,
}

impl WorkerHandle {
    pub async fn stop(self) {
        self.running.store(false, Ordering::SeqCst);

        let abort_handles: Vec<_> = self.handles.iter().map(|h| h.abort_handle()).collect();
        let join_all = futures::future::join_all(self.handles);

        if tokio::time::timeout(self.grace, join_all).await.is_err() {
            tracing::warn!("worker shutdown grace period elapsed; aborting stragglers");
            for handle in abort_handles {
                handle.abort();
            }
        }
    }
}
