//! Judge Queue storage (spec §4.5): a durable FIFO of judge/rejudge tasks
//! backed by a Redis list (`judge_queue`), push-head / pop-tail.
//!
//! The worker pool that drains this queue (the semaphore-bounded set of K
//! workers, `start`/`stop`) lives in the judge service, not here — this
//! struct only owns the shared storage contract so both the intake service
//! and the judge workers see the same queue.

use chrono::Utc;
use deadpool_redis::Pool as RedisPool;
use redis::AsyncCommands;
use uuid::Uuid;

use olympus_common::{AppError, AppResult, TaskKind};

use crate::models::JudgeTask;
use crate::submission_store::SubmissionStore;

const QUEUE_KEY: &str = "judge_queue";
const MAX_ID_RETRIES: u32 = 8;

#[derive(Clone)]
pub struct JudgeQueue {
    redis: RedisPool,
    store: SubmissionStore,
}

impl JudgeQueue {
    pub fn new(redis: RedisPool, store: SubmissionStore) -> Self {
        Self { redis, store }
    }

    async fn push_head(&self, task: &JudgeTask) -> AppResult<()> {
        let mut conn = self.redis.get().await?;
        let payload = serde_json::to_string(task)
            .map_err(|e| AppError::InternalError(format!("task serialization: {e}")))?;
        conn.lpush::<_, _, ()>(QUEUE_KEY, payload).await?;
        Ok(())
    }

    /// Blocks up to `timeout_secs` for a task; `None` on timeout so the
    /// caller's worker loop can check its shutdown flag and retry.
    pub async fn pop_tail(&self, timeout_secs: f64) -> AppResult<Option<JudgeTask>> {
        let mut conn = self.redis.get().await?;
        let popped: Option<(String, String)> = conn.brpop(QUEUE_KEY, timeout_secs).await?;
        let Some((_, payload)) = popped else {
            return Ok(None);
        };
        let task = serde_json::from_str(&payload)
            .map_err(|e| AppError::InternalError(format!("task deserialization: {e}")))?;
        Ok(Some(task))
    }

    /// Generates a fresh submission id (retried on collision), persists it
    /// PENDING, and pushes a JUDGE task. The caller is expected to have
    /// already cleared the submission with the Rate Limiter.
    pub async fn enqueue_judge(
        &self,
        user_id: i64,
        problem_id: &str,
        language: &str,
        source: &str,
    ) -> AppResult<Uuid> {
        let submission_id = self
            .create_pending_with_fresh_id(user_id, problem_id, language, source)
            .await?;

        self.push_head(&JudgeTask {
            kind: TaskKind::Judge,
            submission_id,
            problem_id: problem_id.to_string(),
            user_id: user_id.to_string(),
            language: language.to_string(),
            code: source.to_string(),
        })
        .await?;

        Ok(submission_id)
    }

    async fn create_pending_with_fresh_id(
        &self,
        user_id: i64,
        problem_id: &str,
        language: &str,
        source: &str,
    ) -> AppResult<Uuid> {
        for _ in 0..MAX_ID_RETRIES {
            let submission_id = Uuid::new_v4();
            let created = self
                .store
                .create_pending(submission_id, user_id, problem_id, language, Utc::now(), source)
                .await?;
            if created {
                return Ok(submission_id);
            }
        }
        Err(AppError::Conflict(
            "exhausted retries generating a unique submission id".into(),
        ))
    }

    /// Resets an existing submission to PENDING and pushes a REJUDGE task.
    /// 404s if the submission is unknown. Existing test rows are left in
    /// place until the worker replaces them.
    pub async fn enqueue_rejudge(&self, submission_id: Uuid) -> AppResult<()> {
        let Some(submission) = self.store.get(submission_id).await? else {
            return Err(AppError::NotFound(format!(
                "submission {submission_id} not found"
            )));
        };

        self.store
            .update_status(submission_id, "PENDING", None, None, None)
            .await?;

        self.push_head(&JudgeTask {
            kind: TaskKind::Rejudge,
            submission_id,
            problem_id: submission.problem_id,
            user_id: submission.user_id.to_string(),
            language: submission.language,
            code: submission.source_code,
        })
        .await
    }
}
