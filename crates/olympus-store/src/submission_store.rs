//! Submission Store (spec §4.4): typed create/update/lookup/list over
//! persisted submissions and their per-test log rows, plus the
//! resolve-relation and user counters (I4/I5).

use chrono::{DateTime, Utc};
use olympus_common::{AppError, AppResult, PaginatedResponse, Pagination};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::cache::CacheCoordinator;
use crate::models::{Submission, SubmissionFilters, TestResult};

/// A single test outcome to be persisted by [`SubmissionStore::update_status`].
#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub ordinal: i32,
    pub verdict: String,
    pub wall_time_seconds: f64,
    pub peak_rss_mib: i32,
}

#[derive(Clone)]
pub struct SubmissionStore {
    db: PgPool,
    cache: CacheCoordinator,
}

impl SubmissionStore {
    pub fn new(db: PgPool, cache: CacheCoordinator) -> Self {
        Self { db, cache }
    }

    /// Returns `false` iff `submission_id` collides with an existing row.
    pub async fn create_pending(
        &self,
        submission_id: Uuid,
        user_id: i64,
        problem_id: &str,
        language: &str,
        submission_time: DateTime<Utc>,
        source: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO submissions
                (id, user_id, problem_id, language, source_code, submission_time, status, score, counts)
            VALUES ($1, $2, $3, $4, $5, $6, 'PENDING', NULL, NULL)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(submission_id)
        .bind(user_id)
        .bind(problem_id)
        .bind(language)
        .bind(source)
        .bind(submission_time)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        self.cache
            .invalidate("user", "id", &user_id.to_string())
            .await?;
        self.cache.invalidate("problem", "id", problem_id).await?;

        Ok(true)
    }

    pub async fn get(&self, submission_id: Uuid) -> AppResult<Option<Submission>> {
        let row = sqlx::query_as::<_, Submission>(
            r#"
            SELECT id, user_id, problem_id, language, source_code, submission_time, status, score, counts
            FROM submissions WHERE id = $1
            "#,
        )
        .bind(submission_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row)
    }

    pub async fn get_with_tests(
        &self,
        submission_id: Uuid,
    ) -> AppResult<Option<(Submission, Vec<TestResult>)>> {
        let Some(submission) = self.get(submission_id).await? else {
            return Ok(None);
        };

        let tests = sqlx::query_as::<_, TestResult>(
            r#"
            SELECT submission_id, ordinal, verdict, wall_time_seconds, peak_rss_mib
            FROM test_results WHERE submission_id = $1 ORDER BY ordinal ASC
            "#,
        )
        .bind(submission_id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some((submission, tests)))
    }

    /// Transitions a submission's status, optionally setting score/counts and
    /// atomically replacing its test rows (I1–I3).
    pub async fn update_status(
        &self,
        submission_id: Uuid,
        status: &str,
        score: Option<i32>,
        counts: Option<i32>,
        tests: Option<&[TestOutcome]>,
    ) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            "UPDATE submissions SET status = $2, score = $3, counts = $4 WHERE id = $1",
        )
        .bind(submission_id)
        .bind(status)
        .bind(score)
        .bind(counts)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!(
                "submission {submission_id} not found"
            )));
        }

        if let Some(tests) = tests {
            sqlx::query("DELETE FROM test_results WHERE submission_id = $1")
                .bind(submission_id)
                .execute(&mut *tx)
                .await?;

            for t in tests {
                sqlx::query(
                    r#"
                    INSERT INTO test_results
                        (submission_id, ordinal, verdict, wall_time_seconds, peak_rss_mib)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(submission_id)
                .bind(t.ordinal)
                .bind(&t.verdict)
                .bind(t.wall_time_seconds)
                .bind(t.peak_rss_mib)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        self.cache
            .invalidate("submission", "id", &submission_id.to_string())
            .await?;

        Ok(())
    }

    /// At least one of `filters.user_id` / `filters.problem_id` must be set.
    pub async fn list(
        &self,
        filters: &SubmissionFilters,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<Submission>> {
        if filters.user_id.is_none() && filters.problem_id.is_none() {
            return Err(AppError::ValidationError("insufficient filter".into()));
        }

        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM submissions WHERE 1 = 1");
        Self::apply_filters(&mut count_qb, filters);
        let total: i64 = count_qb
            .build()
            .fetch_one(&self.db)
            .await?
            .try_get(0)
            .unwrap_or(0);

        let response_empty = PaginatedResponse::new(Vec::new(), pagination.page, pagination.per_page, total);
        if total > 0 && pagination.page > response_empty.total_pages.max(1) {
            return Err(AppError::NotFound("page not found".into()));
        }

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, user_id, problem_id, language, source_code, submission_time, status, score, counts FROM submissions WHERE 1 = 1",
        );
        Self::apply_filters(&mut qb, filters);
        qb.push(" ORDER BY submission_time DESC, id DESC LIMIT ");
        qb.push_bind(pagination.limit());
        qb.push(" OFFSET ");
        qb.push_bind(pagination.offset());

        let items = qb
            .build_query_as::<Submission>()
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse::new(
            items,
            pagination.page,
            pagination.per_page,
            total,
        ))
    }

    fn apply_filters(qb: &mut QueryBuilder<Postgres>, filters: &SubmissionFilters) {
        if let Some(user_id) = filters.user_id {
            qb.push(" AND user_id = ");
            qb.push_bind(user_id);
        }
        if let Some(problem_id) = &filters.problem_id {
            qb.push(" AND problem_id = ");
            qb.push_bind(problem_id.clone());
        }
        if let Some(status) = &filters.status {
            qb.push(" AND status = ");
            qb.push_bind(status.clone());
        }
    }

    /// The only path that may increment `users.resolve_count` (I4/I5): a
    /// flip from no-record/false to true, serialized with `SELECT ... FOR
    /// UPDATE` so concurrent rejudges of the same triple can't double-count.
    pub async fn upsert_resolve(
        &self,
        problem_id: &str,
        user_id: i64,
        language: &str,
        passed: bool,
    ) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let existing: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT resolved FROM resolve_records
            WHERE problem_id = $1 AND user_id = $2 AND language = $3
            FOR UPDATE
            "#,
        )
        .bind(problem_id)
        .bind(user_id)
        .bind(language)
        .fetch_optional(&mut *tx)
        .await?;

        let flipped_to_true = match existing {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO resolve_records (problem_id, user_id, language, resolved)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(problem_id)
                .bind(user_id)
                .bind(language)
                .bind(passed)
                .execute(&mut *tx)
                .await?;
                passed
            }
            Some(true) => false,
            Some(false) => {
                if passed {
                    sqlx::query(
                        r#"
                        UPDATE resolve_records SET resolved = TRUE
                        WHERE problem_id = $1 AND user_id = $2 AND language = $3
                        "#,
                    )
                    .bind(problem_id)
                    .bind(user_id)
                    .bind(language)
                    .execute(&mut *tx)
                    .await?;
                }
                passed
            }
        };

        if flipped_to_true {
            sqlx::query("UPDATE users SET resolve_count = resolve_count + 1 WHERE id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        if flipped_to_true {
            self.cache
                .invalidate("user", "id", &user_id.to_string())
                .await?;
        }

        Ok(())
    }
}
