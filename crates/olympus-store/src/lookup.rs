//! Read-only lookups for `Problem` and `LanguageConfig` (spec §3: "read-only
//! from judge engine's perspective"). Backed by Postgres; populated by the
//! out-of-scope problem/language CRUD surface.

use sqlx::PgPool;

use olympus_common::AppResult;

use crate::models::{LanguageConfig, Problem, TestCase};

#[derive(Clone)]
pub struct CatalogLookup {
    db: PgPool,
}

impl CatalogLookup {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get_language(&self, name: &str) -> AppResult<Option<LanguageConfig>> {
        let row = sqlx::query_as::<_, LanguageConfig>(
            r#"
            SELECT name, file_ext, compile_cmd, run_cmd, time_limit_seconds, memory_limit_mib, image
            FROM languages WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await?;

        Ok(row)
    }

    pub async fn get_problem(&self, problem_id: &str) -> AppResult<Option<Problem>> {
        let exists: Option<(String, Option<f64>, Option<i32>)> = sqlx::query_as(
            "SELECT id, time_limit_seconds, memory_limit_mib FROM problems WHERE id = $1",
        )
        .bind(problem_id)
        .fetch_optional(&self.db)
        .await?;

        let Some((id, time_limit_seconds, memory_limit_mib)) = exists else {
            return Ok(None);
        };

        let testcases = sqlx::query_as::<_, TestCase>(
            r#"
            SELECT problem_id, ordinal, input, expected_output
            FROM problem_testcases WHERE problem_id = $1 ORDER BY ordinal ASC
            "#,
        )
        .bind(problem_id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some(Problem {
            id,
            testcases,
            time_limit_seconds,
            memory_limit_mib,
        }))
    }
}
