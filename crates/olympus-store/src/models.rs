//! Row types for the judge core's data model (spec §3).

use chrono::{DateTime, Utc};
use olympus_common::{SubmissionStatus, Verdict};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A submission as persisted by the Submission Store.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: i64,
    pub problem_id: String,
    pub language: String,
    /// Never serialized back out of a list/detail response — same guard the
    /// teacher's own `Submission` model carries for `source_code`.
    #[serde(skip_serializing)]
    pub source_code: String,
    pub submission_time: DateTime<Utc>,
    pub status: String,
    pub score: Option<i32>,
    pub counts: Option<i32>,
}

impl Submission {
    pub fn status(&self) -> SubmissionStatus {
        SubmissionStatus::from_str(&self.status).unwrap_or(SubmissionStatus::Error)
    }
}

/// One test case's recorded outcome (spec §3, I2/I3).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TestResult {
    pub submission_id: Uuid,
    pub ordinal: i32,
    pub verdict: String,
    pub wall_time_seconds: f64,
    pub peak_rss_mib: i32,
}

impl TestResult {
    pub fn verdict(&self) -> Verdict {
        Verdict::from_str(&self.verdict).unwrap_or(Verdict::Unk)
    }
}

/// A single (input, expected-output) pair belonging to a [`Problem`].
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TestCase {
    pub problem_id: String,
    pub ordinal: i32,
    pub input: String,
    pub expected_output: String,
}

/// Problem metadata as read (read-only) by the judge core.
#[derive(Debug, Clone)]
pub struct Problem {
    pub id: String,
    pub testcases: Vec<TestCase>,
    pub time_limit_seconds: Option<f64>,
    pub memory_limit_mib: Option<i32>,
}

/// Compile/run command templates and default limits for one language.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LanguageConfig {
    pub name: String,
    pub file_ext: String,
    pub compile_cmd: Option<String>,
    pub run_cmd: String,
    pub time_limit_seconds: f64,
    pub memory_limit_mib: i32,
    pub image: String,
}

/// JSON task schema pushed to and popped from `judge_queue` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeTask {
    #[serde(rename = "type")]
    pub kind: olympus_common::TaskKind,
    pub submission_id: Uuid,
    pub problem_id: String,
    pub user_id: String,
    pub language: String,
    pub code: String,
}

/// Filters accepted by [`crate::SubmissionStore::list`].
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilters {
    pub user_id: Option<i64>,
    pub problem_id: Option<String>,
    pub status: Option<String>,
}
