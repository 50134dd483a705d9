//! Submission response DTOs (spec §6 "Submission API").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// POST /submissions → 200.
#[derive(Debug, Serialize)]
pub struct SubmissionCreatedResponse {
    pub submission_id: Uuid,
    pub status: &'static str,
}

impl SubmissionCreatedResponse {
    pub fn pending(submission_id: Uuid) -> Self {
        Self {
            submission_id,
            status: "pending",
        }
    }
}

/// GET /submissions/{id} → `{score, counts}` only (spec §6).
#[derive(Debug, Serialize)]
pub struct SubmissionScoreResponse {
    pub score: Option<i32>,
    pub counts: Option<i32>,
}

/// One row of a submission list page.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionSummary {
    pub id: Uuid,
    pub user_id: i64,
    pub problem_id: String,
    pub language: String,
    pub status: String,
    pub score: Option<i32>,
    pub counts: Option<i32>,
    pub submission_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: u32,
}

/// GET /submissions list response.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionListResponse {
    pub submissions: Vec<SubmissionSummary>,
    pub pagination: PaginationMeta,
}

/// One entry of a submission's per-test log.
#[derive(Debug, Serialize)]
pub struct TestLogEntry {
    pub ordinal: i32,
    pub verdict: String,
    pub wall_time_seconds: f64,
    pub peak_rss_mib: i32,
}

/// GET /submissions/{id}/log response.
#[derive(Debug, Serialize)]
pub struct SubmissionLogResponse {
    pub submission_id: Uuid,
    pub status: String,
    pub score: Option<i32>,
    pub counts: Option<i32>,
    pub tests: Vec<TestLogEntry>,
}

/// PUT /submissions/{id}/rejudge → 200.
#[derive(Debug, Serialize)]
pub struct RejudgeAcceptedResponse {
    pub submission_id: Uuid,
    pub status: &'static str,
}
