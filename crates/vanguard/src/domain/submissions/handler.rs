//! Submission handlers: the Intake API and the read/rejudge surface (spec §4.7, §6).

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use olympus_common::{Pagination, SubmissionStatus};
use olympus_store::SubmissionFilters;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

use super::request::{CreateSubmissionRequest, ListSubmissionsQuery};
use super::response::{
    PaginationMeta, RejudgeAcceptedResponse, SubmissionCreatedResponse, SubmissionLogResponse,
    SubmissionListResponse, SubmissionScoreResponse, SubmissionSummary, TestLogEntry,
};

/// POST /submissions
pub async fn create_submission(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateSubmissionRequest>,
) -> ApiResult<Json<SubmissionCreatedResponse>> {
    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if state.lookup.get_problem(&payload.problem_id).await?.is_none() {
        return Err(ApiError::NotFound("problem not found".into()));
    }
    if state.lookup.get_language(&payload.language).await?.is_none() {
        return Err(ApiError::NotFound("language not found".into()));
    }

    if !state.rate_limiter.allow_to_submit(user.user_id).await? {
        return Err(ApiError::RateLimitExceeded);
    }

    let submission_id = state
        .queue
        .enqueue_judge(
            user.user_id,
            &payload.problem_id,
            &payload.language,
            &payload.source_code,
        )
        .await?;

    tracing::info!(%submission_id, user_id = user.user_id, "submission enqueued");

    Ok(Json(SubmissionCreatedResponse::pending(submission_id)))
}

/// GET /submissions/{id}
///
/// Returns only `{score, counts}` (spec §6); 403 if the caller is neither the
/// owner nor an admin.
pub async fn get_submission(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(submission_id): Path<Uuid>,
) -> ApiResult<Json<SubmissionScoreResponse>> {
    let submission = state
        .store
        .get(submission_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("submission not found".into()))?;

    if submission.user_id != user.user_id && !user.is_admin() {
        return Err(ApiError::Forbidden);
    }

    Ok(Json(SubmissionScoreResponse {
        score: submission.score,
        counts: submission.counts,
    }))
}

/// GET /submissions
pub async fn list_submissions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListSubmissionsQuery>,
) -> ApiResult<Json<SubmissionListResponse>> {
    // Non-admins may only list their own submissions.
    let user_id = if user.is_admin() {
        query.user_id
    } else {
        if query.user_id.is_some_and(|id| id != user.user_id) {
            return Err(ApiError::Forbidden);
        }
        Some(user.user_id)
    };

    let status = query
        .status
        .as_deref()
        .map(|s| SubmissionStatus::from_str(s).map(|s| s.as_str().to_string()))
        .transpose()
        .ok_or_else(|| ApiError::Validation("invalid status filter".into()))?;

    let filters = SubmissionFilters {
        user_id,
        problem_id: query.problem_id,
        status,
    };
    let pagination = Pagination {
        page: query.page.max(1),
        per_page: query.per_page.clamp(1, 100),
    };

    let fingerprint = format!(
        "user={:?}&problem={:?}&status={:?}&page={}&per_page={}",
        filters.user_id, filters.problem_id, filters.status, pagination.page, pagination.per_page
    );
    let cache_key = state.cache.query_key("submissions_list", &fingerprint);

    if let Some(cached) = state.cache.get(&cache_key).await? {
        let response: SubmissionListResponse = serde_json::from_str(&cached)
            .map_err(|e| ApiError::Internal(format!("corrupt cache entry: {e}")))?;
        return Ok(Json(response));
    }

    let page = state.store.list(&filters, &pagination).await?;

    let response = SubmissionListResponse {
        submissions: page
            .data
            .into_iter()
            .map(|s| SubmissionSummary {
                id: s.id,
                user_id: s.user_id,
                problem_id: s.problem_id,
                language: s.language,
                status: s.status,
                score: s.score,
                counts: s.counts,
                submission_time: s.submission_time,
            })
            .collect(),
        pagination: PaginationMeta {
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            total_pages: page.total_pages,
        },
    };

    let user_id_str = filters.user_id.map(|id| id.to_string());
    let mut depends_on: Vec<(&str, &str, &str)> = Vec::new();
    if let Some(uid) = user_id_str.as_deref() {
        depends_on.push(("user", "id", uid));
    }
    if let Some(pid) = filters.problem_id.as_deref() {
        depends_on.push(("problem", "id", pid));
    }

    if let Ok(body) = serde_json::to_string(&response) {
        state.cache.put(&cache_key, &body, &depends_on).await?;
    }

    Ok(Json(response))
}

/// GET /submissions/{id}/log
pub async fn get_submission_log(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(submission_id): Path<Uuid>,
) -> ApiResult<Json<SubmissionLogResponse>> {
    let (submission, tests) = state
        .store
        .get_with_tests(submission_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("submission not found".into()))?;

    if submission.user_id != user.user_id && !user.is_admin() {
        return Err(ApiError::Forbidden);
    }

    Ok(Json(SubmissionLogResponse {
        submission_id: submission.id,
        status: submission.status,
        score: submission.score,
        counts: submission.counts,
        tests: tests
            .into_iter()
            .map(|t| TestLogEntry {
                ordinal: t.ordinal,
                verdict: t.verdict,
                wall_time_seconds: t.wall_time_seconds,
                peak_rss_mib: t.peak_rss_mib,
            })
            .collect(),
    }))
}

/// PUT /submissions/{id}/rejudge (admin only)
pub async fn rejudge_submission(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(submission_id): Path<Uuid>,
) -> ApiResult<Json<RejudgeAcceptedResponse>> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden);
    }

    state.queue.enqueue_rejudge(submission_id).await?;

    tracing::info!(%submission_id, admin_id = user.user_id, "rejudge enqueued");

    Ok(Json(RejudgeAcceptedResponse {
        submission_id,
        status: "pending",
    }))
}
