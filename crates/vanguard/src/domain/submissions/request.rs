//! Submission request DTOs.

use serde::Deserialize;
use validator::Validate;

/// Create submission request (spec §4.7: problem-id, language-name, source all non-empty).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    #[validate(length(min = 1, message = "problem_id must not be empty"))]
    pub problem_id: String,

    #[validate(length(min = 1, message = "language must not be empty"))]
    pub language: String,

    #[validate(length(min = 1, max = 65536, message = "source_code must be 1-65536 characters"))]
    pub source_code: String,
}

/// List submissions query parameters. At least one of `user_id`/`problem_id` is
/// required by [`olympus_store::SubmissionStore::list`].
#[derive(Debug, Deserialize)]
pub struct ListSubmissionsQuery {
    #[serde(default = "default_page")]
    pub page: u32,

    #[serde(default = "default_per_page")]
    pub per_page: u32,

    pub user_id: Option<i64>,
    pub problem_id: Option<String>,
    pub status: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}
