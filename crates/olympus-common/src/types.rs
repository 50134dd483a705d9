//! Common types used across the Olympus judge services.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Submission ID type
pub type SubmissionId = Uuid;

/// User role in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    User,
    Banned,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::User
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::User => write!(f, "user"),
            UserRole::Banned => write!(f, "banned"),
        }
    }
}

/// Submission lifecycle status (§3 of the judge-core spec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    Success,
    Error,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::Success => "SUCCESS",
            SubmissionStatus::Error => "ERROR",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(SubmissionStatus::Pending),
            "SUCCESS" => Some(SubmissionStatus::Success),
            "ERROR" => Some(SubmissionStatus::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-testcase verdict. String literals exactly as specified in §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Accepted
    Ac,
    /// Wrong answer
    Wa,
    /// Runtime error (SIGHUP/SIGSEGV/SIGFPE)
    Re,
    /// Compile error
    Ce,
    /// Time limit exceeded
    Tle,
    /// Memory limit exceeded (SIGKILL / oomkill)
    Mle,
    /// Any other non-zero termination
    Unk,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Ac => "AC",
            Verdict::Wa => "WA",
            Verdict::Re => "RE",
            Verdict::Ce => "CE",
            Verdict::Tle => "TLE",
            Verdict::Mle => "MLE",
            Verdict::Unk => "UNK",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "AC" => Some(Verdict::Ac),
            "WA" => Some(Verdict::Wa),
            "RE" => Some(Verdict::Re),
            "CE" => Some(Verdict::Ce),
            "TLE" => Some(Verdict::Tle),
            "MLE" => Some(Verdict::Mle),
            "UNK" => Some(Verdict::Unk),
            _ => None,
        }
    }

    /// Whether this verdict counts as a passing test for scoring (I2).
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Ac)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Judge/rejudge task kind, carried on [`crate::JudgeTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Judge,
    Rejudge,
}

/// Pagination parameters, mirroring the teacher's `Pagination`/`PaginatedResponse` split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * (self.per_page as i64)
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated response wrapper used by `Submission Store::list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: i64) -> Self {
        let total_pages = if total <= 0 {
            0
        } else {
            ((total as f64) / (per_page as f64)).ceil() as u32
        };
        PaginatedResponse {
            data,
            page,
            per_page,
            total,
            total_pages,
        }
    }
}
