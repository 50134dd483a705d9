//! Persistence and cross-cutting store components for the Olympus judge core.
//!
//! Shared by `vanguard` (intake) and `minos` (workers) so the Submission
//! Store contract has exactly one implementation.

pub mod cache;
pub mod lookup;
pub mod models;
pub mod queue;
pub mod rate_limiter;
pub mod submission_store;

pub use cache::CacheCoordinator;
pub use lookup::CatalogLookup;
pub use models::*;
pub use queue::JudgeQueue;
pub use rate_limiter::RateLimiter;
pub use submission_store::{SubmissionStore, TestOutcome};
