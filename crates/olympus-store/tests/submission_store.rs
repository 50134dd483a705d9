//! Integration tests for [`olympus_store::SubmissionStore`] against a real
//! Postgres instance (spec §4.4, I1–I5, P1, P3).

mod common;

use chrono::Utc;
use olympus_common::Pagination;
use olympus_store::submission_store::TestOutcome;
use olympus_store::{CacheCoordinator, SubmissionFilters, SubmissionStore};
use uuid::Uuid;

use common::TestEnv;

fn store(env: &TestEnv) -> SubmissionStore {
    let cache = CacheCoordinator::new(env.redis.clone(), "olympus-test");
    SubmissionStore::new(env.db.clone(), cache)
}

#[tokio::test]
async fn create_pending_rejects_duplicate_submission_id() {
    let env = TestEnv::setup().await;
    let user_id = env.seed_fixtures("p1", "python").await;
    let store = store(&env);
    let id = Uuid::new_v4();

    let first = store
        .create_pending(id, user_id, "p1", "python", Utc::now(), "print(1)")
        .await
        .unwrap();
    assert!(first);

    let second = store
        .create_pending(id, user_id, "p1", "python", Utc::now(), "print(2)")
        .await
        .unwrap();
    assert!(!second);
}

#[tokio::test]
async fn update_status_to_success_upholds_i1_and_i3() {
    let env = TestEnv::setup().await;
    let user_id = env.seed_fixtures("p1", "python").await;
    let store = store(&env);
    let id = Uuid::new_v4();

    store
        .create_pending(id, user_id, "p1", "python", Utc::now(), "print(1)")
        .await
        .unwrap();

    let pending = store.get(id).await.unwrap().unwrap();
    assert!(pending.score.is_none(), "I1: score null while PENDING");

    let tests = vec![
        TestOutcome {
            ordinal: 1,
            verdict: "AC".into(),
            wall_time_seconds: 0.05,
            peak_rss_mib: 4,
        },
        TestOutcome {
            ordinal: 2,
            verdict: "WA".into(),
            wall_time_seconds: 0.04,
            peak_rss_mib: 4,
        },
    ];
    store
        .update_status(id, "SUCCESS", Some(10), Some(20), Some(&tests))
        .await
        .unwrap();

    let (submission, rows) = store.get_with_tests(id).await.unwrap().unwrap();
    assert_eq!(submission.status, "SUCCESS");
    assert_eq!(submission.score, Some(10));
    assert_eq!(submission.counts, Some(20));
    assert_eq!(rows.len(), 2, "I3: exactly |testcases| rows once judged");
    assert_eq!(rows[0].ordinal, 1);
    assert_eq!(rows[1].ordinal, 2);
}

#[tokio::test]
async fn update_status_to_error_leaves_score_null() {
    let env = TestEnv::setup().await;
    let user_id = env.seed_fixtures("p1", "python").await;
    let store = store(&env);
    let id = Uuid::new_v4();

    store
        .create_pending(id, user_id, "p1", "python", Utc::now(), "print(1)")
        .await
        .unwrap();
    store
        .update_status(id, "ERROR", None, None, None)
        .await
        .unwrap();

    let submission = store.get(id).await.unwrap().unwrap();
    assert_eq!(submission.status, "ERROR");
    assert!(submission.score.is_none());
    assert!(submission.counts.is_none());
}

#[tokio::test]
async fn rejudge_replaces_test_rows_rather_than_appending() {
    let env = TestEnv::setup().await;
    let user_id = env.seed_fixtures("p1", "python").await;
    let store = store(&env);
    let id = Uuid::new_v4();
    store
        .create_pending(id, user_id, "p1", "python", Utc::now(), "print(1)")
        .await
        .unwrap();

    let first_pass = vec![TestOutcome {
        ordinal: 1,
        verdict: "RE".into(),
        wall_time_seconds: 0.0,
        peak_rss_mib: 0,
    }];
    store
        .update_status(id, "SUCCESS", Some(0), Some(10), Some(&first_pass))
        .await
        .unwrap();

    let rejudge_pass = vec![TestOutcome {
        ordinal: 1,
        verdict: "AC".into(),
        wall_time_seconds: 0.02,
        peak_rss_mib: 4,
    }];
    store
        .update_status(id, "SUCCESS", Some(10), Some(10), Some(&rejudge_pass))
        .await
        .unwrap();

    let (submission, rows) = store.get_with_tests(id).await.unwrap().unwrap();
    assert_eq!(submission.score, Some(10));
    assert_eq!(rows.len(), 1, "old rows replaced, not appended");
    assert_eq!(rows[0].verdict, "AC");
}

#[tokio::test]
async fn list_requires_at_least_one_filter() {
    let env = TestEnv::setup().await;
    let store = store(&env);

    let err = store
        .list(&SubmissionFilters::default(), &Pagination::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("insufficient filter"));
}

#[tokio::test]
async fn list_page_beyond_total_pages_errors() {
    let env = TestEnv::setup().await;
    let user_id = env.seed_fixtures("p1", "python").await;
    let store = store(&env);
    store
        .create_pending(Uuid::new_v4(), user_id, "p1", "python", Utc::now(), "x")
        .await
        .unwrap();

    let filters = SubmissionFilters {
        user_id: Some(user_id),
        ..Default::default()
    };
    let far_page = Pagination {
        page: 99,
        per_page: 20,
    };

    let err = store.list(&filters, &far_page).await.unwrap_err();
    assert!(err.to_string().contains("page not found"));
}

#[tokio::test]
async fn list_orders_newest_submission_first() {
    let env = TestEnv::setup().await;
    let user_id = env.seed_fixtures("p1", "python").await;
    let store = store(&env);

    let older = Uuid::new_v4();
    let newer = Uuid::new_v4();
    let now = Utc::now();
    store
        .create_pending(older, user_id, "p1", "python", now - chrono::Duration::seconds(10), "a")
        .await
        .unwrap();
    store
        .create_pending(newer, user_id, "p1", "python", now, "b")
        .await
        .unwrap();

    let filters = SubmissionFilters {
        user_id: Some(user_id),
        ..Default::default()
    };
    let page = store
        .list(&filters, &Pagination::default())
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    assert_eq!(page.data[0].id, newer);
    assert_eq!(page.data[1].id, older);
}

#[tokio::test]
async fn upsert_resolve_increments_exactly_once_per_triple() {
    let env = TestEnv::setup().await;
    let user_id = env.seed_fixtures("p1", "python").await;
    let store = store(&env);

    let resolve_count = |user_id: i64, env: &TestEnv| {
        let db = env.db.clone();
        async move {
            sqlx::query_scalar::<_, i32>("SELECT resolve_count FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_one(&db)
                .await
                .unwrap()
        }
    };

    // First attempt fails: record created with resolved = false, no increment.
    store.upsert_resolve("p1", user_id, "python", false).await.unwrap();
    assert_eq!(resolve_count(user_id, &env).await, 0);

    // Flip false -> true: exactly one increment (I4/I5).
    store.upsert_resolve("p1", user_id, "python", true).await.unwrap();
    assert_eq!(resolve_count(user_id, &env).await, 1);

    // Re-resolving (e.g. a rejudge that's still AC) must not double-count.
    store.upsert_resolve("p1", user_id, "python", true).await.unwrap();
    assert_eq!(resolve_count(user_id, &env).await, 1);

    // true -> false is impossible through this API; resolved stays monotonic.
    store.upsert_resolve("p1", user_id, "python", false).await.unwrap();
    assert_eq!(resolve_count(user_id, &env).await, 1);
}
