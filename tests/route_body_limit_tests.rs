use axum::http::{Request, StatusCode, header};
use axum::body::Body;
use chrono::{Duration, Utc};
use subtrack::db::models::IdentityClaims;
use tower::ServiceExt;

#[tokio::test]
async fn onboarding_drafts_route_returns_413_for_oversized_body() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let database_url = format!("sqlite://{}", dir.path().join("limit.db").display());
    let storage = subtrack::db::connect(&database_url)
        .await
        .expect("failed to open storage");

    let mut cfg = subtrack::config::Config::default();
    cfg.basic.reminder_interval_secs = 0;

    let now = Utc::now();
    let user = storage
        .upsert_auth_user(
            &IdentityClaims {
                provider: "google".into(),
                subject: "bulk".into(),
                email: "bulk@example.com".into(),
                full_name: None,
                avatar_url: None,
            },
            now,
        )
        .await
        .expect("failed to record user");
    storage
        .create_session(&user.id, "bulk-token".into(), now, Duration::hours(1))
        .await
        .expect("failed to open session");

    let onboarding = subtrack::service::onboarding_actor::spawn()
        .await
        .expect("failed to spawn onboarding actor");
    let state = subtrack::router::SubtrackState::new(storage, cfg, onboarding)
        .expect("failed to build state");
    let app = subtrack::router::subtrack_router(state);

    let oversized_name = "a".repeat(512 * 1024);
    let oversized_payload = format!(
        r#"[{{"name":"{oversized_name}","start_date":"2026-01-01","next_billing_date":"2026-02-01"}}]"#
    );

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/onboarding/subscriptions")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, "Bearer bulk-token")
                .body(Body::from(oversized_payload))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
