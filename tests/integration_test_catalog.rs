mod common;

use axum::http::StatusCode;
use common::{request_as, TestApp};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn package_payload() -> Value {
    json!({
        "title": "Pre-Wedding Counselling",
        "description": "Six structured sessions for couples",
        "price": 15000,
        "category": "pre-wedding",
        "languages": ["en", "de"],
        "mode": "video",
        "max_participants": 2,
        "session_templates": [
            {"duration_minutes": 60, "title": "Intake", "description": null, "participant_type": "couple"},
            {"duration_minutes": 45, "title": "Follow-up", "description": null, "participant_type": "couple"}
        ],
        "tags": ["couples"]
    })
}

#[tokio::test]
async fn test_create_approve_and_public_visibility() {
    let app = TestApp::new().await;

    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/packages", ("therapist-1", "therapist"), Some(package_payload()),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let pkg = parse_body(res).await;
    assert_eq!(pkg["status"], "pending");
    let package_id = pkg["id"].as_str().unwrap().to_string();

    // Pending package is hidden from other users.
    let res = app.router.clone().oneshot(request_as(
        "GET", &format!("/api/v1/packages/{}", package_id), ("client-1", "client"), None,
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // But visible to its owner.
    let res = app.router.clone().oneshot(request_as(
        "GET", &format!("/api/v1/packages/{}", package_id), ("therapist-1", "therapist"), None,
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.router.clone().oneshot(request_as(
        "POST", &format!("/api/v1/packages/{}/approve", package_id), ("admin-1", "admin"), None,
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let approved = parse_body(res).await;
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["reviewed_by"], "admin-1");

    let res = app.router.clone().oneshot(request_as(
        "GET", &format!("/api/v1/packages/{}", package_id), ("client-1", "client"), None,
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let jobs = app.state.job_repo.list().await.unwrap();
    assert!(jobs.iter().any(|j| j.job_type == "PACKAGE_APPROVED"));
}

#[tokio::test]
async fn test_create_requires_therapist_role() {
    let app = TestApp::new().await;

    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/packages", ("client-1", "client"), Some(package_payload()),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_rejects_out_of_range_price() {
    let app = TestApp::new().await;

    for price in [0, -100, 100_000_001i64] {
        let mut payload = package_payload();
        payload["price"] = json!(price);
        let res = app.router.clone().oneshot(request_as(
            "POST", "/api/v1/packages", ("therapist-1", "therapist"), Some(payload),
        )).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "price {}", price);
    }
}

#[tokio::test]
async fn test_missing_identity_headers_rejected() {
    let app = TestApp::new().await;

    let res = app.router.clone().oneshot(
        axum::http::Request::builder()
            .method("GET")
            .uri("/api/v1/packages")
            .body(axum::body::Body::empty())
            .unwrap(),
    ).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.router.clone().oneshot(request_as(
        "GET", "/api/v1/packages", ("user-1", "superuser"), None,
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reject_then_edit_requeues_package() {
    let app = TestApp::new().await;

    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/packages", ("therapist-1", "therapist"), Some(package_payload()),
    )).await.unwrap();
    let package_id = parse_body(res).await["id"].as_str().unwrap().to_string();

    // Rejection needs a reason.
    let res = app.router.clone().oneshot(request_as(
        "POST", &format!("/api/v1/packages/{}/reject", package_id), ("admin-1", "admin"),
        Some(json!({"reason": "   "})),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.router.clone().oneshot(request_as(
        "POST", &format!("/api/v1/packages/{}/reject", package_id), ("admin-1", "admin"),
        Some(json!({"reason": "Description too vague"})),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let rejected = parse_body(res).await;
    assert_eq!(rejected["status"], "rejected");
    assert_eq!(rejected["rejection_reason"], "Description too vague");

    // Owner edit sends it back to the review queue.
    let res = app.router.clone().oneshot(request_as(
        "PUT", &format!("/api/v1/packages/{}", package_id), ("therapist-1", "therapist"),
        Some(json!({"description": "Six clearly described sessions for couples"})),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let edited = parse_body(res).await;
    assert_eq!(edited["status"], "pending");
    assert!(edited["rejection_reason"].is_null());

    let jobs = app.state.job_repo.list().await.unwrap();
    assert!(jobs.iter().any(|j| j.job_type == "PACKAGE_REJECTED"));
}

#[tokio::test]
async fn test_approved_package_price_is_frozen() {
    let app = TestApp::new().await;
    let pkg = app.seed_approved_package("therapist-1", 15000, 35, &[60, 45]).await;

    let res = app.router.clone().oneshot(request_as(
        "PUT", &format!("/api/v1/packages/{}", pkg.id), ("therapist-1", "therapist"),
        Some(json!({"price": 9999})),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Descriptive fields stay editable.
    let res = app.router.clone().oneshot(request_as(
        "PUT", &format!("/api/v1/packages/{}", pkg.id), ("therapist-1", "therapist"),
        Some(json!({"title": "Renamed Package"})),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated = parse_body(res).await;
    assert_eq!(updated["title"], "Renamed Package");
    assert_eq!(updated["status"], "approved");
    assert_eq!(updated["price"], 15000);
}

#[tokio::test]
async fn test_moderation_queue_requires_admin() {
    let app = TestApp::new().await;

    let res = app.router.clone().oneshot(request_as(
        "GET", "/api/v1/packages?status=pending", ("client-1", "client"), None,
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.router.clone().oneshot(request_as(
        "GET", "/api/v1/packages?status=pending", ("admin-1", "admin"), None,
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_foreign_therapist_cannot_edit_or_delete() {
    let app = TestApp::new().await;

    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/packages", ("therapist-1", "therapist"), Some(package_payload()),
    )).await.unwrap();
    let package_id = parse_body(res).await["id"].as_str().unwrap().to_string();

    let res = app.router.clone().oneshot(request_as(
        "PUT", &format!("/api/v1/packages/{}", package_id), ("therapist-2", "therapist"),
        Some(json!({"title": "Hijacked"})),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.router.clone().oneshot(request_as(
        "DELETE", &format!("/api/v1/packages/{}", package_id), ("therapist-2", "therapist"), None,
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.router.clone().oneshot(request_as(
        "DELETE", &format!("/api/v1/packages/{}", package_id), ("therapist-1", "therapist"), None,
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_approved_package_cannot_be_deleted() {
    let app = TestApp::new().await;
    let pkg = app.seed_approved_package("therapist-1", 12000, 35, &[60]).await;

    let res = app.router.clone().oneshot(request_as(
        "DELETE", &format!("/api/v1/packages/{}", pkg.id), ("therapist-1", "therapist"), None,
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_draft_save_then_submit() {
    let app = TestApp::new().await;

    let mut payload = package_payload();
    payload["save_as_draft"] = json!(true);

    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/packages", ("therapist-1", "therapist"), Some(payload),
    )).await.unwrap();
    let pkg = parse_body(res).await;
    assert_eq!(pkg["status"], "draft");
    let package_id = pkg["id"].as_str().unwrap().to_string();

    let res = app.router.clone().oneshot(request_as(
        "POST", &format!("/api/v1/packages/{}/submit", package_id), ("therapist-1", "therapist"), None,
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "pending");

    // Resubmitting a pending package is a conflict.
    let res = app.router.clone().oneshot(request_as(
        "POST", &format!("/api/v1/packages/{}/submit", package_id), ("therapist-1", "therapist"), None,
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}
