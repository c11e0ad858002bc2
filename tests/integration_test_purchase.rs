mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{request_as, TestApp};
use ledger_backend::domain::models::voucher::NewVoucherParams;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_purchase_money_split() {
    let app = TestApp::new().await;
    let pkg = app.seed_approved_package("therapist-1", 15000, 35, &[60, 45, 30]).await;
    app.seed_voucher(NewVoucherParams {
        code: Some("WELCOME10".to_string()),
        discount_percent: 10,
        min_amount: None,
        usage_limit: None,
        expiry_date: None,
        description: None,
        is_active: true,
    }).await;

    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/bookings", ("client-1", "client"),
        Some(json!({"package_id": pkg.id, "voucher_code": "welcome10", "idempotency_key": "key-1"})),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let booking = parse_body(res).await;
    assert_eq!(booking["total_amount"], 15000);
    assert_eq!(booking["voucher_code"], "WELCOME10");
    assert_eq!(booking["final_amount"], 13500);
    assert_eq!(booking["platform_fee"], 4725);
    assert_eq!(booking["therapist_earnings"], 8775);
    assert_eq!(booking["total_sessions"], 3);
    assert_eq!(booking["status"], "active");

    // One available credit per session template, in order.
    let booking_id = booking["id"].as_str().unwrap();
    let res = app.router.clone().oneshot(request_as(
        "GET", &format!("/api/v1/bookings/{}/credits", booking_id), ("client-1", "client"), None,
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let credits = parse_body(res).await;
    let credits = credits.as_array().unwrap();
    assert_eq!(credits.len(), 3);
    for (i, credit) in credits.iter().enumerate() {
        assert_eq!(credit["session_index"], i as i64);
        assert_eq!(credit["status"], "available");
    }

    let voucher = app.state.voucher_repo.find_by_code("WELCOME10").await.unwrap().unwrap();
    assert_eq!(voucher.usage_count, 1);

    let jobs = app.state.job_repo.list().await.unwrap();
    assert!(jobs.iter().any(|j| j.job_type == "BOOKING_CONFIRMED"));
}

#[tokio::test]
async fn test_purchase_requires_approved_package() {
    let app = TestApp::new().await;

    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/packages", ("therapist-1", "therapist"),
        Some(json!({
            "title": "Pending Package",
            "description": "Not yet reviewed",
            "price": 5000,
            "category": "test",
            "languages": ["en"],
            "mode": "video",
            "max_participants": 1,
            "session_templates": [
                {"duration_minutes": 60, "title": "Intake", "description": null, "participant_type": "individual"}
            ]
        })),
    )).await.unwrap();
    let package_id = parse_body(res).await["id"].as_str().unwrap().to_string();

    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/bookings", ("client-1", "client"),
        Some(json!({"package_id": package_id, "idempotency_key": "key-1"})),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app.router.clone().oneshot(request_as(
        "GET", "/api/v1/bookings", ("client-1", "client"), None,
    )).await.unwrap();
    assert_eq!(parse_body(res).await.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_purchase_is_idempotent_per_client_key() {
    let app = TestApp::new().await;
    let pkg = app.seed_approved_package("therapist-1", 8000, 35, &[60]).await;

    let payload = json!({"package_id": pkg.id, "idempotency_key": "retry-key"});

    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/bookings", ("client-1", "client"), Some(payload.clone()),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let first_id = parse_body(res).await["id"].as_str().unwrap().to_string();

    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/bookings", ("client-1", "client"), Some(payload.clone()),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(parse_body(res).await["id"], first_id.as_str());

    let res = app.router.clone().oneshot(request_as(
        "GET", "/api/v1/bookings", ("client-1", "client"), None,
    )).await.unwrap();
    assert_eq!(parse_body(res).await.as_array().unwrap().len(), 1);

    // A different client may reuse the same key.
    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/bookings", ("client-2", "client"), Some(payload),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_empty_idempotency_key_rejected() {
    let app = TestApp::new().await;
    let pkg = app.seed_approved_package("therapist-1", 8000, 35, &[60]).await;

    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/bookings", ("client-1", "client"),
        Some(json!({"package_id": pkg.id, "idempotency_key": "  "})),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_voucher_leaves_no_partial_state() {
    let app = TestApp::new().await;
    let pkg = app.seed_approved_package("therapist-1", 15000, 35, &[60, 45]).await;
    app.seed_voucher(NewVoucherParams {
        code: Some("EXPIRED".to_string()),
        discount_percent: 10,
        min_amount: None,
        usage_limit: None,
        expiry_date: Some(Utc::now() - Duration::days(1)),
        description: None,
        is_active: true,
    }).await;

    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/bookings", ("client-1", "client"),
        Some(json!({"package_id": pkg.id, "voucher_code": "EXPIRED", "idempotency_key": "key-1"})),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = app.router.clone().oneshot(request_as(
        "GET", "/api/v1/bookings", ("client-1", "client"), None,
    )).await.unwrap();
    assert_eq!(parse_body(res).await.as_array().unwrap().len(), 0);

    let voucher = app.state.voucher_repo.find_by_code("EXPIRED").await.unwrap().unwrap();
    assert_eq!(voucher.usage_count, 0);
}

#[tokio::test]
async fn test_usage_limit_enforced_at_purchase() {
    let app = TestApp::new().await;
    let pkg = app.seed_approved_package("therapist-1", 9000, 35, &[60]).await;
    app.seed_voucher(NewVoucherParams {
        code: Some("ONCE".to_string()),
        discount_percent: 10,
        min_amount: None,
        usage_limit: Some(1),
        expiry_date: None,
        description: None,
        is_active: true,
    }).await;

    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/bookings", ("client-1", "client"),
        Some(json!({"package_id": pkg.id, "voucher_code": "ONCE", "idempotency_key": "key-a"})),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/bookings", ("client-2", "client"),
        Some(json!({"package_id": pkg.id, "voucher_code": "ONCE", "idempotency_key": "key-b"})),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let voucher = app.state.voucher_repo.find_by_code("ONCE").await.unwrap().unwrap();
    assert_eq!(voucher.usage_count, 1);
}

#[tokio::test]
async fn test_only_clients_can_purchase() {
    let app = TestApp::new().await;
    let pkg = app.seed_approved_package("therapist-1", 9000, 35, &[60]).await;

    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/bookings", ("therapist-2", "therapist"),
        Some(json!({"package_id": pkg.id, "idempotency_key": "key-1"})),
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_booking_visibility() {
    let app = TestApp::new().await;
    let pkg = app.seed_approved_package("therapist-1", 9000, 35, &[60]).await;

    let res = app.router.clone().oneshot(request_as(
        "POST", "/api/v1/bookings", ("client-1", "client"),
        Some(json!({"package_id": pkg.id, "idempotency_key": "key-1"})),
    )).await.unwrap();
    let booking_id = parse_body(res).await["id"].as_str().unwrap().to_string();

    // Both participants and admins can read it.
    for user in [("client-1", "client"), ("therapist-1", "therapist"), ("admin-1", "admin")] {
        let res = app.router.clone().oneshot(request_as(
            "GET", &format!("/api/v1/bookings/{}", booking_id), user, None,
        )).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    // Strangers cannot.
    let res = app.router.clone().oneshot(request_as(
        "GET", &format!("/api/v1/bookings/{}", booking_id), ("client-9", "client"), None,
    )).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Therapist sees it in their earnings list.
    let res = app.router.clone().oneshot(request_as(
        "GET", "/api/v1/bookings", ("therapist-1", "therapist"), None,
    )).await.unwrap();
    let list = parse_body(res).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["therapist_earnings"], 5850);
}
