use axum::{
    body::Body,
    extract::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{booking, credit, health, job, package, voucher};
use tower_http::{
    classify::ServerErrorsFailureClass,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Catalog
        .route("/api/v1/packages", post(package::create_package).get(package::list_packages))
        .route("/api/v1/packages/{package_id}", get(package::get_package).put(package::update_package).delete(package::delete_package))
        .route("/api/v1/packages/{package_id}/submit", post(package::submit_package))
        .route("/api/v1/packages/{package_id}/approve", post(package::approve_package))
        .route("/api/v1/packages/{package_id}/reject", post(package::reject_package))

        // Vouchers
        .route("/api/v1/vouchers", post(voucher::create_voucher).get(voucher::list_vouchers))
        .route("/api/v1/vouchers/validate", post(voucher::validate_voucher))

        // Ledger
        .route("/api/v1/bookings", post(booking::purchase).get(booking::list_bookings))
        .route("/api/v1/bookings/{booking_id}", get(booking::get_booking))
        .route("/api/v1/bookings/{booking_id}/credits", get(booking::list_credits))

        // Session credits
        .route("/api/v1/credits/{credit_id}/schedule", post(credit::schedule_credit))
        .route("/api/v1/credits/{credit_id}/reschedule", post(credit::reschedule_credit))
        .route("/api/v1/credits/{credit_id}/complete", post(credit::complete_credit))
        .route("/api/v1/credits/{credit_id}/join", get(credit::join_credit))

        // Worker visibility
        .route("/api/v1/jobs", get(job::list_jobs))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
