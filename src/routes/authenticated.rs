use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes for any user who passed the authentication layer. This module
/// carries the citizen-facing features: submitting complaints, auditing
/// resolutions, uploading evidence, reading notifications, and spending
/// points.
///
/// Access Control Strategy:
/// Every handler here relies on the `AuthUser` extractor middleware applied
/// on the router layer above, so each receives a validated identity for its
/// ownership and ban checks. Banned accounts are rejected by the write
/// handlers themselves.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /upload/presigned
        // Starts the evidence upload pipeline: a short-lived (10-minute)
        // presigned S3 URL lets the client push the image directly to
        // storage, bypassing the application server.
        .route("/upload/presigned", post(handlers::get_presigned_url))
        // GET /me
        // The caller's profile, points, and badge.
        .route("/me", get(handlers::get_me))
        // GET /me/complaints
        // All complaints submitted by the caller, any status.
        .route("/me/complaints", get(handlers::get_my_complaints))
        // GET /me/points
        // The caller's point ledger.
        .route("/me/points", get(handlers::get_my_point_history))
        // --- Complaint Submission ---
        // POST /complaints
        // Submits a new report. The handler enforces payload validation,
        // the reporter-proximity gate, and the duplicate scan.
        .route("/complaints", post(handlers::create_complaint))
        // POST /complaints/check-duplicates
        // Standalone duplicate pre-check used by the report form before the
        // final step.
        .route(
            "/complaints/check-duplicates",
            post(handlers::check_duplicates),
        )
        // --- Community Audits ---
        // POST /complaints/{id}/validations
        // Audits a resolved complaint and drives the validated/reopened
        // transition. One audit per citizen per complaint.
        .route(
            "/complaints/{id}/validations",
            post(handlers::submit_validation),
        )
        // --- Notifications ---
        // GET /notifications
        // The caller's notification feed.
        .route("/notifications", get(handlers::get_notifications))
        // PATCH /notifications/{id}/read
        // Marks one notification as read. Ownership enforced.
        .route(
            "/notifications/{id}/read",
            axum::routing::patch(handlers::mark_notification_read),
        )
        // --- Rewards ---
        // POST /rewards/offers/{id}/redeem
        // Spends points on a partner offer.
        .route(
            "/rewards/offers/{id}/redeem",
            post(handlers::redeem_offer),
        )
}
