use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// The triage surface, nested under `/admin`. Every mutation of a
/// complaint's status in the whole application flows through these routes
/// (or the validation flow) and therefore through the workflow transition
/// table.
///
/// Access Control:
/// The nesting router authenticates the caller; the handlers then check the
/// role explicitly — `admin` everywhere, with `department` also accepted on
/// the queue listing and status endpoint.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Dashboard counters: totals, triage backlog, in-progress, resolved.
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/complaints?status=...&search=...
        // The triage queue over all complaints.
        .route("/complaints", get(handlers::get_admin_complaints))
        // PUT /admin/complaints/{id}/status
        // Moves a complaint along the workflow. Illegal transitions are
        // refused with the list of legal targets.
        .route(
            "/complaints/{id}/status",
            put(handlers::update_complaint_status),
        )
        // PUT /admin/complaints/{id}/assign
        // Routes a complaint to a department user (under_review -> assigned).
        .route(
            "/complaints/{id}/assign",
            put(handlers::assign_complaint),
        )
        // POST /admin/users/{id}/points
        // Manual ledger adjustment (manual_adjustment / fraud_penalty).
        .route("/users/{id}/points", post(handlers::adjust_user_points))
        // PUT /admin/users/{id}/ban
        // Toggles an account's banned flag.
        .route("/users/{id}/ban", put(handlers::set_user_ban))
}
