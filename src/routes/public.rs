use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that are **unauthenticated** and accessible to any client.
/// Complaint data is public by design in this system (the explore map shows
/// every report); write access is what authentication gates.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitors and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // New-citizen signup: external auth provider first, then the local
        // profile mirror. Role is fixed to `citizen` server-side.
        .route("/register", post(handlers::register_user))
        // GET /complaints?category=...&status=...&search=...
        // The explore surface: all complaints, filterable and searchable.
        .route("/complaints", get(handlers::list_complaints))
        // GET /complaints/{id}
        // Detail view with reporter and assignee names joined in.
        .route("/complaints/{id}", get(handlers::get_complaint_details))
        // GET /complaints/{id}/validations
        // The community-audit trail of a complaint.
        .route(
            "/complaints/{id}/validations",
            get(handlers::get_complaint_validations),
        )
        // GET /leaderboard?limit=...
        // Top citizens by points.
        .route("/leaderboard", get(handlers::get_leaderboard))
        // GET /rewards/offers
        // Redeemable offers from active partners.
        .route("/rewards/offers", get(handlers::list_reward_offers))
}
