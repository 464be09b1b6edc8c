/// Router Module Index
///
/// Organizes the application's routing into security-segregated modules so
/// access control is applied explicitly at the module level (via Axum
/// layers) rather than per handler alone.
///
/// The three modules map directly to the access tiers.

/// Routes accessible to all clients (anonymous, mostly read-only).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated user session.
pub mod authenticated;

/// Routes restricted to triage staff (`admin`, and `department` where the
/// handler allows it). Role checks run inside the handlers after the
/// authentication layer.
pub mod admin;
