use crate::{
    AppState,
    auth::AuthUser,
    geo,
    models::{
        self, AdjustPointsRequest, AdminDashboardStats, AssignComplaintRequest, BanUserRequest,
        Complaint, ComplaintCategory, CreateComplaintRequest, CreateValidationRequest,
        DuplicateCheckRequest, DuplicateMatch, DuplicateWarning, LeaderboardEntry, Notification,
        PointTransaction, PresignedUrlRequest, PresignedUrlResponse, RegisterUserRequest,
        RewardOffer, UpdateStatusRequest, User, UserProfile, UserRole, Validation, ValidationType,
    },
    points::{self, RESOLUTION_AWARD, TransactionType, VALIDATION_AWARD},
    repository::RepositoryState,
    workflow::{self, ComplaintStatus},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

// --- Filter Structs ---

/// ComplaintFilter
///
/// Accepted query parameters for the complaint listing endpoints. Used by
/// Axum's Query extractor to safely bind category/status filters and search.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ComplaintFilter {
    /// Optional category filter (wire spelling, e.g. "Public Safety").
    pub category: Option<ComplaintCategory>,
    /// Optional lifecycle status filter.
    pub status: Option<ComplaintStatus>,
    /// Optional search string matched against title, description, address.
    pub search: Option<String>,
}

/// LeaderboardQuery
///
/// Page size for the public leaderboard; defaults to 10, capped at 100.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

/// AuthSignupResponse
///
/// Minimal struct to deserialize the external auth provider's signup
/// response, capturing the newly created user's UUID.
#[derive(Deserialize)]
struct AuthSignupResponse {
    id: Uuid,
}

// --- Shared Workflow Effects ---

/// apply_transition_effects
///
/// The single place where a persisted status change fans out into points and
/// notifications, shared by the admin endpoint and the validation flow:
/// - `validated`: pay the reporter the resolution award.
/// - `reopened`: tell the reporter their issue is live again.
/// - anything else: a plain status-update notification.
async fn apply_transition_effects(repo: &RepositoryState, updated: &Complaint) {
    match updated.status {
        ComplaintStatus::Validated => {
            if let Some(reporter) = repo
                .apply_points(
                    updated.user_id,
                    RESOLUTION_AWARD,
                    TransactionType::ComplaintResolved,
                    Some(updated.id),
                    Some(format!("Resolution of \"{}\" confirmed", updated.title)),
                )
                .await
            {
                refresh_badge(repo, &reporter).await;
            }
            repo.add_notification(
                updated.user_id,
                models::NotificationType::PointEarned,
                "Resolution confirmed",
                &format!(
                    "The community verified \"{}\". You earned {} points.",
                    updated.title, RESOLUTION_AWARD
                ),
                Some(updated.id),
            )
            .await;
        }
        ComplaintStatus::Reopened => {
            repo.add_notification(
                updated.user_id,
                models::NotificationType::ComplaintReopened,
                "Complaint reopened",
                &format!("\"{}\" was audited as not resolved and is open again.", updated.title),
                Some(updated.id),
            )
            .await;
        }
        _ => {
            repo.add_notification(
                updated.user_id,
                models::NotificationType::ComplaintUpdate,
                "Status updated",
                &format!("\"{}\" moved to {}.", updated.title, updated.status.as_str()),
                Some(updated.id),
            )
            .await;
        }
    }
}

/// refresh_badge
///
/// Recomputes the badge tier from the user's new balance. Demotions are
/// persisted silently; promotions also notify.
async fn refresh_badge(repo: &RepositoryState, user: &User) {
    let tier = points::badge_for_points(user.points);
    if tier == user.badge {
        return;
    }
    repo.set_badge(user.id, tier).await;
    if points::badge_rank(tier) > points::badge_rank(&user.badge) {
        repo.add_notification(
            user.id,
            models::NotificationType::BadgeUnlocked,
            "Badge unlocked",
            &format!("You reached the {} tier.", tier),
            None,
        )
        .await;
    }
}

// --- Public Handlers ---

/// list_complaints
///
/// [Public Route] Lists complaints with category/status filtering and
/// search, newest first, reporter names joined.
#[utoipa::path(
    get,
    path = "/complaints",
    params(ComplaintFilter),
    responses((status = 200, description = "List filtered complaints", body = [Complaint]))
)]
pub async fn list_complaints(
    State(state): State<AppState>,
    Query(filter): Query<ComplaintFilter>,
) -> Json<Vec<models::Complaint>> {
    let complaints = state
        .repo
        .list_complaints(filter.category, filter.status, filter.search)
        .await;
    Json(complaints)
}

/// get_complaint_details
///
/// [Public Route] Retrieves a single complaint by ID.
#[utoipa::path(
    get,
    path = "/complaints/{id}",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Found", body = Complaint),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_complaint_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::Complaint>, StatusCode> {
    match state.repo.get_complaint(id).await {
        Some(complaint) => Ok(Json(complaint)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// get_complaint_validations
///
/// [Public Route] Lists the community audits recorded for a complaint.
#[utoipa::path(
    get,
    path = "/complaints/{id}/validations",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    responses((status = 200, description = "Validations", body = [Validation]))
)]
pub async fn get_complaint_validations(
    State(state): State<AppState>,
    Path(complaint_id): Path<Uuid>,
) -> Json<Vec<models::Validation>> {
    let validations = state.repo.get_validations(complaint_id).await;
    Json(validations)
}

/// get_leaderboard
///
/// [Public Route] Top citizens by point balance.
#[utoipa::path(
    get,
    path = "/leaderboard",
    params(LeaderboardQuery),
    responses((status = 200, description = "Leaderboard", body = [LeaderboardEntry]))
)]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Json<Vec<models::LeaderboardEntry>> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    Json(state.repo.leaderboard(limit).await)
}

/// list_reward_offers
///
/// [Public Route] Redeemable offers from active partners.
#[utoipa::path(
    get,
    path = "/rewards/offers",
    responses((status = 200, description = "Offers", body = [RewardOffer]))
)]
pub async fn list_reward_offers(State(state): State<AppState>) -> Json<Vec<models::RewardOffer>> {
    Json(state.repo.list_active_offers().await)
}

/// register_user
///
/// [Public Route] Handles registration via the external auth provider.
///
/// *Flow*: calls the provider's signup endpoint, retrieves the canonical
/// user UUID, and mirrors the profile into the local `public.users` table
/// under the `citizen` role. The role is never client-selectable.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "Registered", body = User),
        (status = 400, description = "Rejected by auth provider"),
        (status = 422, description = "Invalid payload")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<User>, StatusCode> {
    if payload.validate().is_err() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    // Step 1: Call the external auth provider.
    let client = reqwest::Client::new();
    let auth_url = format!("{}/auth/v1/signup", state.config.auth_url);

    let response = client
        .post(auth_url)
        .header("apikey", &state.config.auth_api_key)
        .header("Content-Type", "application/json")
        .json(&serde_json::json!({ "email": payload.email, "password": payload.password }))
        .send()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !response.status().is_success() {
        // Provider rejections (existing email, weak password) surface as 400.
        return Err(StatusCode::BAD_REQUEST);
    }

    // Step 2: Extract the canonical user ID from the provider response.
    let auth_user = response
        .json::<AuthSignupResponse>()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // Step 3: Mirror the profile locally, primary key synchronized with the
    // provider's user id.
    let new_user = User {
        id: auth_user.id,
        email: payload.email,
        full_name: payload.full_name,
        phone: payload.phone,
        role: UserRole::Citizen,
        ..User::default()
    };

    match state.repo.create_user(new_user).await {
        Some(created) => Ok(Json(created)),
        None => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

// --- Authenticated Handlers ---

/// get_me
///
/// [Authenticated Route] The caller's profile, including points and badge.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, StatusCode> {
    match state.repo.get_user(id).await {
        Some(user) => Ok(Json(user.into())),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// get_my_complaints
///
/// [Authenticated Route] Lists all complaints submitted by the caller,
/// whatever their status.
#[utoipa::path(
    get,
    path = "/me/complaints",
    responses((status = 200, description = "My Complaints", body = [Complaint]))
)]
pub async fn get_my_complaints(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<models::Complaint>> {
    Json(state.repo.get_my_complaints(id).await)
}

/// get_my_point_history
///
/// [Authenticated Route] The caller's point ledger, newest first.
#[utoipa::path(
    get,
    path = "/me/points",
    responses((status = 200, description = "Ledger", body = [PointTransaction]))
)]
pub async fn get_my_point_history(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<models::PointTransaction>> {
    Json(state.repo.get_point_history(id).await)
}

/// create_complaint
///
/// [Authenticated Route] Submits a new complaint. Three server-side guards
/// run in order:
/// 1. Payload validation (title/description/address lengths, image cap).
/// 2. Reporter proximity: the submitting device must be within reporting
///    range of the incident location.
/// 3. Duplicate scan: overlapping open reports of the same category within
///    the duplicate radius return 409 with the candidates, unless the
///    client confirmed the report as distinct.
#[utoipa::path(
    post,
    path = "/complaints",
    request_body = CreateComplaintRequest,
    responses(
        (status = 201, description = "Created", body = Complaint),
        (status = 403, description = "Account banned"),
        (status = 409, description = "Possible duplicates", body = DuplicateWarning),
        (status = 422, description = "Invalid payload or reporter too far away")
    )
)]
pub async fn create_complaint(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateComplaintRequest>,
) -> Response {
    if auth.is_banned {
        return StatusCode::FORBIDDEN.into_response();
    }

    if payload.validate().is_err() {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    }

    if !geo::within_reporting_range(payload.reporter_location, payload.location) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            "You must be near the location of the incident to report it",
        )
            .into_response();
    }

    if !payload.confirmed_distinct {
        let duplicates = state
            .repo
            .find_nearby_open(payload.category, payload.location, geo::DUPLICATE_RADIUS_M)
            .await;
        if !duplicates.is_empty() {
            let warning = DuplicateWarning {
                message: format!(
                    "Found {} similar open report(s) nearby. Review them or resubmit with confirmed_distinct.",
                    duplicates.len()
                ),
                duplicates,
            };
            return (StatusCode::CONFLICT, Json(warning)).into_response();
        }
    }

    let complaint = Complaint {
        id: Uuid::new_v4(),
        user_id: auth.id,
        title: payload.title,
        description: payload.description,
        category: payload.category,
        location: payload.location,
        address: payload.address,
        images: payload.images,
        priority: payload.category.default_priority(),
        ..Complaint::default()
    };

    match state.repo.create_complaint(complaint).await {
        Some(created) => (StatusCode::CREATED, Json(created)).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// check_duplicates
///
/// [Authenticated Route] Standalone duplicate pre-check, run by the report
/// form before its final step so the warning appears before the user has
/// filled everything in.
#[utoipa::path(
    post,
    path = "/complaints/check-duplicates",
    request_body = DuplicateCheckRequest,
    responses((status = 200, description = "Nearby open reports", body = [DuplicateMatch]))
)]
pub async fn check_duplicates(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<DuplicateCheckRequest>,
) -> Json<Vec<DuplicateMatch>> {
    let matches = state
        .repo
        .find_nearby_open(payload.category, payload.location, geo::DUPLICATE_RADIUS_M)
        .await;
    Json(matches)
}

/// submit_validation
///
/// [Authenticated Route] Records a community audit of a resolved complaint
/// and drives the resulting transition:
/// - `verified` moves the complaint to `validated` (reporter is paid the
///   resolution award).
/// - `not_resolved` moves it to `reopened`.
///
/// The validator is paid the validation award either way. Guards: the
/// complaint must currently be `resolved` (409), reporters cannot audit
/// their own complaint (422), one audit per validator per complaint (409).
#[utoipa::path(
    post,
    path = "/complaints/{id}/validations",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    request_body = CreateValidationRequest,
    responses(
        (status = 201, description = "Audit recorded", body = Validation),
        (status = 403, description = "Account banned"),
        (status = 404, description = "Complaint not found"),
        (status = 409, description = "Not resolved, or already audited"),
        (status = 422, description = "Invalid payload or self-validation")
    )
)]
pub async fn submit_validation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(complaint_id): Path<Uuid>,
    Json(payload): Json<CreateValidationRequest>,
) -> Response {
    if auth.is_banned {
        return StatusCode::FORBIDDEN.into_response();
    }

    if payload.validate().is_err() {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    }

    let complaint = match state.repo.get_complaint(complaint_id).await {
        Some(c) => c,
        None => return StatusCode::NOT_FOUND.into_response(),
    };

    // Audits only apply to complaints awaiting community confirmation.
    if complaint.status != ComplaintStatus::Resolved {
        return (StatusCode::CONFLICT, "Complaint is not awaiting validation").into_response();
    }

    if complaint.user_id == auth.id {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            "You cannot validate your own complaint",
        )
            .into_response();
    }

    let validation = Validation {
        id: Uuid::new_v4(),
        complaint_id,
        validator_id: auth.id,
        validation_type: payload.validation_type,
        comment: payload.comment,
        proof_images: payload.proof_images,
        ..Validation::default()
    };

    let recorded = match state.repo.add_validation(validation).await {
        Some(v) => v,
        // The unique key absorbed a repeat audit.
        None => {
            return (StatusCode::CONFLICT, "You already validated this complaint").into_response();
        }
    };

    // Pay the validator for the audit itself, outcome-independent.
    if let Some(validator) = state
        .repo
        .apply_points(
            auth.id,
            VALIDATION_AWARD,
            TransactionType::Validation,
            Some(complaint_id),
            Some(format!("Community audit of \"{}\"", complaint.title)),
        )
        .await
    {
        refresh_badge(&state.repo, &validator).await;
        state
            .repo
            .add_notification(
                auth.id,
                models::NotificationType::PointEarned,
                "Audit recorded",
                &format!("You earned {} points for validating.", VALIDATION_AWARD),
                Some(complaint_id),
            )
            .await;
    }

    // The audit outcome picks the next workflow state.
    let next = match recorded.validation_type {
        ValidationType::Verified => ComplaintStatus::Validated,
        ValidationType::NotResolved => ComplaintStatus::Reopened,
    };

    // Both moves are legal from `resolved` by the transition table; the
    // status check above pinned the current state.
    if let Some(updated) = state.repo.set_complaint_status(complaint_id, next).await {
        apply_transition_effects(&state.repo, &updated).await;
    }

    (StatusCode::CREATED, Json(recorded)).into_response()
}

/// get_presigned_url
///
/// [Authenticated Route] Generates a temporary URL for direct client-to-
/// cloud image upload. The URL is short-lived (10 minutes), constrained to
/// the declared MIME type, and keyed under the purpose prefix with a fresh
/// UUID.
#[utoipa::path(
    post,
    path = "/upload/presigned",
    request_body = PresignedUrlRequest,
    responses((status = 200, description = "URL", body = PresignedUrlResponse))
)]
pub async fn get_presigned_url(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> impl IntoResponse {
    // Derive the extension from the client filename; the key itself is a
    // fresh UUID under the purpose prefix.
    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin");
    let unique_id = Uuid::new_v4();
    let object_key = format!("{}/{}.{}", payload.purpose.key_prefix(), unique_id, extension);

    match state
        .storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
    {
        Ok(url) => {
            let response = PresignedUrlResponse {
                upload_url: url,
                resource_key: object_key,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            // Log the storage error, return a generic failure to the client.
            tracing::error!("presign failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed").into_response()
        }
    }
}

/// get_notifications
///
/// [Authenticated Route] The caller's notifications, newest first.
#[utoipa::path(
    get,
    path = "/notifications",
    responses((status = 200, description = "My Notifications", body = [Notification]))
)]
pub async fn get_notifications(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<models::Notification>> {
    Json(state.repo.get_notifications(id).await)
}

/// mark_notification_read
///
/// [Authenticated Route] Marks one notification as read.
///
/// *Ownership*: the repository only updates rows belonging to the caller.
#[utoipa::path(
    patch,
    path = "/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked as read"),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn mark_notification_read(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.repo.mark_notification_read(id, user_id).await {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

/// redeem_offer
///
/// [Authenticated Route] Spends points on a partner offer. The cost is
/// deducted as a negative `redemption` ledger entry; the repository's
/// balance guard backstops the handler's own sufficiency check.
#[utoipa::path(
    post,
    path = "/rewards/offers/{id}/redeem",
    params(("id" = Uuid, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Redeemed", body = UserProfile),
        (status = 404, description = "Offer not available"),
        (status = 409, description = "Insufficient points")
    )
)]
pub async fn redeem_offer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(offer_id): Path<Uuid>,
) -> Response {
    let offer = match state.repo.get_active_offer(offer_id).await {
        Some(o) => o,
        None => return StatusCode::NOT_FOUND.into_response(),
    };

    let user = match state.repo.get_user(auth.id).await {
        Some(u) => u,
        None => return StatusCode::UNAUTHORIZED.into_response(),
    };

    if user.points < offer.points_required {
        return (StatusCode::CONFLICT, "Not enough points").into_response();
    }

    let updated = state
        .repo
        .apply_points(
            auth.id,
            -offer.points_required,
            TransactionType::Redemption,
            Some(offer.id),
            Some(format!("Redeemed \"{}\"", offer.title)),
        )
        .await;

    match updated {
        Some(user) => {
            refresh_badge(&state.repo, &user).await;
            (StatusCode::OK, Json(UserProfile::from(user))).into_response()
        }
        // The balance guard lost a race with another redemption.
        None => (StatusCode::CONFLICT, "Not enough points").into_response(),
    }
}

// --- Admin Handlers ---

/// get_admin_stats
///
/// [Admin Route] Dashboard counters for the triage board.
///
/// *Authorization*: requires the `admin` role.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = AdminDashboardStats))
)]
pub async fn get_admin_stats(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardStats>, StatusCode> {
    if role != UserRole::Admin {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(state.repo.get_stats().await))
}

/// get_admin_complaints
///
/// [Admin Route] The triage queue: all complaints with status filter and
/// search.
///
/// *Authorization*: `admin` or `department`.
#[utoipa::path(
    get,
    path = "/admin/complaints",
    params(ComplaintFilter),
    responses((status = 200, description = "All complaints", body = [Complaint]))
)]
pub async fn get_admin_complaints(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<ComplaintFilter>,
) -> Result<Json<Vec<models::Complaint>>, StatusCode> {
    if !auth.can_triage() {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(
        state
            .repo
            .list_complaints(filter.category, filter.status, filter.search)
            .await,
    ))
}

/// update_complaint_status
///
/// [Admin Route] Moves a complaint along the workflow. Every move is checked
/// against the transition table; an illegal move returns 409 listing the
/// legal targets. This endpoint is the only way an operator changes status.
///
/// *Authorization*: `admin` or `department`.
#[utoipa::path(
    put,
    path = "/admin/complaints/{id}/status",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated", body = Complaint),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Illegal transition")
    )
)]
pub async fn update_complaint_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Response {
    if !auth.can_triage() {
        return StatusCode::FORBIDDEN.into_response();
    }

    let complaint = match state.repo.get_complaint(id).await {
        Some(c) => c,
        None => return StatusCode::NOT_FOUND.into_response(),
    };

    if !workflow::can_transition(complaint.status, payload.status) {
        let allowed = workflow::allowed_transitions(complaint.status);
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "message": "Illegal status transition",
                "current": complaint.status,
                "allowed": allowed,
            })),
        )
            .into_response();
    }

    match state.repo.set_complaint_status(id, payload.status).await {
        Some(updated) => {
            apply_transition_effects(&state.repo, &updated).await;
            (StatusCode::OK, Json(updated)).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// assign_complaint
///
/// [Admin Route] Routes a complaint to a department user. The move itself is
/// the `under_review -> assigned` transition and passes through the same
/// table check as every other mutation.
///
/// *Authorization*: `admin` only; the assignee must hold the `department`
/// role.
#[utoipa::path(
    put,
    path = "/admin/complaints/{id}/assign",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    request_body = AssignComplaintRequest,
    responses(
        (status = 200, description = "Assigned", body = Complaint),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Illegal transition"),
        (status = 422, description = "Assignee is not a department user")
    )
)]
pub async fn assign_complaint(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignComplaintRequest>,
) -> Response {
    if role != UserRole::Admin {
        return StatusCode::FORBIDDEN.into_response();
    }

    let complaint = match state.repo.get_complaint(id).await {
        Some(c) => c,
        None => return StatusCode::NOT_FOUND.into_response(),
    };

    if !workflow::can_transition(complaint.status, ComplaintStatus::Assigned) {
        return (StatusCode::CONFLICT, "Complaint is not awaiting assignment").into_response();
    }

    let assignee = match state.repo.get_user(payload.assignee_id).await {
        Some(u) => u,
        None => return StatusCode::UNPROCESSABLE_ENTITY.into_response(),
    };
    if assignee.role != UserRole::Department {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            "Assignee must be a department user",
        )
            .into_response();
    }

    match state.repo.assign_complaint(id, assignee.id).await {
        Some(updated) => {
            state
                .repo
                .add_notification(
                    assignee.id,
                    models::NotificationType::Assignment,
                    "Complaint assigned to you",
                    &format!("\"{}\" is now in your queue.", updated.title),
                    Some(updated.id),
                )
                .await;
            apply_transition_effects(&state.repo, &updated).await;
            (StatusCode::OK, Json(updated)).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// adjust_user_points
///
/// [Admin Route] Appends a manual ledger entry for a user. Only the
/// operator-facing transaction types are accepted; workflow awards cannot be
/// forged through this endpoint.
///
/// *Authorization*: `admin` only.
#[utoipa::path(
    post,
    path = "/admin/users/{id}/points",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = AdjustPointsRequest,
    responses(
        (status = 200, description = "Adjusted", body = UserProfile),
        (status = 404, description = "User not found"),
        (status = 409, description = "Balance would go negative"),
        (status = 422, description = "Transaction type not allowed")
    )
)]
pub async fn adjust_user_points(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AdjustPointsRequest>,
) -> Response {
    if role != UserRole::Admin {
        return StatusCode::FORBIDDEN.into_response();
    }

    if !matches!(
        payload.transaction_type,
        TransactionType::ManualAdjustment | TransactionType::FraudPenalty
    ) {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    }

    if state.repo.get_user(user_id).await.is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }

    let updated = state
        .repo
        .apply_points(
            user_id,
            payload.points_change,
            payload.transaction_type,
            None,
            payload.description,
        )
        .await;

    match updated {
        Some(user) => {
            refresh_badge(&state.repo, &user).await;
            let (kind, title) = if payload.points_change >= 0 {
                (models::NotificationType::PointEarned, "Points credited")
            } else {
                (models::NotificationType::SystemAlert, "Points deducted")
            };
            state
                .repo
                .add_notification(
                    user.id,
                    kind,
                    title,
                    &format!("An operator adjusted your balance by {}.", payload.points_change),
                    None,
                )
                .await;
            (StatusCode::OK, Json(UserProfile::from(user))).into_response()
        }
        None => (StatusCode::CONFLICT, "Balance would go negative").into_response(),
    }
}

/// set_user_ban
///
/// [Admin Route] Toggles the banned flag on an account. Banned accounts keep
/// read access but are refused by the submission and validation endpoints.
///
/// *Authorization*: `admin` only.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/ban",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = BanUserRequest,
    responses(
        (status = 200, description = "Updated"),
        (status = 404, description = "User not found")
    )
)]
pub async fn set_user_ban(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<BanUserRequest>,
) -> StatusCode {
    if role != UserRole::Admin {
        return StatusCode::FORBIDDEN;
    }
    if state.repo.set_user_banned(user_id, payload.banned).await {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}
