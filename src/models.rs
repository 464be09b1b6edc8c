use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::geo::Location;
use crate::points::TransactionType;
use crate::workflow::ComplaintStatus;

// --- Core Application Schemas (Mapped to Database) ---

/// UserRole
///
/// The RBAC field. `citizen` accounts self-register; `admin` and `department`
/// accounts are provisioned out of band.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[ts(export)]
pub enum UserRole {
    #[default]
    Citizen,
    Admin,
    Department,
}

/// User
///
/// The canonical profile record in `public.users`, mirroring the external
/// `auth.users` id. Carries the gamification state alongside identity.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    // Primary key, also the FK to the external auth.users table.
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    // Materialized ledger balance.
    pub points: i64,
    pub badge: String,
    // Banned accounts keep read access but may not submit or validate.
    pub is_banned: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ComplaintCategory
///
/// The eight fixed reporting categories. Wire values keep the display
/// spelling the submission form uses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[sqlx(type_name = "complaint_category")]
#[ts(export)]
pub enum ComplaintCategory {
    #[default]
    Infrastructure,
    Sanitation,
    #[serde(rename = "Public Safety")]
    #[sqlx(rename = "Public Safety")]
    PublicSafety,
    #[serde(rename = "Water Supply")]
    #[sqlx(rename = "Water Supply")]
    WaterSupply,
    Electricity,
    #[serde(rename = "Roads & Transport")]
    #[sqlx(rename = "Roads & Transport")]
    RoadsTransport,
    #[serde(rename = "Parks & Recreation")]
    #[sqlx(rename = "Parks & Recreation")]
    ParksRecreation,
    Other,
}

impl ComplaintCategory {
    /// Default triage priority for a fresh report: 1 = high, 2 = normal.
    /// Public Safety reports jump the queue.
    pub fn default_priority(self) -> i32 {
        match self {
            ComplaintCategory::PublicSafety => 1,
            _ => 2,
        }
    }
}

/// Complaint
///
/// A citizen grievance record from `public.complaints`. This is the primary
/// data structure for the status workflow.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Complaint {
    pub id: Uuid,
    // FK to public.users.id (the reporter).
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ComplaintCategory,
    pub status: ComplaintStatus,

    /// Stored as plain `lat`/`lng` columns, serialized as a nested object.
    #[sqlx(flatten)]
    pub location: Location,
    pub address: String,

    // S3 keys of the evidence photos, at most five.
    pub images: Vec<String>,
    pub priority: i32,
    // Department user handling the complaint, set by the assignment endpoint.
    pub assigned_to: Option<Uuid>,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,

    // Joined display names; present only on queries that join public.users.
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter_name: Option<String>,
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_name: Option<String>,
}

/// ValidationType
///
/// The two possible outcomes of a community audit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "validation_type", rename_all = "snake_case")]
#[ts(export)]
pub enum ValidationType {
    #[default]
    Verified,
    NotResolved,
}

/// Validation
///
/// A citizen audit of a resolved complaint, from `public.validations`.
/// At most one per (complaint, validator) pair.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Validation {
    pub id: Uuid,
    pub complaint_id: Uuid,
    pub validator_id: Uuid,
    pub validation_type: ValidationType,
    pub comment: Option<String>,
    pub proof_images: Vec<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// PointTransaction
///
/// One row of the append-only point ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct PointTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub points_change: i64,
    pub transaction_type: TransactionType,
    // The complaint, validation, or offer this entry refers to.
    pub reference_id: Option<Uuid>,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// NotificationType
///
/// Classifies a notification for the client's rendering and routing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[ts(export)]
pub enum NotificationType {
    #[default]
    ComplaintUpdate,
    ValidationRequest,
    PointEarned,
    BadgeUnlocked,
    ComplaintReopened,
    Assignment,
    SystemAlert,
}

/// Notification
///
/// A row from `public.notifications`. 'type' is a reserved keyword in Rust,
/// so the field is renamed internally and mapped back on both the SQL and
/// JSON sides.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Notification {
    pub id: Uuid,
    // Recipient.
    pub user_id: Uuid,

    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub notification_type: NotificationType,

    pub title: String,
    pub message: String,
    pub reference_id: Option<Uuid>,
    pub is_read: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// RewardOffer
///
/// A redeemable offer from `public.reward_offers`, enriched with the partner
/// name when the listing query joins `business_partners`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct RewardOffer {
    pub id: Uuid,
    pub partner_id: Uuid,
    pub title: String,
    pub description: String,
    pub points_required: i64,
    pub terms: Option<String>,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
}

/// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input payload for the public registration endpoint (POST /register).
/// The password is only passed through to the external auth provider and
/// never persisted or logged by this application. Role is always `citizen`;
/// it is not client-selectable.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[ts(export)]
pub struct RegisterUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 2, max = 100))]
    pub full_name: String,
    pub phone: Option<String>,
}

/// CreateComplaintRequest
///
/// Input payload for submitting a new complaint (POST /complaints). The
/// image entries are S3 keys produced by the presigned upload flow.
/// `reporter_location` is the submitting device's current position, checked
/// against the incident location server-side. `confirmed_distinct` is set by
/// the client after it has shown the duplicate warning and the user chose
/// "still a new issue".
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateComplaintRequest {
    #[validate(length(min = 10, max = 100, message = "Title must be 10-100 characters"))]
    pub title: String,
    #[validate(length(min = 20, max = 1000, message = "Description must be 20-1000 characters"))]
    pub description: String,
    pub category: ComplaintCategory,
    #[validate(length(min = 5, message = "Address is required"))]
    pub address: String,
    pub location: Location,
    #[validate(length(max = 5, message = "Maximum 5 images allowed"))]
    pub images: Vec<String>,
    pub reporter_location: Location,
    #[serde(default)]
    pub confirmed_distinct: bool,
}

/// DuplicateCheckRequest
///
/// Input for the standalone duplicate pre-check (POST
/// /complaints/check-duplicates), run by the form before the final step.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DuplicateCheckRequest {
    pub category: ComplaintCategory,
    pub location: Location,
}

/// DuplicateMatch
///
/// One nearby open complaint of the same category, with its distance from
/// the proposed report location.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DuplicateMatch {
    pub id: Uuid,
    pub title: String,
    pub status: ComplaintStatus,
    pub distance_m: f64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// DuplicateWarning
///
/// The 409 body returned when a submission overlaps existing open reports.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DuplicateWarning {
    pub message: String,
    pub duplicates: Vec<DuplicateMatch>,
}

/// CreateValidationRequest
///
/// Input payload for auditing a resolved complaint
/// (POST /complaints/{id}/validations).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateValidationRequest {
    pub validation_type: ValidationType,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
    #[serde(default)]
    #[validate(length(max = 5, message = "Maximum 5 proof images allowed"))]
    pub proof_images: Vec<String>,
}

/// UpdateStatusRequest
///
/// Admin payload for moving a complaint along the workflow
/// (PUT /admin/complaints/{id}/status).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateStatusRequest {
    pub status: ComplaintStatus,
}

/// AssignComplaintRequest
///
/// Admin payload routing a complaint to a department user
/// (PUT /admin/complaints/{id}/assign).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AssignComplaintRequest {
    pub assignee_id: Uuid,
}

/// AdjustPointsRequest
///
/// Admin payload appending a manual ledger entry
/// (POST /admin/users/{id}/points). Only `manual_adjustment` and
/// `fraud_penalty` are accepted; the other transaction types are produced by
/// the workflow itself.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdjustPointsRequest {
    pub points_change: i64,
    pub transaction_type: TransactionType,
    pub description: Option<String>,
}

/// BanUserRequest
///
/// Admin payload toggling an account's banned flag
/// (PUT /admin/users/{id}/ban).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct BanUserRequest {
    pub banned: bool,
}

/// UploadPurpose
///
/// Chooses the storage prefix a presigned upload lands under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum UploadPurpose {
    #[default]
    ComplaintImage,
    ValidationProof,
}

impl UploadPurpose {
    pub fn key_prefix(self) -> &'static str {
        match self {
            UploadPurpose::ComplaintImage => "complaint-images",
            UploadPurpose::ValidationProof => "validation-proofs",
        }
    }
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived S3 upload URL
/// (POST /upload/presigned).
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "pothole.jpg")]
    pub filename: String,
    /// The MIME type the upload will be constrained to.
    #[schema(example = "image/jpeg")]
    pub file_type: String,
    #[serde(default)]
    pub purpose: UploadPurpose,
}

/// PresignedUrlResponse
///
/// Output schema containing the temporary URL for client-to-cloud transfer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The S3 object key to reference in the complaint or validation record.
    pub resource_key: String,
}

/// --- Dashboard & Profile Schemas (Output) ---

/// AdminDashboardStats
///
/// Output schema for the administrative dashboard (GET /admin/stats).
/// `needs_triage` counts fresh submissions; `in_progress` folds `assigned`
/// in; `resolved` folds `validated` in.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_complaints: i64,
    pub needs_triage: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub total_users: i64,
}

/// UserProfile
///
/// Output schema for the authenticated user's profile (GET /me).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub points: i64,
    pub badge: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            phone: u.phone,
            role: u.role,
            points: u.points,
            badge: u.badge,
            created_at: u.created_at,
        }
    }
}

/// LeaderboardEntry
///
/// One row of the public community leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct LeaderboardEntry {
    pub full_name: String,
    pub points: i64,
    pub badge: String,
}
