use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;
use zensolve::{
    AppState, create_router,
    config::AppConfig,
    geo::Location,
    models::{
        AdminDashboardStats, Complaint, ComplaintCategory, DuplicateMatch, LeaderboardEntry,
        Notification, NotificationType, PointTransaction, PresignedUrlRequest,
        PresignedUrlResponse, RewardOffer, User, Validation,
    },
    points::TransactionType,
    repository::{Repository, RepositoryState},
    storage::MockStorageService,
    workflow::ComplaintStatus,
};

// Minimal stub: only `get_user` matters here (the local auth bypass resolves
// the caller through it); everything else returns empty defaults.
struct StubRepository;

#[async_trait]
impl Repository for StubRepository {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        Some(User {
            id,
            email: "test@test.com".to_string(),
            full_name: "Test Citizen".to_string(),
            ..User::default()
        })
    }
    async fn create_user(&self, user: User) -> Option<User> {
        Some(user)
    }
    async fn set_user_banned(&self, _id: Uuid, _banned: bool) -> bool {
        false
    }
    async fn set_badge(&self, _id: Uuid, _badge: &str) -> bool {
        false
    }
    async fn leaderboard(&self, _limit: i64) -> Vec<LeaderboardEntry> {
        vec![]
    }
    async fn list_complaints(
        &self,
        _category: Option<ComplaintCategory>,
        _status: Option<ComplaintStatus>,
        _search: Option<String>,
    ) -> Vec<Complaint> {
        vec![]
    }
    async fn get_complaint(&self, _id: Uuid) -> Option<Complaint> {
        None
    }
    async fn get_my_complaints(&self, _user_id: Uuid) -> Vec<Complaint> {
        vec![]
    }
    async fn create_complaint(&self, complaint: Complaint) -> Option<Complaint> {
        Some(complaint)
    }
    async fn set_complaint_status(&self, _id: Uuid, _status: ComplaintStatus) -> Option<Complaint> {
        None
    }
    async fn assign_complaint(&self, _id: Uuid, _assignee_id: Uuid) -> Option<Complaint> {
        None
    }
    async fn find_nearby_open(
        &self,
        _category: ComplaintCategory,
        _center: Location,
        _radius_m: f64,
    ) -> Vec<DuplicateMatch> {
        vec![]
    }
    async fn add_validation(&self, _validation: Validation) -> Option<Validation> {
        None
    }
    async fn get_validations(&self, _complaint_id: Uuid) -> Vec<Validation> {
        vec![]
    }
    async fn apply_points(
        &self,
        _user_id: Uuid,
        _change: i64,
        _transaction_type: TransactionType,
        _reference_id: Option<Uuid>,
        _description: Option<String>,
    ) -> Option<User> {
        None
    }
    async fn get_point_history(&self, _user_id: Uuid) -> Vec<PointTransaction> {
        vec![]
    }
    async fn add_notification(
        &self,
        _user_id: Uuid,
        _notification_type: NotificationType,
        _title: &str,
        _message: &str,
        _reference_id: Option<Uuid>,
    ) {
    }
    async fn get_notifications(&self, _user_id: Uuid) -> Vec<Notification> {
        vec![]
    }
    async fn mark_notification_read(&self, _notification_id: Uuid, _user_id: Uuid) -> bool {
        false
    }
    async fn list_active_offers(&self) -> Vec<RewardOffer> {
        vec![]
    }
    async fn get_active_offer(&self, _id: Uuid) -> Option<RewardOffer> {
        None
    }
    async fn get_stats(&self) -> AdminDashboardStats {
        AdminDashboardStats::default()
    }
}

fn app(mock_storage: MockStorageService) -> axum::Router {
    let repo = Arc::new(StubRepository) as RepositoryState;
    let storage = Arc::new(mock_storage);
    // The default config runs in Env::Local, which enables the x-user-id
    // auth bypass the requests below rely on.
    let config = AppConfig::default();

    let state = AppState {
        repo,
        storage,
        config,
    };
    create_router(state)
}

async fn presign(app: axum::Router, payload: &PresignedUrlRequest) -> axum::response::Response {
    let user_id = Uuid::new_v4();
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/upload/presigned")
            .header("Content-Type", "application/json")
            .header("x-user-id", user_id.to_string())
            .body(Body::from(serde_json::to_string(payload).unwrap()))
            .unwrap(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_presigned_url_success() {
    let payload = PresignedUrlRequest {
        filename: "pothole.jpg".to_string(),
        file_type: "image/jpeg".to_string(),
        purpose: zensolve::models::UploadPurpose::ComplaintImage,
    };

    let response = presign(app(MockStorageService::new()), &payload).await;

    assert_eq!(response.status(), StatusCode::OK);

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_json: PresignedUrlResponse = serde_json::from_slice(&body_bytes).unwrap();

    assert!(body_json.upload_url.contains("signature=fake"));
    assert!(body_json.resource_key.starts_with("complaint-images/"));
    assert!(body_json.resource_key.ends_with(".jpg"));
}

#[tokio::test]
async fn test_presigned_url_validation_proof_prefix() {
    let payload = PresignedUrlRequest {
        filename: "after_repair.png".to_string(),
        file_type: "image/png".to_string(),
        purpose: zensolve::models::UploadPurpose::ValidationProof,
    };

    let response = presign(app(MockStorageService::new()), &payload).await;

    assert_eq!(response.status(), StatusCode::OK);

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_json: PresignedUrlResponse = serde_json::from_slice(&body_bytes).unwrap();

    assert!(body_json.resource_key.starts_with("validation-proofs/"));
    assert!(body_json.resource_key.ends_with(".png"));
}

#[tokio::test]
async fn test_presigned_url_sanitization() {
    let payload = PresignedUrlRequest {
        filename: "../../etc/passwd.exe".to_string(),
        file_type: "application/binary".to_string(),
        purpose: zensolve::models::UploadPurpose::ComplaintImage,
    };

    let response = presign(app(MockStorageService::new()), &payload).await;

    assert_eq!(response.status(), StatusCode::OK);

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_json: PresignedUrlResponse = serde_json::from_slice(&body_bytes).unwrap();

    // The object key is a fresh UUID under the purpose prefix; nothing of the
    // client-supplied path survives except the extension.
    assert!(body_json.resource_key.ends_with(".exe"));
    assert!(!body_json.resource_key.contains(".."));
}

#[tokio::test]
async fn test_presigned_url_storage_failure() {
    let payload = PresignedUrlRequest {
        filename: "valid.jpg".to_string(),
        file_type: "image/jpeg".to_string(),
        purpose: zensolve::models::UploadPurpose::ComplaintImage,
    };

    let response = presign(app(MockStorageService::new_failing()), &payload).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_presigned_url_requires_auth() {
    // No x-user-id header and no bearer token.
    let payload = PresignedUrlRequest {
        filename: "pothole.jpg".to_string(),
        file_type: "image/jpeg".to_string(),
        purpose: zensolve::models::UploadPurpose::ComplaintImage,
    };

    let response = app(MockStorageService::new())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload/presigned")
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
