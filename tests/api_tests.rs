use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;
use zensolve::{
    AppConfig, AppState, MockStorageService, create_router,
    models::{Complaint, UserProfile, UserRole},
    repository::{PostgresRepository, RepositoryState},
    storage::StorageState,
    workflow::ComplaintStatus,
};

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
    pub pool: sqlx::PgPool,
}

/// Boots the full application against the database named by DATABASE_URL.
/// Returns None (skipping the test) when no database is configured.
async fn spawn_app() -> Option<TestApp> {
    dotenv::dotenv().ok();

    let db_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("skipping: DATABASE_URL not set");
            return None;
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await
        .expect("Failed to connect to Postgres in tests");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let repo = Arc::new(PostgresRepository::new(pool.clone())) as RepositoryState;
    let storage = Arc::new(MockStorageService::new()) as StorageState;
    // Default config keeps Env::Local, so the x-user-id bypass is available.
    let config = AppConfig::default();

    let state = AppState {
        repo,
        storage,
        config,
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Some(TestApp { address, pool })
}

/// Seeds a user in auth.users and public.users.
async fn seed_user(pool: &sqlx::PgPool, role: UserRole) -> Uuid {
    let id = Uuid::new_v4();
    let email = format!("{}@test.com", id.simple());

    sqlx::query(
        r#"
        WITH auth_user AS (
            INSERT INTO auth.users (id, email) VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            RETURNING id, email
        )
        INSERT INTO public.users (id, email, full_name, role)
        SELECT id, email, 'E2E Citizen', $3 FROM auth_user
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(&email)
    .bind(role)
    .execute(pool)
    .await
    .expect("failed to seed user");

    id
}

fn submission_body(lat: f64, lng: f64, confirmed: bool) -> serde_json::Value {
    serde_json::json!({
        "title": "Water main leaking onto the road",
        "description": "Clean water has been running down the curb since yesterday morning.",
        "category": "Water Supply",
        "address": "Corner of Elm St and 2nd Ave",
        "location": { "lat": lat, "lng": lng },
        "images": [],
        "reporter_location": { "lat": lat, "lng": lng },
        "confirmed_distinct": confirmed
    })
}

async fn fetch_points(app: &TestApp, client: &reqwest::Client, user: Uuid) -> i64 {
    let profile: UserProfile = client
        .get(format!("{}/me", app.address))
        .header("x-user-id", user.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    profile.points
}

#[tokio::test]
async fn test_health_check() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_admin_routes_forbidden_for_citizen() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let citizen = seed_user(&app.pool, UserRole::Citizen).await;

    let response = client
        .get(format!("{}/admin/stats", app.address))
        .header("x-user-id", citizen.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_duplicate_submission_requires_confirmation() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let citizen = seed_user(&app.pool, UserRole::Citizen).await;

    // A pseudo-random neighborhood so reruns do not interfere.
    let salt = Uuid::new_v4().as_u128();
    let lat = 20.0 + (salt % 997) as f64 * 0.031;
    let lng = 20.0 + ((salt >> 16) % 997) as f64 * 0.029;

    // First report goes through.
    let first = client
        .post(format!("{}/complaints", app.address))
        .header("x-user-id", citizen.to_string())
        .json(&submission_body(lat, lng, false))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 201);

    // A second report a few meters away trips the duplicate guard.
    let second = client
        .post(format!("{}/complaints", app.address))
        .header("x-user-id", citizen.to_string())
        .json(&submission_body(lat + 0.0003, lng, false))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 409);

    // Confirming it as distinct overrides the guard.
    let confirmed = client
        .post(format!("{}/complaints", app.address))
        .header("x-user-id", citizen.to_string())
        .json(&submission_body(lat + 0.0003, lng, true))
        .send()
        .await
        .unwrap();
    assert_eq!(confirmed.status(), 201);
}

#[tokio::test]
async fn test_complaint_lifecycle_with_validation_awards() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let reporter = seed_user(&app.pool, UserRole::Citizen).await;
    let validator = seed_user(&app.pool, UserRole::Citizen).await;
    let admin = seed_user(&app.pool, UserRole::Admin).await;
    let department = seed_user(&app.pool, UserRole::Department).await;

    let salt = Uuid::new_v4().as_u128();
    let lat = 30.0 + (salt % 997) as f64 * 0.033;
    let lng = 30.0 + ((salt >> 16) % 997) as f64 * 0.027;

    // 1. Citizen submits.
    let response = client
        .post(format!("{}/complaints", app.address))
        .header("x-user-id", reporter.to_string())
        .json(&submission_body(lat, lng, false))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let complaint: Complaint = response.json().await.unwrap();
    assert_eq!(complaint.status, ComplaintStatus::Submitted);

    // 2. An illegal jump is refused: submitted -> resolved.
    let response = client
        .put(format!(
            "{}/admin/complaints/{}/status",
            app.address, complaint.id
        ))
        .header("x-user-id", admin.to_string())
        .json(&serde_json::json!({ "status": "resolved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // 3. The legal walk: under_review, assign, in_progress, resolved.
    let response = client
        .put(format!(
            "{}/admin/complaints/{}/status",
            app.address, complaint.id
        ))
        .header("x-user-id", admin.to_string())
        .json(&serde_json::json!({ "status": "under_review" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .put(format!(
            "{}/admin/complaints/{}/assign",
            app.address, complaint.id
        ))
        .header("x-user-id", admin.to_string())
        .json(&serde_json::json!({ "assignee_id": department }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let assigned: Complaint = response.json().await.unwrap();
    assert_eq!(assigned.status, ComplaintStatus::Assigned);
    assert_eq!(assigned.assigned_to, Some(department));

    for next in ["in_progress", "resolved"] {
        let response = client
            .put(format!(
                "{}/admin/complaints/{}/status",
                app.address, complaint.id
            ))
            .header("x-user-id", department.to_string())
            .json(&serde_json::json!({ "status": next }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "transition to {} failed", next);
    }

    // 4. The reporter cannot audit their own complaint.
    let response = client
        .post(format!(
            "{}/complaints/{}/validations",
            app.address, complaint.id
        ))
        .header("x-user-id", reporter.to_string())
        .json(&serde_json::json!({ "validation_type": "verified" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);

    // 5. A second citizen verifies the fix.
    let reporter_points_before = fetch_points(&app, &client, reporter).await;
    let validator_points_before = fetch_points(&app, &client, validator).await;

    let response = client
        .post(format!(
            "{}/complaints/{}/validations",
            app.address, complaint.id
        ))
        .header("x-user-id", validator.to_string())
        .json(&serde_json::json!({
            "validation_type": "verified",
            "comment": "Road is dry, repair crew did a clean job."
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    // 6. The complaint is validated and both sides were paid.
    let detail: Complaint = client
        .get(format!("{}/complaints/{}", app.address, complaint.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail.status, ComplaintStatus::Validated);

    let reporter_points = fetch_points(&app, &client, reporter).await;
    let validator_points = fetch_points(&app, &client, validator).await;
    assert_eq!(reporter_points - reporter_points_before, 50);
    assert_eq!(validator_points - validator_points_before, 30);

    // 7. A repeat audit by the same validator conflicts.
    let response = client
        .post(format!(
            "{}/complaints/{}/validations",
            app.address, complaint.id
        ))
        .header("x-user-id", validator.to_string())
        .json(&serde_json::json!({ "validation_type": "verified" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
}
