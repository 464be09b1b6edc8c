use crate::geo::{self, Location};
use crate::models::{
    AdminDashboardStats, Complaint, ComplaintCategory, DuplicateMatch, LeaderboardEntry,
    Notification, NotificationType, PointTransaction, RewardOffer, User, Validation,
};
use crate::points::TransactionType;
use crate::workflow::ComplaintStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// The abstract contract for all persistence operations. Handlers interact
/// with the data layer through this trait only, so the Postgres
/// implementation can be swapped for a stub in tests.
///
/// **Send + Sync + async_trait** make the trait object (`Arc<dyn Repository>`)
/// shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users / Auth ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    // Mirrors the external auth record into public.users after signup.
    async fn create_user(&self, user: User) -> Option<User>;
    async fn set_user_banned(&self, id: Uuid, banned: bool) -> bool;
    async fn set_badge(&self, id: Uuid, badge: &str) -> bool;
    // Top citizens by points for the public leaderboard.
    async fn leaderboard(&self, limit: i64) -> Vec<LeaderboardEntry>;

    // --- Complaints ---
    async fn list_complaints(
        &self,
        category: Option<ComplaintCategory>,
        status: Option<ComplaintStatus>,
        search: Option<String>,
    ) -> Vec<Complaint>;
    async fn get_complaint(&self, id: Uuid) -> Option<Complaint>;
    async fn get_my_complaints(&self, user_id: Uuid) -> Vec<Complaint>;
    async fn create_complaint(&self, complaint: Complaint) -> Option<Complaint>;
    // Writes a workflow transition. Legality is the caller's responsibility;
    // this method only persists and keeps resolved_at in step.
    async fn set_complaint_status(&self, id: Uuid, status: ComplaintStatus) -> Option<Complaint>;
    // Routes a complaint to a department user and moves it to `assigned`.
    async fn assign_complaint(&self, id: Uuid, assignee_id: Uuid) -> Option<Complaint>;
    // Same-category open complaints within `radius_m` of `center`, nearest
    // first. Backs the duplicate guard.
    async fn find_nearby_open(
        &self,
        category: ComplaintCategory,
        center: Location,
        radius_m: f64,
    ) -> Vec<DuplicateMatch>;

    // --- Validations ---
    // Returns None when the validator already audited this complaint.
    async fn add_validation(&self, validation: Validation) -> Option<Validation>;
    async fn get_validations(&self, complaint_id: Uuid) -> Vec<Validation>;

    // --- Point Ledger ---
    // Appends a ledger row and moves users.points in one transaction.
    // Refuses changes that would take the balance below zero.
    async fn apply_points(
        &self,
        user_id: Uuid,
        change: i64,
        transaction_type: TransactionType,
        reference_id: Option<Uuid>,
        description: Option<String>,
    ) -> Option<User>;
    async fn get_point_history(&self, user_id: Uuid) -> Vec<PointTransaction>;

    // --- Notifications ---
    async fn add_notification(
        &self,
        user_id: Uuid,
        notification_type: NotificationType,
        title: &str,
        message: &str,
        reference_id: Option<Uuid>,
    );
    async fn get_notifications(&self, user_id: Uuid) -> Vec<Notification>;
    // Ownership-checked read marker.
    async fn mark_notification_read(&self, notification_id: Uuid, user_id: Uuid) -> bool;

    // --- Rewards ---
    async fn list_active_offers(&self) -> Vec<RewardOffer>;
    async fn get_active_offer(&self, id: Uuid) -> Option<RewardOffer>;

    // --- Admin ---
    async fn get_stats(&self) -> AdminDashboardStats;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Column list shared by every complaint query that joins the reporter and
// assignee names.
const COMPLAINT_COLS: &str = r#"
    c.id, c.user_id, c.title, c.description, c.category, c.status,
    c.lat, c.lng, c.address, c.images, c.priority, c.assigned_to,
    c.created_at, c.resolved_at, c.updated_at,
    u.full_name AS reporter_name, a.full_name AS assignee_name
"#;

const COMPLAINT_JOINS: &str = r#"
    FROM complaints c
    JOIN users u ON c.user_id = u.id
    LEFT JOIN users a ON c.assigned_to = a.id
"#;

// Internal row for the duplicate scan; distance is computed in Rust after
// the bounding-box pre-filter.
#[derive(sqlx::FromRow)]
struct NearbyRow {
    id: Uuid,
    title: String,
    status: ComplaintStatus,
    lat: f64,
    lng: f64,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl Repository for PostgresRepository {
    /// get_user
    ///
    /// Retrieves the profile data needed for authentication, authorization,
    /// and the gamification surfaces.
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, full_name, phone, role, points, badge, is_banned, created_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user error: {:?}", e);
            None
        })
    }

    /// create_user
    ///
    /// Creates the mirroring profile record in `public.users` after the
    /// external auth provider accepts the signup.
    async fn create_user(&self, user: User) -> Option<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, full_name, phone, role, points, badge)
             VALUES ($1, $2, $3, $4, $5, 0, 'observer')
             RETURNING id, email, full_name, phone, role, points, badge, is_banned, created_at",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(user.role)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_user error: {:?}", e);
            None
        })
    }

    /// set_user_banned
    ///
    /// Flips the moderation flag. Returns false when the user does not exist.
    async fn set_user_banned(&self, id: Uuid, banned: bool) -> bool {
        match sqlx::query("UPDATE users SET is_banned = $1 WHERE id = $2")
            .bind(banned)
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("set_user_banned error: {:?}", e);
                false
            }
        }
    }

    /// set_badge
    ///
    /// Persists a recomputed badge tier.
    async fn set_badge(&self, id: Uuid, badge: &str) -> bool {
        match sqlx::query("UPDATE users SET badge = $1 WHERE id = $2")
            .bind(badge)
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("set_badge error: {:?}", e);
                false
            }
        }
    }

    /// leaderboard
    ///
    /// Top citizens by point balance. Banned accounts are excluded from the
    /// public board.
    async fn leaderboard(&self, limit: i64) -> Vec<LeaderboardEntry> {
        sqlx::query_as::<_, LeaderboardEntry>(
            "SELECT full_name, points, badge FROM users
             WHERE is_banned = false
             ORDER BY points DESC, created_at ASC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("leaderboard error: {:?}", e);
            vec![]
        })
    }

    /// list_complaints
    ///
    /// Flexible listing with category/status filtering and case-insensitive
    /// search, built with QueryBuilder for safe parameterization. Serves both
    /// the public explore surface and the admin queue (the admin passes a
    /// status filter; the data set is the same).
    async fn list_complaints(
        &self,
        category: Option<ComplaintCategory>,
        status: Option<ComplaintStatus>,
        search: Option<String>,
    ) -> Vec<Complaint> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {COMPLAINT_COLS} {COMPLAINT_JOINS} WHERE 1=1"));

        if let Some(c) = category {
            builder.push(" AND c.category = ");
            builder.push_bind(c);
        }

        if let Some(s) = status {
            builder.push(" AND c.status = ");
            builder.push_bind(s);
        }

        if let Some(q) = search {
            // Search across title, description, and address.
            let pattern = format!("%{}%", q);
            builder.push(" AND (c.title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR c.description ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR c.address ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY c.created_at DESC");

        let query = builder.build_query_as::<Complaint>();

        match query.fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("list_complaints error: {:?}", e);
                vec![]
            }
        }
    }

    /// get_complaint
    ///
    /// Single complaint by ID with reporter and assignee names joined in.
    async fn get_complaint(&self, id: Uuid) -> Option<Complaint> {
        sqlx::query_as::<_, Complaint>(&format!(
            "SELECT {COMPLAINT_COLS} {COMPLAINT_JOINS} WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_complaint error: {:?}", e);
            None
        })
    }

    /// get_my_complaints
    ///
    /// All complaints submitted by one user, newest first.
    async fn get_my_complaints(&self, user_id: Uuid) -> Vec<Complaint> {
        match sqlx::query_as::<_, Complaint>(&format!(
            "SELECT {COMPLAINT_COLS} {COMPLAINT_JOINS}
             WHERE c.user_id = $1 ORDER BY c.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("get_my_complaints error: {:?}", e);
                vec![]
            }
        }
    }

    /// create_complaint
    ///
    /// Inserts a new complaint. Every new complaint enters the workflow as
    /// `submitted`; status is not client-settable.
    async fn create_complaint(&self, complaint: Complaint) -> Option<Complaint> {
        sqlx::query_as::<_, Complaint>(
            "INSERT INTO complaints
                (id, user_id, title, description, category, status, lat, lng,
                 address, images, priority, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, 'submitted', $6, $7, $8, $9, $10, NOW(), NOW())
             RETURNING id, user_id, title, description, category, status, lat, lng,
                       address, images, priority, assigned_to, created_at, resolved_at, updated_at",
        )
        .bind(complaint.id)
        .bind(complaint.user_id)
        .bind(&complaint.title)
        .bind(&complaint.description)
        .bind(complaint.category)
        .bind(complaint.location.lat)
        .bind(complaint.location.lng)
        .bind(&complaint.address)
        .bind(&complaint.images)
        .bind(complaint.priority)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_complaint error: {:?}", e);
            None
        })
    }

    /// set_complaint_status
    ///
    /// Persists a transition. `resolved_at` is stamped when the complaint
    /// reaches `resolved` and cleared when it is reopened.
    async fn set_complaint_status(&self, id: Uuid, status: ComplaintStatus) -> Option<Complaint> {
        sqlx::query_as::<_, Complaint>(
            "UPDATE complaints
             SET status = $2,
                 resolved_at = CASE
                     WHEN $2 = 'resolved'::complaint_status THEN NOW()
                     WHEN $2 = 'reopened'::complaint_status THEN NULL
                     ELSE resolved_at
                 END,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING id, user_id, title, description, category, status, lat, lng,
                       address, images, priority, assigned_to, created_at, resolved_at, updated_at",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_complaint_status error: {:?}", e);
            None
        })
    }

    /// assign_complaint
    ///
    /// Sets the handling department user and writes the `assigned` state in
    /// the same statement, so a half-applied assignment cannot be observed.
    async fn assign_complaint(&self, id: Uuid, assignee_id: Uuid) -> Option<Complaint> {
        sqlx::query_as::<_, Complaint>(
            "UPDATE complaints
             SET assigned_to = $2, status = 'assigned', updated_at = NOW()
             WHERE id = $1
             RETURNING id, user_id, title, description, category, status, lat, lng,
                       address, images, priority, assigned_to, created_at, resolved_at, updated_at",
        )
        .bind(id)
        .bind(assignee_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("assign_complaint error: {:?}", e);
            None
        })
    }

    /// find_nearby_open
    ///
    /// The duplicate scan. SQL narrows candidates to the same category,
    /// non-closed statuses, and a bounding box around the proposed location;
    /// exact distances are computed here and filtered to `radius_m`.
    async fn find_nearby_open(
        &self,
        category: ComplaintCategory,
        center: Location,
        radius_m: f64,
    ) -> Vec<DuplicateMatch> {
        let (lat_half, lng_half) = geo::bounding_box_deg(center, radius_m);

        let rows = sqlx::query_as::<_, NearbyRow>(
            "SELECT id, title, status, lat, lng, created_at
             FROM complaints
             WHERE category = $1
               AND status NOT IN ('rejected', 'validated')
               AND lat BETWEEN $2 AND $3
               AND lng BETWEEN $4 AND $5",
        )
        .bind(category)
        .bind(center.lat - lat_half)
        .bind(center.lat + lat_half)
        .bind(center.lng - lng_half)
        .bind(center.lng + lng_half)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_nearby_open error: {:?}", e);
            vec![]
        });

        let mut matches: Vec<DuplicateMatch> = rows
            .into_iter()
            .filter_map(|row| {
                let here = Location {
                    lat: row.lat,
                    lng: row.lng,
                };
                let distance_m = geo::approx_distance_meters(center, here);
                (distance_m <= radius_m).then_some(DuplicateMatch {
                    id: row.id,
                    title: row.title,
                    status: row.status,
                    distance_m,
                    created_at: row.created_at,
                })
            })
            .collect();

        matches.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        matches
    }

    /// add_validation
    ///
    /// Inserts a community audit. `ON CONFLICT DO NOTHING` against the
    /// (complaint_id, validator_id) unique key makes repeat audits a no-op:
    /// a conflict surfaces as None, which the handler maps to 409.
    async fn add_validation(&self, validation: Validation) -> Option<Validation> {
        sqlx::query_as::<_, Validation>(
            "INSERT INTO validations
                (id, complaint_id, validator_id, validation_type, comment, proof_images)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (complaint_id, validator_id) DO NOTHING
             RETURNING id, complaint_id, validator_id, validation_type, comment,
                       proof_images, created_at",
        )
        .bind(validation.id)
        .bind(validation.complaint_id)
        .bind(validation.validator_id)
        .bind(validation.validation_type)
        .bind(&validation.comment)
        .bind(&validation.proof_images)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("add_validation error: {:?}", e);
            None
        })
    }

    /// get_validations
    ///
    /// All audits for a complaint, oldest first.
    async fn get_validations(&self, complaint_id: Uuid) -> Vec<Validation> {
        sqlx::query_as::<_, Validation>(
            "SELECT id, complaint_id, validator_id, validation_type, comment,
                    proof_images, created_at
             FROM validations WHERE complaint_id = $1 ORDER BY created_at ASC",
        )
        .bind(complaint_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
    }

    /// apply_points
    ///
    /// The only write path for point balances: moves `users.points` and
    /// appends the ledger row in a single database transaction. The balance
    /// guard (`points + change >= 0`) rejects over-draining redemptions that
    /// race past the handler's own check.
    async fn apply_points(
        &self,
        user_id: Uuid,
        change: i64,
        transaction_type: TransactionType,
        reference_id: Option<Uuid>,
        description: Option<String>,
    ) -> Option<User> {
        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                tracing::error!("apply_points begin error: {:?}", e);
                return None;
            }
        };

        let updated = sqlx::query_as::<_, User>(
            "UPDATE users SET points = points + $2
             WHERE id = $1 AND points + $2 >= 0
             RETURNING id, email, full_name, phone, role, points, badge, is_banned, created_at",
        )
        .bind(user_id)
        .bind(change)
        .fetch_optional(&mut *tx)
        .await;

        let user = match updated {
            Ok(Some(user)) => user,
            Ok(None) => {
                // Unknown user or a change that would go negative.
                let _ = tx.rollback().await;
                return None;
            }
            Err(e) => {
                tracing::error!("apply_points update error: {:?}", e);
                let _ = tx.rollback().await;
                return None;
            }
        };

        let inserted = sqlx::query(
            "INSERT INTO point_transactions
                (id, user_id, points_change, transaction_type, reference_id, description)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(change)
        .bind(transaction_type)
        .bind(reference_id)
        .bind(&description)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            tracing::error!("apply_points ledger error: {:?}", e);
            let _ = tx.rollback().await;
            return None;
        }

        match tx.commit().await {
            Ok(()) => Some(user),
            Err(e) => {
                tracing::error!("apply_points commit error: {:?}", e);
                None
            }
        }
    }

    /// get_point_history
    ///
    /// The user's ledger, newest first.
    async fn get_point_history(&self, user_id: Uuid) -> Vec<PointTransaction> {
        sqlx::query_as::<_, PointTransaction>(
            "SELECT id, user_id, points_change, transaction_type, reference_id,
                    description, created_at
             FROM point_transactions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_point_history error: {:?}", e);
            vec![]
        })
    }

    /// add_notification
    ///
    /// Fire-and-forget insert. A lost notification is logged, never allowed
    /// to fail the request that produced it.
    async fn add_notification(
        &self,
        user_id: Uuid,
        notification_type: NotificationType,
        title: &str,
        message: &str,
        reference_id: Option<Uuid>,
    ) {
        let result = sqlx::query(
            "INSERT INTO notifications (id, user_id, type, title, message, reference_id)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(notification_type)
        .bind(title)
        .bind(message)
        .bind(reference_id)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::error!("add_notification error: {:?}", e);
        }
    }

    /// get_notifications
    ///
    /// All notifications for the recipient, newest first.
    async fn get_notifications(&self, user_id: Uuid) -> Vec<Notification> {
        sqlx::query_as::<_, Notification>(
            "SELECT id, user_id, type, title, message, reference_id, is_read, created_at
             FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_notifications error: {:?}", e);
            vec![]
        })
    }

    /// mark_notification_read
    ///
    /// Sets `is_read = true`, enforced by an ownership check on `user_id`.
    async fn mark_notification_read(&self, notification_id: Uuid, user_id: Uuid) -> bool {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(r) => r.rows_affected() > 0,
            Err(e) => {
                tracing::error!("mark_notification_read error: {:?}", e);
                false
            }
        }
    }

    /// list_active_offers
    ///
    /// Redeemable offers from active partners, cheapest first.
    async fn list_active_offers(&self) -> Vec<RewardOffer> {
        sqlx::query_as::<_, RewardOffer>(
            "SELECT o.id, o.partner_id, o.title, o.description, o.points_required,
                    o.terms, o.is_active, o.created_at, p.business_name AS partner_name
             FROM reward_offers o
             JOIN business_partners p ON o.partner_id = p.id
             WHERE o.is_active = true AND p.is_active = true
             ORDER BY o.points_required ASC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_active_offers error: {:?}", e);
            vec![]
        })
    }

    /// get_active_offer
    ///
    /// One offer, only if both the offer and its partner are still active.
    async fn get_active_offer(&self, id: Uuid) -> Option<RewardOffer> {
        sqlx::query_as::<_, RewardOffer>(
            "SELECT o.id, o.partner_id, o.title, o.description, o.points_required,
                    o.terms, o.is_active, o.created_at, p.business_name AS partner_name
             FROM reward_offers o
             JOIN business_partners p ON o.partner_id = p.id
             WHERE o.id = $1 AND o.is_active = true AND p.is_active = true",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_active_offer error: {:?}", e);
            None
        })
    }

    /// get_stats
    ///
    /// Compiles the dashboard counters. `assigned` counts as in progress and
    /// `validated` counts as resolved, matching the triage board's buckets.
    async fn get_stats(&self) -> AdminDashboardStats {
        let total_complaints = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM complaints")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let needs_triage = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM complaints WHERE status = 'submitted'",
        )
        .fetch_one(&self.pool)
        .await
        .unwrap_or(0);
        let in_progress = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM complaints WHERE status IN ('assigned', 'in_progress')",
        )
        .fetch_one(&self.pool)
        .await
        .unwrap_or(0);
        let resolved = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM complaints WHERE status IN ('resolved', 'validated')",
        )
        .fetch_one(&self.pool)
        .await
        .unwrap_or(0);
        let total_users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);

        AdminDashboardStats {
            total_complaints,
            needs_triage,
            in_progress,
            resolved,
            total_users,
        }
    }
}
