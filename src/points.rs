use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Points credited to a validator for submitting a community audit.
pub const VALIDATION_AWARD: i64 = 30;

/// Points credited to the reporter when their complaint reaches `validated`.
pub const RESOLUTION_AWARD: i64 = 50;

/// TransactionType
///
/// Classifies a ledger entry. The ledger is append-only; `users.points` is
/// the materialized balance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
#[ts(export)]
pub enum TransactionType {
    ComplaintResolved,
    Validation,
    Redemption,
    FraudPenalty,
    #[default]
    ManualAdjustment,
}

/// badge_for_points
///
/// Maps a lifetime point balance to its badge tier. Tiers only ever move up
/// in display terms; the stored badge is recomputed from the balance after
/// each award, so a fraud penalty can demote.
pub fn badge_for_points(points: i64) -> &'static str {
    match points {
        p if p >= 2500 => "champion",
        p if p >= 1000 => "gold",
        p if p >= 500 => "silver",
        p if p >= 100 => "bronze",
        _ => "observer",
    }
}

/// Badge tiers in ascending order.
pub const BADGE_TIERS: [&str; 5] = ["observer", "bronze", "silver", "gold", "champion"];

/// badge_rank
///
/// Position of a badge in the tier ladder. Unknown values rank lowest, so a
/// promotion notification is only sent for a genuine climb.
pub fn badge_rank(badge: &str) -> usize {
    BADGE_TIERS.iter().position(|t| *t == badge).unwrap_or(0)
}
