use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Location
///
/// A WGS84 coordinate pair. Stored as plain `lat`/`lng` columns and flattened
/// into row structs, serialized as a nested object on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS, ToSchema, sqlx::FromRow, Default,
)]
#[ts(export)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Maximum distance, in raw coordinate degrees, between a reporter's current
/// position and the complaint location (roughly 5 km at mid latitudes).
pub const REPORTER_RADIUS_DEG: f64 = 0.05;

/// Radius of the duplicate scan, in meters.
pub const DUPLICATE_RADIUS_M: f64 = 250.0;

/// Meters per degree of latitude.
const METERS_PER_DEG: f64 = 111_320.0;

/// degree_distance
///
/// Plain Euclidean distance in coordinate degrees. This is deliberately the
/// same crude metric the submission form applies, so the server-side gate
/// accepts exactly what the form promised.
pub fn degree_distance(a: Location, b: Location) -> f64 {
    ((a.lat - b.lat).powi(2) + (a.lng - b.lng).powi(2)).sqrt()
}

/// within_reporting_range
///
/// The reporter-presence gate: the submitting device must be near the
/// incident it reports.
pub fn within_reporting_range(reporter: Location, incident: Location) -> bool {
    degree_distance(reporter, incident) <= REPORTER_RADIUS_DEG
}

/// approx_distance_meters
///
/// Equirectangular approximation of the distance between two points.
/// Accurate to well under a meter at the sub-kilometer ranges the duplicate
/// scan operates on.
pub fn approx_distance_meters(a: Location, b: Location) -> f64 {
    let mean_lat = ((a.lat + b.lat) / 2.0).to_radians();
    let dy = (a.lat - b.lat) * METERS_PER_DEG;
    let dx = (a.lng - b.lng) * METERS_PER_DEG * mean_lat.cos();
    (dx * dx + dy * dy).sqrt()
}

/// bounding_box_deg
///
/// Half-width in degrees of a latitude/longitude box that contains every
/// point within `radius_m` of `center`. Used to pre-filter the duplicate scan
/// in SQL before exact distances are computed.
pub fn bounding_box_deg(center: Location, radius_m: f64) -> (f64, f64) {
    let lat_half = radius_m / METERS_PER_DEG;
    // Longitude degrees shrink with latitude; guard the cos near the poles.
    let cos_lat = center.lat.to_radians().cos().abs().max(0.01);
    let lng_half = radius_m / (METERS_PER_DEG * cos_lat);
    (lat_half, lng_half)
}
