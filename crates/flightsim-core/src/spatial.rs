//! Spatial math for trajectories, separation checks and grid projection.
//!
//! Distances use a fixed-radius haversine; path interpolation goes through `geo`.

use crate::models::LatLon;
use geo::{Geodesic, Haversine, InterpolatePoint, Point};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const KM_TO_NM: f64 = 0.5399568;
pub const NM_TO_KM: f64 = 1.852;

/// Reference latitude of the equirectangular grid projection (degrees).
pub const PROJECTION_REF_LAT_DEG: f64 = 56.0;

/// Great-circle distance in nautical miles (haversine on a sphere).
pub fn distance_nm(a: LatLon, b: LatLon) -> f64 {
    EARTH_RADIUS_KM * central_angle(a, b) * KM_TO_NM
}

/// Central angle between two points in radians.
fn central_angle(a: LatLon, b: LatLon) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

/// How points between two waypoints are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Geodesic on the WGS84 ellipsoid
    #[default]
    Geodesic,
    /// Great circle on a sphere
    GreatCircle,
    /// Straight lat/lon blend. An approximation, not a great-circle path.
    Linear,
}

impl Interpolation {
    pub fn apply(self, a: LatLon, b: LatLon, fraction: f64) -> LatLon {
        match self {
            Interpolation::Geodesic => interpolate(a, b, fraction),
            Interpolation::GreatCircle => interpolate_great_circle(a, b, fraction),
            Interpolation::Linear => interpolate_linear(a, b, fraction),
        }
    }
}

fn to_point(p: LatLon) -> Point {
    Point::new(p.lon, p.lat)
}

fn from_point(p: Point) -> LatLon {
    LatLon::new(p.y(), p.x())
}

/// Point at `fraction` of the WGS84 geodesic from `a` to `b`.
pub fn interpolate(a: LatLon, b: LatLon, fraction: f64) -> LatLon {
    from_point(Geodesic.point_at_ratio_between(to_point(a), to_point(b), fraction))
}

/// Point at `fraction` of the spherical great-circle path from `a` to `b`.
pub fn interpolate_great_circle(a: LatLon, b: LatLon, fraction: f64) -> LatLon {
    from_point(Haversine.point_at_ratio_between(to_point(a), to_point(b), fraction))
}

/// Linear blend of latitude and longitude.
pub fn interpolate_linear(a: LatLon, b: LatLon, fraction: f64) -> LatLon {
    LatLon::new(
        a.lat + (b.lat - a.lat) * fraction,
        a.lon + (b.lon - a.lon) * fraction,
    )
}

/// Equirectangular projection to kilometres, centered on
/// [`PROJECTION_REF_LAT_DEG`]. Returns `(x_km, y_km)`.
pub fn project_km(p: LatLon) -> (f64, f64) {
    let lat0 = PROJECTION_REF_LAT_DEG * PI / 180.0;
    let x = p.lon * lat0.cos() * (PI / 180.0) * EARTH_RADIUS_KM;
    let y = p.lat * (PI / 180.0) * EARTH_RADIUS_KM;
    (x, y)
}
