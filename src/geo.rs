use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate.
///
/// Serialized as a `[lon, lat]` pair, the order map layers expect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 2]", from = "[f64; 2]")]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }

    /// Haversine distance in kilometres.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().min(1.0).asin();

        EARTH_RADIUS_KM * c
    }

    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        self.distance_km(other) * 1000.0
    }

    pub fn midpoint(&self, other: &GeoPoint) -> GeoPoint {
        GeoPoint::new((self.lat + other.lat) / 2.0, (self.lon + other.lon) / 2.0)
    }

    /// Linear interpolation; `t` is clamped to `[0, 1]`.
    pub fn lerp(&self, other: &GeoPoint, t: f64) -> GeoPoint {
        let t = t.clamp(0.0, 1.0);
        GeoPoint::new(
            self.lat + (other.lat - self.lat) * t,
            self.lon + (other.lon - self.lon) * t,
        )
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(p: GeoPoint) -> Self {
        [p.lon, p.lat]
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from(pair: [f64; 2]) -> Self {
        GeoPoint::new(pair[1], pair[0])
    }
}

/// Smallest absolute difference between two bearings, in `[0, 180]`.
pub fn bearing_change(from: f64, to: f64) -> f64 {
    let diff = (to - from).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Arithmetic mean of the coordinates. Good enough for the sub-100 km
/// clusters this crate works with; `None` for an empty slice.
pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lon) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.lat, lon + p.lon));
    Some(GeoPoint::new(lat / n, lon / n))
}

/// Largest distance, in km, from `center` to any of `points`.
pub fn max_radius_km(center: &GeoPoint, points: &[GeoPoint]) -> f64 {
    points
        .iter()
        .map(|p| center.distance_km(p))
        .fold(0.0, f64::max)
}

pub fn knots_to_kmh(knots: f64) -> f64 {
    knots * 1.852
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_one_degree_latitude() {
        let a = GeoPoint::new(56.0, 11.0);
        let b = GeoPoint::new(57.0, 11.0);
        assert_relative_eq!(a.distance_km(&b), 111.19, epsilon = 0.01);
        assert_relative_eq!(a.distance_km(&a), 0.0);
    }

    #[test]
    fn test_bearing_change_wraps() {
        assert_relative_eq!(bearing_change(350.0, 10.0), 20.0);
        assert_relative_eq!(bearing_change(10.0, 350.0), 20.0);
        assert_relative_eq!(bearing_change(0.0, 180.0), 180.0);
        assert_relative_eq!(bearing_change(90.0, 90.0), 0.0);
    }

    #[test]
    fn test_serializes_lon_first() {
        let p = GeoPoint::new(56.5, 11.25);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "[11.25,56.5]");
        let back: GeoPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_centroid_and_radius() {
        let pts = [GeoPoint::new(56.0, 11.0), GeoPoint::new(56.2, 11.0)];
        let c = centroid(&pts).unwrap();
        assert_relative_eq!(c.lat, 56.1, epsilon = 1e-9);
        assert_relative_eq!(max_radius_km(&c, &pts), 11.12, epsilon = 0.01);
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn test_validity() {
        assert!(GeoPoint::new(90.0, -180.0).is_valid());
        assert!(!GeoPoint::new(90.1, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::NAN).is_valid());
    }
}
