use std::fs;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SeaWatchError};
use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneCategory {
    Port,
    Anchorage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub name: String,
    pub center: GeoPoint,
    pub radius_km: f64,
    pub category: ZoneCategory,
}

impl Zone {
    pub fn new(name: &str, lat: f64, lon: f64, radius_km: f64, category: ZoneCategory) -> Self {
        Zone {
            name: name.to_string(),
            center: GeoPoint::new(lat, lon),
            radius_km,
            category,
        }
    }

    /// Distance from `p` to the zone boundary; zero inside the zone.
    pub fn distance_to_edge_km(&self, p: &GeoPoint) -> f64 {
        (self.center.distance_km(p) - self.radius_km).max(0.0)
    }

    pub fn contains(&self, p: &GeoPoint) -> bool {
        self.center.distance_km(p) <= self.radius_km
    }
}

/// Read-only collection of zones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneSet {
    zones: Vec<Zone>,
}

impl ZoneSet {
    pub fn new(zones: Vec<Zone>) -> Self {
        ZoneSet { zones }
    }

    pub fn empty() -> Self {
        ZoneSet::default()
    }

    /// Major ports and anchorages of the Kattegat and northern Øresund.
    pub fn kattegat() -> Self {
        use ZoneCategory::{Anchorage, Port};
        ZoneSet::new(vec![
            Zone::new("Aarhus", 56.150, 10.230, 3.0, Port),
            Zone::new("Grenaa", 56.410, 10.930, 2.0, Port),
            Zone::new("Frederikshavn", 57.440, 10.550, 2.5, Port),
            Zone::new("Skagen", 57.720, 10.590, 2.0, Port),
            Zone::new("Gothenburg", 57.700, 11.940, 4.0, Port),
            Zone::new("Varberg", 57.110, 12.240, 2.0, Port),
            Zone::new("Halmstad", 56.670, 12.850, 2.0, Port),
            Zone::new("Helsingborg", 56.040, 12.690, 2.5, Port),
            Zone::new("Helsingør", 56.040, 12.610, 1.5, Port),
            Zone::new("Kalundborg", 55.680, 11.090, 2.0, Port),
            Zone::new("Copenhagen", 55.690, 12.600, 4.0, Port),
            Zone::new("Skagen Roads", 57.780, 10.750, 5.0, Anchorage),
            Zone::new("Frederikshavn Roads", 57.460, 10.650, 3.0, Anchorage),
            Zone::new("Vinga Anchorage", 57.630, 11.600, 4.0, Anchorage),
            Zone::new("Aarhus Bay Anchorage", 56.120, 10.400, 3.0, Anchorage),
        ])
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &str) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| SeaWatchError::Io {
            path: path.to_string(),
            source,
        })?;
        ZoneSet::from_json_str(&json)
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// The zone whose boundary is closest to `p`, with that distance.
    pub fn nearest(&self, p: &GeoPoint) -> Option<(&Zone, f64)> {
        self.zones
            .iter()
            .map(|z| (z, z.distance_to_edge_km(p)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// First zone within `km` of `p` (measured to the zone boundary).
    pub fn near(&self, p: &GeoPoint, km: f64) -> Option<&Zone> {
        self.zones.iter().find(|z| z.distance_to_edge_km(p) <= km)
    }

    pub fn is_near(&self, p: &GeoPoint, km: f64) -> bool {
        self.near(p, km).is_some()
    }

    pub fn is_near_category(&self, p: &GeoPoint, km: f64, category: ZoneCategory) -> bool {
        self.zones
            .iter()
            .any(|z| z.category == category && z.distance_to_edge_km(p) <= km)
    }

    /// Open water: farther than `km` from every zone. Trivially true with no zones.
    pub fn is_open_water(&self, p: &GeoPoint, km: f64) -> bool {
        !self.is_near(p, km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_to_edge() {
        let zone = Zone::new("Test", 56.0, 11.0, 5.0, ZoneCategory::Port);
        assert_eq!(zone.distance_to_edge_km(&GeoPoint::new(56.0, 11.0)), 0.0);
        assert_relative_eq!(
            zone.distance_to_edge_km(&GeoPoint::new(56.1, 11.0)),
            6.12,
            epsilon = 0.01
        );
        assert!(zone.contains(&GeoPoint::new(56.02, 11.0)));
    }

    #[test]
    fn test_proximity_queries() {
        let zones = ZoneSet::kattegat();
        let aarhus = GeoPoint::new(56.16, 10.24);
        let mid_kattegat = GeoPoint::new(56.75, 11.75);

        assert_eq!(zones.near(&aarhus, 1.0).map(|z| z.name.as_str()), Some("Aarhus"));
        assert!(zones.is_near_category(&GeoPoint::new(57.78, 10.75), 0.0, ZoneCategory::Anchorage));
        assert!(!zones.is_near_category(&aarhus, 0.0, ZoneCategory::Anchorage));
        assert!(zones.is_open_water(&mid_kattegat, 20.0));
        assert!(ZoneSet::empty().is_open_water(&aarhus, 100.0));
        assert!(zones.nearest(&mid_kattegat).unwrap().1 > 20.0);
    }

    #[test]
    fn test_load_from_json() {
        let zones = ZoneSet::from_json_str(
            r#"[{"name":"Pier","center":[11.0,56.0],"radiusKm":1.5,"category":"anchorage"}]"#,
        )
        .unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones.zones()[0].center, GeoPoint::new(56.0, 11.0));
        assert_eq!(zones.zones()[0].category, ZoneCategory::Anchorage);
        assert!(ZoneSet::from_json_str("{").is_err());
    }
}
