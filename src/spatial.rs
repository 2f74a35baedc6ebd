//! Radius queries over a fixed point set.
//!
//! [`GridIndex`] buckets points into lat/lon cells sized to the query radius
//! so a query only touches nearby cells; [`BruteForceIndex`] scans every
//! point and serves as the reference. Both return the same neighbour sets.

use std::collections::HashMap;

use crate::geo::{GeoPoint, EARTH_RADIUS_KM};

/// Widens cell ranges against rounding at the bounding-box edge.
const SLACK_DEG: f64 = 1e-9;

pub trait SpatialIndex {
    /// Indices of all points within `radius_km` of `center` (inclusive),
    /// in ascending order.
    fn within(&self, center: &GeoPoint, radius_km: f64) -> Vec<usize>;
}

pub struct BruteForceIndex {
    points: Vec<GeoPoint>,
}

impl BruteForceIndex {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        BruteForceIndex { points }
    }
}

impl SpatialIndex for BruteForceIndex {
    fn within(&self, center: &GeoPoint, radius_km: f64) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| center.distance_km(p) <= radius_km)
            .map(|(i, _)| i)
            .collect()
    }
}

pub struct GridIndex {
    points: Vec<GeoPoint>,
    cell_deg: f64,
    lon_cells: i64,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl GridIndex {
    /// `cell_km` should be close to the radius later queries will use.
    pub fn new(points: Vec<GeoPoint>, cell_km: f64) -> Self {
        let approx_deg = (cell_km / EARTH_RADIUS_KM).to_degrees().clamp(1e-4, 360.0);
        // whole number of columns around the globe, so wrapped columns line up
        let lon_cells = (360.0 / approx_deg).ceil() as i64;
        let cell_deg = 360.0 / lon_cells as f64;

        let mut index = GridIndex {
            points: Vec::new(),
            cell_deg,
            lon_cells,
            cells: HashMap::new(),
        };
        for (i, p) in points.iter().enumerate() {
            let key = (index.lat_cell(p.lat), index.lon_cell(p.lon));
            index.cells.entry(key).or_default().push(i);
        }
        index.points = points;
        index
    }

    fn lat_cell(&self, lat: f64) -> i64 {
        ((lat + 90.0) / self.cell_deg).floor() as i64
    }

    fn lon_cell(&self, lon: f64) -> i64 {
        (((lon + 180.0) / self.cell_deg).floor() as i64).rem_euclid(self.lon_cells)
    }

    /// Longitude columns to scan, or `None` for all of them.
    fn lon_columns(&self, center: &GeoPoint, angular_radius: f64) -> Option<Vec<i64>> {
        let lat = center.lat.to_radians();
        let lat_lo = lat - angular_radius;
        let lat_hi = lat + angular_radius;
        if lat_hi >= std::f64::consts::FRAC_PI_2 || lat_lo <= -std::f64::consts::FRAC_PI_2 {
            return None;
        }
        let ratio = angular_radius.sin() / lat.cos();
        if ratio >= 1.0 {
            return None;
        }
        let dlon = ratio.asin().to_degrees() + SLACK_DEG;
        let first = ((center.lon - dlon + 180.0) / self.cell_deg).floor() as i64;
        let last = ((center.lon + dlon + 180.0) / self.cell_deg).floor() as i64;
        if last - first + 1 >= self.lon_cells {
            return None;
        }
        Some((first..=last).map(|c| c.rem_euclid(self.lon_cells)).collect())
    }
}

impl SpatialIndex for GridIndex {
    fn within(&self, center: &GeoPoint, radius_km: f64) -> Vec<usize> {
        let angular_radius = radius_km / EARTH_RADIUS_KM;
        let dlat = angular_radius.to_degrees() + SLACK_DEG;
        let rows = self.lat_cell((center.lat - dlat).max(-90.0))
            ..=self.lat_cell((center.lat + dlat).min(90.0));
        let columns = self
            .lon_columns(center, angular_radius)
            .unwrap_or_else(|| (0..self.lon_cells).collect());

        let mut found: Vec<usize> = Vec::new();
        for row in rows {
            for &col in &columns {
                if let Some(members) = self.cells.get(&(row, col)) {
                    found.extend(
                        members
                            .iter()
                            .copied()
                            .filter(|&i| center.distance_km(&self.points[i]) <= radius_km),
                    );
                }
            }
        }
        found.sort_unstable();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn scatter(n: usize, seed: u64, lat: (f64, f64), lon: (f64, f64)) -> Vec<GeoPoint> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| GeoPoint::new(rng.gen_range(lat.0..lat.1), rng.gen_range(lon.0..lon.1)))
            .collect()
    }

    fn assert_same_neighbours(points: Vec<GeoPoint>, radius_km: f64) {
        let brute = BruteForceIndex::new(points.clone());
        let grid = GridIndex::new(points.clone(), radius_km);
        for p in &points {
            assert_eq!(grid.within(p, radius_km), brute.within(p, radius_km), "at {:?}", p);
        }
    }

    #[test]
    fn test_grid_matches_brute_force() {
        assert_same_neighbours(scatter(300, 7, (54.0, 59.0), (8.0, 14.0)), 50.0);
    }

    #[test]
    fn test_antimeridian_and_high_latitude() {
        assert_same_neighbours(scatter(200, 11, (-10.0, 10.0), (175.0, 180.0)), 100.0);
        let mut wrapped = scatter(100, 13, (-10.0, 10.0), (-180.0, -175.0));
        wrapped.extend(scatter(100, 17, (-10.0, 10.0), (175.0, 180.0)));
        assert_same_neighbours(wrapped, 100.0);
        assert_same_neighbours(scatter(200, 19, (85.0, 90.0), (-180.0, 180.0)), 100.0);
    }

    #[test]
    fn test_includes_self() {
        let points = vec![GeoPoint::new(56.0, 11.0), GeoPoint::new(60.0, 11.0)];
        let grid = GridIndex::new(points.clone(), 100.0);
        assert_eq!(grid.within(&points[0], 100.0), vec![0]);
    }
}
