use std::collections::{BTreeMap, BTreeSet};

use crate::geo::GeoPoint;
use crate::hotspot::MaritimePoint;
use crate::track::TrackStore;

#[derive(Default)]
struct Cell<'a> {
    vessels: BTreeSet<&'a str>,
    points: usize,
    speed_sum: f64,
    length_sum: f64,
    lengths: usize,
}

/// One [`MaritimePoint`] per occupied cell, located at the cell centre.
/// `vessel_count` is the number of distinct vessels seen in the cell.
pub fn aggregate(store: &TrackStore, cell_degrees: f64) -> Vec<MaritimePoint> {
    if cell_degrees <= 0.0 || !cell_degrees.is_finite() {
        return Vec::new();
    }
    let mut cells: BTreeMap<(i64, i64), Cell> = BTreeMap::new();

    for track in store.tracks() {
        for point in &track.points {
            let p = point.position();
            let key = (
                (p.lat / cell_degrees).floor() as i64,
                (p.lon / cell_degrees).floor() as i64,
            );
            let cell = cells.entry(key).or_default();
            cell.vessels.insert(track.mmsi.as_str());
            cell.points += 1;
            cell.speed_sum += point.sog();
            if let Some(length) = track.vessel.length_m {
                cell.length_sum += length;
                cell.lengths += 1;
            }
        }
    }

    cells
        .into_iter()
        .map(|((row, col), cell)| MaritimePoint {
            position: GeoPoint::new(
                (row as f64 + 0.5) * cell_degrees,
                (col as f64 + 0.5) * cell_degrees,
            ),
            vessel_count: cell.vessels.len() as u32,
            average_speed_knots: cell.speed_sum / cell.points as f64,
            average_vessel_length_m: if cell.lengths > 0 {
                cell.length_sum / cell.lengths as f64
            } else {
                0.0
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::tests::record;

    #[test]
    fn test_counts_distinct_vessels_per_cell() {
        let mut long = record("265000001", 0, 56.02, 11.02, 4.0, 0.0);
        long.length_m = Some(120.0);
        let store = TrackStore::from_records(vec![
            record("219000001", 0, 56.01, 11.01, 10.0, 0.0),
            record("219000001", 5, 56.03, 11.01, 12.0, 0.0),
            long,
            record("219000002", 0, 57.5, 12.5, 8.0, 0.0),
        ]);

        let points = aggregate(&store, 0.1);
        assert_eq!(points.len(), 2);

        let busy = &points[0];
        assert_eq!(busy.vessel_count, 2);
        assert!((busy.position.lat - 56.05).abs() < 1e-9);
        assert!((busy.average_speed_knots - 26.0 / 3.0).abs() < 1e-9);
        assert_eq!(busy.average_vessel_length_m, 120.0);
        assert_eq!(points[1].vessel_count, 1);
    }

    #[test]
    fn test_degenerate_cell_size() {
        let store = TrackStore::from_records(vec![record("219000001", 0, 56.0, 11.0, 1.0, 0.0)]);
        assert!(aggregate(&store, 0.0).is_empty());
    }
}
