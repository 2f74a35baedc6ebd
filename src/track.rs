use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::flag::flag_for_mmsi;
use crate::geo::bearing_change;
use crate::model::{PositionRecord, ShipType, Track, TrackPoint, VesselMetadata};

/// Time span covered by a set of tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Tracks keyed by MMSI. Iteration is in MMSI order.
#[derive(Debug, Clone, Default)]
pub struct TrackStore {
    tracks: BTreeMap<String, Track>,
}

impl TrackStore {
    pub fn from_records(records: Vec<PositionRecord>) -> Self {
        let mut grouped: BTreeMap<String, Vec<PositionRecord>> = BTreeMap::new();
        for record in records {
            grouped.entry(record.mmsi.clone()).or_default().push(record);
        }

        let tracks = grouped
            .into_iter()
            .filter_map(|(mmsi, records)| build_track(records).map(|t| (mmsi, t)))
            .collect();

        TrackStore { tracks }
    }

    /// Add records to the store, rebuilding the tracks they touch.
    pub fn extend(&mut self, records: Vec<PositionRecord>) {
        let mut grouped: BTreeMap<String, Vec<PositionRecord>> = BTreeMap::new();
        for record in records {
            grouped.entry(record.mmsi.clone()).or_default().push(record);
        }
        for (mmsi, mut fresh) in grouped {
            if let Some(existing) = self.tracks.remove(&mmsi) {
                let mut all: Vec<PositionRecord> =
                    existing.points.into_iter().map(|p| p.record).collect();
                all.append(&mut fresh);
                fresh = all;
            }
            if let Some(track) = build_track(fresh) {
                self.tracks.insert(mmsi, track);
            }
        }
    }

    pub fn get(&self, mmsi: &str) -> Option<&Track> {
        self.tracks.get(mmsi)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn as_vec(&self) -> Vec<&Track> {
        self.tracks.values().collect()
    }

    pub fn vessel_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn point_count(&self) -> usize {
        self.tracks.values().map(|t| t.points.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        let start = self.tracks.values().map(|t| t.start).min()?;
        let end = self.tracks.values().map(|t| t.end).max()?;
        Some(TimeRange { start, end })
    }
}

/// Sort one vessel's records and compute the per-step deltas.
/// `None` for an empty input.
pub fn build_track(mut records: Vec<PositionRecord>) -> Option<Track> {
    // stable, so equal timestamps keep input order
    records.sort_by_key(|r| r.timestamp);

    let first = records.first()?;
    let mut vessel = VesselMetadata {
        mmsi: first.mmsi.clone(),
        name: None,
        imo: None,
        callsign: None,
        ship_type: first.ship_type,
        width_m: None,
        length_m: None,
        destination: None,
        cargo_type: None,
        flag: flag_for_mmsi(&first.mmsi).map(str::to_string),
    };
    for record in &records {
        backfill(&mut vessel, record);
    }

    let mut points: Vec<TrackPoint> = Vec::with_capacity(records.len());
    for record in records {
        let point = match points.last() {
            None => TrackPoint {
                record,
                elapsed_secs: 0.0,
                distance_km: 0.0,
                course_change: 0.0,
            },
            Some(prev) => {
                let elapsed_secs =
                    (record.timestamp - prev.record.timestamp).num_milliseconds() as f64 / 1000.0;
                let distance_km = prev.record.position.distance_km(&record.position);
                let course_change = bearing_change(prev.record.cog, record.cog);
                TrackPoint {
                    record,
                    elapsed_secs,
                    distance_km,
                    course_change,
                }
            }
        };
        points.push(point);
    }

    let start = points.first()?.timestamp();
    let end = points.last()?.timestamp();
    Some(Track {
        mmsi: vessel.mmsi.clone(),
        points,
        start,
        end,
        vessel,
    })
}

/// First non-empty value wins for every optional field.
fn backfill(vessel: &mut VesselMetadata, record: &PositionRecord) {
    fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
        if slot.is_none() {
            slot.clone_from(value);
        }
    }
    fill(&mut vessel.name, &record.name);
    fill(&mut vessel.imo, &record.imo);
    fill(&mut vessel.callsign, &record.callsign);
    fill(&mut vessel.width_m, &record.width_m);
    fill(&mut vessel.length_m, &record.length_m);
    fill(&mut vessel.destination, &record.destination);
    fill(&mut vessel.cargo_type, &record.cargo_type);
    if vessel.ship_type == ShipType::Undefined {
        vessel.ship_type = record.ship_type;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::model::NavigationalStatus;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    pub(crate) fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 6, 23, 0, 0, 0).unwrap()
    }

    /// A bare record `minutes` after [`base_time`].
    pub(crate) fn record(mmsi: &str, minutes: i64, lat: f64, lon: f64, sog: f64, cog: f64) -> PositionRecord {
        PositionRecord {
            mmsi: mmsi.to_string(),
            imo: None,
            name: None,
            callsign: None,
            ship_type: ShipType::Undefined,
            width_m: None,
            length_m: None,
            timestamp: base_time() + Duration::minutes(minutes),
            position: GeoPoint::new(lat, lon),
            sog,
            cog,
            heading: cog,
            status: NavigationalStatus::Under,
            destination: None,
            eta: None,
            cargo_type: None,
        }
    }

    #[test]
    fn test_groups_and_sorts() {
        let store = TrackStore::from_records(vec![
            record("219000001", 10, 56.1, 11.0, 10.0, 90.0),
            record("265000001", 0, 57.0, 11.5, 5.0, 0.0),
            record("219000001", 0, 56.0, 11.0, 10.0, 350.0),
        ]);
        assert_eq!(store.vessel_count(), 2);
        assert_eq!(store.point_count(), 3);

        let track = store.get("219000001").unwrap();
        assert_eq!(track.start, base_time());
        assert_eq!(track.end, base_time() + Duration::minutes(10));
        assert_eq!(track.points[0].elapsed_secs, 0.0);
        assert_eq!(track.points[1].elapsed_secs, 600.0);
        assert_relative_eq!(track.points[1].distance_km, 11.12, epsilon = 0.01);
        assert_relative_eq!(track.points[1].course_change, 100.0);
        assert_eq!(track.vessel.flag.as_deref(), Some("Denmark"));
    }

    #[test]
    fn test_metadata_first_non_empty_wins() {
        let mut late = record("219000001", 5, 56.0, 11.0, 0.0, 0.0);
        late.name = Some("EARLY BIRD".into());
        late.imo = Some("9000001".into());
        let mut later = record("219000001", 9, 56.0, 11.0, 0.0, 0.0);
        later.name = Some("RENAMED".into());
        later.ship_type = ShipType::Tanker;

        let track = build_track(vec![later, record("219000001", 0, 56.0, 11.0, 0.0, 0.0), late]).unwrap();
        assert_eq!(track.vessel.name.as_deref(), Some("EARLY BIRD"));
        assert_eq!(track.vessel.imo.as_deref(), Some("9000001"));
        assert_eq!(track.vessel.ship_type, ShipType::Tanker);
    }

    #[test]
    fn test_extend_rebuilds_track() {
        let mut store = TrackStore::from_records(vec![record("219000001", 10, 56.1, 11.0, 10.0, 0.0)]);
        store.extend(vec![record("219000001", 0, 56.0, 11.0, 10.0, 0.0)]);
        let track = store.get("219000001").unwrap();
        assert_eq!(track.points.len(), 2);
        assert_eq!(track.start, base_time());
        assert_eq!(track.points[1].elapsed_secs, 600.0);
        assert!(build_track(Vec::new()).is_none());
    }
}
