//! Ship-to-ship rendezvous: two vessels holding close range for a sustained
//! period.
//!
//! Observations are bucketed by minute. Any two vessels seen close together
//! in the same bucket start a candidate encounter, which is then followed
//! minute by minute on linearly interpolated positions until the vessels
//! separate, one of them runs out of data, or the two-hour horizon is hit.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::anomaly::types::{
    anomaly_id, AnomalyDetails, AnomalyKind, AnomalyLocation, DetectedAnomaly, RendezvousDetails,
};
use crate::anomaly::vessel_label;
use crate::config::RendezvousConfig;
use crate::geo::GeoPoint;
use crate::model::Track;
use crate::scoring::Confidence;
use crate::zone::ZoneSet;

const BASE_CONFIDENCE: f64 = 0.5;
const BOTH_STOPPED_BONUS: f64 = 0.2;
const OPEN_WATER_BONUS: f64 = 0.2;
const LONG_MEETING_BONUS: f64 = 0.1;

/// Minutes followed per candidate encounter.
const MAX_STEPS: i64 = 120;
const STOPPED_KNOTS: f64 = 1.0;
/// Share of matched minutes with both vessels stopped for `both_stopped`.
const STOPPED_FRACTION: f64 = 0.5;

type PairKey = (String, String);

fn pair_key(a: &str, b: &str) -> PairKey {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Minute bucket -> (track index, point index) observations.
fn build_time_index(tracks: &[&Track]) -> BTreeMap<i64, Vec<(usize, usize)>> {
    let mut index: BTreeMap<i64, Vec<(usize, usize)>> = BTreeMap::new();
    for (ti, track) in tracks.iter().enumerate() {
        for (pi, point) in track.points.iter().enumerate() {
            let bucket = point.timestamp().timestamp().div_euclid(60);
            index.entry(bucket).or_default().push((ti, pi));
        }
    }
    index
}

/// Position and speed of `track` at `t`, interpolated between the bracketing
/// points. `None` outside the track's time span.
fn position_at(track: &Track, t: DateTime<Utc>) -> Option<(GeoPoint, f64)> {
    if t < track.start || t > track.end {
        return None;
    }
    let idx = track.points.partition_point(|p| p.timestamp() <= t);
    let before = track.points.get(idx.checked_sub(1)?)?;
    if before.timestamp() == t {
        return Some((before.position(), before.sog()));
    }
    let after = track.points.get(idx)?;
    let span = (after.timestamp() - before.timestamp()).num_milliseconds() as f64;
    let frac = if span > 0.0 {
        (t - before.timestamp()).num_milliseconds() as f64 / span
    } else {
        0.0
    };
    let position = before.position().lerp(&after.position(), frac);
    let sog = before.sog() + (after.sog() - before.sog()) * frac;
    Some((position, sog))
}

struct Encounter {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    min_distance_m: f64,
    meeting_point: GeoPoint,
    matched: usize,
    stopped: usize,
}

impl Encounter {
    fn duration_minutes(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 60.0
    }

    fn stopped_fraction(&self) -> f64 {
        if self.matched == 0 {
            0.0
        } else {
            self.stopped as f64 / self.matched as f64
        }
    }
}

fn follow_encounter(a: &Track, b: &Track, start: DateTime<Utc>, max_distance_m: f64) -> Option<Encounter> {
    let mut encounter: Option<Encounter> = None;

    for step in 0..=MAX_STEPS {
        let t = start + Duration::minutes(step);
        let (Some((pa, sa)), Some((pb, sb))) = (position_at(a, t), position_at(b, t)) else {
            break;
        };
        let distance = pa.distance_m(&pb);
        if distance > max_distance_m {
            break;
        }

        let e = encounter.get_or_insert(Encounter {
            start: t,
            end: t,
            min_distance_m: distance,
            meeting_point: pa.midpoint(&pb),
            matched: 0,
            stopped: 0,
        });
        e.end = t;
        e.matched += 1;
        if sa < STOPPED_KNOTS && sb < STOPPED_KNOTS {
            e.stopped += 1;
        }
        if distance < e.min_distance_m {
            e.min_distance_m = distance;
            e.meeting_point = pa.midpoint(&pb);
        }
    }

    encounter
}

pub fn detect(tracks: &[&Track], config: &RendezvousConfig, zones: &ZoneSet) -> Vec<DetectedAnomaly> {
    let index = build_time_index(tracks);
    let mut processed: HashSet<PairKey> = HashSet::new();
    // last minute already followed for a pair that did not qualify
    let mut checked_until: HashMap<PairKey, DateTime<Utc>> = HashMap::new();
    let mut anomalies = Vec::new();

    for observations in index.values() {
        let mut first_seen: BTreeMap<usize, usize> = BTreeMap::new();
        for &(ti, pi) in observations {
            first_seen.entry(ti).or_insert(pi);
        }
        if first_seen.len() < 2 {
            continue;
        }
        let seen: Vec<(usize, usize)> = first_seen.into_iter().collect();

        for (i, &(ta, pa)) in seen.iter().enumerate() {
            for &(tb, pb) in &seen[i + 1..] {
                let (a, b) = (tracks[ta], tracks[tb]);
                let key = pair_key(&a.mmsi, &b.mmsi);
                if processed.contains(&key) {
                    continue;
                }

                let (oa, ob) = (&a.points[pa], &b.points[pb]);
                let start = oa.timestamp().max(ob.timestamp());
                if checked_until.get(&key).is_some_and(|until| start <= *until) {
                    continue;
                }
                if oa.position().distance_m(&ob.position()) > config.max_distance_meters {
                    continue;
                }

                let Some(encounter) = follow_encounter(a, b, start, config.max_distance_meters) else {
                    continue;
                };
                if encounter.duration_minutes() < config.min_duration_minutes {
                    checked_until.insert(key, encounter.end);
                    continue;
                }

                debug!(
                    "rendezvous {} / {} for {:.0} minutes",
                    a.mmsi,
                    b.mmsi,
                    encounter.duration_minutes()
                );
                anomalies.push(build_anomaly(a, b, &encounter, config, zones));
                processed.insert(key);
            }
        }
    }

    anomalies
}

fn build_anomaly(
    a: &Track,
    b: &Track,
    encounter: &Encounter,
    config: &RendezvousConfig,
    zones: &ZoneSet,
) -> DetectedAnomaly {
    let duration_minutes = encounter.duration_minutes();
    let stopped_fraction = encounter.stopped_fraction();
    let both_stopped = stopped_fraction >= STOPPED_FRACTION;
    let open_water = zones.is_open_water(
        &encounter.meeting_point,
        config.open_water_min_distance_from_land_km,
    );

    let confidence = Confidence::base(BASE_CONFIDENCE)
        .bonus(both_stopped, BOTH_STOPPED_BONUS)
        .bonus(open_water, OPEN_WATER_BONUS)
        .bonus(duration_minutes >= 2.0 * config.min_duration_minutes, LONG_MEETING_BONUS);

    let mut vessels = vec![a.mmsi.clone(), b.mmsi.clone()];
    vessels.sort();

    DetectedAnomaly {
        id: anomaly_id(AnomalyKind::Rendezvous, &vessels, encounter.start),
        severity: confidence.severity(open_water),
        confidence: confidence.value(),
        timestamp: encounter.start,
        start_time: encounter.start,
        end_time: encounter.end,
        location: AnomalyLocation::Point {
            coordinates: encounter.meeting_point,
        },
        affected_vessels: vessels,
        description: format!(
            "{} and {} stayed within {:.0} m of each other for {:.0} minutes{}{}",
            vessel_label(a),
            vessel_label(b),
            config.max_distance_meters,
            duration_minutes,
            if both_stopped { ", both stopped" } else { "" },
            if open_water { ", in open water" } else { "" },
        ),
        details: AnomalyDetails::Rendezvous(RendezvousDetails {
            duration_minutes,
            min_distance_meters: encounter.min_distance_m,
            meeting_point: encounter.meeting_point,
            both_stopped,
            stopped_fraction,
            open_water,
        }),
    }
}
