use crate::anomaly::types::{
    anomaly_id, AnomalyDetails, AnomalyKind, AnomalyLocation, DetectedAnomaly, LoiteringDetails,
};
use crate::anomaly::vessel_label;
use crate::config::LoiteringConfig;
use crate::geo::{centroid, max_radius_km, GeoPoint};
use crate::model::{Track, TrackPoint};
use crate::scoring::Confidence;
use crate::zone::{ZoneCategory, ZoneSet};

const BASE_CONFIDENCE: f64 = 0.5;
const OPEN_WATER_BONUS: f64 = 0.2;
const LONG_DWELL_BONUS: f64 = 0.1;
const MIN_RUN_POINTS: usize = 3;

pub fn detect(track: &Track, config: &LoiteringConfig, zones: &ZoneSet) -> Vec<DetectedAnomaly> {
    let mut anomalies = Vec::new();
    let mut run: Vec<&TrackPoint> = Vec::new();

    for point in &track.points {
        if point.sog() <= config.max_speed_knots {
            run.push(point);
            continue;
        }
        anomalies.extend(evaluate_run(track, &run, config, zones));
        run.clear();
    }
    anomalies.extend(evaluate_run(track, &run, config, zones));

    anomalies
}

fn evaluate_run(
    track: &Track,
    run: &[&TrackPoint],
    config: &LoiteringConfig,
    zones: &ZoneSet,
) -> Option<DetectedAnomaly> {
    if run.len() < MIN_RUN_POINTS {
        return None;
    }
    let (first, last) = (run.first()?, run.last()?);
    let duration_minutes = (last.timestamp() - first.timestamp()).num_seconds() as f64 / 60.0;
    if duration_minutes < config.min_duration_minutes {
        return None;
    }

    let positions: Vec<GeoPoint> = run.iter().map(|p| p.position()).collect();
    let center = centroid(&positions)?;
    let radius_meters = max_radius_km(&center, &positions) * 1000.0;
    if radius_meters > config.max_radius_meters {
        // drifting, not loitering
        return None;
    }

    let near_zone = zones.near(&center, config.port_exclusion_radius_km);
    let near_anchorage =
        zones.is_near_category(&center, config.port_exclusion_radius_km, ZoneCategory::Anchorage);
    let open_water = near_zone.is_none() && !near_anchorage;

    let confidence = Confidence::base(BASE_CONFIDENCE)
        .bonus(open_water, OPEN_WATER_BONUS)
        .bonus(duration_minutes >= 2.0 * config.min_duration_minutes, LONG_DWELL_BONUS);

    let average_speed_knots = run.iter().map(|p| p.sog()).sum::<f64>() / run.len() as f64;

    let place = match near_zone {
        Some(zone) if zone.contains(&center) => format!("inside {}", zone.name),
        Some(zone) => format!("near {}", zone.name),
        None => "in open water".to_string(),
    };
    let vessels = vec![track.mmsi.clone()];

    Some(DetectedAnomaly {
        id: anomaly_id(AnomalyKind::Loitering, &vessels, first.timestamp()),
        severity: confidence.severity(open_water),
        confidence: confidence.value(),
        timestamp: first.timestamp(),
        start_time: first.timestamp(),
        end_time: last.timestamp(),
        location: AnomalyLocation::Point {
            coordinates: center,
        },
        affected_vessels: vessels,
        description: format!(
            "{} loitered {} for {:.0} minutes within {:.0} m",
            vessel_label(track),
            place,
            duration_minutes,
            radius_meters
        ),
        details: AnomalyDetails::Loitering(LoiteringDetails {
            duration_minutes,
            radius_meters,
            point_count: run.len(),
            average_speed_knots,
            near_zone: near_zone.map(|z| z.name.clone()),
            near_anchorage,
        }),
    })
}
