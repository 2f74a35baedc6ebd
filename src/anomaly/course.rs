//! Sharp course changes. Never reported near a zone: turning in and out of
//! port is routine.

use crate::anomaly::types::{
    anomaly_id, AnomalyDetails, AnomalyKind, AnomalyLocation, CourseDetails, DetectedAnomaly,
};
use crate::anomaly::vessel_label;
use crate::config::CourseConfig;
use crate::model::Track;
use crate::scoring::Confidence;
use crate::zone::ZoneSet;

const BASE_CONFIDENCE: f64 = 0.5;
const EVASION_BONUS: f64 = 0.2;
const QUICK_TURN_BONUS: f64 = 0.1;
const EVASION_DEGREES: f64 = 90.0;

pub fn detect(track: &Track, config: &CourseConfig, zones: &ZoneSet) -> Vec<DetectedAnomaly> {
    let mut anomalies = Vec::new();

    for pair in track.points.windows(2) {
        let (before, after) = (&pair[0], &pair[1]);
        let elapsed_minutes = after.elapsed_minutes();
        if elapsed_minutes <= 0.0 || elapsed_minutes > config.min_time_window_minutes {
            continue;
        }
        if after.course_change < config.min_deviation_degrees {
            continue;
        }
        if zones.is_near(&after.position(), config.zone_exclusion_km) {
            continue;
        }

        let possible_evasion = after.course_change > EVASION_DEGREES;
        let confidence = Confidence::base(BASE_CONFIDENCE)
            .bonus(possible_evasion, EVASION_BONUS)
            .bonus(
                elapsed_minutes <= config.min_time_window_minutes / 2.0,
                QUICK_TURN_BONUS,
            );

        let vessels = vec![track.mmsi.clone()];
        anomalies.push(DetectedAnomaly {
            id: anomaly_id(AnomalyKind::CourseDeviation, &vessels, after.timestamp()),
            severity: confidence.severity(false),
            confidence: confidence.value(),
            timestamp: after.timestamp(),
            start_time: before.timestamp(),
            end_time: after.timestamp(),
            location: AnomalyLocation::Point {
                coordinates: after.position(),
            },
            affected_vessels: vessels,
            description: format!(
                "{} turned {:.0}° ({:.0}° to {:.0}°) in {:.1} minutes{}",
                vessel_label(track),
                after.course_change,
                before.record.cog,
                after.record.cog,
                elapsed_minutes,
                if possible_evasion { ", possible evasive manoeuvre" } else { "" }
            ),
            details: AnomalyDetails::CourseDeviation(CourseDetails {
                course_before: before.record.cog,
                course_after: after.record.cog,
                change_degrees: after.course_change,
                elapsed_minutes,
                possible_evasion,
            }),
        });
    }

    anomalies
}
