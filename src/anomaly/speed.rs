use crate::anomaly::types::{
    anomaly_id, AnomalyDetails, AnomalyKind, AnomalyLocation, DetectedAnomaly, SpeedDetails,
};
use crate::anomaly::vessel_label;
use crate::config::SpeedConfig;
use crate::model::Track;
use crate::scoring::Confidence;
use crate::zone::ZoneSet;

const BASE_CONFIDENCE: f64 = 0.5;
const OPEN_WATER_BONUS: f64 = 0.2;
const LARGE_DELTA_BONUS: f64 = 0.2;
const HARD_ACCELERATION_BONUS: f64 = 0.1;

pub fn detect(track: &Track, config: &SpeedConfig, zones: &ZoneSet) -> Vec<DetectedAnomaly> {
    let mut anomalies = Vec::new();

    for pair in track.points.windows(2) {
        let (before, after) = (&pair[0], &pair[1]);
        let elapsed_minutes = after.elapsed_minutes();
        if elapsed_minutes <= 0.0 {
            continue;
        }
        let delta_knots = (after.sog() - before.sog()).abs();
        let acceleration = delta_knots / elapsed_minutes;
        if delta_knots < config.min_delta_knots || acceleration < config.min_acceleration_knots_per_min {
            continue;
        }

        let near_zone = zones.is_near(&after.position(), config.zone_proximity_km);
        let confidence = Confidence::base(BASE_CONFIDENCE)
            .bonus(!near_zone, OPEN_WATER_BONUS)
            .bonus(delta_knots >= 2.0 * config.min_delta_knots, LARGE_DELTA_BONUS)
            .bonus(
                acceleration >= 2.0 * config.min_acceleration_knots_per_min,
                HARD_ACCELERATION_BONUS,
            );

        let verb = if after.sog() > before.sog() { "accelerated" } else { "slowed" };
        let vessels = vec![track.mmsi.clone()];
        anomalies.push(DetectedAnomaly {
            id: anomaly_id(AnomalyKind::SpeedAnomaly, &vessels, after.timestamp()),
            severity: confidence.severity(false),
            confidence: confidence.value(),
            timestamp: after.timestamp(),
            start_time: before.timestamp(),
            end_time: after.timestamp(),
            location: AnomalyLocation::Path {
                start: before.position(),
                end: after.position(),
            },
            affected_vessels: vessels,
            description: format!(
                "{} {} from {:.1} to {:.1} kn in {:.1} minutes",
                vessel_label(track),
                verb,
                before.sog(),
                after.sog(),
                elapsed_minutes
            ),
            details: AnomalyDetails::SpeedAnomaly(SpeedDetails {
                speed_before_knots: before.sog(),
                speed_after_knots: after.sog(),
                delta_knots,
                acceleration_knots_per_min: acceleration,
                elapsed_minutes,
                near_zone,
            }),
        });
    }

    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Severity;
    use crate::track::build_track;
    use crate::track::tests::record;
    use crate::zone::{Zone, ZoneCategory};

    #[test]
    fn test_sudden_stop_in_open_water() {
        let track = build_track(vec![
            record("219000001", 0, 56.0, 11.0, 22.0, 0.0),
            record("219000001", 2, 56.01, 11.0, 0.5, 0.0),
        ])
        .unwrap();
        let found = detect(&track, &SpeedConfig::default(), &ZoneSet::empty());
        assert_eq!(found.len(), 1);
        // open water, delta >= 20, acceleration >= 4
        assert!((found[0].confidence - 1.0).abs() < 1e-9);
        assert_eq!(found[0].severity, Severity::Critical);
        assert!(found[0].description.contains("slowed"));
    }

    #[test]
    fn test_both_thresholds_required() {
        // large delta but spread over 20 minutes
        let gradual = build_track(vec![
            record("219000001", 0, 56.0, 11.0, 20.0, 0.0),
            record("219000001", 20, 56.1, 11.0, 5.0, 0.0),
        ])
        .unwrap();
        assert!(detect(&gradual, &SpeedConfig::default(), &ZoneSet::empty()).is_empty());

        // quick but small change
        let small = build_track(vec![
            record("219000001", 0, 56.0, 11.0, 10.0, 0.0),
            record("219000001", 1, 56.0, 11.0, 14.0, 0.0),
        ])
        .unwrap();
        assert!(detect(&small, &SpeedConfig::default(), &ZoneSet::empty()).is_empty());
    }

    #[test]
    fn test_near_port_loses_bonus() {
        let zones = ZoneSet::new(vec![Zone::new("Quay", 56.0, 11.0, 1.0, ZoneCategory::Port)]);
        let track = build_track(vec![
            record("219000001", 0, 56.0, 11.0, 12.0, 0.0),
            record("219000001", 5, 56.0, 11.0, 0.0, 0.0),
        ])
        .unwrap();
        let found = detect(&track, &SpeedConfig::default(), &zones);
        assert_eq!(found.len(), 1);
        assert!((found[0].confidence - 0.5).abs() < 1e-9);
        assert_eq!(found[0].severity, Severity::Medium);
    }
}
