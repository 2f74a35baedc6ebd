use crate::anomaly::types::{
    anomaly_id, AnomalyDetails, AnomalyKind, AnomalyLocation, DetectedAnomaly, GapDetails,
};
use crate::anomaly::vessel_label;
use crate::config::GapConfig;
use crate::geo::knots_to_kmh;
use crate::model::Track;
use crate::scoring::Confidence;
use crate::zone::ZoneSet;

const BASE_CONFIDENCE: f64 = 0.5;
const CRITICAL_DURATION_BONUS: f64 = 0.2;
const SPOOFING_BONUS: f64 = 0.2;
const OPEN_WATER_BONUS: f64 = 0.1;

pub fn detect(track: &Track, config: &GapConfig, zones: &ZoneSet) -> Vec<DetectedAnomaly> {
    let mut anomalies = Vec::new();

    for pair in track.points.windows(2) {
        let (before, after) = (&pair[0], &pair[1]);
        let gap_minutes = after.elapsed_minutes();
        if gap_minutes < config.min_gap_minutes {
            continue;
        }

        let hours = gap_minutes / 60.0;
        let distance_km = after.distance_km;
        let expected_distance_km = knots_to_kmh(config.typical_speed_knots) * hours;
        let implied_speed_knots = if hours > 0.0 {
            distance_km / knots_to_kmh(1.0) / hours
        } else {
            0.0
        };

        let beyond_plausible = distance_km > config.max_distance_for_spoofing_km;
        let possible_spoofing = beyond_plausible || distance_km > 2.0 * expected_distance_km;

        let near_zone = zones.near(&before.position(), config.zone_proximity_km);
        let open_water = near_zone.is_none();

        // The spoofing bonus keys on the time-independent distance test, so a
        // longer silence over the same distance never scores lower.
        let confidence = Confidence::base(BASE_CONFIDENCE)
            .bonus(gap_minutes >= config.critical_gap_minutes, CRITICAL_DURATION_BONUS)
            .bonus(beyond_plausible, SPOOFING_BONUS)
            .bonus(open_water, OPEN_WATER_BONUS);

        let mut description = format!(
            "{} went dark for {:.0} minutes and reappeared {:.1} km away",
            vessel_label(track),
            gap_minutes,
            distance_km
        );
        if possible_spoofing {
            description.push_str(&format!(
                " (expected at most {:.1} km at {} kn; possible spoofing)",
                expected_distance_km, config.typical_speed_knots
            ));
        }
        match (near_zone, zones.nearest(&before.position())) {
            (Some(zone), _) => description.push_str(&format!(", near {}", zone.name)),
            (None, Some((zone, km))) => {
                description.push_str(&format!(", {:.0} km off {}", km, zone.name))
            }
            (None, None) => {}
        }

        let vessels = vec![track.mmsi.clone()];
        anomalies.push(DetectedAnomaly {
            id: anomaly_id(AnomalyKind::AisGap, &vessels, before.timestamp()),
            severity: confidence.severity(open_water),
            confidence: confidence.value(),
            timestamp: before.timestamp(),
            start_time: before.timestamp(),
            end_time: after.timestamp(),
            location: AnomalyLocation::Path {
                start: before.position(),
                end: after.position(),
            },
            affected_vessels: vessels,
            description,
            details: AnomalyDetails::AisGap(GapDetails {
                gap_minutes,
                distance_km,
                expected_distance_km,
                implied_speed_knots,
                possible_spoofing,
                near_zone: near_zone.map(|z| z.name.clone()),
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

    fn details(a: &DetectedAnomaly) -> &GapDetails {
        match &a.details {
            AnomalyDetails::AisGap(d) => d,
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn test_short_silence_is_not_a_gap() {
        let track = build_track(vec![
            record("219000001", 0, 56.0, 11.0, 10.0, 0.0),
            record("219000001", 20, 56.05, 11.0, 10.0, 0.0),
        ])
        .unwrap();
        assert!(detect(&track, &GapConfig::default(), &ZoneSet::empty()).is_empty());
    }

    #[test]
    fn test_plausible_gap_in_open_water() {
        // 60 minutes, ~11 km: consistent with normal transit
        let track = build_track(vec![
            record("219000001", 0, 56.0, 11.0, 10.0, 0.0),
            record("219000001", 60, 56.1, 11.0, 10.0, 0.0),
        ])
        .unwrap();
        let found = detect(&track, &GapConfig::default(), &ZoneSet::empty());
        assert_eq!(found.len(), 1);
        let gap = &found[0];
        assert!(!details(gap).possible_spoofing);
        assert!((gap.confidence - 0.6).abs() < 1e-9);
        // medium, escalated for open water
        assert_eq!(gap.severity, Severity::High);
    }

    #[test]
    fn test_gap_near_port_is_weaker() {
        let zones = ZoneSet::new(vec![Zone::new("Harbour", 56.0, 11.0, 1.0, ZoneCategory::Port)]);
        let track = build_track(vec![
            record("219000001", 0, 56.0, 11.0, 0.0, 0.0),
            record("219000001", 60, 56.01, 11.0, 0.0, 0.0),
        ])
        .unwrap();
        let found = detect(&track, &GapConfig::default(), &zones);
        assert_eq!(found.len(), 1);
        assert!((found[0].confidence - 0.5).abs() < 1e-9);
        assert_eq!(found[0].severity, Severity::Medium);
        assert_eq!(details(&found[0]).near_zone.as_deref(), Some("Harbour"));
    }

    #[test]
    fn test_open_water_gap_names_closest_zone() {
        let zones = ZoneSet::new(vec![Zone::new("Harbour", 56.0, 11.0, 1.0, ZoneCategory::Port)]);
        let track = build_track(vec![
            record("219000001", 0, 56.5, 11.0, 10.0, 0.0),
            record("219000001", 60, 56.6, 11.0, 10.0, 0.0),
        ])
        .unwrap();
        let found = detect(&track, &GapConfig::default(), &zones);
        assert!(details(&found[0]).near_zone.is_none());
        assert!(found[0].description.ends_with(", 55 km off Harbour"));
    }

    #[test]
    fn test_implied_speed_sets_spoofing_flag() {
        // 30 km in 30 minutes: under the plausibility cap but over 2x expected
        let track = build_track(vec![
            record("219000001", 0, 56.0, 11.0, 10.0, 0.0),
            record("219000001", 30, 56.27, 11.0, 10.0, 0.0),
        ])
        .unwrap();
        let found = detect(&track, &GapConfig::default(), &ZoneSet::empty());
        assert!(details(&found[0]).possible_spoofing);
        assert!(details(&found[0]).implied_speed_knots > 24.0);
    }

    #[test]
    fn test_long_gap_earns_duration_bonus() {
        let track = build_track(vec![
            record("219000001", 0, 56.0, 11.0, 10.0, 0.0),
            record("219000001", 180, 56.2, 11.0, 10.0, 0.0),
        ])
        .unwrap();
        let found = detect(&track, &GapConfig::default(), &ZoneSet::empty());
        assert!((found[0].confidence - 0.8).abs() < 1e-9);
        assert_eq!(found[0].severity, Severity::Critical);
    }
}
