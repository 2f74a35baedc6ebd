use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::geo::GeoPoint;
use crate::scoring::Severity;
use crate::track::TimeRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    AisGap,
    Loitering,
    Rendezvous,
    SpeedAnomaly,
    CourseDeviation,
}

impl AnomalyKind {
    pub const ALL: [AnomalyKind; 5] = [
        AnomalyKind::AisGap,
        AnomalyKind::Loitering,
        AnomalyKind::Rendezvous,
        AnomalyKind::SpeedAnomaly,
        AnomalyKind::CourseDeviation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::AisGap => "AIS_GAP",
            AnomalyKind::Loitering => "LOITERING",
            AnomalyKind::Rendezvous => "RENDEZVOUS",
            AnomalyKind::SpeedAnomaly => "SPEED_ANOMALY",
            AnomalyKind::CourseDeviation => "COURSE_DEVIATION",
        }
    }
}

/// Deterministic anomaly id: the same inputs always give the same id.
pub fn anomaly_id(kind: AnomalyKind, vessels: &[String], at: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{}",
        kind.as_str().to_ascii_lowercase(),
        vessels.join("-"),
        at.timestamp_millis()
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnomalyLocation {
    Point { coordinates: GeoPoint },
    Path { start: GeoPoint, end: GeoPoint },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapDetails {
    pub gap_minutes: f64,
    pub distance_km: f64,
    pub expected_distance_km: f64,
    pub implied_speed_knots: f64,
    pub possible_spoofing: bool,
    pub near_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoiteringDetails {
    pub duration_minutes: f64,
    pub radius_meters: f64,
    pub point_count: usize,
    pub average_speed_knots: f64,
    pub near_zone: Option<String>,
    pub near_anchorage: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendezvousDetails {
    pub duration_minutes: f64,
    pub min_distance_meters: f64,
    pub meeting_point: GeoPoint,
    pub both_stopped: bool,
    pub stopped_fraction: f64,
    pub open_water: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedDetails {
    pub speed_before_knots: f64,
    pub speed_after_knots: f64,
    pub delta_knots: f64,
    pub acceleration_knots_per_min: f64,
    pub elapsed_minutes: f64,
    pub near_zone: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetails {
    pub course_before: f64,
    pub course_after: f64,
    pub change_degrees: f64,
    pub elapsed_minutes: f64,
    pub possible_evasion: bool,
}

/// Per-kind payload, tagged by the anomaly type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "metadata", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyDetails {
    AisGap(GapDetails),
    Loitering(LoiteringDetails),
    Rendezvous(RendezvousDetails),
    SpeedAnomaly(SpeedDetails),
    CourseDeviation(CourseDetails),
}

impl AnomalyDetails {
    pub fn kind(&self) -> AnomalyKind {
        match self {
            AnomalyDetails::AisGap(_) => AnomalyKind::AisGap,
            AnomalyDetails::Loitering(_) => AnomalyKind::Loitering,
            AnomalyDetails::Rendezvous(_) => AnomalyKind::Rendezvous,
            AnomalyDetails::SpeedAnomaly(_) => AnomalyKind::SpeedAnomaly,
            AnomalyDetails::CourseDeviation(_) => AnomalyKind::CourseDeviation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedAnomaly {
    pub id: String,
    pub severity: Severity,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: AnomalyLocation,
    pub affected_vessels: Vec<String>,
    pub description: String,
    #[serde(flatten)]
    pub details: AnomalyDetails,
}

impl DetectedAnomaly {
    pub fn kind(&self) -> AnomalyKind {
        self.details.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalySummary {
    pub total: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_type: BTreeMap<AnomalyKind, usize>,
    /// Vessels implicated in two or more anomalies, sorted.
    pub high_risk_vessels: Vec<String>,
}

impl AnomalySummary {
    pub fn from_anomalies<'a>(anomalies: impl Iterator<Item = &'a DetectedAnomaly>) -> Self {
        let mut by_severity: BTreeMap<Severity, usize> = [
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ]
        .into_iter()
        .map(|s| (s, 0))
        .collect();
        let mut by_type: BTreeMap<AnomalyKind, usize> =
            AnomalyKind::ALL.into_iter().map(|k| (k, 0)).collect();
        let mut per_vessel: BTreeMap<&str, usize> = BTreeMap::new();
        let mut total = 0;

        for anomaly in anomalies {
            total += 1;
            *by_severity.entry(anomaly.severity).or_insert(0) += 1;
            *by_type.entry(anomaly.kind()).or_insert(0) += 1;
            // a vessel counts once per anomaly
            let vessels: BTreeSet<&str> =
                anomaly.affected_vessels.iter().map(String::as_str).collect();
            for vessel in vessels {
                *per_vessel.entry(vessel).or_insert(0) += 1;
            }
        }

        let high_risk_vessels = per_vessel
            .into_iter()
            .filter(|(_, n)| *n >= 2)
            .map(|(v, _)| v.to_string())
            .collect();

        AnomalySummary {
            total,
            by_severity,
            by_type,
            high_risk_vessels,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyAnalysisResult {
    pub time_range: Option<TimeRange>,
    pub vessel_count: usize,
    pub point_count: usize,
    pub ais_gaps: Vec<DetectedAnomaly>,
    pub loitering: Vec<DetectedAnomaly>,
    pub rendezvous: Vec<DetectedAnomaly>,
    pub speed_anomalies: Vec<DetectedAnomaly>,
    pub course_deviations: Vec<DetectedAnomaly>,
    pub summary: AnomalySummary,
    pub config: AnalysisConfig,
    pub processing_time_ms: u64,
}

impl AnomalyAnalysisResult {
    pub fn all(&self) -> impl Iterator<Item = &DetectedAnomaly> {
        self.ais_gaps
            .iter()
            .chain(&self.loitering)
            .chain(&self.rendezvous)
            .chain(&self.speed_anomalies)
            .chain(&self.course_deviations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(vessels: &[&str], severity: Severity) -> DetectedAnomaly {
        let at = Utc.with_ymd_and_hms(2017, 6, 23, 1, 0, 0).unwrap();
        let vessels: Vec<String> = vessels.iter().map(|v| v.to_string()).collect();
        DetectedAnomaly {
            id: anomaly_id(AnomalyKind::CourseDeviation, &vessels, at),
            severity,
            confidence: 0.6,
            timestamp: at,
            start_time: at,
            end_time: at,
            location: AnomalyLocation::Point {
                coordinates: GeoPoint::new(56.0, 11.0),
            },
            affected_vessels: vessels,
            description: "turn".into(),
            details: AnomalyDetails::CourseDeviation(CourseDetails {
                course_before: 0.0,
                course_after: 95.0,
                change_degrees: 95.0,
                elapsed_minutes: 1.0,
                possible_evasion: true,
            }),
        }
    }

    #[test]
    fn test_id_is_deterministic() {
        let a = sample(&["219000001"], Severity::Low);
        assert_eq!(a.id, "course_deviation-219000001-1498179600000");
        assert_eq!(a.id, sample(&["219000001"], Severity::High).id);
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(sample(&["219000001"], Severity::Medium)).unwrap();
        assert_eq!(json["type"], "COURSE_DEVIATION");
        assert_eq!(json["severity"], "medium");
        assert_eq!(json["metadata"]["possibleEvasion"], true);
        assert_eq!(json["location"]["kind"], "point");
        assert_eq!(json["location"]["coordinates"][0], 11.0);
        assert_eq!(json["startTime"], "2017-06-23T01:00:00Z");
    }

    #[test]
    fn test_summary_counts_and_high_risk() {
        let anomalies = [
            sample(&["219000001"], Severity::High),
            sample(&["219000001", "265000001"], Severity::Critical),
            sample(&["265000002"], Severity::Low),
        ];
        let summary = AnomalySummary::from_anomalies(anomalies.iter());
        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_severity[&Severity::Critical], 1);
        assert_eq!(summary.by_severity[&Severity::Medium], 0);
        assert_eq!(summary.by_type[&AnomalyKind::CourseDeviation], 3);
        assert_eq!(summary.by_type[&AnomalyKind::AisGap], 0);
        assert_eq!(summary.high_risk_vessels, vec!["219000001".to_string()]);
    }
}
