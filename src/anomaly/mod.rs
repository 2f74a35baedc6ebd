//! Per-vessel and multi-vessel anomaly detection.
//!
//! [`AnomalyDetector`] owns its configuration and reference zones. The four
//! per-track detectors fan out across vessels with `rayon`; the rendezvous
//! pass needs every track at once and runs alongside them.

pub mod course;
pub mod gap;
pub mod loitering;
pub mod rendezvous;
pub mod speed;
pub mod types;

use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;

pub use types::*;

use crate::config::AnalysisConfig;
use crate::model::Track;
use crate::track::TrackStore;
use crate::zone::ZoneSet;

/// Display name for descriptions: vessel name when known, else MMSI.
pub(crate) fn vessel_label(track: &Track) -> String {
    match &track.vessel.name {
        Some(name) => format!("{} ({})", name, track.mmsi),
        None => format!("MMSI {}", track.mmsi),
    }
}

#[derive(Debug, Default)]
struct TrackAnomalies {
    ais_gaps: Vec<DetectedAnomaly>,
    loitering: Vec<DetectedAnomaly>,
    speed_anomalies: Vec<DetectedAnomaly>,
    course_deviations: Vec<DetectedAnomaly>,
}

impl TrackAnomalies {
    fn merge(mut self, mut other: TrackAnomalies) -> TrackAnomalies {
        self.ais_gaps.append(&mut other.ais_gaps);
        self.loitering.append(&mut other.loitering);
        self.speed_anomalies.append(&mut other.speed_anomalies);
        self.course_deviations.append(&mut other.course_deviations);
        self
    }
}

#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    config: AnalysisConfig,
    zones: ZoneSet,
}

impl AnomalyDetector {
    pub fn new(config: AnalysisConfig, zones: ZoneSet) -> Self {
        AnomalyDetector { config, zones }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn zones(&self) -> &ZoneSet {
        &self.zones
    }

    pub fn detect_gaps(&self, track: &Track) -> Vec<DetectedAnomaly> {
        gap::detect(track, &self.config.gap, &self.zones)
    }

    pub fn detect_loitering(&self, track: &Track) -> Vec<DetectedAnomaly> {
        loitering::detect(track, &self.config.loitering, &self.zones)
    }

    pub fn detect_speed_anomalies(&self, track: &Track) -> Vec<DetectedAnomaly> {
        speed::detect(track, &self.config.speed, &self.zones)
    }

    pub fn detect_course_deviations(&self, track: &Track) -> Vec<DetectedAnomaly> {
        course::detect(track, &self.config.course, &self.zones)
    }

    pub fn detect_rendezvous(&self, tracks: &[&Track]) -> Vec<DetectedAnomaly> {
        rendezvous::detect(tracks, &self.config.rendezvous, &self.zones)
    }

    fn detect_track(&self, track: &Track) -> TrackAnomalies {
        TrackAnomalies {
            ais_gaps: self.detect_gaps(track),
            loitering: self.detect_loitering(track),
            speed_anomalies: self.detect_speed_anomalies(track),
            course_deviations: self.detect_course_deviations(track),
        }
    }

    /// Run every detector over `store`.
    pub fn analyze(&self, store: &TrackStore) -> AnomalyAnalysisResult {
        let started = Instant::now();
        let tracks = store.as_vec();

        let (per_track, mut rendezvous) = rayon::join(
            || {
                tracks
                    .par_iter()
                    .map(|t| self.detect_track(t))
                    .reduce(TrackAnomalies::default, TrackAnomalies::merge)
            },
            || self.detect_rendezvous(&tracks),
        );

        let TrackAnomalies {
            mut ais_gaps,
            mut loitering,
            mut speed_anomalies,
            mut course_deviations,
        } = per_track;
        for list in [
            &mut ais_gaps,
            &mut loitering,
            &mut rendezvous,
            &mut speed_anomalies,
            &mut course_deviations,
        ] {
            list.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        }

        debug!(
            "gaps={} loitering={} rendezvous={} speed={} course={}",
            ais_gaps.len(),
            loitering.len(),
            rendezvous.len(),
            speed_anomalies.len(),
            course_deviations.len()
        );

        let summary = AnomalySummary::from_anomalies(
            ais_gaps
                .iter()
                .chain(&loitering)
                .chain(&rendezvous)
                .chain(&speed_anomalies)
                .chain(&course_deviations),
        );
        let processing_time_ms = started.elapsed().as_millis() as u64;
        info!(
            "analyzed {} vessels / {} points: {} anomalies in {} ms",
            store.vessel_count(),
            store.point_count(),
            summary.total,
            processing_time_ms
        );

        AnomalyAnalysisResult {
            time_range: store.time_range(),
            vessel_count: store.vessel_count(),
            point_count: store.point_count(),
            ais_gaps,
            loitering,
            rendezvous,
            speed_anomalies,
            course_deviations,
            summary,
            config: self.config.clone(),
            processing_time_ms,
        }
    }
}
