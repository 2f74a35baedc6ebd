//! Detector and analyzer configuration.
//!
//! Every struct is `#[serde(default)]`: a partial JSON document is merged over
//! the documented defaults, and the merged value stays read-only for the
//! whole analysis run.

use std::fs;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SeaWatchError};

/// Master configuration for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    pub gap: GapConfig,
    pub loitering: LoiteringConfig,
    pub rendezvous: RendezvousConfig,
    pub speed: SpeedConfig,
    pub course: CourseConfig,
    pub hot_spot: HotSpotConfig,
}

impl AnalysisConfig {
    /// Merge a (possibly partial) JSON document over the defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &str) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| SeaWatchError::Io {
            path: path.to_string(),
            source,
        })?;
        AnalysisConfig::from_json_str(&json)
    }
}

/// AIS gap (dark vessel) detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GapConfig {
    /// Silence at or above this is a gap.
    pub min_gap_minutes: f64,
    /// Gaps at or above this earn the duration bonus.
    pub critical_gap_minutes: f64,
    /// Distance covered during a gap beyond which spoofing is suspected.
    pub max_distance_for_spoofing_km: f64,
    /// Assumed transit speed for the expected-distance estimate.
    pub typical_speed_knots: f64,
    /// A gap starting this close to a zone counts as near land.
    pub zone_proximity_km: f64,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            min_gap_minutes: 30.0,
            critical_gap_minutes: 120.0,
            max_distance_for_spoofing_km: 50.0,
            typical_speed_knots: 12.0,
            zone_proximity_km: 10.0,
        }
    }
}

/// Loitering detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoiteringConfig {
    pub min_duration_minutes: f64,
    /// Points at or below this speed belong to a stationary run.
    pub max_speed_knots: f64,
    /// Runs spread wider than this are drifting, not loitering.
    pub max_radius_meters: f64,
    pub port_exclusion_radius_km: f64,
}

impl Default for LoiteringConfig {
    fn default() -> Self {
        Self {
            min_duration_minutes: 30.0,
            max_speed_knots: 3.0,
            max_radius_meters: 500.0,
            port_exclusion_radius_km: 5.0,
        }
    }
}

/// Ship-to-ship rendezvous detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RendezvousConfig {
    pub max_distance_meters: f64,
    pub min_duration_minutes: f64,
    pub open_water_min_distance_from_land_km: f64,
}

impl Default for RendezvousConfig {
    fn default() -> Self {
        Self {
            max_distance_meters: 500.0,
            min_duration_minutes: 15.0,
            open_water_min_distance_from_land_km: 20.0,
        }
    }
}

/// Abrupt speed change detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpeedConfig {
    pub min_delta_knots: f64,
    pub min_acceleration_knots_per_min: f64,
    pub zone_proximity_km: f64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            min_delta_knots: 10.0,
            min_acceleration_knots_per_min: 2.0,
            zone_proximity_km: 5.0,
        }
    }
}

/// Sharp course change detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CourseConfig {
    pub min_deviation_degrees: f64,
    /// The change must happen within this many minutes.
    pub min_time_window_minutes: f64,
    /// Course changes this close to a zone are never reported.
    pub zone_exclusion_km: f64,
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            min_deviation_degrees: 60.0,
            min_time_window_minutes: 5.0,
            zone_exclusion_km: 5.0,
        }
    }
}

/// Getis-Ord Gi* hot-spot analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HotSpotConfig {
    /// Neighbourhood radius for the binary spatial weights.
    pub distance_threshold_km: f64,
    /// |Gi*| at or above this is significant (1.96 = 95% two-tailed).
    pub z_threshold: f64,
    /// Trend heuristic: hot spots denser than this are labelled growing.
    pub growing_density: f64,
}

impl Default for HotSpotConfig {
    fn default() -> Self {
        Self {
            distance_threshold_km: 100.0,
            z_threshold: 1.96,
            growing_density: 1.0,
        }
    }
}
