//! Traffic hot spots via the Getis-Ord Gi* statistic.
//!
//! Each density point's neighbourhood is every point within the configured
//! distance, itself included, with row-normalized binary weights. Points
//! whose |Gi*| clears the significance threshold seed clusters, which grow by
//! flood fill over same-sign significant neighbours.
//!
//! The trend label is a heuristic on density and cold-spot status, not a
//! comparison against earlier data; `trend_is_heuristic` says so on every
//! result.

use std::collections::VecDeque;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::HotSpotConfig;
use crate::geo::{centroid, max_radius_km, GeoPoint};
use crate::scoring::clamp_unit;
use crate::spatial::{GridIndex, SpatialIndex};

const MIN_POINTS: usize = 3;

/// A pre-aggregated traffic density sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaritimePoint {
    pub position: GeoPoint,
    pub vessel_count: u32,
    pub average_speed_knots: f64,
    pub average_vessel_length_m: f64,
}

impl MaritimePoint {
    pub fn new(lat: f64, lon: f64, vessel_count: u32) -> Self {
        MaritimePoint {
            position: GeoPoint::new(lat, lon),
            vessel_count,
            average_speed_knots: 0.0,
            average_vessel_length_m: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotSpotKind {
    Hot,
    Cold,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Growing,
    Stable,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotSpot {
    pub id: String,
    pub center: GeoPoint,
    pub radius_km: f64,
    pub z_score: f64,
    pub p_value: f64,
    pub confidence: f64,
    /// Vessels per square kilometre over the cluster's disc.
    pub vessel_density: f64,
    pub total_vessels: u64,
    pub point_count: usize,
    pub kind: HotSpotKind,
    pub trend: Trend,
    pub trend_is_heuristic: bool,
}

/// Standard normal CDF (Abramowitz & Stegun 7.1.26 erf approximation).
pub fn normal_cdf(z: f64) -> f64 {
    let x = z.abs() / std::f64::consts::SQRT_2;
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    let erf = 1.0 - poly * (-x * x).exp();
    if z >= 0.0 {
        0.5 * (1.0 + erf)
    } else {
        0.5 * (1.0 - erf)
    }
}

/// Two-tailed p-value for a z-score.
pub fn p_value(z: f64) -> f64 {
    clamp_unit(2.0 * (1.0 - normal_cdf(z.abs())))
}

#[derive(Debug, Clone, Default)]
pub struct HotSpotAnalyzer {
    config: HotSpotConfig,
}

impl HotSpotAnalyzer {
    pub fn new(config: HotSpotConfig) -> Self {
        HotSpotAnalyzer { config }
    }

    pub fn config(&self) -> &HotSpotConfig {
        &self.config
    }

    pub fn analyze(&self, points: &[MaritimePoint]) -> Vec<HotSpot> {
        let index = GridIndex::new(
            points.iter().map(|p| p.position).collect(),
            self.config.distance_threshold_km,
        );
        self.analyze_with(points, &index)
    }

    /// Same as [`analyze`](Self::analyze) with a caller-supplied index over
    /// the same points, in the same order.
    pub fn analyze_with<I: SpatialIndex>(&self, points: &[MaritimePoint], index: &I) -> Vec<HotSpot> {
        if points.len() < MIN_POINTS {
            return Vec::new();
        }
        let neighbours = self.neighbours(points, index);
        let z = gi_star(points, &neighbours);
        let hot_spots = self.extract_clusters(points, &neighbours, &z);
        debug!("{} density points -> {} hot/cold spots", points.len(), hot_spots.len());
        hot_spots
    }

    fn neighbours<I: SpatialIndex>(&self, points: &[MaritimePoint], index: &I) -> Vec<Vec<usize>> {
        points
            .iter()
            .map(|p| index.within(&p.position, self.config.distance_threshold_km))
            .collect()
    }

    fn extract_clusters(&self, points: &[MaritimePoint], neighbours: &[Vec<usize>], z: &[f64]) -> Vec<HotSpot> {
        let significant: Vec<bool> = z.iter().map(|v| v.abs() >= self.config.z_threshold).collect();

        let mut seeds: Vec<usize> = (0..points.len()).filter(|&i| significant[i]).collect();
        seeds.sort_by(|&a, &b| z[b].abs().total_cmp(&z[a].abs()).then(a.cmp(&b)));

        let mut visited = vec![false; points.len()];
        let mut hot_spots = Vec::new();

        for seed in seeds {
            if visited[seed] {
                continue;
            }
            let positive = z[seed] > 0.0;
            let mut members = vec![seed];
            let mut queue = VecDeque::from([seed]);
            visited[seed] = true;

            while let Some(i) = queue.pop_front() {
                for &j in &neighbours[i] {
                    if !visited[j] && significant[j] && (z[j] > 0.0) == positive {
                        visited[j] = true;
                        members.push(j);
                        queue.push_back(j);
                    }
                }
            }

            hot_spots.push(self.build_hot_spot(points, &members, z));
        }

        hot_spots
    }

    fn build_hot_spot(&self, points: &[MaritimePoint], members: &[usize], z: &[f64]) -> HotSpot {
        let positions: Vec<GeoPoint> = members.iter().map(|&i| points[i].position).collect();
        let center = centroid(&positions).unwrap_or(positions[0]);
        let radius_km = max_radius_km(&center, &positions);
        let total_vessels: u64 = members.iter().map(|&i| u64::from(points[i].vessel_count)).sum();
        let area = std::f64::consts::PI * radius_km * radius_km;
        let vessel_density = if area > 0.0 { total_vessels as f64 / area } else { 0.0 };

        let z_score = members.iter().map(|&i| z[i]).sum::<f64>() / members.len() as f64;
        let p = p_value(z_score);
        let kind = if z_score > 0.0 {
            HotSpotKind::Hot
        } else if z_score < 0.0 {
            HotSpotKind::Cold
        } else {
            HotSpotKind::Neutral
        };
        let trend = match kind {
            HotSpotKind::Cold => Trend::Declining,
            _ if vessel_density > self.config.growing_density => Trend::Growing,
            _ => Trend::Stable,
        };

        HotSpot {
            id: format!(
                "hotspot-{:?}-{:.4}-{:.4}",
                kind, center.lat, center.lon
            )
            .to_lowercase(),
            center,
            radius_km,
            z_score,
            p_value: p,
            confidence: clamp_unit(1.0 - p),
            vessel_density,
            total_vessels,
            point_count: members.len(),
            kind,
            trend,
            trend_is_heuristic: true,
        }
    }
}

/// Gi* per point from row-normalized binary weights over `neighbours`.
/// A zero denominator gives a zero statistic.
pub fn gi_star(points: &[MaritimePoint], neighbours: &[Vec<usize>]) -> Vec<f64> {
    let n = points.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let values: Vec<f64> = points.iter().map(|p| f64::from(p.vessel_count)).collect();
    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let std_dev = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / nf).sqrt();

    neighbours
        .iter()
        .map(|row| {
            if row.is_empty() {
                return 0.0;
            }
            let w = 1.0 / row.len() as f64;
            let sum_w = w * row.len() as f64;
            let sum_w2 = w * w * row.len() as f64;
            let weighted: f64 = row.iter().map(|&j| w * values[j]).sum();

            let numerator = weighted - mean * sum_w;
            let variance_term = (nf * sum_w2 - sum_w * sum_w) / (nf - 1.0);
            let denominator = std_dev * variance_term.max(0.0).sqrt();
            if denominator <= f64::EPSILON || !denominator.is_finite() {
                0.0
            } else {
                numerator / denominator
            }
        })
        .collect()
}
