//! Turns raw AIS CSV rows into validated [`PositionRecord`]s.
//!
//! Bad rows are dropped one at a time and tallied in [`IngestStats`]; nothing
//! in here fails because of the content of a single row.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;

use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SeaWatchError};
use crate::geo::GeoPoint;
use crate::model::{PositionRecord, Record};

static LOW_LAT: f64 = 55.5;
static LOW_LON: f64 = 10.3;
static HIGH_LAT: f64 = 58.0;
static HIGH_LON: f64 = 13.0;

/// AIS convention for "heading not available".
const HEADING_UNAVAILABLE: f64 = 511.0;

const MIN_MMSI_LEN: usize = 9;

const TIMESTAMP_FORMATS: [&str; 3] = ["%d/%m/%Y %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Bounding box that accepted positions must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Region {
    pub fn kattegat() -> Self {
        Region {
            min_lat: LOW_LAT,
            min_lon: LOW_LON,
            max_lat: HIGH_LAT,
            max_lon: HIGH_LON,
        }
    }

    pub fn preset(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "kattegat" => Ok(Region::kattegat()),
            _ => Err(SeaWatchError::UnknownRegion(name.to_string())),
        }
    }

    pub fn contains(&self, p: &GeoPoint) -> bool {
        p.lat >= self.min_lat && p.lat <= self.max_lat && p.lon >= self.min_lon && p.lon <= self.max_lon
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingMmsi,
    BadCoordinates,
    OutOfRange,
    BadTimestamp,
    OutsideRegion,
    Unreadable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestStats {
    pub rows_read: usize,
    pub accepted: usize,
    pub rejected: BTreeMap<RejectReason, usize>,
}

impl IngestStats {
    pub fn reject(&mut self, reason: RejectReason) {
        *self.rejected.entry(reason).or_insert(0) += 1;
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    pub fn merge(mut self, other: IngestStats) -> IngestStats {
        self.rows_read += other.rows_read;
        self.accepted += other.accepted;
        for (reason, n) in other.rejected {
            *self.rejected.entry(reason).or_insert(0) += n;
        }
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    region: Option<Region>,
}

impl Normalizer {
    pub fn new(region: Option<Region>) -> Self {
        Normalizer { region }
    }

    /// Validate one row.
    pub fn normalize(&self, record: &Record) -> std::result::Result<PositionRecord, RejectReason> {
        let mmsi = record.mmsi.trim();
        if mmsi.len() < MIN_MMSI_LEN {
            return Err(RejectReason::MissingMmsi);
        }

        let (lat, lon) = match (parse_f64(&record.lat), parse_f64(&record.lon)) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => return Err(RejectReason::BadCoordinates),
        };
        let position = GeoPoint::new(lat, lon);
        if !position.is_valid() {
            return Err(RejectReason::OutOfRange);
        }
        if let Some(region) = &self.region {
            if !region.contains(&position) {
                return Err(RejectReason::OutsideRegion);
            }
        }

        let timestamp = parse_timestamp(&record.timestamp).ok_or(RejectReason::BadTimestamp)?;

        let sog = parse_f64(&record.sog).unwrap_or(0.0);
        let cog = parse_f64(&record.cog).unwrap_or(0.0);
        let heading = match parse_f64(&record.heading).unwrap_or(0.0) {
            h if h == HEADING_UNAVAILABLE => cog,
            h => h,
        };

        Ok(PositionRecord {
            mmsi: mmsi.to_string(),
            imo: text(&record.imo),
            name: text(&record.name),
            callsign: text(&record.callsign),
            ship_type: record.ship_type,
            width_m: parse_f64(&record.width),
            length_m: parse_f64(&record.length),
            timestamp,
            position,
            sog,
            cog,
            heading,
            status: record.status,
            destination: text(&record.destination),
            eta: parse_timestamp(&record.eta),
            cargo_type: text(&record.cargo_type),
        })
    }

    /// Read every row of a headed AIS CSV. Only a failing reader is an error.
    pub fn read_csv<R: Read>(&self, reader: R) -> Result<(Vec<PositionRecord>, IngestStats)> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(reader);

        let mut stats = IngestStats::default();
        let mut records = Vec::new();

        for (row, result) in rdr.deserialize::<Record>().enumerate().skip(1) {
            stats.rows_read += 1;
            let raw = match result {
                Ok(raw) => raw,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    debug!("row {} unreadable: {}", row, e);
                    stats.reject(RejectReason::Unreadable);
                    continue;
                }
            };
            match self.normalize(&raw) {
                Ok(record) => {
                    stats.accepted += 1;
                    records.push(record);
                }
                Err(reason) => {
                    debug!("row {} dropped: {:?}", row, reason);
                    stats.reject(reason);
                }
            }
        }

        Ok((records, stats))
    }

    pub fn load_file(&self, path: &str) -> Result<(Vec<PositionRecord>, IngestStats)> {
        let file = File::open(path).map_err(|source| SeaWatchError::Io {
            path: path.to_string(),
            source,
        })?;
        let (records, stats) = self.read_csv(file)?;
        info!(
            "{} has {} records passed, {} rejected.",
            path,
            stats.accepted,
            stats.rejected_total()
        );
        Ok((records, stats))
    }

    /// Load several files in parallel. A file that cannot be opened is skipped
    /// with a warning; the load fails only when none of them could be read.
    pub fn load_files(&self, paths: &[String]) -> Result<(Vec<PositionRecord>, IngestStats)> {
        let results: Vec<Result<(Vec<PositionRecord>, IngestStats)>> =
            paths.par_iter().map(|p| self.load_file(p)).collect();

        let mut loaded = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(file) => loaded.push(file),
                Err(e) => {
                    warn!("skipping: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }
        if loaded.is_empty() {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        Ok(loaded.into_iter().fold(
            (Vec::new(), IngestStats::default()),
            |(mut all, stats), (records, file_stats)| {
                all.extend(records);
                (all, stats.merge(file_stats))
            },
        ))
    }
}

fn parse_f64(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn text(s: &str) -> Option<String> {
    let s = s.trim();
    match s {
        "" | "Unknown" | "Undefined" => None,
        _ => Some(s.to_string()),
    }
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
