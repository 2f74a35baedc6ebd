//! Maritime track analysis for AIS position reports.
//!
//! Raw CSV rows go through the [`normalize`] step into per-vessel tracks
//! ([`track`]), which the [`anomaly`] detectors scan for transponder gaps,
//! loitering, rendezvous, speed and course anomalies. Separately, the
//! [`hotspot`] analyzer finds statistically significant traffic clusters in
//! aggregated density points.

pub mod anomaly;
pub mod config;
pub mod density;
pub mod error;
pub mod flag;
pub mod geo;
pub mod hotspot;
pub mod model;
pub mod normalize;
pub mod scoring;
pub mod spatial;
pub mod track;
pub mod zone;

use std::io::Write;

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, Command};
use log::info;
use serde::Serialize;

pub use anomaly::{AnomalyAnalysisResult, AnomalyDetector, DetectedAnomaly};
pub use config::AnalysisConfig;
pub use error::SeaWatchError;
pub use hotspot::{HotSpot, HotSpotAnalyzer, MaritimePoint};
pub use normalize::{IngestStats, Normalizer, Region};
pub use scoring::Severity;
pub use track::TrackStore;
pub use zone::{Zone, ZoneCategory, ZoneSet};

const DEFAULT_CELL_DEGREES: f64 = 0.1;

#[derive(Debug)]
pub struct Config {
    paths: Vec<String>,
    config_path: Option<String>,
    zones_path: Option<String>,
    region: Option<String>,
    cell_degrees: f64,
    pretty: bool,
}

pub fn get_arg() -> Result<Config> {
    let matches = Command::new("seawatch")
        .version("0.1")
        .about("detect vessel anomalies and traffic hot spots in AIS csv files")
        .arg(
            Arg::new("paths")
                .short('f')
                .long("file-path")
                .action(ArgAction::Append)
                .required(true)
                .help("AIS csv file to analyze, may be repeated"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("json file overriding detector defaults"),
        )
        .arg(
            Arg::new("zones")
                .short('z')
                .long("zones")
                .help("json file of port/anchorage zones (default: built-in Kattegat set)"),
        )
        .arg(
            Arg::new("region")
                .short('r')
                .long("region")
                .help("drop positions outside a named region, e.g. kattegat"),
        )
        .arg(
            Arg::new("cell-degrees")
                .long("cell-degrees")
                .value_parser(value_parser!(f64))
                .default_value("0.1")
                .help("grid cell size for hot-spot density aggregation"),
        )
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .action(ArgAction::SetTrue)
                .help("pretty-print the json report"),
        )
        .get_matches();

    let files = matches
        .get_many::<String>("paths")
        .unwrap_or_default()
        .cloned()
        .collect::<Vec<String>>();

    Ok(Config {
        paths: files,
        config_path: matches.get_one::<String>("config").cloned(),
        zones_path: matches.get_one::<String>("zones").cloned(),
        region: matches.get_one::<String>("region").cloned(),
        cell_degrees: matches
            .get_one::<f64>("cell-degrees")
            .copied()
            .unwrap_or(DEFAULT_CELL_DEGREES),
        pretty: matches.get_flag("pretty"),
    })
}

/// Everything one run produces.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub ingest: IngestStats,
    pub anomalies: AnomalyAnalysisResult,
    pub hot_spots: Vec<HotSpot>,
}

/// Run both analyses over an already built store. They share nothing and
/// run side by side.
pub fn analyze(
    store: &TrackStore,
    detector: &AnomalyDetector,
    analyzer: &HotSpotAnalyzer,
    cell_degrees: f64,
) -> (AnomalyAnalysisResult, Vec<HotSpot>) {
    rayon::join(
        || detector.analyze(store),
        || analyzer.analyze(&density::aggregate(store, cell_degrees)),
    )
}

pub fn run(config: Config) -> Result<()> {
    info!("config is {:?}", config);

    let region = config.region.as_deref().map(Region::preset).transpose()?;
    let analysis_config = match &config.config_path {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    let zones = match &config.zones_path {
        Some(path) => ZoneSet::load(path)?,
        None => ZoneSet::kattegat(),
    };

    let (records, ingest) = Normalizer::new(region).load_files(&config.paths)?;
    let store = TrackStore::from_records(records);
    info!(
        "{} records accepted into {} tracks",
        ingest.accepted,
        store.vessel_count()
    );

    let detector = AnomalyDetector::new(analysis_config, zones);
    let analyzer = HotSpotAnalyzer::new(detector.config().hot_spot.clone());
    let (anomalies, hot_spots) = analyze(&store, &detector, &analyzer, config.cell_degrees);

    let report = Report {
        ingest,
        anomalies,
        hot_spots,
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if config.pretty {
        serde_json::to_writer_pretty(&mut out, &report)?;
    } else {
        serde_json::to_writer(&mut out, &report)?;
    }
    writeln!(out)?;

    Ok(())
}
