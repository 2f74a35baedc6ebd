use std::io::Write;

use seawatch::anomaly::AnomalyKind;
use seawatch::normalize::RejectReason;
use seawatch::{AnalysisConfig, AnomalyDetector, HotSpotAnalyzer, Normalizer, SeaWatchError, TrackStore, ZoneSet};
use tempfile::NamedTempFile;

const HEADER: &str = "# Timestamp,Type of mobile,MMSI,Latitude,Longitude,Navigational status,ROT,SOG,COG,Heading,IMO,Callsign,Name,Ship type,Cargo type,Width,Length,Type of position fixing device,Draught,Destination,ETA,Data source type,A,B,C,D";

fn row(ts: &str, mmsi: &str, lat: f64, lon: f64, sog: f64, cog: f64) -> String {
    format!(
        "{ts},Class A,{mmsi},{lat},{lon},Under way using engine,0.0,{sog},{cog},511,Unknown,OZ2104,NORD SKAGEN,Cargo,,20,110,GPS,6.0,GOTHENBURG,,AIS,90,20,10,10"
    )
}

fn csv_file(rows: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for r in rows {
        writeln!(file, "{}", r).unwrap();
    }
    file.flush().unwrap();
    file
}

fn path(file: &NamedTempFile) -> String {
    file.path().to_string_lossy().into_owned()
}

#[test]
fn test_file_to_anomalies() {
    let file = csv_file(&[
        row("23/06/2017 00:00:00", "219000001", 56.75, 11.75, 12.0, 0.0),
        row("23/06/2017 01:30:00", "219000001", 57.47, 11.75, 12.0, 0.0),
        row("23/06/2017 00:10:00", "12345", 56.0, 11.0, 5.0, 0.0),
        row("23/06/2017 00:10:00", "219000002", 91.0, 11.0, 5.0, 0.0),
    ]);

    let (records, stats) = Normalizer::default().load_file(&path(&file)).unwrap();
    assert_eq!(stats.rows_read, 4);
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.rejected[&RejectReason::MissingMmsi], 1);
    assert_eq!(stats.rejected[&RejectReason::OutOfRange], 1);

    let store = TrackStore::from_records(records);
    let track = store.get("219000001").unwrap();
    assert_eq!(track.vessel.name.as_deref(), Some("NORD SKAGEN"));
    assert_eq!(track.vessel.imo, None);
    assert_eq!(track.vessel.flag.as_deref(), Some("Denmark"));
    // heading 511 means not available
    assert_eq!(track.points[0].record.heading, 0.0);

    let detector = AnomalyDetector::new(AnalysisConfig::default(), ZoneSet::kattegat());
    let (result, _) = seawatch::analyze(&store, &detector, &HotSpotAnalyzer::default(), 0.1);
    assert_eq!(result.summary.by_type[&AnomalyKind::AisGap], 1);
    assert!(result.ais_gaps[0].description.contains("NORD SKAGEN"));
}

#[test]
fn test_region_drops_outside_rows() {
    let file = csv_file(&[
        row("2017-06-23 00:00:00", "219000001", 56.75, 11.75, 12.0, 0.0),
        row("2017-06-23 00:01:00", "219000001", 40.0, -30.0, 12.0, 0.0),
    ]);
    let normalizer = Normalizer::new(Some(seawatch::Region::kattegat()));
    let (records, stats) = normalizer.load_file(&path(&file)).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(stats.rejected[&RejectReason::OutsideRegion], 1);
}

#[test]
fn test_load_files_merges_counters() {
    let first = csv_file(&[row("23/06/2017 00:00:00", "219000001", 56.75, 11.75, 12.0, 0.0)]);
    let second = csv_file(&[
        row("23/06/2017 00:05:00", "219000001", 56.76, 11.75, 12.0, 0.0),
        row("not a time", "219000001", 56.76, 11.75, 12.0, 0.0),
    ]);

    let (records, stats) = Normalizer::default()
        .load_files(&[path(&first), path(&second)])
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(stats.rows_read, 3);
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.rejected[&RejectReason::BadTimestamp], 1);

    let store = TrackStore::from_records(records);
    assert_eq!(store.vessel_count(), 1);
    assert_eq!(store.point_count(), 2);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.csv").to_string_lossy().into_owned();
    let err = Normalizer::default().load_file(&missing).unwrap_err();
    assert!(matches!(err, SeaWatchError::Io { .. }));
    assert!(Normalizer::default()
        .load_files(&[missing.clone()])
        .is_err());

    // one readable file is enough
    let good = csv_file(&[row("23/06/2017 00:00:00", "219000001", 56.75, 11.75, 12.0, 0.0)]);
    let (records, stats) = Normalizer::default()
        .load_files(&[missing, path(&good)])
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(stats.rows_read, 1);
}
