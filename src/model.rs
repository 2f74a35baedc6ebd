use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum NavigationalStatus {
    #[serde(rename = "Unknown value")]
    Unknown,
    #[serde(rename = "Under way using engine")]
    Under,
    #[serde(rename = "Engaged in fishing")]
    Engaged,
    #[serde(rename = "Moored")]
    Moored,
    #[serde(rename = "At anchor")]
    Anchor,
    #[serde(rename = "Restricted maneuverability")]
    Restricted,
    #[serde(rename = "Constrained by her draught")]
    Constrained,
    #[serde(rename = "Not under command")]
    Not,
    #[serde(rename = "Under way sailing")]
    Sailing,
    #[serde(rename = "Aground")]
    Aground,
    #[serde(alias = "Reserved for future use [11]")]
    #[serde(alias = "Reserved for future use [13]")]
    #[serde(alias = "Reserved for future amendment [HSC]")]
    Reserved,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ShipType {
    Tanker,
    Cargo,
    Fishing,
    Passenger,
    Sailing,
    SAR,
    Pleasure,
    Reserved,
    Tug,
    WIG,
    Medical,
    #[serde(alias = "Anti-pollution")]
    AntiPollution,
    Other,
    #[serde(alias = "Towing long/wide")]
    Towing,
    Pilot,
    Dredging,
    Military,
    HSC,
    #[serde(alias = "Law enforcement")]
    Law,
    #[serde(alias = "Port tender")]
    Port,
    #[serde(alias = "Diving")]
    Diving,
    #[serde(alias = "Spare 1")]
    #[serde(alias = "Spare 2")]
    Spare,
    #[serde(other)]
    Undefined,
}

/// One raw CSV row. Everything numeric stays text here so a single bad field
/// drops the row in the normalizer instead of failing the whole file.
#[derive(Debug, Clone, Deserialize)]
//1.	Timestamp			Timestamp from the AIS basestation, format: 31/12/2015 23:59:59
//2.	Type of mobile			Describes what type of target this message is received from (class A AIS Vessel, Class B AIS vessel, etc)
//3.	MMSI				MMSI number of vessel
//4.	Latitude			Latitude of message report (e.g. 57,8794)
//5.	Longitude			Longitude of message report (e.g. 17,9125)
//6.	Navigational status		Navigational status from AIS message if available
//7.	ROT				Rot of turn from AIS message if available
//8.	SOG				Speed over ground from AIS message if available
//9.	COG				Course over ground from AIS message if available
//10.	Heading			Heading from AIS message if available, 511 = not available
//11.	IMO				IMO number of the vessel
//12.	Callsign			Callsign of the vessel
//13.	Name				Name of the vessel
//14.	Ship type			Describes the AIS ship type of this vessel
//15.	Cargo type			Type of cargo from the AIS message
//16.	Width				Width of the vessel
//17.	Length				Length of the vessel
//18.	Type of position fixing device
//19.	Draught			Draught field from AIS message
//20.	Destination			Destination from AIS message
//21.	ETA				Estimated Time of Arrival, if available
//22.	Data source type		Data source type, e.g. AIS
//23-26. Size A-D			Distances from GPS antenna to bow, stern, starboard, port
// example: 23/06/2017 00:44:23,Class A,305484000,56.134323,11.474578,Under way using engine,0.0,6.8,268.1,264,9428217,V2EN3,ICE MOON,Cargo,,24,129,GPS,6.8,AARHUS,23/06/2017 08:00:00,AIS,109,20,12,12
pub struct Record {
    pub timestamp: String,
    pub type_mobile: String,
    pub mmsi: String,
    pub lat: String,
    pub lon: String,
    pub status: NavigationalStatus,
    pub rot: String,
    pub sog: String,
    pub cog: String,
    pub heading: String,
    pub imo: String,
    pub callsign: String,
    pub name: String,
    pub ship_type: ShipType,
    pub cargo_type: String,
    pub width: String,
    pub length: String,
    pub type_device: String,
    pub draught: String,
    pub destination: String,
    pub eta: String,
    pub data_source: String,
    pub a: String,
    pub b: String,
    pub c: String,
    pub d: String,
}

/// A validated position report. Immutable once built by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRecord {
    pub mmsi: String,
    pub imo: Option<String>,
    pub name: Option<String>,
    pub callsign: Option<String>,
    pub ship_type: ShipType,
    pub width_m: Option<f64>,
    pub length_m: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub position: GeoPoint,
    pub sog: f64,
    pub cog: f64,
    pub heading: f64,
    pub status: NavigationalStatus,
    pub destination: Option<String>,
    pub eta: Option<DateTime<Utc>>,
    pub cargo_type: Option<String>,
}

/// A position on a track plus the deltas from the point before it.
/// The first point of a track has all deltas at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPoint {
    pub record: PositionRecord,
    pub elapsed_secs: f64,
    pub distance_km: f64,
    pub course_change: f64,
}

impl TrackPoint {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.record.timestamp
    }

    pub fn position(&self) -> GeoPoint {
        self.record.position
    }

    pub fn sog(&self) -> f64 {
        self.record.sog
    }

    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed_secs / 60.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselMetadata {
    pub mmsi: String,
    pub name: Option<String>,
    pub imo: Option<String>,
    pub callsign: Option<String>,
    pub ship_type: ShipType,
    pub width_m: Option<f64>,
    pub length_m: Option<f64>,
    pub destination: Option<String>,
    pub cargo_type: Option<String>,
    pub flag: Option<String>,
}

/// All points of one vessel in ascending time order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub mmsi: String,
    pub points: Vec<TrackPoint>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub vessel: VesselMetadata,
}
