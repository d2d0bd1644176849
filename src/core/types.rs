//! Core data types shared by the map view, the feeds and the API layer

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

impl LatLng {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Visible area of the map, given by its south-west and north-east corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self { south_west, north_east }
    }

    /// Bounds of a box centered on `center` spanning the given degrees
    pub fn around(center: LatLng, lat_span: f64, lon_span: f64) -> Self {
        Self {
            south_west: LatLng::new(center.lat - lat_span / 2.0, center.lon - lon_span / 2.0),
            north_east: LatLng::new(center.lat + lat_span / 2.0, center.lon + lon_span / 2.0),
        }
    }

    /// Strict containment; points on the edge are outside.
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat > self.south_west.lat
            && point.lat < self.north_east.lat
            && point.lon > self.south_west.lon
            && point.lon < self.north_east.lon
    }

    /// North-south extent in degrees
    pub fn lat_span(&self) -> f64 {
        self.north_east.lat - self.south_west.lat
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lon + self.north_east.lon) / 2.0,
        )
    }
}

/// Identifiers arrive either as JSON strings or as integers depending on
/// the backend revision.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

macro_rules! wire_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                Ok(match RawId::deserialize(deserializer)? {
                    RawId::Text(id) => Self(id),
                    RawId::Number(id) => Self(id.to_string()),
                })
            }
        }
    };
}

wire_id!(
    /// Server-side identifier of a position (and of its measurement)
    PositionId
);
wire_id!(
    /// Server-side identifier of a trip
    TripId
);

/// One depth/position sample from a vessel's instrument log.
///
/// Serialized with the short field names of wire schema v1; the long
/// names used by older backends are accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(rename = "p_id", alias = "position_id")]
    pub position_id: PositionId,
    #[serde(rename = "t_id", alias = "trip_id", default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<TripId>,
    #[serde(rename = "lat", alias = "latitude")]
    pub latitude: f64,
    #[serde(rename = "lon", alias = "longitude")]
    pub longitude: f64,
    /// Depth in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
    /// UTC timestamp as `YYYYMMDDHHMMSS`
    #[serde(rename = "t_utc", alias = "pos_time_utc", default)]
    pub timestamp_utc: String,
    #[serde(rename = "d_bad", alias = "depth_erroneous", default)]
    pub depth_erroneous: bool,
    /// Speed through water (knots)
    #[serde(rename = "ws", alias = "water_speed", default, skip_serializing_if = "Option::is_none")]
    pub water_speed: Option<f64>,
    /// Speed over ground (knots)
    #[serde(rename = "gs", alias = "ground_speed", default, skip_serializing_if = "Option::is_none")]
    pub ground_speed: Option<f64>,
    /// Course over ground (degrees)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<f64>,
}

impl Measurement {
    /// Minimal depth measurement
    pub fn depth_sample(position_id: impl Into<String>, lat: f64, lon: f64, depth: f64) -> Self {
        Self {
            position_id: PositionId::new(position_id),
            trip_id: None,
            latitude: lat,
            longitude: lon,
            depth: Some(depth),
            timestamp_utc: String::new(),
            depth_erroneous: false,
            water_speed: None,
            ground_speed: None,
            course: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp_utc: impl Into<String>) -> Self {
        self.timestamp_utc = timestamp_utc.into();
        self
    }

    pub fn with_erroneous(mut self, erroneous: bool) -> Self {
        self.depth_erroneous = erroneous;
        self
    }

    pub fn with_trip(mut self, trip_id: TripId) -> Self {
        self.trip_id = Some(trip_id);
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// A named, dated voyage of one vessel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    #[serde(rename = "t_id", alias = "trip_id")]
    pub trip_id: TripId,
    #[serde(default)]
    pub vessel_name: String,
    #[serde(default)]
    pub trip_date: String,
    #[serde(default)]
    pub trip_name: String,
}

/// Which measurements are shown on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementFilter {
    All,
    #[default]
    Valid,
    Erroneous,
}

impl MeasurementFilter {
    /// Whether a measurement with the given flag passes this filter
    pub fn matches(&self, depth_erroneous: bool) -> bool {
        match self {
            MeasurementFilter::All => true,
            MeasurementFilter::Valid => !depth_erroneous,
            MeasurementFilter::Erroneous => depth_erroneous,
        }
    }

    /// Value of the matching control panel radio button
    pub fn radio_value(&self) -> u8 {
        match self {
            MeasurementFilter::All => 0,
            MeasurementFilter::Valid => 1,
            MeasurementFilter::Erroneous => 2,
        }
    }
}

impl fmt::Display for MeasurementFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementFilter::All => write!(f, "all"),
            MeasurementFilter::Valid => write!(f, "valid"),
            MeasurementFilter::Erroneous => write!(f, "erroneous"),
        }
    }
}

impl FromStr for MeasurementFilter {
    type Err = String;

    /// Accepts the radio button values `0`/`1`/`2` as well as the names.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "0" | "all" => Ok(MeasurementFilter::All),
            "1" | "valid" => Ok(MeasurementFilter::Valid),
            "2" | "erroneous" | "bad" => Ok(MeasurementFilter::Erroneous),
            other => Err(format!("unknown measurement filter '{}'", other)),
        }
    }
}
