//! Request and response bodies of the backend API

use crate::core::{Bounds, LatLng, Measurement, Trip, TripId};
use serde::{Deserialize, Serialize};

/// Bounding box plus sampling density sent with every area request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaQuery {
    pub lat0: f64,
    pub lon0: f64,
    pub lat1: f64,
    pub lon1: f64,
    /// Meters per pixel, used by the backend to thin out samples
    #[serde(rename = "mPerPix")]
    pub m_per_pix: f64,
}

impl AreaQuery {
    pub fn new(bounds: Bounds, m_per_pix: f64) -> Self {
        Self {
            lat0: bounds.south_west.lat,
            lon0: bounds.south_west.lon,
            lat1: bounds.north_east.lat,
            lon1: bounds.north_east.lon,
            m_per_pix,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(LatLng::new(self.lat0, self.lon0), LatLng::new(self.lat1, self.lon1))
    }

    /// Query string pairs in wire order
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("lat0", self.lat0.to_string()),
            ("lon0", self.lon0.to_string()),
            ("lat1", self.lat1.to_string()),
            ("lon1", self.lon1.to_string()),
            ("mPerPix", self.m_per_pix.to_string()),
        ]
    }
}

/// `GET /api/1/depth_data/` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthData {
    #[serde(default)]
    pub depths: Vec<Measurement>,
}

/// `GET /api/1/trip/` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripList {
    #[serde(default)]
    pub trips: Vec<Trip>,
}

/// `GET /api/1/trip/{id}` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripPoints {
    #[serde(default, rename = "t_id", alias = "trip_id", skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<TripId>,
    #[serde(default, alias = "trip_points")]
    pub points: Vec<Measurement>,
}

/// `POST /api/1/measurement/{id}` body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementUpdate {
    pub depth_erroneous: bool,
}
