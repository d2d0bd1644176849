//! Backend access

use crate::api::{ApiError, ApiResult, AreaQuery, DepthData, MeasurementUpdate, TripList, TripPoints};
use crate::core::{PositionId, TripId, API_VERSION};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Operations the feeds need from the backend
pub trait DataSource {
    /// Depth measurements inside the queried area
    fn depth_data(&mut self, query: &AreaQuery) -> ApiResult<DepthData>;

    /// Store the validity flag of one measurement
    fn update_measurement(&mut self, position_id: &PositionId, update: &MeasurementUpdate) -> ApiResult<()>;

    fn trips(&mut self) -> ApiResult<TripList>;

    /// Points of one trip inside the queried area
    fn trip_points(&mut self, trip_id: &TripId, query: &AreaQuery) -> ApiResult<TripPoints>;

    /// HTML fragment of the depth view control panel
    fn control_panel(&mut self) -> ApiResult<String>;
}

/// Backend location and timeouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Blocking HTTP client for the versioned JSON API
pub struct HttpDataSource {
    client: Client,
    base_url: String,
}

impl HttpDataSource {
    pub fn new(settings: &ApiSettings) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| ApiError::transport(&settings.base_url, e))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}/{}", self.base_url, API_VERSION, path)
    }

    fn send(&self, url: &str, request: RequestBuilder) -> ApiResult<reqwest::blocking::Response> {
        let response = request.send().map_err(|e| ApiError::transport(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http { url: url.to_string(), status: status.as_u16() });
        }
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, query: Option<&AreaQuery>) -> ApiResult<T> {
        debug!(%url, "GET");
        let mut request = self.client.get(url);
        if let Some(query) = query {
            request = request.query(&query.to_query_pairs());
        }
        self.send(url, request)?.json().map_err(|e| ApiError::decode(url, e))
    }
}

impl DataSource for HttpDataSource {
    fn depth_data(&mut self, query: &AreaQuery) -> ApiResult<DepthData> {
        self.get_json(&self.api_url("depth_data/"), Some(query))
    }

    fn update_measurement(&mut self, position_id: &PositionId, update: &MeasurementUpdate) -> ApiResult<()> {
        let url = self.api_url(&format!("measurement/{}", position_id));
        debug!(%url, depth_erroneous = update.depth_erroneous, "POST");
        self.send(&url, self.client.post(&url).json(update))?;
        Ok(())
    }

    fn trips(&mut self) -> ApiResult<TripList> {
        self.get_json(&self.api_url("trip/"), None)
    }

    fn trip_points(&mut self, trip_id: &TripId, query: &AreaQuery) -> ApiResult<TripPoints> {
        self.get_json(&self.api_url(&format!("trip/{}", trip_id)), Some(query))
    }

    fn control_panel(&mut self) -> ApiResult<String> {
        let url = format!("{}/snippets/depth_view/control_panel/", self.base_url);
        debug!(%url, "GET");
        self.send(&url, self.client.get(&url))?
            .text()
            .map_err(|e| ApiError::decode(&url, e))
    }
}
