//! In-memory backend used by tests and offline demos

use crate::api::{ApiError, ApiResult, AreaQuery, DataSource, DepthData, MeasurementUpdate, TripList, TripPoints};
use crate::core::{Measurement, PositionId, Trip, TripId};
use std::collections::BTreeMap;

/// A request as seen by the in-memory backend
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRequest {
    DepthData(AreaQuery),
    UpdateMeasurement(PositionId, MeasurementUpdate),
    Trips,
    TripPoints(TripId, AreaQuery),
    ControlPanel,
}

/// Backend holding its data in memory and recording every request
#[derive(Debug, Default)]
pub struct MemoryDataSource {
    measurements: Vec<Measurement>,
    trips: Vec<Trip>,
    trip_points: BTreeMap<TripId, Vec<Measurement>>,
    control_panel: String,
    requests: Vec<RecordedRequest>,
    failing: bool,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_measurements(mut self, measurements: Vec<Measurement>) -> Self {
        self.measurements = measurements;
        self
    }

    pub fn with_trip(mut self, trip: Trip, points: Vec<Measurement>) -> Self {
        self.trip_points.insert(trip.trip_id.clone(), points);
        self.trips.push(trip);
        self
    }

    pub fn with_control_panel(mut self, html: impl Into<String>) -> Self {
        self.control_panel = html.into();
        self
    }

    /// Make every following request fail with an HTTP 500
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn requests(&self) -> &[RecordedRequest] {
        &self.requests
    }

    pub fn measurement(&self, position_id: &PositionId) -> Option<&Measurement> {
        self.measurements.iter().find(|m| &m.position_id == position_id)
    }

    fn check(&self, url: &str) -> ApiResult<()> {
        if self.failing {
            return Err(ApiError::Http { url: url.to_string(), status: 500 });
        }
        Ok(())
    }

    fn inside(points: &[Measurement], query: &AreaQuery) -> Vec<Measurement> {
        let bounds = query.bounds();
        points
            .iter()
            .filter(|m| bounds.contains(&m.position()))
            .cloned()
            .collect()
    }
}

impl DataSource for MemoryDataSource {
    fn depth_data(&mut self, query: &AreaQuery) -> ApiResult<DepthData> {
        self.requests.push(RecordedRequest::DepthData(*query));
        self.check("memory://depth_data/")?;
        Ok(DepthData { depths: Self::inside(&self.measurements, query) })
    }

    fn update_measurement(&mut self, position_id: &PositionId, update: &MeasurementUpdate) -> ApiResult<()> {
        self.requests
            .push(RecordedRequest::UpdateMeasurement(position_id.clone(), *update));
        self.check("memory://measurement/")?;
        if let Some(m) = self.measurements.iter_mut().find(|m| &m.position_id == position_id) {
            m.depth_erroneous = update.depth_erroneous;
        }
        Ok(())
    }

    fn trips(&mut self) -> ApiResult<TripList> {
        self.requests.push(RecordedRequest::Trips);
        self.check("memory://trip/")?;
        Ok(TripList { trips: self.trips.clone() })
    }

    fn trip_points(&mut self, trip_id: &TripId, query: &AreaQuery) -> ApiResult<TripPoints> {
        self.requests
            .push(RecordedRequest::TripPoints(trip_id.clone(), *query));
        self.check("memory://trip/")?;
        let points = self
            .trip_points
            .get(trip_id)
            .map(|points| Self::inside(points, query))
            .unwrap_or_default();
        Ok(TripPoints { trip_id: Some(trip_id.clone()), points })
    }

    fn control_panel(&mut self) -> ApiResult<String> {
        self.requests.push(RecordedRequest::ControlPanel);
        self.check("memory://snippets/")?;
        Ok(self.control_panel.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Bounds, LatLng};

    fn query() -> AreaQuery {
        AreaQuery::new(Bounds::new(LatLng::new(60.0, 24.0), LatLng::new(61.0, 25.0)), 10.0)
    }

    #[test]
    fn test_depth_data_filters_by_area() {
        let mut source = MemoryDataSource::new().with_measurements(vec![
            Measurement::depth_sample("1", 60.5, 24.5, 3.0),
            Measurement::depth_sample("2", 59.0, 24.5, 3.0),
        ]);
        let data = source.depth_data(&query()).unwrap();
        assert_eq!(data.depths.len(), 1);
        assert_eq!(source.requests(), &[RecordedRequest::DepthData(query())]);
    }

    #[test]
    fn test_update_and_failure() {
        let mut source = MemoryDataSource::new()
            .with_measurements(vec![Measurement::depth_sample("1", 60.5, 24.5, 3.0)]);
        let id = PositionId::from("1");

        source
            .update_measurement(&id, &MeasurementUpdate { depth_erroneous: true })
            .unwrap();
        assert!(source.measurement(&id).unwrap().depth_erroneous);

        source.set_failing(true);
        assert!(matches!(source.trips(), Err(ApiError::Http { status: 500, .. })));
    }
}
