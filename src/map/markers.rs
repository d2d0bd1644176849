//! Tracking of markers currently materialized on the map

use crate::core::{Measurement, PositionId, TripId};
use crate::map::MarkerId;
use std::collections::BTreeMap;

/// A marker together with the measurement it shows
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedMarker {
    pub marker: MarkerId,
    pub point: Measurement,
    /// Trip the point was downloaded for, if any
    pub owner: Option<TripId>,
}

/// Markers keyed by the position id of their measurement
#[derive(Debug, Default)]
pub struct MarkerSet {
    markers: BTreeMap<PositionId, TrackedMarker>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, position_id: &PositionId) -> bool {
        self.markers.contains_key(position_id)
    }

    pub fn insert(&mut self, tracked: TrackedMarker) -> Option<TrackedMarker> {
        self.markers.insert(tracked.point.position_id.clone(), tracked)
    }

    pub fn get(&self, position_id: &PositionId) -> Option<&TrackedMarker> {
        self.markers.get(position_id)
    }

    pub fn get_mut(&mut self, position_id: &PositionId) -> Option<&mut TrackedMarker> {
        self.markers.get_mut(position_id)
    }

    pub fn remove(&mut self, position_id: &PositionId) -> Option<TrackedMarker> {
        self.markers.remove(position_id)
    }

    /// Look up the tracked entry behind a widget marker
    pub fn find_by_marker(&self, marker: MarkerId) -> Option<&TrackedMarker> {
        self.markers.values().find(|t| t.marker == marker)
    }

    /// Position ids of every marker owned by the given trip
    pub fn owned_by(&self, trip_id: &TripId) -> Vec<PositionId> {
        self.markers
            .iter()
            .filter(|(_, t)| t.owner.as_ref() == Some(trip_id))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedMarker> {
        self.markers.values()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
