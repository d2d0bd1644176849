//! Trip track feed

use crate::api::{AreaQuery, DataSource, TripPoints};
use crate::core::{Trip, TripId, TRIP_MARKER_COLOR};
use crate::feeds::{FeedError, FeedResult, FetchTicket, FetchTracker, ViewportListener};
use crate::gradient::Color;
use crate::map::{MapView, MapWidget, MarkerId, MarkerSet, TrackedMarker};
use maud::html;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Shows the points of the trips the user has enabled
pub struct TripFeed {
    trips: Vec<Trip>,
    enabled: BTreeSet<TripId>,
    markers: MarkerSet,
    trackers: BTreeMap<TripId, FetchTracker>,
    discard_stale: bool,
    color: Color,
}

impl TripFeed {
    pub fn new(discard_stale_responses: bool) -> Self {
        Self {
            trips: Vec::new(),
            enabled: BTreeSet::new(),
            markers: MarkerSet::new(),
            trackers: BTreeMap::new(),
            discard_stale: discard_stale_responses,
            color: Color::from_hex(TRIP_MARKER_COLOR).unwrap_or(Color::rgb(255, 0, 0)),
        }
    }

    /// Fetch the list of trips
    pub fn load_trips(&mut self, source: &mut dyn DataSource) -> FeedResult<&[Trip]> {
        self.trips = source.trips()?.trips;
        info!(trips = self.trips.len(), "trip list loaded");
        Ok(&self.trips)
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn is_enabled(&self, trip_id: &TripId) -> bool {
        self.enabled.contains(trip_id)
    }

    /// Trip list with one checkbox per trip
    pub fn trip_list_html(&self) -> String {
        html! {
            p { "Latest trips:" }
            " "
            form id="latestTripsForm" {
                @for trip in &self.trips {
                    input type="checkbox" id=(format!("tripEnabled{}", trip.trip_id)) value=(trip.trip_id.as_str())
                        checked[self.is_enabled(&trip.trip_id)];
                    (trip.vessel_name) " " (trip.trip_date) " " (trip.trip_name)
                    br;
                }
            }
        }
        .into_string()
    }

    fn known(&self, trip_id: &TripId) -> FeedResult<()> {
        if self.trips.iter().any(|t| &t.trip_id == trip_id) {
            Ok(())
        } else {
            Err(FeedError::UnknownTrip { trip_id: trip_id.clone() })
        }
    }

    /// Enable a trip and prepare the request for its points in the current area
    pub fn begin_trip<W: MapWidget>(&mut self, view: &mut MapView<W>, trip_id: &TripId) -> FeedResult<(FetchTicket, AreaQuery)> {
        self.known(trip_id)?;
        self.enabled.insert(trip_id.clone());
        let query = view.area_query().ok_or(FeedError::BoundsUnavailable)?;
        let ticket = self.trackers.entry(trip_id.clone()).or_default().issue();
        Ok((ticket, query))
    }

    /// Deliver the points of one trip. Responses for trips disabled in the
    /// meantime are dropped. Returns the number of markers created.
    pub fn apply_trip_points<W: MapWidget>(
        &mut self,
        view: &mut MapView<W>,
        trip_id: &TripId,
        ticket: FetchTicket,
        points: TripPoints,
    ) -> usize {
        if !self.is_enabled(trip_id) {
            debug!(%trip_id, "discarding points of disabled trip");
            return 0;
        }
        let current = self.trackers.get(trip_id).map(|t| t.is_current(ticket)).unwrap_or(false);
        if self.discard_stale && !current {
            debug!(%trip_id, ?ticket, "discarding stale trip response");
            return 0;
        }

        let mut created = 0;
        for point in points.points {
            if self.markers.contains(&point.position_id) {
                continue;
            }
            let marker = view.make_marker(&point, self.color);
            view.set_marker_visible(marker, view.is_in_view(&point));
            self.markers.insert(TrackedMarker { marker, point, owner: Some(trip_id.clone()) });
            created += 1;
        }
        debug!(%trip_id, created, "trip points applied");
        created
    }

    /// Enable a trip and draw its points in the current area
    pub fn show_trip<W: MapWidget>(
        &mut self,
        view: &mut MapView<W>,
        source: &mut dyn DataSource,
        trip_id: &TripId,
    ) -> FeedResult<usize> {
        let (ticket, query) = self.begin_trip(view, trip_id)?;
        let points = source.trip_points(trip_id, &query)?;
        Ok(self.apply_trip_points(view, trip_id, ticket, points))
    }

    /// Disable a trip and remove its markers. Other trips are untouched.
    pub fn hide_trip<W: MapWidget>(&mut self, view: &mut MapView<W>, trip_id: &TripId) -> usize {
        self.enabled.remove(trip_id);
        let owned = self.markers.owned_by(trip_id);
        for id in &owned {
            if let Some(tracked) = self.markers.remove(id) {
                view.remove_marker(tracked.marker);
            }
        }
        debug!(%trip_id, removed = owned.len(), "trip hidden");
        owned.len()
    }

    /// Checkbox handler
    pub fn set_trip_enabled<W: MapWidget>(
        &mut self,
        view: &mut MapView<W>,
        source: &mut dyn DataSource,
        trip_id: &TripId,
        enabled: bool,
    ) -> FeedResult<()> {
        if enabled {
            self.show_trip(view, source, trip_id)?;
        } else {
            self.known(trip_id)?;
            self.hide_trip(view, trip_id);
        }
        Ok(())
    }

    /// Drop points outside the view, attach the kept ones and re-download
    /// every enabled trip
    pub fn update<W: MapWidget>(&mut self, view: &mut MapView<W>, source: &mut dyn DataSource) -> FeedResult<usize> {
        view.drop_points_outside_bounds(&mut self.markers);
        for tracked in self.markers.iter() {
            view.set_marker_visible(tracked.marker, view.is_in_view(&tracked.point));
        }
        let enabled: Vec<TripId> = self.enabled.iter().cloned().collect();
        let mut created = 0;
        for trip_id in &enabled {
            created += self.show_trip(view, source, trip_id)?;
        }
        Ok(created)
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }
}

impl<W: MapWidget> ViewportListener<W> for TripFeed {
    fn on_viewport_settled(&mut self, view: &mut MapView<W>, source: &mut dyn DataSource) -> FeedResult<()> {
        let result = self.update(view, source).map(|_| ());
        view.finish_update();
        result
    }

    fn on_marker_clicked(&mut self, view: &mut MapView<W>, marker: MarkerId) -> bool {
        match self.markers.find_by_marker(marker) {
            Some(tracked) => {
                view.show_info(&tracked.point, false);
                true
            }
            None => false,
        }
    }
}
