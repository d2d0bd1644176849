//! Event routing between the map widget, the view and one feed

use crate::api::DataSource;
use crate::feeds::{FeedResult, ViewportListener};
use crate::map::{MapEvent, MapView, MapWidget};
use tracing::debug;

/// A map view with one feed and the backend it fetches from
pub struct MapSession<W: MapWidget, L: ViewportListener<W>> {
    view: MapView<W>,
    feed: L,
    source: Box<dyn DataSource>,
}

impl<W: MapWidget, L: ViewportListener<W>> MapSession<W, L> {
    pub fn new(view: MapView<W>, feed: L, source: Box<dyn DataSource>) -> Self {
        Self { view, feed, source }
    }

    /// Handle one widget event
    pub fn dispatch(&mut self, event: MapEvent) -> FeedResult<()> {
        if let MapEvent::MarkerClicked(marker) = event {
            if !self.feed.on_marker_clicked(&mut self.view, marker) {
                debug!(?marker, "click on marker not owned by the feed");
            }
            return Ok(());
        }

        if self.view.handle_event(&event) {
            self.feed.on_viewport_settled(&mut self.view, self.source.as_mut())?;
        }
        Ok(())
    }

    /// Run the first update, as the widget does once it has laid out
    pub fn start(&mut self) -> FeedResult<()> {
        self.dispatch(MapEvent::BoundsChanged)
    }

    pub fn view(&self) -> &MapView<W> {
        &self.view
    }

    pub fn feed(&self) -> &L {
        &self.feed
    }

    /// Borrow all parts at once, for handlers that need the view and the
    /// backend together (validity toggles, trip checkboxes)
    pub fn parts_mut(&mut self) -> (&mut MapView<W>, &mut L, &mut dyn DataSource) {
        (&mut self.view, &mut self.feed, self.source.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryDataSource;
    use crate::core::{Bounds, LatLng, Measurement, MeasurementFilter, PositionId, TripId};
    use crate::feeds::{DepthFeed, DepthFeedSettings, TripFeed};
    use crate::gradient::DepthGradient;
    use crate::histogram::HistogramConfig;
    use crate::map::{CookieSettings, HeadlessMap, MapSettings, MemoryStore, ViewState};

    fn view() -> MapView<HeadlessMap> {
        let mut view = MapView::new(
            HeadlessMap::new(LatLng::new(60.0, 24.0), 12, 800, 600),
            Box::new(MemoryStore::new()),
            CookieSettings::default(),
            &MapSettings::default(),
        );
        view.widget_mut()
            .set_bounds(Some(Bounds::new(LatLng::new(59.5, 23.5), LatLng::new(60.5, 24.5))));
        view
    }

    fn depth_session() -> MapSession<HeadlessMap, DepthFeed> {
        let source = MemoryDataSource::new().with_measurements(vec![
            Measurement::depth_sample("1", 60.0, 24.0, 4.0),
            Measurement::depth_sample("2", 60.1, 24.1, 8.0).with_erroneous(true),
        ]);
        let feed = DepthFeed::new(DepthGradient::default(), &HistogramConfig::default(), &DepthFeedSettings::default());
        MapSession::new(view(), feed, Box::new(source))
    }

    #[test]
    fn test_settle_runs_feed_update() {
        let mut session = depth_session();
        session.start().unwrap();
        assert_eq!(session.feed().markers().len(), 2);
        assert_eq!(session.view().widget().attached_count(), 1);
        assert_eq!(session.view().state(), ViewState::Idle);
    }

    #[test]
    fn test_drag_defers_update() {
        let mut session = depth_session();
        session.dispatch(MapEvent::DragStart).unwrap();
        session.dispatch(MapEvent::BoundsChanged).unwrap();
        assert!(session.feed().markers().is_empty());
        assert_eq!(session.view().state(), ViewState::Dragging);

        session.dispatch(MapEvent::DragEnd).unwrap();
        assert_eq!(session.feed().markers().len(), 2);
    }

    #[test]
    fn test_click_and_toggle_through_parts() {
        let mut session = depth_session();
        session.start().unwrap();

        let marker = session.feed().markers().get(&PositionId::from("2")).unwrap().marker;
        session.dispatch(MapEvent::MarkerClicked(marker)).unwrap();
        assert!(session.view().widget().info_window().is_some());

        let (view, feed, source) = session.parts_mut();
        feed.toggle_validity(view, source, &PositionId::from("2")).unwrap();
        feed.set_filter(view, MeasurementFilter::Valid);
        assert_eq!(session.view().widget().attached_count(), 2);
    }

    #[test]
    fn test_trip_session() {
        let trip = serde_json::from_value(serde_json::json!({"t_id": 5, "vessel_name": "Aalto"})).unwrap();
        let source = MemoryDataSource::new()
            .with_trip(trip, vec![Measurement::depth_sample("p1", 60.0, 24.0, 2.0)]);
        let mut session = MapSession::new(view(), TripFeed::new(true), Box::new(source));

        let (view, feed, source) = session.parts_mut();
        feed.load_trips(source).unwrap();
        feed.set_trip_enabled(view, source, &TripId::from("5"), true).unwrap();

        session.dispatch(MapEvent::ZoomChanged).unwrap();
        assert_eq!(session.feed().markers().len(), 1);
        assert_eq!(session.view().widget().attached_count(), 1);
    }
}
