//! Depth measurement feed
//!
//! Keeps one gradient-colored marker per depth measurement in the visible
//! area. Markers of measurements that do not pass the active filter stay
//! tracked but detached, so changing the filter never needs a fetch.

use crate::api::{AreaQuery, DataSource, DepthData, MeasurementUpdate};
use crate::core::{MeasurementFilter, PositionId};
use crate::feeds::{FeedError, FeedResult, FetchTicket, FetchTracker, ViewportListener};
use crate::gradient::{DepthGradient, DepthLegend};
use crate::histogram::{DepthHistogram, HistogramBin, HistogramConfig, HistogramError};
use crate::map::{MapView, MapWidget, MarkerId, MarkerSet, TrackedMarker};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Depth feed behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthFeedSettings {
    pub initial_filter: MeasurementFilter,
    /// Ignore responses issued before the latest viewport settle
    pub discard_stale_responses: bool,
}

impl Default for DepthFeedSettings {
    fn default() -> Self {
        Self {
            initial_filter: MeasurementFilter::Valid,
            discard_stale_responses: true,
        }
    }
}

pub struct DepthFeed {
    gradient: DepthGradient,
    markers: MarkerSet,
    filter: MeasurementFilter,
    histogram: Option<DepthHistogram>,
    bins: Vec<HistogramBin>,
    tracker: FetchTracker,
    discard_stale: bool,
    control_panel: Option<String>,
}

impl DepthFeed {
    pub fn new(gradient: DepthGradient, histogram: &HistogramConfig, settings: &DepthFeedSettings) -> Self {
        Self {
            gradient,
            markers: MarkerSet::new(),
            filter: settings.initial_filter,
            histogram: histogram.enabled.then(|| DepthHistogram::new(histogram)),
            bins: Vec::new(),
            tracker: FetchTracker::new(),
            discard_stale: settings.discard_stale_responses,
            control_panel: None,
        }
    }

    /// Drop markers that left the view and prepare the request for the new
    /// area. Any response to an earlier request becomes stale.
    pub fn begin_update<W: MapWidget>(&mut self, view: &mut MapView<W>) -> FeedResult<(FetchTicket, AreaQuery)> {
        view.drop_points_outside_bounds(&mut self.markers);
        self.refresh_histogram();
        let query = view.area_query().ok_or(FeedError::BoundsUnavailable)?;
        Ok((self.tracker.issue(), query))
    }

    /// Deliver a depth response. Returns the number of markers created.
    pub fn apply_depths<W: MapWidget>(&mut self, view: &mut MapView<W>, ticket: FetchTicket, data: DepthData) -> usize {
        if self.discard_stale && !self.tracker.is_current(ticket) {
            debug!(?ticket, current = ?self.tracker.current(), "discarding stale depth response");
            return 0;
        }

        let received = data.depths.len();
        let mut created = 0;
        for point in data.depths {
            if self.markers.contains(&point.position_id) {
                continue;
            }
            let color = self.gradient.color(point.depth.unwrap_or(0.0));
            let marker = view.make_marker(&point, color);
            view.set_marker_visible(marker, self.filter.matches(point.depth_erroneous));
            self.markers.insert(TrackedMarker { marker, point, owner: None });
            created += 1;
        }

        info!(received, created, tracked = self.markers.len(), "depth data applied");
        self.refresh_histogram();
        created
    }

    /// Full update cycle for the current viewport
    pub fn update<W: MapWidget>(&mut self, view: &mut MapView<W>, source: &mut dyn DataSource) -> FeedResult<usize> {
        let (ticket, query) = self.begin_update(view)?;
        let data = source.depth_data(&query)?;
        Ok(self.apply_depths(view, ticket, data))
    }

    pub fn filter(&self) -> MeasurementFilter {
        self.filter
    }

    /// Switch the filter and re-apply visibility without fetching
    pub fn set_filter<W: MapWidget>(&mut self, view: &mut MapView<W>, filter: MeasurementFilter) {
        debug!(%filter, "measurement filter changed");
        self.filter = filter;
        self.refilter(view);
    }

    /// Attach every tracked marker that passes the filter, detach the rest
    pub fn refilter<W: MapWidget>(&mut self, view: &mut MapView<W>) {
        for tracked in self.markers.iter() {
            view.set_marker_visible(tracked.marker, self.filter.matches(tracked.point.depth_erroneous));
        }
        self.refresh_histogram();
    }

    /// Set the erroneous flag of a shown measurement and store it in the
    /// backend. The local flag is kept even when the backend call fails.
    pub fn set_validity<W: MapWidget>(
        &mut self,
        view: &mut MapView<W>,
        source: &mut dyn DataSource,
        position_id: &PositionId,
        depth_erroneous: bool,
    ) -> FeedResult<()> {
        let tracked = self
            .markers
            .get_mut(position_id)
            .ok_or_else(|| FeedError::UnknownMeasurement { position_id: position_id.clone() })?;
        tracked.point.depth_erroneous = depth_erroneous;

        if let Err(e) = source.update_measurement(position_id, &MeasurementUpdate { depth_erroneous }) {
            warn!(%position_id, error = %e, "failed to store measurement validity");
            return Err(e.into());
        }

        self.refilter(view);
        Ok(())
    }

    /// Flip the erroneous flag of a shown measurement, as the popup checkbox does
    pub fn toggle_validity<W: MapWidget>(
        &mut self,
        view: &mut MapView<W>,
        source: &mut dyn DataSource,
        position_id: &PositionId,
    ) -> FeedResult<()> {
        let erroneous = self
            .markers
            .get(position_id)
            .map(|t| t.point.depth_erroneous)
            .ok_or_else(|| FeedError::UnknownMeasurement { position_id: position_id.clone() })?;
        self.set_validity(view, source, position_id, !erroneous)
    }

    /// Fetch the control panel fragment with the filter radio buttons
    pub fn setup_control_panel(&mut self, source: &mut dyn DataSource) -> FeedResult<&str> {
        let html = source.control_panel()?;
        Ok(self.control_panel.insert(html).as_str())
    }

    pub fn control_panel(&self) -> Option<&str> {
        self.control_panel.as_deref()
    }

    fn refresh_histogram(&mut self) {
        let Some(histogram) = &self.histogram else {
            return;
        };
        let filter = self.filter;
        let depths = self
            .markers
            .iter()
            .filter(|t| filter.matches(t.point.depth_erroneous))
            .filter_map(|t| t.point.depth);
        self.bins = histogram.bins(depths);
    }

    /// Bins of the last histogram refresh; empty when the histogram is off
    pub fn histogram_bins(&self) -> &[HistogramBin] {
        &self.bins
    }

    /// Histogram markup, or `None` when the histogram is off
    pub fn histogram_html(&self) -> Option<Result<String, HistogramError>> {
        self.histogram
            .as_ref()
            .map(|h| h.render_html(&self.bins, &self.gradient))
    }

    pub fn histogram_svg(&self) -> Option<Result<String, HistogramError>> {
        self.histogram
            .as_ref()
            .map(|h| h.render_svg(&self.bins, &self.gradient))
    }

    pub fn legend(&self) -> DepthLegend {
        self.gradient.legend()
    }

    pub fn gradient(&self) -> &DepthGradient {
        &self.gradient
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }
}

impl<W: MapWidget> ViewportListener<W> for DepthFeed {
    fn on_viewport_settled(&mut self, view: &mut MapView<W>, source: &mut dyn DataSource) -> FeedResult<()> {
        let result = self.update(view, source).map(|_| ());
        view.finish_update();
        result
    }

    fn on_marker_clicked(&mut self, view: &mut MapView<W>, marker: MarkerId) -> bool {
        match self.markers.find_by_marker(marker) {
            Some(tracked) => {
                view.show_info(&tracked.point, true);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MemoryDataSource, RecordedRequest};
    use crate::core::{Bounds, LatLng, Measurement, BOUNDS_UNAVAILABLE_MESSAGE};
    use crate::map::{CookieSettings, HeadlessMap, MapSettings, MemoryStore};

    fn view_around(lat: f64, lon: f64) -> MapView<HeadlessMap> {
        let mut view = MapView::new(
            HeadlessMap::new(LatLng::new(lat, lon), 12, 800, 600),
            Box::new(MemoryStore::new()),
            CookieSettings::default(),
            &MapSettings::default(),
        );
        let bounds = Bounds::new(LatLng::new(lat - 0.5, lon - 0.5), LatLng::new(lat + 0.5, lon + 0.5));
        view.widget_mut().set_bounds(Some(bounds));
        view
    }

    fn feed() -> DepthFeed {
        DepthFeed::new(DepthGradient::default(), &HistogramConfig::default(), &DepthFeedSettings::default())
    }

    fn attached(view: &MapView<HeadlessMap>, feed: &DepthFeed, id: &str) -> bool {
        let marker = feed.markers().get(&PositionId::from(id)).unwrap().marker;
        view.widget().is_marker_attached(marker)
    }

    fn mixed_source() -> MemoryDataSource {
        MemoryDataSource::new().with_measurements(vec![
            Measurement::depth_sample("1", 60.1, 24.1, 3.0),
            Measurement::depth_sample("2", 60.2, 24.2, 12.0).with_erroneous(true),
            Measurement::depth_sample("3", 60.3, 24.3, 21.0),
        ])
    }

    #[test]
    fn test_marker_follows_filter_end_to_end() {
        let body = r#"{"depths": [{"p_id":"42","lat":60.0,"lon":24.0,"depth":12,
                       "t_utc":"20230101120000","d_bad":false}]}"#;
        let data: DepthData = serde_json::from_str(body).unwrap();

        let mut view = view_around(60.0, 24.0);
        let mut feed = feed();
        let (ticket, _) = feed.begin_update(&mut view).unwrap();
        assert_eq!(feed.apply_depths(&mut view, ticket, data), 1);
        assert!(attached(&view, &feed, "42"));

        feed.set_filter(&mut view, MeasurementFilter::Erroneous);
        assert!(!attached(&view, &feed, "42"));
        assert_eq!(feed.markers().len(), 1);
        assert_eq!(view.widget().marker_count(), 1);

        feed.set_filter(&mut view, MeasurementFilter::Valid);
        assert!(attached(&view, &feed, "42"));
    }

    #[test]
    fn test_marker_color_from_gradient() {
        let mut view = view_around(60.0, 24.0);
        let mut source = mixed_source();
        let mut feed = feed();
        feed.update(&mut view, &mut source).unwrap();

        let tracked = feed.markers().get(&PositionId::from("3")).unwrap();
        let spec = &view.widget().marker(tracked.marker).unwrap().spec;
        assert_eq!(spec.fill_color, feed.gradient().color(21.0));
        assert_eq!(spec.stroke_color, spec.fill_color);
    }

    #[test]
    fn test_all_filter_shows_hidden_markers_without_fetch() {
        let mut view = view_around(60.0, 24.0);
        let mut source = mixed_source();
        let mut feed = feed();
        assert_eq!(feed.update(&mut view, &mut source).unwrap(), 3);
        assert!(!attached(&view, &feed, "2"));
        assert_eq!(view.widget().attached_count(), 2);

        let requests_before = source.requests().len();
        feed.set_filter(&mut view, MeasurementFilter::All);
        assert_eq!(view.widget().attached_count(), 3);
        assert_eq!(source.requests().len(), requests_before);
    }

    #[test]
    fn test_known_points_are_not_duplicated() {
        let mut view = view_around(60.0, 24.0);
        let mut source = mixed_source();
        let mut feed = feed();
        feed.update(&mut view, &mut source).unwrap();
        assert_eq!(feed.update(&mut view, &mut source).unwrap(), 0);
        assert_eq!(view.widget().marker_count(), 3);
    }

    #[test]
    fn test_out_of_view_markers_dropped_before_fetch() {
        let mut view = view_around(60.0, 24.0);
        let mut source = mixed_source();
        let mut feed = feed();
        feed.update(&mut view, &mut source).unwrap();

        let moved = Bounds::new(LatLng::new(60.15, 24.15), LatLng::new(61.0, 25.0));
        view.widget_mut().set_bounds(Some(moved));
        feed.update(&mut view, &mut source).unwrap();

        assert!(!feed.markers().contains(&PositionId::from("1")));
        assert_eq!(feed.markers().len(), 2);
        assert_eq!(view.widget().marker_count(), 2);
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut view = view_around(60.0, 24.0);
        let mut feed = feed();
        let (old_ticket, _) = feed.begin_update(&mut view).unwrap();
        let (new_ticket, _) = feed.begin_update(&mut view).unwrap();

        let stale = DepthData { depths: vec![Measurement::depth_sample("9", 60.1, 24.1, 5.0)] };
        assert_eq!(feed.apply_depths(&mut view, old_ticket, stale.clone()), 0);
        assert!(feed.markers().is_empty());
        assert_eq!(feed.apply_depths(&mut view, new_ticket, stale), 1);
    }

    #[test]
    fn test_stale_response_kept_when_configured() {
        let settings = DepthFeedSettings { discard_stale_responses: false, ..Default::default() };
        let mut feed = DepthFeed::new(DepthGradient::default(), &HistogramConfig::default(), &settings);
        let mut view = view_around(60.0, 24.0);
        let (old_ticket, _) = feed.begin_update(&mut view).unwrap();
        feed.begin_update(&mut view).unwrap();

        let data = DepthData { depths: vec![Measurement::depth_sample("9", 60.1, 24.1, 5.0)] };
        assert_eq!(feed.apply_depths(&mut view, old_ticket, data), 1);
    }

    #[test]
    fn test_validity_toggle_refilters() {
        let mut view = view_around(60.0, 24.0);
        let mut source = mixed_source();
        let mut feed = feed();
        feed.update(&mut view, &mut source).unwrap();
        let total = |feed: &DepthFeed| feed.histogram_bins().iter().map(|b| b.count).sum::<usize>();
        assert_eq!(total(&feed), 2);

        let id = PositionId::from("1");
        feed.toggle_validity(&mut view, &mut source, &id).unwrap();
        assert!(!attached(&view, &feed, "1"));
        assert_eq!(total(&feed), 1);
        assert!(source.measurement(&id).unwrap().depth_erroneous);
        assert!(source
            .requests()
            .contains(&RecordedRequest::UpdateMeasurement(id.clone(), MeasurementUpdate { depth_erroneous: true })));

        feed.toggle_validity(&mut view, &mut source, &id).unwrap();
        assert!(attached(&view, &feed, "1"));
        assert_eq!(total(&feed), 2);
    }

    #[test]
    fn test_failed_validity_update_keeps_local_flag() {
        let mut view = view_around(60.0, 24.0);
        let mut source = mixed_source();
        let mut feed = feed();
        feed.update(&mut view, &mut source).unwrap();

        source.set_failing(true);
        let id = PositionId::from("1");
        let result = feed.set_validity(&mut view, &mut source, &id, true);
        assert!(matches!(result, Err(FeedError::Api(_))));
        assert!(feed.markers().get(&id).unwrap().point.depth_erroneous);
        // No refilter pass ran, so the marker is still shown.
        assert!(attached(&view, &feed, "1"));
    }

    #[test]
    fn test_unknown_measurement() {
        let mut view = view_around(60.0, 24.0);
        let mut source = mixed_source();
        let mut feed = feed();
        let result = feed.toggle_validity(&mut view, &mut source, &PositionId::from("404"));
        assert!(matches!(result, Err(FeedError::UnknownMeasurement { .. })));
    }

    #[test]
    fn test_histogram_restricted_to_filter() {
        let mut view = view_around(60.0, 24.0);
        let mut source = mixed_source();
        let mut feed = feed();
        feed.update(&mut view, &mut source).unwrap();

        let total = |feed: &DepthFeed| feed.histogram_bins().iter().map(|b| b.count).sum::<usize>();
        assert_eq!(total(&feed), 2);

        feed.set_filter(&mut view, MeasurementFilter::All);
        assert_eq!(total(&feed), 3);

        feed.set_filter(&mut view, MeasurementFilter::Erroneous);
        assert_eq!(total(&feed), 1);
        assert!(feed.histogram_html().unwrap().unwrap().contains("Distribution of depths"));
    }

    #[test]
    fn test_histogram_disabled() {
        let config = HistogramConfig { enabled: false, ..Default::default() };
        let mut feed = DepthFeed::new(DepthGradient::default(), &config, &DepthFeedSettings::default());
        let mut view = view_around(60.0, 24.0);
        feed.update(&mut view, &mut mixed_source()).unwrap();
        assert!(feed.histogram_bins().is_empty());
        assert!(feed.histogram_svg().is_none());
    }

    #[test]
    fn test_unavailable_bounds_abort_update() {
        let mut view = view_around(60.0, 24.0);
        view.widget_mut().set_bounds(None);
        let mut source = mixed_source();
        let mut feed = feed();

        let result = feed.update(&mut view, &mut source);
        assert!(matches!(result, Err(FeedError::BoundsUnavailable)));
        assert!(source.requests().is_empty());
        assert_eq!(view.widget().alerts(), &[BOUNDS_UNAVAILABLE_MESSAGE.to_string()]);
    }

    #[test]
    fn test_click_opens_popup_with_checkbox() {
        let mut view = view_around(60.0, 24.0);
        let mut feed = feed();
        feed.update(&mut view, &mut mixed_source()).unwrap();

        let marker = feed.markers().get(&PositionId::from("1")).unwrap().marker;
        assert!(feed.on_marker_clicked(&mut view, marker));
        let (at, html) = view.widget().info_window().unwrap();
        assert_eq!(*at, LatLng::new(60.1, 24.1));
        assert!(html.contains("validDepthCheckBox"));
        assert!(!feed.on_marker_clicked(&mut view, MarkerId(999)));
    }

    #[test]
    fn test_control_panel_and_radio_values() {
        let mut source = MemoryDataSource::new().with_control_panel("<form>radios</form>");
        let mut view = view_around(60.0, 24.0);
        let mut feed = feed();
        assert_eq!(feed.setup_control_panel(&mut source).unwrap(), "<form>radios</form>");
        assert_eq!(feed.control_panel(), Some("<form>radios</form>"));

        let filter: MeasurementFilter = "0".parse().unwrap();
        feed.set_filter(&mut view, filter);
        assert_eq!(feed.filter(), MeasurementFilter::All);
    }

    #[test]
    fn test_histogram_follows_dropped_markers_when_fetch_fails() {
        let mut view = view_around(60.0, 24.0);
        let mut source = mixed_source();
        let mut feed = feed();
        feed.update(&mut view, &mut source).unwrap();
        assert_eq!(feed.histogram_bins().iter().map(|b| b.count).sum::<usize>(), 2);

        view.widget_mut()
            .set_bounds(Some(Bounds::new(LatLng::new(10.0, 10.0), LatLng::new(11.0, 11.0))));
        source.set_failing(true);
        assert!(matches!(feed.update(&mut view, &mut source), Err(FeedError::Api(_))));

        assert!(feed.markers().is_empty());
        assert_eq!(feed.histogram_bins().iter().map(|b| b.count).sum::<usize>(), 0);
    }
}
