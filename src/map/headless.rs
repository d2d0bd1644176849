//! In-memory map widget for tests and the command line front-end

use crate::core::{Bounds, LatLng};
use crate::map::{MapSettings, MapWidget, MarkerId, MarkerSpec};
use std::collections::BTreeMap;

/// Pixel size of one map tile at zoom 0
const TILE_SIZE_PX: f64 = 256.0;

/// A marker as held by the headless widget
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMarker {
    pub spec: MarkerSpec,
    pub attached: bool,
}

/// Map widget that keeps all state in memory and draws nothing
pub struct HeadlessMap {
    center: LatLng,
    zoom: u8,
    canvas_width_px: u32,
    canvas_height_px: u32,
    bounds: Option<Bounds>,
    markers: BTreeMap<MarkerId, HeadlessMarker>,
    next_marker_id: u64,
    info_window: Option<(LatLng, String)>,
    alerts: Vec<String>,
}

impl HeadlessMap {
    /// Create a widget centered on `center` with bounds derived from the
    /// zoom level and canvas size
    pub fn new(center: LatLng, zoom: u8, canvas_width_px: u32, canvas_height_px: u32) -> Self {
        let mut map = Self {
            center,
            zoom,
            canvas_width_px,
            canvas_height_px,
            bounds: None,
            markers: BTreeMap::new(),
            next_marker_id: 1,
            info_window: None,
            alerts: Vec::new(),
        };
        map.bounds = Some(map.projected_bounds());
        map
    }

    pub fn from_settings(settings: &MapSettings) -> Self {
        Self::new(
            settings.default_center,
            settings.default_zoom,
            settings.canvas_width_px,
            settings.canvas_height_px,
        )
    }

    /// Override the visible area; `None` simulates a widget without bounds
    pub fn set_bounds(&mut self, bounds: Option<Bounds>) {
        self.bounds = bounds;
        if let Some(bounds) = bounds {
            self.center = bounds.center();
        }
    }

    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom;
    }

    /// Approximate Web Mercator extent of the canvas around the center
    fn projected_bounds(&self) -> Bounds {
        let world_px = TILE_SIZE_PX * 2f64.powi(self.zoom as i32);
        let lon_span = self.canvas_width_px as f64 * 360.0 / world_px;
        let lat_span =
            self.canvas_height_px as f64 * 360.0 / world_px * self.center.lat.to_radians().cos();
        Bounds::around(self.center, lat_span, lon_span)
    }

    pub fn marker(&self, marker: MarkerId) -> Option<&HeadlessMarker> {
        self.markers.get(&marker)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn attached_count(&self) -> usize {
        self.markers.values().filter(|m| m.attached).count()
    }

    pub fn info_window(&self) -> Option<&(LatLng, String)> {
        self.info_window.as_ref()
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }
}

impl MapWidget for HeadlessMap {
    fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    fn center(&self) -> LatLng {
        self.center
    }

    fn zoom(&self) -> u8 {
        self.zoom
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.center = center;
        self.zoom = zoom;
        self.bounds = Some(self.projected_bounds());
    }

    fn canvas_height_px(&self) -> u32 {
        self.canvas_height_px
    }

    fn add_marker(&mut self, spec: MarkerSpec) -> MarkerId {
        let id = MarkerId(self.next_marker_id);
        self.next_marker_id += 1;
        self.markers.insert(id, HeadlessMarker { spec, attached: false });
        id
    }

    fn set_marker_attached(&mut self, marker: MarkerId, attached: bool) {
        if let Some(m) = self.markers.get_mut(&marker) {
            m.attached = attached;
        }
    }

    fn is_marker_attached(&self, marker: MarkerId) -> bool {
        self.markers.get(&marker).map(|m| m.attached).unwrap_or(false)
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        self.markers.remove(&marker);
    }

    fn open_info_window(&mut self, at: LatLng, content: &str) {
        self.info_window = Some((at, content.to_string()));
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::Color;

    #[test]
    fn test_headless_bounds_follow_view() {
        let mut map = HeadlessMap::new(LatLng::new(60.0, 24.0), 12, 800, 600);
        let bounds = map.bounds().unwrap();
        assert!(bounds.contains(&LatLng::new(60.0, 24.0)));
        let span_at_12 = bounds.lat_span();

        map.set_view(LatLng::new(60.0, 24.0), 13);
        let span_at_13 = map.bounds().unwrap().lat_span();
        assert!((span_at_12 / span_at_13 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_marker_lifecycle() {
        let mut map = HeadlessMap::new(LatLng::new(60.0, 24.0), 12, 800, 600);
        let id = map.add_marker(MarkerSpec::circle(LatLng::new(60.0, 24.0), Color::rgb(1, 2, 3)));
        assert_eq!(map.marker_count(), 1);
        assert!(!map.is_marker_attached(id));

        map.set_marker_attached(id, true);
        assert_eq!(map.attached_count(), 1);

        map.remove_marker(id);
        assert_eq!(map.marker_count(), 0);
        assert!(!map.is_marker_attached(id));
    }

    #[test]
    fn test_alerts_and_info_window() {
        let mut map = HeadlessMap::new(LatLng::new(60.0, 24.0), 12, 800, 600);
        map.set_bounds(None);
        assert!(map.bounds().is_none());

        map.alert("no bounds");
        map.open_info_window(LatLng::new(1.0, 2.0), "<p>x</p>");
        assert_eq!(map.alerts(), &["no bounds".to_string()]);
        assert_eq!(map.info_window().unwrap().1, "<p>x</p>");
    }
}
