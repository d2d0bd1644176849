//! Viewport handling shared by the depth and trip feeds

use crate::api::AreaQuery;
use crate::core::{
    Bounds, LatLng, Measurement, PositionId, BOUNDS_UNAVAILABLE_MESSAGE, LAT_DEG_TO_METERS,
};
use crate::gradient::Color;
use crate::map::info::info_window_html;
use crate::map::{
    Cookie, CookieSettings, MapEvent, MapSettings, MapWidget, MarkerId, MarkerSet, MarkerSpec,
    SavedViewport, ViewportStore,
};
use chrono::Utc;
use tracing::{debug, warn};

/// Below this zoom level the sampling density is divided by four
const COARSE_ZOOM: u8 = 11;
/// Below this zoom level the sampling density is halved
const MEDIUM_ZOOM: u8 = 14;

/// Where the view is in its update cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    /// User is dragging the map; settle events are ignored
    Dragging,
    /// Viewport settled and the owning feed should fetch
    Fetching,
}

/// A map widget together with viewport persistence and the update state
pub struct MapView<W: MapWidget> {
    widget: W,
    state: ViewState,
    store: Box<dyn ViewportStore>,
    cookie: CookieSettings,
}

impl<W: MapWidget> MapView<W> {
    /// Wrap a widget, restoring the last saved viewport when one exists
    pub fn new(
        mut widget: W,
        store: Box<dyn ViewportStore>,
        cookie: CookieSettings,
        settings: &MapSettings,
    ) -> Self {
        let saved = store.get(&cookie.name).and_then(|value| {
            SavedViewport::from_cookie_value(&value)
                .map_err(|e| warn!(cookie = %cookie.name, error = %e, "ignoring malformed viewport cookie"))
                .ok()
        });

        match saved {
            Some(viewport) => {
                debug!(lat = viewport.lat, lon = viewport.lon, zoom = viewport.zoom, "restoring viewport");
                widget.set_view(viewport.center(), viewport.zoom);
            }
            None => widget.set_view(settings.default_center, settings.default_zoom),
        }

        Self {
            widget,
            state: ViewState::Idle,
            store,
            cookie,
        }
    }

    /// Advance the state machine. Returns true when the viewport settled
    /// and the owning feed should run its update.
    pub fn handle_event(&mut self, event: &MapEvent) -> bool {
        match event {
            MapEvent::DragStart => {
                self.state = ViewState::Dragging;
                false
            }
            MapEvent::DragEnd => {
                self.settle();
                true
            }
            MapEvent::BoundsChanged | MapEvent::ZoomChanged => {
                if self.state == ViewState::Dragging {
                    return false;
                }
                self.settle();
                true
            }
            MapEvent::MarkerClicked(_) => false,
        }
    }

    fn settle(&mut self) {
        self.save_viewport();
        self.state = ViewState::Fetching;
    }

    /// Mark the running update as done
    pub fn finish_update(&mut self) {
        if self.state == ViewState::Fetching {
            self.state = ViewState::Idle;
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    /// Persist the current center and zoom
    pub fn save_viewport(&mut self) {
        let viewport = SavedViewport::new(self.widget.center(), self.widget.zoom());
        match viewport.to_cookie_value() {
            Ok(value) => self.store.set(&Cookie::new(&self.cookie, value, Utc::now())),
            Err(e) => warn!(error = %e, "failed to serialize viewport"),
        }
    }

    /// Whether the point lies strictly inside the visible area
    pub fn is_in_view(&self, point: &Measurement) -> bool {
        match self.widget.bounds() {
            Some(bounds) => bounds.contains(&point.position()),
            None => false,
        }
    }

    /// Remove every tracked marker whose point left the visible area.
    /// Does nothing while bounds are unavailable.
    pub fn drop_points_outside_bounds(&mut self, markers: &mut MarkerSet) -> Vec<PositionId> {
        if self.widget.bounds().is_none() {
            return Vec::new();
        }

        let outside: Vec<PositionId> = markers
            .iter()
            .filter(|t| !self.is_in_view(&t.point))
            .map(|t| t.point.position_id.clone())
            .collect();

        for id in &outside {
            if let Some(tracked) = markers.remove(id) {
                self.widget.remove_marker(tracked.marker);
            }
        }
        if !outside.is_empty() {
            debug!(dropped = outside.len(), remaining = markers.len(), "dropped markers outside view");
        }
        outside
    }

    /// Create a flat circle marker for a point. The marker starts detached.
    pub fn make_marker(&mut self, point: &Measurement, color: Color) -> MarkerId {
        self.widget.add_marker(MarkerSpec::circle(point.position(), color))
    }

    pub fn set_marker_visible(&mut self, marker: MarkerId, visible: bool) {
        if self.widget.is_marker_attached(marker) != visible {
            self.widget.set_marker_attached(marker, visible);
        }
    }

    pub fn remove_marker(&mut self, marker: MarkerId) {
        self.widget.remove_marker(marker);
    }

    /// Open the info popup for a point
    pub fn show_info(&mut self, point: &Measurement, with_validity_checkbox: bool) {
        let html = info_window_html(point, with_validity_checkbox);
        self.widget.open_info_window(point.position(), &html);
    }

    /// Current bounds, alerting the user when the widget has none
    pub fn bounds_or_alert(&mut self) -> Option<Bounds> {
        let bounds = self.widget.bounds();
        if bounds.is_none() {
            warn!("map bounds are not available");
            self.widget.alert(BOUNDS_UNAVAILABLE_MESSAGE);
        }
        bounds
    }

    /// Query parameters for the visible area, or `None` (after alerting)
    /// when bounds are unavailable
    pub fn area_query(&mut self) -> Option<AreaQuery> {
        let bounds = self.bounds_or_alert()?;
        let canvas_height = self.widget.canvas_height_px().max(1) as f64;

        let mut m_per_pix = bounds.lat_span() * LAT_DEG_TO_METERS / canvas_height;
        let zoom = self.widget.zoom();
        if zoom < COARSE_ZOOM {
            m_per_pix *= 4.0;
        } else if zoom < MEDIUM_ZOOM {
            m_per_pix *= 2.0;
        }

        Some(AreaQuery::new(bounds, m_per_pix))
    }

    pub fn center(&self) -> LatLng {
        self.widget.center()
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }
}
