//! Map widget abstraction and the view built on top of it
//!
//! The mapping widget itself is external. Everything the feeds need from it
//! goes through the [`MapWidget`] trait, so the view logic runs the same
//! against a browser map and against the in-memory [`HeadlessMap`].

pub mod widget;
pub mod headless;
pub mod markers;
pub mod info;
pub mod persistence;
pub mod view;

pub use widget::MapWidget;
pub use headless::HeadlessMap;
pub use markers::{MarkerSet, TrackedMarker};
pub use persistence::{Cookie, CookieSettings, FileStore, MemoryStore, SavedViewport, ViewportStore};
pub use view::{MapView, ViewState};

use crate::core::{LatLng, DEFAULT_CENTER_LAT, DEFAULT_CENTER_LON, DEFAULT_ZOOM};
use crate::gradient::Color;
use serde::{Deserialize, Serialize};

/// Handle of a marker owned by the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// Visual description of a circular marker
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: LatLng,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub fill_opacity: f32,
    /// Drawn without a shadow
    pub flat: bool,
}

impl MarkerSpec {
    pub fn circle(position: LatLng, color: Color) -> Self {
        Self {
            position,
            fill_color: color,
            stroke_color: color,
            fill_opacity: 1.0,
            flat: true,
        }
    }
}

/// Events delivered by the map widget
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Visible area changed (pan settled or programmatic move)
    BoundsChanged,
    ZoomChanged,
    DragStart,
    DragEnd,
    MarkerClicked(MarkerId),
}

/// Initial map state and canvas geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub default_center: LatLng,
    pub default_zoom: u8,
    /// Canvas size used by the headless widget
    pub canvas_width_px: u32,
    pub canvas_height_px: u32,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            default_center: LatLng::new(DEFAULT_CENTER_LAT, DEFAULT_CENTER_LON),
            default_zoom: DEFAULT_ZOOM,
            canvas_width_px: 800,
            canvas_height_px: 600,
        }
    }
}
