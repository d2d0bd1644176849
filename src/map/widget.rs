//! Map widget interface

use crate::core::{Bounds, LatLng};
use crate::map::{MarkerId, MarkerSpec};

/// Operations the views need from a mapping widget
pub trait MapWidget {
    /// Currently visible area; `None` while the widget has not laid out yet
    fn bounds(&self) -> Option<Bounds>;

    fn center(&self) -> LatLng;

    fn zoom(&self) -> u8;

    /// Move the map to a new center and zoom level
    fn set_view(&mut self, center: LatLng, zoom: u8);

    /// Height of the map canvas in pixels
    fn canvas_height_px(&self) -> u32;

    /// Create a marker. New markers are detached (not drawn).
    fn add_marker(&mut self, spec: MarkerSpec) -> MarkerId;

    /// Attach a marker to the map or detach it without destroying it
    fn set_marker_attached(&mut self, marker: MarkerId, attached: bool);

    fn is_marker_attached(&self, marker: MarkerId) -> bool;

    /// Destroy a marker
    fn remove_marker(&mut self, marker: MarkerId);

    /// Show the shared info popup at a position
    fn open_info_window(&mut self, at: LatLng, content: &str);

    /// Blocking user-facing alert
    fn alert(&mut self, message: &str);
}
