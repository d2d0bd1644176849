//! Data feeds drawn on top of the map view
//!
//! A feed reacts to settled viewports by fetching data for the visible
//! area and keeping one marker per measurement. Fetches are split into a
//! `begin_*` step that prepares the request and hands out a [`FetchTicket`],
//! and an `apply_*` step that delivers the response. Responses carrying a
//! ticket from an older generation are stale.

pub mod depth;
pub mod session;
pub mod trip;

pub use depth::{DepthFeed, DepthFeedSettings};
pub use session::MapSession;
pub use trip::TripFeed;

use crate::api::{ApiError, DataSource};
use crate::core::{PositionId, TripId};
use crate::map::{MapView, MapWidget, MarkerId};
use thiserror::Error;

pub type FeedResult<T> = Result<T, FeedError>;

#[derive(Debug, Error)]
pub enum FeedError {
    /// The widget could not report its visible area
    #[error("map bounds are not available")]
    BoundsUnavailable,

    #[error("measurement {position_id} is not shown on the map")]
    UnknownMeasurement { position_id: PositionId },

    #[error("trip {trip_id} is not in the trip list")]
    UnknownTrip { trip_id: TripId },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Identifies the settle that issued a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// Hands out fetch tickets and tells current ones from stale ones
#[derive(Debug, Default)]
pub struct FetchTracker {
    generation: u64,
}

impl FetchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, superseding every outstanding ticket
    pub fn issue(&mut self) -> FetchTicket {
        self.generation += 1;
        FetchTicket(self.generation)
    }

    /// Ticket of the current generation without starting a new one
    pub fn current(&self) -> FetchTicket {
        FetchTicket(self.generation)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.generation
    }
}

/// A feed driven by viewport changes of a [`MapView`]
pub trait ViewportListener<W: MapWidget> {
    /// Viewport settled; fetch and redraw for the new bounds
    fn on_viewport_settled(&mut self, view: &mut MapView<W>, source: &mut dyn DataSource) -> FeedResult<()>;

    /// A marker was clicked. Returns false when the marker is not owned by
    /// this feed.
    fn on_marker_clicked(&mut self, view: &mut MapView<W>, marker: MarkerId) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_generations() {
        let mut tracker = FetchTracker::new();
        let first = tracker.issue();
        assert!(tracker.is_current(first));

        let second = tracker.issue();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        assert_eq!(tracker.current(), second);
        assert!(first < second);
    }
}
