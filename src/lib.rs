//! Marine depth map
//!
//! Controllers for a map that shows depth measurements and vessel trip
//! tracks. Depths are colored along a red-green-blue gradient, can be
//! filtered and flagged as erroneous, and summarized in a histogram.
//! The map widget and the backend are reached through traits so the same
//! logic runs against a browser map, the in-memory [`map::HeadlessMap`],
//! the HTTP backend or the in-memory [`api::MemoryDataSource`].

pub mod core;
pub mod gradient;
pub mod histogram;
pub mod map;
pub mod api;
pub mod feeds;
pub mod utils;

// Re-export commonly used types
pub use core::{Bounds, LatLng, Measurement, MeasurementFilter, PositionId, Trip, TripId};
pub use gradient::{Color, DepthGradient, DepthLegend, GradientConfig};
pub use histogram::{DepthHistogram, HistogramBin, HistogramConfig, HistogramError};
pub use map::{HeadlessMap, MapEvent, MapSettings, MapView, MapWidget, MarkerId, ViewState};
pub use api::{ApiError, ApiSettings, AreaQuery, DataSource, HttpDataSource, MemoryDataSource};
pub use feeds::{DepthFeed, DepthFeedSettings, FeedError, FeedResult, MapSession, TripFeed, ViewportListener};
pub use utils::{ConfigError, ConfigurationManager, LogLevel, ViewerConfig};
