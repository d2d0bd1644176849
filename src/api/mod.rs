//! Backend API
//!
//! Wire schema version 1 under `/api/1/`, the [`DataSource`] seam used by
//! the feeds, and two implementations: blocking HTTP and in-memory.

pub mod client;
pub mod error;
pub mod memory;
pub mod types;

pub use client::{ApiSettings, DataSource, HttpDataSource};
pub use error::{ApiError, ApiResult};
pub use memory::{MemoryDataSource, RecordedRequest};
pub use types::{AreaQuery, DepthData, MeasurementUpdate, TripList, TripPoints};
