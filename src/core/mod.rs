//! Core types and constants for the depth map

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
