//! Error types for the Nebula3D engine
//!
//! This module defines the error types used throughout the engine core:
//! spatial queries, collision resolution, resource management and rendering.

use std::fmt;

/// Result type for Nebula3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Nebula3D engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Operation attempted before the owning system was initialised
    NotInitialised(&'static str),

    /// Point query outside the world rectangle of a grid
    OutOfBounds(f32, f32),

    /// Polygon cannot be triangulated (< 3 vertices, or no ear exists)
    DegeneratePolygon(String),

    /// Altitude query for a position not inside any collision volume
    OutsideAllVolumes,

    /// More than the supported number of lights staged in one frame
    LightCapacityExceeded(usize),

    /// Resource handle does not refer to a live resource
    UnknownResource(i64),

    /// Feature-set combination was not compiled before the render loop started
    FeatureSetUncompiled,

    /// Invalid resource data (texture, mesh, material, etc.)
    InvalidResource(String),

    /// The graphics device was lost or reported a surface error
    DeviceLost(String),

    /// Backend-specific error (worker thread, lock poisoning, etc.)
    BackendError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotInitialised(what) => write!(f, "{} not initialised", what),
            Error::OutOfBounds(x, y) => write!(f, "Point ({}, {}) out of bounds", x, y),
            Error::DegeneratePolygon(msg) => write!(f, "Degenerate polygon: {}", msg),
            Error::OutsideAllVolumes => write!(f, "Position is not inside any collision volume"),
            Error::LightCapacityExceeded(max) => {
                write!(f, "Exceeded maximum of {} lights per frame", max)
            }
            Error::UnknownResource(id) => write!(f, "Unknown resource id: {}", id),
            Error::FeatureSetUncompiled => {
                write!(f, "No pipeline compiled for this feature-set combination")
            }
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::DeviceLost(msg) => write!(f, "Graphics device error: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
