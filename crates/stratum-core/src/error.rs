//! Error types for stratum-core.

use crate::pile::PlaneId;
use std::collections::TryReserveError;
use thiserror::Error;

/// Errors returned by plane, blitter and render operations.
///
/// Every variant is recoverable: the operation that produced it left the
/// pile and frame buffers exactly as they were before the call.
#[derive(Debug, Error)]
pub enum Error {
    /// Plane dimensions or position make no sense.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Write or cursor target outside the plane grid.
    #[error("Out of bounds: ({y}, {x}) outside {rows}x{cols} plane")]
    OutOfBounds {
        y: u32,
        x: u32,
        rows: u32,
        cols: u32,
    },

    /// Blit destination has no area, or the bitmap has no pixels.
    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    /// Bitmap length does not match width × height × bytes-per-pixel.
    #[error("Source buffer mismatch: expected {expected} bytes, got {actual}")]
    SourceBufferMismatch { expected: usize, actual: usize },

    /// Only 3 (RGB) and 4 (RGBA) bytes per pixel are understood.
    #[error("Unsupported pixel format: {0} bytes per pixel")]
    UnsupportedPixelFormat(usize),

    /// The id does not name a live plane of this pile.
    #[error("Unknown plane: {0}")]
    UnknownPlane(PlaneId),

    /// The root plane cannot be destroyed, moved or resized directly.
    #[error("Operation not permitted on the root plane")]
    RootPlane,

    /// Grid storage could not be allocated.
    #[error("Allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// The output sink failed while a frame was being written.
    #[error("Render IO error: {0}")]
    RenderIo(#[source] std::io::Error),
}

/// Result alias used throughout stratum-core.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_geometry_message() {
        let err = Error::InvalidGeometry("rows is zero while cols is 4".to_string());
        assert!(err.to_string().contains("Invalid geometry"));
        assert!(err.to_string().contains("cols is 4"));
    }

    #[test]
    fn test_out_of_bounds_message() {
        let err = Error::OutOfBounds {
            y: 7,
            x: 2,
            rows: 5,
            cols: 10,
        };
        assert_eq!(err.to_string(), "Out of bounds: (7, 2) outside 5x10 plane");
    }

    #[test]
    fn test_source_buffer_mismatch_message() {
        let err = Error::SourceBufferMismatch {
            expected: 16,
            actual: 12,
        };
        let msg = err.to_string();
        assert!(msg.contains("16"));
        assert!(msg.contains("12"));
    }

    #[test]
    fn test_render_io_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sink closed");
        let err = Error::RenderIo(io);
        assert!(err.to_string().contains("sink closed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_allocation_from() {
        let mut v: Vec<u8> = Vec::new();
        let reserve = v.try_reserve_exact(usize::MAX).unwrap_err();
        let err: Error = reserve.into();
        assert!(matches!(err, Error::Allocation(_)));
    }

    #[test]
    fn test_root_plane_debug() {
        let debug_str = format!("{:?}", Error::RootPlane);
        assert!(debug_str.contains("RootPlane"));
    }
}
