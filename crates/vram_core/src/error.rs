//! # Allocator Error Types
//!
//! All errors the four VRAM allocators can report.
//!
//! Out-of-memory means the game's asset budget exceeds fixed hardware
//! capacity. There is no fallback: the engine reports it and halts.

use thiserror::Error;
use vram_shared::{ContentId, RegionError};

/// Errors that can occur in the VRAM allocators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VramError {
    /// No segment has a contiguous free run large enough.
    #[error("char memory depleted: no run of {requested} free tiles ({free} tiles free in total)")]
    OutOfTileMemory {
        /// Tiles requested.
        requested: usize,
        /// Free tiles across all segments.
        free: usize,
    },

    /// No bgmap segment has room and no free cached region fits.
    #[error("bgmap segments depleted: no room for a {cols}x{rows} texture")]
    BgmapDepleted {
        /// Requested columns, padding included.
        cols: usize,
        /// Requested rows, padding included.
        rows: usize,
    },

    /// The param table cannot fit another table.
    #[error("param table depleted: {requested} bytes requested, {available} available")]
    OutOfParamMemory {
        /// Bytes requested.
        requested: usize,
        /// Bytes left before the end of the table.
        available: usize,
    },

    /// No object segment can hold the requested objects.
    #[error("object segments depleted: {requested} objects requested, largest free run is {largest_free}")]
    ObjectSegmentsDepleted {
        /// Objects requested.
        requested: usize,
        /// Largest number of free slots in a single segment.
        largest_free: usize,
    },

    /// Explicit segment sizes exceed the object attribute table.
    #[error("object budget exceeded: {requested} objects configured, hardware has {available}")]
    ObjectBudgetExceeded {
        /// Sum of configured sizes.
        requested: usize,
        /// Hardware object slots.
        available: usize,
    },

    /// Segment z positions are not ordered from nearest to most distant.
    #[error("object segment {segment} has z {z}, below previous segment's {previous}")]
    InvalidSegmentOrder {
        /// Offending segment.
        segment: usize,
        /// Its z position.
        z: i32,
        /// The previous segment's z position.
        previous: i32,
    },

    /// The content source has no data for a record being written.
    #[error("content {0:?} not found in content source")]
    MissingContent(ContentId),

    /// A request that can never be satisfied (zero size, oversized, duplicate owner).
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),

    /// A hardware region access failed.
    #[error(transparent)]
    Region(#[from] RegionError),
}

impl VramError {
    /// Returns true if the error must halt the engine.
    ///
    /// Depletion and setup errors are fatal. Bad requests and missing
    /// content are reported to the caller, which owns the decision.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::OutOfTileMemory { .. }
                | Self::BgmapDepleted { .. }
                | Self::OutOfParamMemory { .. }
                | Self::ObjectSegmentsDepleted { .. }
                | Self::ObjectBudgetExceeded { .. }
                | Self::InvalidSegmentOrder { .. }
        )
    }
}

/// Result type for allocator operations.
pub type VramResult<T> = Result<T, VramError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(VramError::OutOfTileMemory { requested: 4, free: 2 }.is_fatal());
        assert!(VramError::OutOfParamMemory { requested: 4, available: 2 }.is_fatal());
        assert!(!VramError::InvalidRequest("zero tiles").is_fatal());
        assert!(!VramError::MissingContent(ContentId::new(3)).is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = VramError::BgmapDepleted { cols: 64, rows: 8 };
        assert_eq!(err.to_string(), "bgmap segments depleted: no room for a 64x8 texture");
    }
}
