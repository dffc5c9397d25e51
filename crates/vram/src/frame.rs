//! Per-frame statistics.

use vram_core::CompactionStep;

/// What happened to video memory during one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame number, starting at 0.
    pub frame: u64,
    /// Outcome of this frame's param table compaction step.
    pub compaction: CompactionStep,
    /// Tiles in use across all char segments.
    pub tiles_used: usize,
    /// Bgmap regions tracked, free ones included.
    pub bgmap_regions: usize,
    /// Param table bytes below the bump pointer.
    pub param_used: usize,
    /// Param table bytes above the bump pointer.
    pub param_free: usize,
    /// Object slots in use across all segments.
    pub objects_used: usize,
    /// Memory windows copied to the display side.
    pub regions_published: usize,
    /// The context is halted after a fatal error.
    pub halted: bool,
}

impl FrameReport {
    /// Returns true if a param table moved this frame.
    #[must_use]
    pub fn relocated(&self) -> bool {
        matches!(self.compaction, CompactionStep::Relocated { .. })
    }

    /// Returns true if the param table hole closed this frame.
    #[must_use]
    pub fn hole_closed(&self) -> bool {
        matches!(self.compaction, CompactionStep::Closed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vram_shared::OwnerId;

    fn report(compaction: CompactionStep) -> FrameReport {
        FrameReport {
            frame: 3,
            compaction,
            tiles_used: 0,
            bgmap_regions: 0,
            param_used: 0,
            param_free: 0,
            objects_used: 0,
            regions_published: 0,
            halted: false,
        }
    }

    #[test]
    fn test_compaction_helpers() {
        let moved = report(CompactionStep::Relocated { owner: OwnerId::new(1), from: 384, to: 128, bytes: 64 });
        assert!(moved.relocated());
        assert!(!moved.hole_closed());

        let closed = report(CompactionStep::Closed { reclaimed: 256 });
        assert!(closed.hole_closed());
        assert!(!closed.relocated());

        let idle = report(CompactionStep::Idle);
        assert!(!idle.relocated() && !idle.hole_closed());
    }
}
