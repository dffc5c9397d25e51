//! # Video Memory Context
//!
//! One instance of each allocator, built from a [`VramConfig`] and passed
//! to whoever needs it. There is no global: a second context is a second,
//! independent VRAM (tests build as many as they like).
//!
//! ## Frame Flow
//!
//! ```text
//!   logic phase                      end_frame()
//!  ┌─────────────────────┐   ┌──────────────────────────────┐
//!  │ allocate / free     │   │ 1. one param compaction step │
//!  │ write tiles, cells  ├──►│ 2. SPT values                │
//!  │ check() every call  │   │ 3. publish dirty windows     │
//!  └─────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! Allocation failures are fatal. Pass every allocator result through
//! [`VideoMemory::check`]: a fatal error halts the context and leaves a
//! diagnostic screen in the overlay.

use tracing::{error, info, info_span};
use vram_core::{
    BgmapTextureManager, CharSetManager, CompactionStep, ObjectSegmentManager, ParamTableManager,
    TextOverlay, VramError, VramResult,
};
use vram_shared::constants::OBJECT_SEGMENTS;

use crate::config::VramConfig;
use crate::frame::FrameReport;
use crate::sync::{DisplayLatch, DisplayReader, LatchUpdate};

/// The engine's video memory.
#[derive(Debug)]
pub struct VideoMemory {
    config: VramConfig,
    charsets: CharSetManager,
    bgmaps: BgmapTextureManager,
    params: ParamTableManager,
    objects: ObjectSegmentManager,
    latch: DisplayLatch,
    overlay: TextOverlay,
    frame: u64,
    halted: Option<VramError>,
}

impl VideoMemory {
    /// Builds every allocator from `config`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if the param table leaves no bgmap segment for
    /// textures, or the object segment errors of
    /// [`ObjectSegmentManager::setup_segments`].
    pub fn new(config: &VramConfig) -> VramResult<Self> {
        let texture_segments = config.texture_segments();
        if texture_segments == 0 {
            error!(param_table_segments = config.param_table_segments, "no bgmap segment left for textures");
            return Err(VramError::InvalidRequest("param table leaves no bgmap segment for textures"));
        }

        let charsets = CharSetManager::new(config.reserve_blank_tile);
        let params = ParamTableManager::new(config.param_table_segments);
        let bgmaps = BgmapTextureManager::new(
            BgmapTextureManager::segments_below(params.base_address()),
            config.reserve_printing_area,
        );
        let mut objects = ObjectSegmentManager::new();
        if let Some(layout) = &config.object_segments {
            objects.setup_segments(&layout.sizes, &layout.z_positions)?;
        }

        let latch = DisplayLatch::new(
            charsets.region().len(),
            bgmaps.region().len(),
            params.region().len(),
            objects.region().len(),
        );

        info!(
            texture_segments,
            param_base = params.base_address(),
            param_bytes = params.capacity(),
            object_segments = objects.segment_count(),
            "video memory ready"
        );

        Ok(Self {
            config: config.clone(),
            charsets,
            bgmaps,
            params,
            objects,
            latch,
            overlay: TextOverlay::default(),
            frame: 0,
            halted: None,
        })
    }

    // =========================================================================
    // Allocators
    // =========================================================================

    /// Tile memory.
    #[inline]
    #[must_use]
    pub const fn charsets(&self) -> &CharSetManager {
        &self.charsets
    }

    /// Tile memory, mutably.
    #[inline]
    pub fn charsets_mut(&mut self) -> &mut CharSetManager {
        &mut self.charsets
    }

    /// Bgmap textures.
    #[inline]
    #[must_use]
    pub const fn bgmaps(&self) -> &BgmapTextureManager {
        &self.bgmaps
    }

    /// Bgmap textures, mutably.
    #[inline]
    pub fn bgmaps_mut(&mut self) -> &mut BgmapTextureManager {
        &mut self.bgmaps
    }

    /// Param table.
    #[inline]
    #[must_use]
    pub const fn params(&self) -> &ParamTableManager {
        &self.params
    }

    /// Param table, mutably.
    #[inline]
    pub fn params_mut(&mut self) -> &mut ParamTableManager {
        &mut self.params
    }

    /// Object attribute memory.
    #[inline]
    #[must_use]
    pub const fn objects(&self) -> &ObjectSegmentManager {
        &self.objects
    }

    /// Object attribute memory, mutably.
    #[inline]
    pub fn objects_mut(&mut self) -> &mut ObjectSegmentManager {
        &mut self.objects
    }

    /// Configuration the context was built from.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &VramConfig {
        &self.config
    }

    /// A reader for the display side.
    #[must_use]
    pub fn display(&self) -> DisplayReader {
        self.latch.reader()
    }

    /// Debug overlay. Holds the fatal screen after a halt.
    #[inline]
    #[must_use]
    pub const fn overlay(&self) -> &TextOverlay {
        &self.overlay
    }

    /// Frames ended so far.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Returns true once a fatal error has been reported.
    #[inline]
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// The error that halted the context.
    #[inline]
    #[must_use]
    pub const fn halt_reason(&self) -> Option<&VramError> {
        self.halted.as_ref()
    }

    // =========================================================================
    // Fatal errors
    // =========================================================================

    /// Passes `result` through, halting on fatal errors.
    ///
    /// Bind the allocator result first, then check it:
    ///
    /// ```ignore
    /// let result = vram.charsets_mut().allocate(content, 8, CharSetPolicy::Exclusive);
    /// let allocation = vram.check(result)?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the error unchanged.
    pub fn check<T>(&mut self, result: VramResult<T>) -> VramResult<T> {
        match result {
            Err(err) if err.is_fatal() => Err(self.fatal(err)),
            other => other,
        }
    }

    /// Halts the context: logs `err`, renders the failing allocator's
    /// status into the overlay and returns `err` for the main loop.
    pub fn fatal(&mut self, err: VramError) -> VramError {
        error!(%err, frame = self.frame, "video memory exhausted, halting");

        self.overlay.clear();
        self.overlay.text(0, 0, "VRAM FATAL");
        self.overlay.text(0, 1, &err.to_string());
        #[cfg(feature = "debug_overlay")]
        {
            let overlay = &mut self.overlay;
            match &err {
                VramError::OutOfTileMemory { .. } => self.charsets.print(overlay, 0, 3),
                VramError::BgmapDepleted { .. } => self.bgmaps.print(overlay, 0, 3),
                VramError::OutOfParamMemory { .. } => self.params.print(overlay, 0, 3),
                VramError::ObjectSegmentsDepleted { .. }
                | VramError::ObjectBudgetExceeded { .. }
                | VramError::InvalidSegmentOrder { .. } => self.objects.print(overlay, 0, 3),
                _ => {}
            }
        }

        if self.halted.is_none() {
            self.halted = Some(err.clone());
        }
        err
    }

    // =========================================================================
    // Frame driver
    // =========================================================================

    /// Ends the frame: one compaction step, then every window written this
    /// frame goes to the display side.
    ///
    /// Owners of a relocated param table must point the hardware at the new
    /// offset before the next frame; see [`FrameReport::compaction`].
    pub fn end_frame(&mut self) -> FrameReport {
        let span = info_span!("frame", number = self.frame);
        let _guard = span.enter();

        let compaction = if self.is_halted() {
            CompactionStep::Idle
        } else {
            self.params.process_compaction_step()
        };

        let mut spt = [0u16; OBJECT_SEGMENTS];
        for (segment, value) in spt.iter_mut().enumerate() {
            *value = self.objects.spt_value(segment).unwrap_or(0);
        }

        let update = LatchUpdate {
            char_memory: self.charsets.take_dirty_region(),
            bgmap_memory: self.bgmaps.take_dirty_region(),
            param_table: self.params.take_dirty_region(),
            object_memory: self.objects.take_dirty_region(),
            spt,
        };
        let regions_published = self.latch.publish(self.frame, &update);

        let report = FrameReport {
            frame: self.frame,
            compaction,
            tiles_used: self.charsets.total_used_tiles(),
            bgmap_regions: self.bgmaps.region_count(),
            param_used: self.params.used(),
            param_free: self.params.free_bytes(),
            objects_used: self.objects.total_used_objects(),
            regions_published,
            halted: self.is_halted(),
        };
        self.frame += 1;
        report
    }

    /// Releases everything for a stage reload. The configured object
    /// layout is set up again; a halt is not cleared.
    ///
    /// # Errors
    ///
    /// The object segment errors of
    /// [`ObjectSegmentManager::setup_segments`].
    pub fn reset(&mut self) -> VramResult<()> {
        self.charsets.reset();
        self.bgmaps.reset();
        self.params.reset();
        self.objects.reset();
        let result = match &self.config.object_segments {
            Some(layout) => self.objects.setup_segments(&layout.sizes, &layout.z_positions),
            None => Ok(()),
        };
        self.check(result)?;
        info!(frame = self.frame, "video memory reset");
        Ok(())
    }

    /// Renders all four allocators' status into `overlay`.
    #[cfg(feature = "debug_overlay")]
    pub fn print_status(&self, overlay: &mut TextOverlay) {
        self.charsets.print(overlay, 0, 0);
        self.bgmaps.print(overlay, 24, 0);
        self.params.print(overlay, 0, 14);
        self.objects.print(overlay, 24, 15);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObjectSegmentConfig;
    use vram_core::CharSetPolicy;
    use vram_shared::ContentId;

    #[test]
    fn test_new_uses_config() {
        let config = VramConfig { param_table_segments: 2, ..VramConfig::default() };
        let vram = VideoMemory::new(&config).unwrap();

        assert_eq!(vram.bgmaps().available_segments(), 12);
        assert_eq!(vram.params().base_address(), 0x38000);
        assert_eq!(vram.params().capacity(), 0x5800);
        assert_eq!(vram.frame(), 0);
        assert!(!vram.is_halted());
    }

    #[test]
    fn test_new_rejects_full_param_table() {
        let config = VramConfig { param_table_segments: 14, ..VramConfig::default() };
        assert!(matches!(VideoMemory::new(&config), Err(VramError::InvalidRequest(_))));
    }

    #[test]
    fn test_new_sets_up_object_segments() {
        let config = VramConfig {
            object_segments: Some(ObjectSegmentConfig { sizes: vec![100, 200], z_positions: vec![0, 8] }),
            ..VramConfig::default()
        };
        let vram = VideoMemory::new(&config).unwrap();

        assert_eq!(vram.objects().segment_count(), 2);
        assert_eq!(vram.objects().spt_value(1), Some(299));
    }

    #[test]
    fn test_check_halts_on_fatal() {
        let mut vram = VideoMemory::new(&VramConfig::default()).unwrap();

        let ok = vram.charsets_mut().allocate(ContentId::new(1), 4, CharSetPolicy::Exclusive);
        assert!(vram.check(ok).is_ok());
        assert!(!vram.is_halted());

        let invalid = vram.charsets_mut().allocate(ContentId::new(2), 0, CharSetPolicy::Exclusive);
        assert!(vram.check(invalid).is_err());
        assert!(!vram.is_halted());

        let err = vram.fatal(VramError::OutOfParamMemory { requested: 64, available: 0 });
        assert!(vram.is_halted());
        assert_eq!(vram.halt_reason(), Some(&err));
        assert_eq!(vram.overlay().line(0), "VRAM FATAL");
    }

    #[test]
    fn test_frames_count_up() {
        let mut vram = VideoMemory::new(&VramConfig::default()).unwrap();
        let first = vram.end_frame();
        let second = vram.end_frame();

        assert_eq!(first.frame, 0);
        assert_eq!(second.frame, 1);
        assert_eq!(vram.frame(), 2);
        assert_eq!(vram.display().frame(), 1);
    }
}
