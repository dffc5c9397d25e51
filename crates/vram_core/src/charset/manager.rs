//! # CharSet Manager
//!
//! Hands out contiguous tile runs from the four character segments.
//!
//! Shared charsets are deduplicated by content: a second request for the
//! same content under the same shared policy gets the existing tiles and
//! bumps the reference count. Tiles go back to the segment only when the
//! last owner frees them.
//!
//! Freed runs leave gaps that first fit may not be able to use. The
//! defragmenter packs each segment from the bottom, one charset per step,
//! and reports every move so owners can pick up their new char index.

use tracing::{debug, error, trace, warn};
use vram_shared::constants::{
    CHAR_MEMORY_TOTAL_CHARS, CHAR_SEGMENTS, CHAR_SEGMENT_BYTES, CHAR_SPACE_BASE_ADDRESS,
    CHARS_PER_SEGMENT, TILE_BYTES,
};
use vram_shared::{ContentId, ContentSource, HardwareRegion};

use super::mask::SegmentMask;
#[cfg(feature = "debug_overlay")]
use crate::diagnostics::TextOverlay;
use crate::error::{VramError, VramResult};
use crate::memory::{RecordHandle, RecordPool};

/// How a charset's tiles may be shared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharSetPolicy {
    /// Private tiles. Each owner animates its own copy.
    Exclusive,
    /// Shared tiles; every owner sees the same animation frame.
    SharedAnimated,
    /// Shared tiles that never change after the first write.
    Static,
}

impl CharSetPolicy {
    /// Returns true if owners with identical content share one copy.
    #[inline]
    #[must_use]
    pub const fn is_shared(self) -> bool {
        !matches!(self, Self::Exclusive)
    }

    /// Returns true if the record may switch animation frames.
    #[inline]
    #[must_use]
    pub const fn is_animated(self) -> bool {
        !matches!(self, Self::Static)
    }
}

/// Handle to an allocated charset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CharSetHandle(RecordHandle);

/// Describes a charset to allocate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharSetRequest {
    /// Tile content.
    pub content: ContentId,
    /// Tiles per animation frame.
    pub tile_count: usize,
    /// Sharing policy.
    pub policy: CharSetPolicy,
}

impl CharSetRequest {
    /// Creates a request.
    #[inline]
    #[must_use]
    pub const fn new(content: ContentId, tile_count: usize, policy: CharSetPolicy) -> Self {
        Self { content, tile_count, policy }
    }
}

/// Result of a successful allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharSetAllocation {
    /// Handle for later calls.
    pub handle: CharSetHandle,
    /// Char segment holding the tiles.
    pub segment: usize,
    /// First tile within the segment.
    pub offset: usize,
    /// True if the tiles still need their first write.
    pub needs_write: bool,
}

/// A charset moved down by the defragmenter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharSetRelocation {
    /// Charset that moved. Its handle stays valid.
    pub handle: CharSetHandle,
    /// Segment it lives in.
    pub segment: usize,
    /// Old first tile.
    pub from: usize,
    /// New first tile.
    pub to: usize,
}

#[derive(Clone, Debug)]
struct CharSetRecord {
    content: ContentId,
    tile_count: usize,
    policy: CharSetPolicy,
    segment: usize,
    offset: usize,
    ref_count: usize,
    frame: usize,
    written: bool,
}

impl CharSetRecord {
    #[inline]
    const fn byte_offset(&self) -> usize {
        self.segment * CHAR_SEGMENT_BYTES + self.offset * TILE_BYTES
    }
}

/// Allocator for character (tile) memory.
#[derive(Debug)]
pub struct CharSetManager {
    region: HardwareRegion,
    segments: [SegmentMask; CHAR_SEGMENTS],
    records: RecordPool<CharSetRecord>,
    reserve_blank_tile: bool,
    /// A free left a gap the defragmenter has not closed yet.
    needs_defrag: bool,
}

impl CharSetManager {
    /// Creates an empty manager.
    ///
    /// With `reserve_blank_tile`, tile 0 of segment 0 is never handed out.
    #[must_use]
    pub fn new(reserve_blank_tile: bool) -> Self {
        let mut manager = Self {
            region: HardwareRegion::new(
                "char memory",
                CHAR_SPACE_BASE_ADDRESS,
                CHAR_SEGMENTS * CHAR_SEGMENT_BYTES,
            ),
            segments: std::array::from_fn(|_| SegmentMask::new()),
            records: RecordPool::new(CHAR_MEMORY_TOTAL_CHARS),
            reserve_blank_tile,
            needs_defrag: false,
        };
        manager.reserve();
        manager
    }

    fn reserve(&mut self) {
        if self.reserve_blank_tile {
            self.segments[0].mark(0, 1);
        }
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Allocates `tile_count` tiles for `content`.
    ///
    /// Shared policies first look for a live record with the same content
    /// and policy; a hit bumps its reference count and touches no memory.
    ///
    /// # Errors
    ///
    /// `OutOfTileMemory` if no segment has a contiguous free run, and
    /// `InvalidRequest` for zero or oversized tile counts.
    pub fn allocate(
        &mut self,
        content: ContentId,
        tile_count: usize,
        policy: CharSetPolicy,
    ) -> VramResult<CharSetAllocation> {
        if tile_count == 0 || tile_count > CHARS_PER_SEGMENT {
            return Err(VramError::InvalidRequest("charset tile count must be 1..=512"));
        }

        if policy.is_shared() {
            let existing = self
                .records
                .find(|record| record.content == content && record.policy == policy);
            if let Some(handle) = existing {
                if let Some(record) = self.records.get_mut(handle) {
                    debug_assert_eq!(record.tile_count, tile_count, "shared content changed size");
                    record.ref_count += 1;
                    debug!(
                        segment = record.segment,
                        offset = record.offset,
                        refs = record.ref_count,
                        "charset shared"
                    );
                    return Ok(CharSetAllocation {
                        handle: CharSetHandle(handle),
                        segment: record.segment,
                        offset: record.offset,
                        needs_write: !record.written,
                    });
                }
            }
        }

        let placement = self
            .segments
            .iter()
            .enumerate()
            .find_map(|(segment, mask)| mask.find_run(tile_count).map(|offset| (segment, offset)));

        let Some((segment, offset)) = placement else {
            let free = self.total_free_tiles();
            error!(tiles = tile_count, free, "char memory depleted");
            return Err(VramError::OutOfTileMemory { requested: tile_count, free });
        };

        let record = CharSetRecord {
            content,
            tile_count,
            policy,
            segment,
            offset,
            ref_count: 1,
            frame: 0,
            written: false,
        };
        // One record per tile at most, so the pool cannot run out first
        let handle = self
            .records
            .insert(record)
            .ok_or(VramError::OutOfTileMemory { requested: tile_count, free: 0 })?;
        self.segments[segment].mark(offset, tile_count);

        debug!(segment, offset, tiles = tile_count, ?policy, "charset allocated");

        Ok(CharSetAllocation { handle: CharSetHandle(handle), segment, offset, needs_write: true })
    }

    /// Allocates every shared request up front, in order.
    ///
    /// Exclusive requests are skipped; their owners allocate on demand.
    ///
    /// # Errors
    ///
    /// Stops at the first failed allocation.
    pub fn load_shared(&mut self, requests: &[CharSetRequest]) -> VramResult<Vec<CharSetHandle>> {
        requests
            .iter()
            .filter(|request| request.policy.is_shared())
            .map(|request| {
                self.allocate(request.content, request.tile_count, request.policy)
                    .map(|allocation| allocation.handle)
            })
            .collect()
    }

    /// Drops one reference. Returns true if the tiles went back to the segment.
    pub fn free(&mut self, handle: CharSetHandle) -> bool {
        let Some(record) = self.records.get_mut(handle.0) else {
            debug_assert!(false, "freeing unknown charset {handle:?}");
            warn!(?handle, "ignoring free of unknown charset");
            return false;
        };

        record.ref_count -= 1;
        if record.ref_count > 0 {
            debug!(refs = record.ref_count, "charset released by one owner");
            return false;
        }

        let Some(record) = self.records.remove(handle.0) else {
            return false;
        };
        self.segments[record.segment].release(record.offset, record.tile_count);
        self.needs_defrag = true;
        debug!(segment = record.segment, offset = record.offset, tiles = record.tile_count, "charset freed");

        true
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Copies the current frame's tiles from `source` into char memory.
    ///
    /// # Errors
    ///
    /// `MissingContent` if the source lacks the content, `InvalidRequest`
    /// if it holds fewer bytes than the frame needs or the handle is unknown.
    pub fn write(&mut self, handle: CharSetHandle, source: &dyn ContentSource) -> VramResult<()> {
        let Some(record) = self.records.get_mut(handle.0) else {
            debug_assert!(false, "writing unknown charset {handle:?}");
            return Err(VramError::InvalidRequest("unknown charset handle"));
        };

        let data = source.tiles(record.content).ok_or(VramError::MissingContent(record.content))?;
        let frame_bytes = record.tile_count * TILE_BYTES;
        let start = record.frame * frame_bytes;
        let frame = data
            .get(start..start + frame_bytes)
            .ok_or(VramError::InvalidRequest("tile content shorter than the charset frame"))?;

        self.region.write(record.byte_offset(), frame)?;
        record.written = true;
        Ok(())
    }

    /// Selects an animation frame and writes it.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for `Static` charsets, plus anything [`Self::write`] returns.
    pub fn set_frame(
        &mut self,
        handle: CharSetHandle,
        frame: usize,
        source: &dyn ContentSource,
    ) -> VramResult<()> {
        let Some(record) = self.records.get_mut(handle.0) else {
            debug_assert!(false, "animating unknown charset {handle:?}");
            return Err(VramError::InvalidRequest("unknown charset handle"));
        };
        if !record.policy.is_animated() {
            debug_assert!(false, "static charsets cannot change frames");
            return Err(VramError::InvalidRequest("static charsets cannot change frames"));
        }

        if record.frame == frame && record.written {
            return Ok(());
        }
        let previous = std::mem::replace(&mut record.frame, frame);
        let result = self.write(handle, source);
        if result.is_err() {
            if let Some(record) = self.records.get_mut(handle.0) {
                record.frame = previous;
            }
        }
        result
    }

    /// Writes every record that has not been written yet. Returns how many.
    ///
    /// # Errors
    ///
    /// Stops at the first failed write.
    pub fn write_pending(&mut self, source: &dyn ContentSource) -> VramResult<usize> {
        let pending: Vec<CharSetHandle> = self
            .records
            .iter()
            .filter(|(_, record)| !record.written)
            .map(|(handle, _)| CharSetHandle(handle))
            .collect();

        for handle in &pending {
            self.write(*handle, source)?;
        }
        Ok(pending.len())
    }

    // =========================================================================
    // Defragmentation
    // =========================================================================

    /// Moves at most one charset down onto the lowest free tile of its
    /// segment. Returns `None` once every segment is packed.
    ///
    /// The tiles are copied inside char memory, so the moved charset keeps
    /// its current animation frame. Owners must refresh anything that
    /// holds the old char index (object attributes, bgmap cells).
    pub fn defragment_step(&mut self) -> Option<CharSetRelocation> {
        if !self.needs_defrag {
            return None;
        }

        for segment in 0..CHAR_SEGMENTS {
            let Some(hole) = self.segments[segment].find_run(1) else {
                continue;
            };

            // Every tile below the hole is taken, so [hole, next.offset) is free
            let next = self
                .records
                .iter()
                .filter(|(_, record)| record.segment == segment && record.offset > hole)
                .min_by_key(|(_, record)| record.offset)
                .map(|(handle, _)| handle);
            let Some(handle) = next else {
                continue;
            };
            let Some(record) = self.records.get_mut(handle) else {
                continue;
            };

            let from = record.offset;
            let bytes = record.tile_count * TILE_BYTES;
            let source = record.byte_offset();
            let target = segment * CHAR_SEGMENT_BYTES + hole * TILE_BYTES;
            if let Err(err) = self.region.copy_within(source, target, bytes) {
                // Offsets come from this allocator, so only corrupt
                // bookkeeping gets here
                error!(%err, segment, "charset relocation out of bounds");
                return None;
            }
            record.offset = hole;
            self.segments[segment].release(from, record.tile_count);
            self.segments[segment].mark(hole, record.tile_count);

            trace!(segment, from, to = hole, tiles = record.tile_count, "charset relocated");
            return Some(CharSetRelocation { handle: CharSetHandle(handle), segment, from, to: hole });
        }

        self.needs_defrag = false;
        None
    }

    /// Packs every segment. Used at stage load, before anything is drawn.
    pub fn defragment_fully(&mut self) -> Vec<CharSetRelocation> {
        let mut relocations = Vec::new();
        while let Some(relocation) = self.defragment_step() {
            relocations.push(relocation);
        }
        debug!(moved = relocations.len(), "char memory packed");
        relocations
    }

    /// Returns true if a free left a gap that has not been packed yet.
    #[inline]
    #[must_use]
    pub const fn needs_defrag(&self) -> bool {
        self.needs_defrag
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// First tile of the charset within its segment.
    #[must_use]
    pub fn offset(&self, handle: CharSetHandle) -> Option<usize> {
        self.records.get(handle.0).map(|record| record.offset)
    }

    /// Segment holding the charset.
    #[must_use]
    pub fn segment(&self, handle: CharSetHandle) -> Option<usize> {
        self.records.get(handle.0).map(|record| record.segment)
    }

    /// Global char index (`segment * 512 + offset`) used in bgmap cells and objects.
    #[must_use]
    pub fn char_index(&self, handle: CharSetHandle) -> Option<usize> {
        self.records
            .get(handle.0)
            .map(|record| record.segment * CHARS_PER_SEGMENT + record.offset)
    }

    /// Number of owners sharing the charset.
    #[must_use]
    pub fn ref_count(&self, handle: CharSetHandle) -> Option<usize> {
        self.records.get(handle.0).map(|record| record.ref_count)
    }

    /// Tiles per frame.
    #[must_use]
    pub fn tile_count(&self, handle: CharSetHandle) -> Option<usize> {
        self.records.get(handle.0).map(|record| record.tile_count)
    }

    /// Current animation frame.
    #[must_use]
    pub fn frame(&self, handle: CharSetHandle) -> Option<usize> {
        self.records.get(handle.0).map(|record| record.frame)
    }

    /// Tiles taken in one segment, reserved tiles included.
    ///
    /// # Panics
    ///
    /// Panics if `segment` is out of range.
    #[must_use]
    pub fn used_tiles(&self, segment: usize) -> usize {
        self.segments[segment].used()
    }

    /// Tiles taken across all segments.
    #[must_use]
    pub fn total_used_tiles(&self) -> usize {
        self.segments.iter().map(SegmentMask::used).sum()
    }

    /// Tiles free across all segments.
    #[must_use]
    pub fn total_free_tiles(&self) -> usize {
        self.segments.iter().map(SegmentMask::free).sum()
    }

    /// Number of live records.
    #[inline]
    #[must_use]
    pub const fn record_count(&self) -> usize {
        self.records.len()
    }

    /// The backing char memory.
    #[inline]
    #[must_use]
    pub const fn region(&self) -> &HardwareRegion {
        &self.region
    }

    /// Returns the region if it changed since the last call.
    pub fn take_dirty_region(&mut self) -> Option<&HardwareRegion> {
        self.region.take_dirty().then_some(&self.region)
    }

    /// Drops every record and restores the initial free space.
    ///
    /// Memory contents are left as they are; the next owners overwrite them.
    pub fn reset(&mut self) {
        self.records.clear();
        for mask in &mut self.segments {
            mask.reset();
        }
        self.reserve();
        self.needs_defrag = false;
        debug!("char memory reset");
    }

    /// Prints per-segment usage.
    #[cfg(feature = "debug_overlay")]
    pub fn print(&self, overlay: &mut TextOverlay, x: usize, y: usize) {
        overlay.text(x, y, "CHAR MEMORY USAGE");
        overlay.text(x, y + 2, "Seg  Used  Free  Run");
        for (segment, mask) in self.segments.iter().enumerate() {
            let row = y + 3 + segment;
            overlay.int(x, row, segment as i64);
            overlay.int(x + 5, row, mask.used() as i64);
            overlay.int(x + 11, row, mask.free() as i64);
            overlay.int(x + 17, row, mask.largest_free_run() as i64);
        }
        overlay.text(x, y + 8, "Records:");
        overlay.int(x + 9, y + 8, self.records.len() as i64);
        overlay.text(x, y + 9, "Total free:");
        overlay.int(x + 12, y + 9, self.total_free_tiles() as i64);
    }
}
