//! # Bgmap Texture Manager
//!
//! Places rectangular textures in bgmap segments and keeps them around as
//! a cache after their owners let go.
//!
//! Removing a texture never erases it. The region stays tagged with its
//! content and becomes a reuse candidate: the same content comes back for
//! free, and other requests of equal or smaller size take it over (best
//! fit, exact size first) before any new segment space is carved.

use tracing::{debug, error, warn};
use vram_shared::constants::{
    BGMAP_CHAR_MASK, BGMAP_ENTRY_BYTES, BGMAP_PALETTE_SHIFT, BGMAP_SEGMENT_BYTES,
    BGMAP_SEGMENT_COLS, BGMAP_SEGMENT_ROWS, BGMAP_SPACE_BASE_ADDRESS, MAX_BGMAP_SEGMENTS,
    SCREEN_HEIGHT_IN_CHARS,
};
use vram_shared::{ContentId, ContentSource, HardwareRegion};

use super::shelf::ShelfPacker;
#[cfg(feature = "debug_overlay")]
use crate::diagnostics::TextOverlay;
use crate::error::{VramError, VramResult};
use crate::memory::{RecordHandle, RecordPool};

/// Flip bits carried from content cells into bgmap entries.
const CELL_FLIP_MASK: u16 = 0x3000;

/// Rows usable in the segment shared with the text layer.
const PRINTING_MAX_ROW: usize = BGMAP_SEGMENT_ROWS - SCREEN_HEIGHT_IN_CHARS;

/// Most regions tracked at once.
const MAX_REGIONS: usize = MAX_BGMAP_SEGMENTS * BGMAP_SEGMENT_COLS;

/// Handle to a registered texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BgmapHandle(RecordHandle);

/// Describes a texture to place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BgmapRequest {
    /// Cell content.
    pub content: ContentId,
    /// Width in cells.
    pub cols: usize,
    /// Height in cells.
    pub rows: usize,
    /// Palette (0..=3) stamped into every cell.
    pub palette: u8,
    /// Blank columns kept on each side.
    pub padding_cols: usize,
    /// Blank rows kept above and below.
    pub padding_rows: usize,
    /// Lowest segment the texture may use.
    pub minimum_segment: usize,
    /// Segment index must be a multiple of this (1, 2, 4 or 8).
    pub segment_alignment: usize,
}

impl BgmapRequest {
    /// Creates an unpadded request with no placement constraints.
    #[must_use]
    pub const fn new(content: ContentId, cols: usize, rows: usize) -> Self {
        Self {
            content,
            cols,
            rows,
            palette: 0,
            padding_cols: 0,
            padding_rows: 0,
            minimum_segment: 0,
            segment_alignment: 1,
        }
    }

    /// Sets the palette.
    #[must_use]
    pub const fn with_palette(mut self, palette: u8) -> Self {
        self.palette = palette;
        self
    }

    /// Sets per-side padding.
    #[must_use]
    pub const fn with_padding(mut self, cols: usize, rows: usize) -> Self {
        self.padding_cols = cols;
        self.padding_rows = rows;
        self
    }

    /// Restricts placement to segments `>= minimum` that are multiples of `alignment`.
    #[must_use]
    pub const fn with_segment_constraints(mut self, minimum: usize, alignment: usize) -> Self {
        self.minimum_segment = minimum;
        self.segment_alignment = alignment;
        self
    }

    #[inline]
    const fn footprint(&self) -> (usize, usize) {
        (self.cols + 2 * self.padding_cols, self.rows + 2 * self.padding_rows)
    }

    #[inline]
    const fn alignment(&self) -> usize {
        if self.segment_alignment == 0 {
            1
        } else {
            self.segment_alignment
        }
    }

    #[inline]
    const fn accepts_segment(&self, segment: usize) -> bool {
        segment >= self.minimum_segment && segment % self.alignment() == 0
    }
}

/// Result of a successful registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BgmapRegistration {
    /// Handle for later calls.
    pub handle: BgmapHandle,
    /// Bgmap segment holding the texture.
    pub segment: usize,
    /// Column of the texture's top-left cell.
    pub x_offset: usize,
    /// Row of the texture's top-left cell.
    pub y_offset: usize,
    /// True if the cells must be written (or rewritten after reuse).
    pub needs_write: bool,
    /// True if an existing region was handed out.
    pub reused: bool,
}

#[derive(Clone, Debug)]
struct BgmapRegion {
    content: ContentId,
    cols: usize,
    rows: usize,
    palette: u8,
    capacity_cols: usize,
    capacity_rows: usize,
    padding_cols: usize,
    padding_rows: usize,
    segment: usize,
    x_offset: usize,
    y_offset: usize,
    ref_count: usize,
    written: bool,
}

impl BgmapRegion {
    #[inline]
    const fn is_free(&self) -> bool {
        self.ref_count == 0
    }

    /// Same cells, and the region still satisfies the request's placement.
    const fn is_identical(&self, request: &BgmapRequest) -> bool {
        self.content.raw() == request.content.raw()
            && self.cols == request.cols
            && self.rows == request.rows
            && self.palette == request.palette
            && request.padding_cols <= self.padding_cols
            && request.padding_rows <= self.padding_rows
            && request.accepts_segment(self.segment)
    }

    const fn can_host(&self, request: &BgmapRequest) -> bool {
        self.is_free()
            && request.cols <= self.capacity_cols
            && request.rows <= self.capacity_rows
            && request.padding_cols <= self.padding_cols
            && request.padding_rows <= self.padding_rows
            && request.accepts_segment(self.segment)
    }

    #[inline]
    const fn is_exact_fit(&self, request: &BgmapRequest) -> bool {
        self.capacity_cols == request.cols && self.capacity_rows == request.rows
    }

    #[inline]
    const fn area(&self) -> usize {
        self.capacity_cols * self.capacity_rows
    }
}

/// Allocator and cache for bgmap memory.
#[derive(Debug)]
pub struct BgmapTextureManager {
    region: HardwareRegion,
    shelves: Vec<ShelfPacker>,
    regions: RecordPool<BgmapRegion>,
    printing_segment: Option<usize>,
}

impl BgmapTextureManager {
    /// Creates a manager over `available_segments` segments.
    ///
    /// With `reserve_printing_area`, the last segment keeps its bottom 28
    /// rows free for the text layer.
    #[must_use]
    pub fn new(available_segments: usize, reserve_printing_area: bool) -> Self {
        let available_segments = available_segments.min(MAX_BGMAP_SEGMENTS);
        let printing_segment = if reserve_printing_area {
            available_segments.checked_sub(1)
        } else {
            None
        };

        Self {
            region: HardwareRegion::new(
                "bgmap memory",
                BGMAP_SPACE_BASE_ADDRESS,
                available_segments * BGMAP_SEGMENT_BYTES,
            ),
            shelves: vec![ShelfPacker::new(); available_segments],
            regions: RecordPool::new(MAX_REGIONS),
            printing_segment,
        }
    }

    /// Number of bgmap segments below a param table starting at `param_base`.
    #[must_use]
    pub const fn segments_below(param_base: u32) -> usize {
        let span = param_base.saturating_sub(BGMAP_SPACE_BASE_ADDRESS) as usize;
        let segments = span / BGMAP_SEGMENT_BYTES;
        if segments > MAX_BGMAP_SEGMENTS {
            MAX_BGMAP_SEGMENTS
        } else {
            segments
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Finds or places a region for `request`.
    ///
    /// In order: identical content already tracked (shared, no rewrite
    /// needed if written), the best-fitting free region (rewrite needed),
    /// then fresh space carved from the first segment with room.
    ///
    /// # Errors
    ///
    /// `BgmapDepleted` if nothing fits, `InvalidRequest` for empty or
    /// oversized textures and bad alignments.
    pub fn register_texture(&mut self, request: &BgmapRequest) -> VramResult<BgmapRegistration> {
        let (cols, rows) = request.footprint();
        if request.cols == 0 || request.rows == 0 {
            return Err(VramError::InvalidRequest("texture must have at least one cell"));
        }
        if cols > BGMAP_SEGMENT_COLS || rows > BGMAP_SEGMENT_ROWS {
            return Err(VramError::InvalidRequest("texture does not fit in a bgmap segment"));
        }
        if !matches!(request.alignment(), 1 | 2 | 4 | 8) {
            return Err(VramError::InvalidRequest("segment alignment must be 1, 2, 4 or 8"));
        }

        if let Some(registration) = self.share_identical(request) {
            return Ok(registration);
        }
        if let Some(registration) = self.reuse_free(request) {
            return Ok(registration);
        }
        self.carve(request)
    }

    fn share_identical(&mut self, request: &BgmapRequest) -> Option<BgmapRegistration> {
        let handle = self.regions.find(|region| region.is_identical(request))?;
        let region = self.regions.get_mut(handle)?;
        region.ref_count += 1;
        debug!(segment = region.segment, refs = region.ref_count, "bgmap texture shared");

        Some(BgmapRegistration {
            handle: BgmapHandle(handle),
            segment: region.segment,
            x_offset: region.x_offset,
            y_offset: region.y_offset,
            needs_write: !region.written,
            reused: true,
        })
    }

    fn reuse_free(&mut self, request: &BgmapRequest) -> Option<BgmapRegistration> {
        let mut selected: Option<(RecordHandle, &BgmapRegion)> = None;
        for (handle, region) in self.regions.iter() {
            if !region.can_host(request) {
                continue;
            }
            if region.is_exact_fit(request) {
                selected = Some((handle, region));
                break;
            }
            if selected.map_or(true, |(_, best)| region.area() < best.area()) {
                selected = Some((handle, region));
            }
        }
        let (old_handle, _) = selected?;

        // Rekey the region so handles to the previous texture go stale
        let mut region = self.regions.remove(old_handle)?;
        region.content = request.content;
        region.cols = request.cols;
        region.rows = request.rows;
        region.palette = request.palette;
        region.ref_count = 1;
        region.written = false;

        let (segment, x_offset, y_offset) = (region.segment, region.x_offset, region.y_offset);
        let handle = self.regions.insert(region)?;
        debug!(segment, x = x_offset, y = y_offset, "bgmap region recycled");

        Some(BgmapRegistration {
            handle: BgmapHandle(handle),
            segment,
            x_offset,
            y_offset,
            needs_write: true,
            reused: true,
        })
    }

    fn carve(&mut self, request: &BgmapRequest) -> VramResult<BgmapRegistration> {
        let (cols, rows) = request.footprint();
        let depleted = VramError::BgmapDepleted { cols, rows };
        if self.regions.len() == self.regions.capacity() {
            error!(cols, rows, "bgmap region table full");
            return Err(depleted);
        }

        let alignment = request.alignment();
        let first = request.minimum_segment.div_ceil(alignment) * alignment;
        let printing_segment = self.printing_segment;
        let placement = (first..self.shelves.len()).step_by(alignment).find_map(|segment| {
            let max_row = if printing_segment == Some(segment) { PRINTING_MAX_ROW } else { BGMAP_SEGMENT_ROWS };
            self.shelves[segment].place(cols, rows, max_row).map(|origin| (segment, origin))
        });

        let Some((segment, (x, y))) = placement else {
            error!(cols, rows, segments = self.shelves.len(), "bgmap segments depleted");
            return Err(depleted);
        };

        let (x_offset, y_offset) = (x + request.padding_cols, y + request.padding_rows);
        let region = BgmapRegion {
            content: request.content,
            cols: request.cols,
            rows: request.rows,
            palette: request.palette,
            capacity_cols: request.cols,
            capacity_rows: request.rows,
            padding_cols: request.padding_cols,
            padding_rows: request.padding_rows,
            segment,
            x_offset,
            y_offset,
            ref_count: 1,
            written: false,
        };
        let handle = self.regions.insert(region).ok_or(depleted)?;
        debug!(segment, x, y, cols, rows, "bgmap region carved");

        Ok(BgmapRegistration {
            handle: BgmapHandle(handle),
            segment,
            x_offset,
            y_offset,
            needs_write: true,
            reused: false,
        })
    }

    /// Drops one reference. Returns true if the region is now a free cache entry.
    ///
    /// The cells stay in memory untouched.
    pub fn remove_texture(&mut self, handle: BgmapHandle) -> bool {
        let Some(region) = self.regions.get_mut(handle.0) else {
            debug_assert!(false, "removing unknown texture {handle:?}");
            warn!(?handle, "ignoring removal of unknown texture");
            return false;
        };
        if region.is_free() {
            debug_assert!(false, "texture {handle:?} removed twice");
            warn!(?handle, "ignoring removal of free texture");
            return false;
        }

        region.ref_count -= 1;
        if region.is_free() {
            debug!(segment = region.segment, "bgmap region cached");
        }
        region.is_free()
    }

    /// Registers a stage's textures, tallest first, then releases them so
    /// they sit in the cache ready for reuse. Returns the cached region count.
    ///
    /// # Errors
    ///
    /// Stops at the first failed registration.
    pub fn load_textures(&mut self, requests: &[BgmapRequest]) -> VramResult<usize> {
        let mut ordered: Vec<&BgmapRequest> = requests.iter().collect();
        ordered.sort_by(|a, b| b.rows.cmp(&a.rows));

        let mut handles = Vec::with_capacity(ordered.len());
        for request in ordered {
            handles.push(self.register_texture(request)?.handle);
        }
        for handle in handles {
            self.remove_texture(handle);
        }
        Ok(self.free_region_count())
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Writes the texture's cells, offsetting char indices by `char_base`.
    ///
    /// # Errors
    ///
    /// `MissingContent` if the source lacks the cells, `InvalidRequest` if
    /// it holds fewer than `cols * rows` or the handle is unknown.
    pub fn write(
        &mut self,
        handle: BgmapHandle,
        char_base: usize,
        source: &dyn ContentSource,
    ) -> VramResult<()> {
        let Some(region) = self.regions.get_mut(handle.0) else {
            debug_assert!(false, "writing unknown texture {handle:?}");
            return Err(VramError::InvalidRequest("unknown texture handle"));
        };

        let cells = source.cells(region.content).ok_or(VramError::MissingContent(region.content))?;
        if cells.len() < region.cols * region.rows {
            return Err(VramError::InvalidRequest("cell content smaller than the texture"));
        }

        let palette = u16::from(region.palette & 0x03) << BGMAP_PALETTE_SHIFT;
        let mut line = [0u16; BGMAP_SEGMENT_COLS];
        for (row, source_row) in cells.chunks_exact(region.cols).take(region.rows).enumerate() {
            for (entry, &cell) in line.iter_mut().zip(source_row) {
                let char_index = (char_base as u16).wrapping_add(cell & BGMAP_CHAR_MASK);
                *entry = palette | (cell & CELL_FLIP_MASK) | (char_index & BGMAP_CHAR_MASK);
            }

            let offset = region.segment * BGMAP_SEGMENT_BYTES
                + ((region.y_offset + row) * BGMAP_SEGMENT_COLS + region.x_offset) * BGMAP_ENTRY_BYTES;
            self.region.write(offset, bytemuck::cast_slice(&line[..region.cols]))?;
        }

        region.written = true;
        Ok(())
    }

    /// Writes a recycled region's new cells. Same as [`Self::write`].
    ///
    /// # Errors
    ///
    /// See [`Self::write`].
    #[inline]
    pub fn rewrite(
        &mut self,
        handle: BgmapHandle,
        char_base: usize,
        source: &dyn ContentSource,
    ) -> VramResult<()> {
        self.write(handle, char_base, source)
    }

    /// Zeroes a whole segment.
    ///
    /// # Errors
    ///
    /// Fails if the segment is not available to textures.
    pub fn clear_segment(&mut self, segment: usize) -> VramResult<()> {
        self.region.fill(segment * BGMAP_SEGMENT_BYTES, BGMAP_SEGMENT_BYTES, 0)?;
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Segment holding the texture.
    #[must_use]
    pub fn segment(&self, handle: BgmapHandle) -> Option<usize> {
        self.regions.get(handle.0).map(|region| region.segment)
    }

    /// Top-left cell of the texture as (column, row).
    #[must_use]
    pub fn offsets(&self, handle: BgmapHandle) -> Option<(usize, usize)> {
        self.regions.get(handle.0).map(|region| (region.x_offset, region.y_offset))
    }

    /// Owners currently holding the texture.
    #[must_use]
    pub fn ref_count(&self, handle: BgmapHandle) -> Option<usize> {
        self.regions.get(handle.0).map(|region| region.ref_count)
    }

    /// Segments available to textures.
    #[inline]
    #[must_use]
    pub fn available_segments(&self) -> usize {
        self.shelves.len()
    }

    /// Segment sharing its bottom rows with the text layer, if any.
    #[inline]
    #[must_use]
    pub const fn printing_segment(&self) -> Option<usize> {
        self.printing_segment
    }

    /// Cells carved out of a segment, padding included.
    #[must_use]
    pub fn used_cells(&self, segment: usize) -> usize {
        self.shelves.get(segment).map_or(0, ShelfPacker::used_cells)
    }

    /// Tracked regions, free or not.
    #[inline]
    #[must_use]
    pub const fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Regions with no owner, waiting for reuse.
    #[must_use]
    pub fn free_region_count(&self) -> usize {
        self.regions.iter().filter(|(_, region)| region.is_free()).count()
    }

    /// The backing bgmap memory.
    #[inline]
    #[must_use]
    pub const fn region(&self) -> &HardwareRegion {
        &self.region
    }

    /// Returns the region if it changed since the last call.
    pub fn take_dirty_region(&mut self) -> Option<&HardwareRegion> {
        self.region.take_dirty().then_some(&self.region)
    }

    /// Forgets every region and empties all segments.
    pub fn reset(&mut self) {
        self.regions.clear();
        for shelf in &mut self.shelves {
            shelf.reset();
        }
        debug!("bgmap memory reset");
    }

    /// Prints per-segment usage.
    #[cfg(feature = "debug_overlay")]
    pub fn print(&self, overlay: &mut TextOverlay, x: usize, y: usize) {
        overlay.text(x, y, "BGMAP TEXTURES USAGE");
        overlay.text(x, y + 2, "Segments:");
        overlay.int(x + 10, y + 2, self.shelves.len() as i64);
        overlay.text(x, y + 3, "Regions:");
        overlay.int(x + 10, y + 3, self.regions.len() as i64);
        overlay.text(x, y + 4, "Free:");
        overlay.int(x + 10, y + 4, self.free_region_count() as i64);

        overlay.text(x, y + 6, "Seg Cells  Seg Cells");
        for (segment, shelf) in self.shelves.iter().enumerate() {
            let col = x + (segment / 7) * 11;
            let row = y + 7 + segment % 7;
            overlay.int(col, row, segment as i64);
            overlay.int(col + 4, row, shelf.used_cells() as i64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vram_shared::ContentLibrary;

    fn request(id: u32, cols: usize, rows: usize) -> BgmapRequest {
        BgmapRequest::new(ContentId::new(id), cols, rows)
    }

    #[test]
    fn test_segments_below_param_table() {
        assert_eq!(BgmapTextureManager::segments_below(0x0003_A000), 13);
        assert_eq!(BgmapTextureManager::segments_below(0x0003_D800), 14);
        assert_eq!(BgmapTextureManager::segments_below(0x0002_0000), 0);
    }

    #[test]
    fn test_carves_new_regions() {
        let mut manager = BgmapTextureManager::new(2, false);
        let a = manager.register_texture(&request(1, 48, 28)).unwrap();
        let b = manager.register_texture(&request(2, 16, 10)).unwrap();

        assert_eq!((a.segment, a.x_offset, a.y_offset), (0, 0, 0));
        assert_eq!((b.segment, b.x_offset, b.y_offset), (0, 48, 0));
        assert!(!a.reused && a.needs_write);
        assert_eq!(manager.used_cells(0), 48 * 28 + 16 * 10);
    }

    #[test]
    fn test_identical_content_is_shared() {
        let mut manager = BgmapTextureManager::new(1, false);
        let a = manager.register_texture(&request(1, 8, 8)).unwrap();
        let b = manager.register_texture(&request(1, 8, 8)).unwrap();

        assert_eq!(a.handle, b.handle);
        assert_eq!(manager.ref_count(a.handle), Some(2));
        assert_eq!(manager.region_count(), 1);

        assert!(!manager.remove_texture(a.handle));
        assert!(manager.remove_texture(a.handle));
    }

    #[test]
    fn test_removed_texture_comes_back_unchanged() {
        let mut manager = BgmapTextureManager::new(1, false);
        let mut library = ContentLibrary::new();
        library.insert_cells(ContentId::new(1), vec![3u16; 16]);

        let a = manager.register_texture(&request(1, 4, 4)).unwrap();
        manager.write(a.handle, 0, &library).unwrap();
        assert!(manager.remove_texture(a.handle));

        let again = manager.register_texture(&request(1, 4, 4)).unwrap();
        assert_eq!(again.handle, a.handle);
        assert!(again.reused);
        assert!(!again.needs_write);
    }

    #[test]
    fn test_sharing_respects_placement() {
        let mut manager = BgmapTextureManager::new(4, false);
        let plain = manager.register_texture(&request(1, 64, 64)).unwrap();
        assert_eq!(plain.segment, 0);

        let constrained = manager.register_texture(&request(1, 64, 64).with_segment_constraints(2, 2)).unwrap();
        assert_ne!(constrained.handle, plain.handle);
        assert_eq!(constrained.segment, 2);
        assert!(!constrained.reused);

        // Same constraints again share the constrained copy
        let again = manager.register_texture(&request(1, 64, 64).with_segment_constraints(2, 2)).unwrap();
        assert_eq!(again.handle, constrained.handle);
        assert_eq!(manager.ref_count(constrained.handle), Some(2));

        let small = manager.register_texture(&request(2, 8, 8)).unwrap();
        let padded = manager.register_texture(&request(2, 8, 8).with_padding(1, 1)).unwrap();
        assert_ne!(padded.handle, small.handle);
        assert_eq!(manager.ref_count(small.handle), Some(1));

        // An unpadded request fits inside the padded copy
        let unpadded = manager.register_texture(&request(2, 8, 8)).unwrap();
        assert!(unpadded.handle == small.handle || unpadded.handle == padded.handle);
        assert_eq!(manager.region_count(), 4);
    }

    #[test]
    fn test_free_region_best_fit() {
        let mut manager = BgmapTextureManager::new(1, false);
        let big = manager.register_texture(&request(1, 32, 16)).unwrap();
        let small = manager.register_texture(&request(2, 16, 8)).unwrap();
        let exact = manager.register_texture(&request(3, 12, 6)).unwrap();
        manager.remove_texture(big.handle);
        manager.remove_texture(small.handle);
        manager.remove_texture(exact.handle);

        // Smallest region that fits
        let r = manager.register_texture(&request(4, 10, 5)).unwrap();
        assert!(r.reused && r.needs_write);
        assert_eq!((r.x_offset, r.y_offset), (exact.x_offset, exact.y_offset));
        assert_eq!(manager.ref_count(exact.handle), None);

        // Exact size wins over a smaller-area region
        let r = manager.register_texture(&request(5, 32, 16)).unwrap();
        assert_eq!((r.x_offset, r.y_offset), (big.x_offset, big.y_offset));

        let r = manager.register_texture(&request(6, 16, 9)).unwrap();
        assert!(!r.reused);
        assert_eq!(manager.region_count(), 4);
    }

    #[test]
    fn test_padding_offsets_origin() {
        let mut manager = BgmapTextureManager::new(1, false);
        let a = manager.register_texture(&request(1, 10, 10).with_padding(1, 2)).unwrap();
        let b = manager.register_texture(&request(2, 4, 4)).unwrap();

        assert_eq!((a.x_offset, a.y_offset), (1, 2));
        assert_eq!((b.x_offset, b.y_offset), (12, 0));
    }

    #[test]
    fn test_segment_alignment() {
        let mut manager = BgmapTextureManager::new(6, false);
        let a = manager.register_texture(&request(1, 64, 64).with_segment_constraints(1, 2)).unwrap();
        let b = manager.register_texture(&request(2, 64, 64).with_segment_constraints(1, 2)).unwrap();

        assert_eq!(a.segment, 2);
        assert_eq!(b.segment, 4);
        assert!(manager.register_texture(&request(3, 64, 64).with_segment_constraints(0, 3)).is_err());
    }

    #[test]
    fn test_printing_area_reserved() {
        let mut manager = BgmapTextureManager::new(1, true);
        assert_eq!(manager.printing_segment(), Some(0));

        let err = manager.register_texture(&request(1, 64, 40)).unwrap_err();
        assert_eq!(err, VramError::BgmapDepleted { cols: 64, rows: 40 });
        assert!(manager.register_texture(&request(2, 64, 36)).is_ok());
    }

    #[test]
    fn test_write_encodes_cells() {
        let mut manager = BgmapTextureManager::new(1, false);
        let mut library = ContentLibrary::new();
        library.insert_cells(ContentId::new(1), vec![0, 1, 0x2002, 3]);

        let a = manager.register_texture(&request(1, 2, 2).with_palette(1)).unwrap();
        manager.write(a.handle, 100, &library).unwrap();

        let top: u16 = manager.region().read_pod(0).unwrap();
        let top_right: u16 = manager.region().read_pod(2).unwrap();
        let bottom: u16 = manager.region().read_pod(BGMAP_SEGMENT_COLS * 2).unwrap();
        assert_eq!(top, 0x4000 | 100);
        assert_eq!(top_right, 0x4000 | 101);
        assert_eq!(bottom, 0x4000 | 0x2000 | 102);
    }

    #[test]
    fn test_load_textures_fills_cache() {
        let mut manager = BgmapTextureManager::new(1, false);
        let requests = [request(1, 8, 4), request(2, 8, 16), request(1, 8, 4)];

        assert_eq!(manager.load_textures(&requests).unwrap(), 2);
        let tall = manager.register_texture(&request(2, 8, 16)).unwrap();
        assert_eq!(tall.y_offset, 0);
        assert!(tall.reused && tall.needs_write);
    }

    #[test]
    fn test_reset_forgets_regions() {
        let mut manager = BgmapTextureManager::new(1, false);
        let a = manager.register_texture(&request(1, 64, 64)).unwrap();
        assert!(manager.register_texture(&request(2, 1, 1)).is_err());

        manager.reset();
        assert_eq!(manager.region_count(), 0);
        assert_eq!(manager.segment(a.handle), None);
        assert!(manager.register_texture(&request(2, 1, 1)).is_ok());
    }

    #[test]
    fn test_invalid_requests() {
        let mut manager = BgmapTextureManager::new(1, false);
        assert!(matches!(manager.register_texture(&request(1, 0, 4)), Err(VramError::InvalidRequest(_))));
        assert!(matches!(
            manager.register_texture(&request(1, 64, 4).with_padding(1, 0)),
            Err(VramError::InvalidRequest(_))
        ));
    }
}
