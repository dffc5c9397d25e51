//! # Param Table Manager
//!
//! Bump allocator for affine and h-bias tables at the top of bgmap memory,
//! with incremental compaction.
//!
//! ## Compaction
//!
//! Freeing opens a single hole anchored at the lowest freed offset. Each
//! frame, [`ParamTableManager::process_compaction_step`] moves the first
//! live table above the anchor down onto it and advances the anchor past
//! it. When nothing is left above the anchor the hole closes and the bump
//! pointer drops by everything reclaimed.
//!
//! ```text
//!  before:  [A 128][   hole 256   ][C 64]
//!  step 1:  [A 128][C 64][   hole 256   ]       C moved 384 -> 128
//!  step 2:  [A 128][C 64]                       used 448 -> 192
//! ```
//!
//! Moving one table per step bounds per-frame cost. The byte copy and the
//! offset update happen in the same call, so the renderer never sees a
//! table at an offset it has not been copied to yet.

use tracing::{debug, error, trace, warn};
use vram_shared::constants::{
    AFFINE_BYTES_PER_ROW, AFFINE_MAX_ROWS, BGMAP_SEGMENT_BYTES, HBIAS_BYTES_PER_ROW,
    HBIAS_MAX_ROWS, MAXIMUM_SCALE, PARAM_TABLE_END, PARAM_TABLE_PADDING_ROWS,
};
use vram_shared::{HardwareRegion, OwnerId};

#[cfg(feature = "debug_overlay")]
use crate::diagnostics::TextOverlay;
use crate::error::{VramError, VramResult};

/// Kind of per-row table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamMode {
    /// Affine transform parameters, sized for the largest scale.
    Affine,
    /// Horizontal bias offsets.
    HBias,
}

impl ParamMode {
    /// Bytes a table for `rows` display rows takes.
    #[must_use]
    pub const fn table_size(self, rows: usize) -> usize {
        let padded = rows + PARAM_TABLE_PADDING_ROWS;
        match self {
            Self::Affine => {
                let rows = if padded > AFFINE_MAX_ROWS { AFFINE_MAX_ROWS } else { padded };
                rows * AFFINE_BYTES_PER_ROW * MAXIMUM_SCALE
            }
            Self::HBias => {
                let rows = if padded > HBIAS_MAX_ROWS { HBIAS_MAX_ROWS } else { padded };
                rows * HBIAS_BYTES_PER_ROW
            }
        }
    }
}

/// The single tracked hole.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hole {
    /// Offset the next relocated table moves to.
    pub anchor: usize,
    /// Bytes returned to the bump pointer when the hole closes.
    pub reclaimable: usize,
}

/// Compaction state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompactionState {
    /// No hole.
    Idle,
    /// One hole waiting to be closed.
    Compacting(Hole),
}

/// Outcome of one compaction step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompactionStep {
    /// Nothing to do.
    Idle,
    /// A table moved. Its owner must point the hardware at `to`.
    Relocated {
        /// Table owner.
        owner: OwnerId,
        /// Old offset.
        from: usize,
        /// New offset.
        to: usize,
        /// Table size.
        bytes: usize,
    },
    /// The hole closed.
    Closed {
        /// Bytes returned to the bump pointer.
        reclaimed: usize,
    },
}

/// Placement of an allocated table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamAllocation {
    /// Offset from the table base.
    pub offset: usize,
    /// Table size in bytes.
    pub size: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ParamRecord {
    owner: OwnerId,
    offset: usize,
    size: usize,
}

impl ParamRecord {
    #[inline]
    const fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// Allocator for the param table.
#[derive(Debug)]
pub struct ParamTableManager {
    region: HardwareRegion,
    /// Live tables, in allocation order.
    records: Vec<ParamRecord>,
    /// Bump pointer.
    used: usize,
    hole: Option<Hole>,
}

impl ParamTableManager {
    /// Creates a table taking `param_segments` bgmap segments.
    #[must_use]
    pub fn new(param_segments: usize) -> Self {
        Self {
            region: Self::table_region(param_segments),
            records: Vec::new(),
            used: 0,
            hole: None,
        }
    }

    /// Table base address for a table taking `param_segments` segments.
    ///
    /// Rounded down to a segment boundary.
    #[must_use]
    pub const fn base_for_segments(param_segments: usize) -> u32 {
        let span = param_segments.saturating_mul(BGMAP_SEGMENT_BYTES);
        if span > PARAM_TABLE_END as usize {
            return 0;
        }
        let base = PARAM_TABLE_END - span as u32;
        if param_segments == 0 {
            base
        } else {
            base - base % BGMAP_SEGMENT_BYTES as u32
        }
    }

    fn table_region(param_segments: usize) -> HardwareRegion {
        let base = Self::base_for_segments(param_segments);
        HardwareRegion::new("param table", base, (PARAM_TABLE_END - base) as usize)
    }

    /// Moves the table to `param_segments` segments, dropping every record
    /// and zeroing the memory.
    pub fn setup(&mut self, param_segments: usize) {
        self.region = Self::table_region(param_segments);
        self.region.clear();
        self.reset();
        debug!(
            base = self.region.base_address(),
            size = self.region.len(),
            "param table set up"
        );
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Allocates a table for `rows` display rows.
    ///
    /// # Errors
    ///
    /// See [`Self::allocate_bytes`].
    pub fn allocate(&mut self, owner: OwnerId, rows: usize, mode: ParamMode) -> VramResult<ParamAllocation> {
        self.allocate_bytes(owner, mode.table_size(rows))
    }

    /// Appends a table of `size` bytes at the bump pointer.
    ///
    /// The table must end strictly below the table end. The new table is
    /// zeroed.
    ///
    /// # Errors
    ///
    /// `OutOfParamMemory` if it does not fit, `InvalidRequest` for an empty
    /// table or an owner that already holds one.
    pub fn allocate_bytes(&mut self, owner: OwnerId, size: usize) -> VramResult<ParamAllocation> {
        if size == 0 {
            return Err(VramError::InvalidRequest("param table size must be non-zero"));
        }
        if self.position(owner).is_some() {
            debug_assert!(false, "owner {owner:?} already holds a param table");
            return Err(VramError::InvalidRequest("owner already holds a param table"));
        }

        if self.used + size >= self.capacity() {
            let available = self.free_bytes();
            error!(owner = owner.raw(), bytes = size, available, "param table depleted");
            return Err(VramError::OutOfParamMemory { requested: size, available });
        }

        let offset = self.used;
        self.region.fill(offset, size, 0)?;
        self.records.push(ParamRecord { owner, offset, size });
        self.used += size;

        debug!(owner = owner.raw(), offset, bytes = size, used = self.used, "param table allocated");
        Ok(ParamAllocation { offset, size })
    }

    /// Releases the owner's table and opens or extends the hole.
    ///
    /// Returns false for owners holding no table.
    pub fn free(&mut self, owner: OwnerId) -> bool {
        let Some(index) = self.position(owner) else {
            debug_assert!(false, "freeing param table of unknown owner {owner:?}");
            warn!(owner = owner.raw(), "ignoring free of unknown param table");
            return false;
        };
        let record = self.records.remove(index);

        let hole = match self.hole {
            None => Hole { anchor: record.offset, reclaimable: record.size },
            Some(hole) => Hole {
                anchor: hole.anchor.min(record.offset),
                reclaimable: hole.reclaimable + record.size,
            },
        };
        self.hole = Some(hole);

        debug!(
            owner = owner.raw(),
            offset = record.offset,
            bytes = record.size,
            anchor = hole.anchor,
            reclaimable = hole.reclaimable,
            "param table freed"
        );
        true
    }

    // =========================================================================
    // Compaction
    // =========================================================================

    /// Moves at most one table into the hole, or closes the hole when
    /// nothing is left above it. Call once per frame.
    pub fn process_compaction_step(&mut self) -> CompactionStep {
        let Some(mut hole) = self.hole else {
            return CompactionStep::Idle;
        };

        loop {
            let next = self
                .records
                .iter()
                .enumerate()
                .filter(|(_, record)| record.offset >= hole.anchor)
                .min_by_key(|(_, record)| record.offset)
                .map(|(index, _)| index);

            let Some(index) = next else {
                self.used -= hole.reclaimable;
                self.hole = None;
                debug_assert_eq!(self.used, self.live_bytes(), "slack left after compaction");
                debug!(reclaimed = hole.reclaimable, used = self.used, "param table hole closed");
                return CompactionStep::Closed { reclaimed: hole.reclaimable };
            };

            let record = self.records[index];
            if record.offset == hole.anchor {
                // Already packed against the anchor
                hole.anchor = record.end();
                self.hole = Some(hole);
                continue;
            }

            debug_assert!(
                self.records
                    .iter()
                    .all(|other| other.offset >= hole.anchor || other.end() <= hole.anchor),
                "table below the anchor overlaps it"
            );

            if let Err(err) = self.region.copy_within(record.offset, hole.anchor, record.size) {
                // Offsets come from this allocator, so this is unreachable
                // unless the bookkeeping is corrupt
                error!(%err, "param table relocation out of bounds");
                return CompactionStep::Idle;
            }
            self.records[index].offset = hole.anchor;
            hole.anchor += record.size;
            self.hole = Some(hole);

            trace!(
                owner = record.owner.raw(),
                from = record.offset,
                to = self.records[index].offset,
                bytes = record.size,
                "param table relocated"
            );
            return CompactionStep::Relocated {
                owner: record.owner,
                from: record.offset,
                to: self.records[index].offset,
                bytes: record.size,
            };
        }
    }

    /// Runs compaction steps until idle. Returns how many tables moved.
    pub fn compact_fully(&mut self) -> usize {
        let mut moved = 0;
        loop {
            match self.process_compaction_step() {
                CompactionStep::Idle | CompactionStep::Closed { .. } => return moved,
                CompactionStep::Relocated { .. } => moved += 1,
            }
        }
    }

    // =========================================================================
    // Table contents
    // =========================================================================

    /// Writes `bytes` at `at` within the owner's table.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for unknown owners or writes past the table's end.
    pub fn write(&mut self, owner: OwnerId, at: usize, bytes: &[u8]) -> VramResult<()> {
        let Some(index) = self.position(owner) else {
            debug_assert!(false, "writing param table of unknown owner {owner:?}");
            return Err(VramError::InvalidRequest("owner holds no param table"));
        };
        let record = self.records[index];
        if at + bytes.len() > record.size {
            return Err(VramError::InvalidRequest("write past the end of the param table"));
        }

        self.region.write(record.offset + at, bytes)?;
        Ok(())
    }

    /// The owner's table bytes.
    #[must_use]
    pub fn read(&self, owner: OwnerId) -> Option<&[u8]> {
        let record = self.records[self.position(owner)?];
        self.region.read(record.offset, record.size).ok()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[inline]
    fn position(&self, owner: OwnerId) -> Option<usize> {
        self.records.iter().position(|record| record.owner == owner)
    }

    fn live_bytes(&self) -> usize {
        self.records.iter().map(|record| record.size).sum()
    }

    /// The owner's table offset from the table base.
    #[must_use]
    pub fn offset(&self, owner: OwnerId) -> Option<usize> {
        self.position(owner).map(|index| self.records[index].offset)
    }

    /// The owner's table address in VRAM.
    #[must_use]
    pub fn address(&self, owner: OwnerId) -> Option<u32> {
        self.offset(owner).map(|offset| self.region.address_of(offset))
    }

    /// The owner's table size.
    #[must_use]
    pub fn size_of(&self, owner: OwnerId) -> Option<usize> {
        self.position(owner).map(|index| self.records[index].size)
    }

    /// Live tables as (owner, offset, size), in allocation order.
    pub fn records(&self) -> impl Iterator<Item = (OwnerId, usize, usize)> + '_ {
        self.records.iter().map(|record| (record.owner, record.offset, record.size))
    }

    /// Number of live tables.
    #[inline]
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Bump pointer: bytes from the base up to the next allocation.
    #[inline]
    #[must_use]
    pub const fn used(&self) -> usize {
        self.used
    }

    /// Table size in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Bytes left above the bump pointer.
    #[inline]
    #[must_use]
    pub fn free_bytes(&self) -> usize {
        self.capacity() - self.used
    }

    /// Bytes waiting in the hole.
    #[must_use]
    pub fn reclaimable(&self) -> usize {
        self.hole.map_or(0, |hole| hole.reclaimable)
    }

    /// Current compaction state.
    #[must_use]
    pub fn state(&self) -> CompactionState {
        self.hole.map_or(CompactionState::Idle, CompactionState::Compacting)
    }

    /// Table base address.
    #[inline]
    #[must_use]
    pub const fn base_address(&self) -> u32 {
        self.region.base_address()
    }

    /// The backing table memory.
    #[inline]
    #[must_use]
    pub const fn region(&self) -> &HardwareRegion {
        &self.region
    }

    /// Returns the region if it changed since the last call.
    pub fn take_dirty_region(&mut self) -> Option<&HardwareRegion> {
        self.region.take_dirty().then_some(&self.region)
    }

    /// Drops every table and the hole. Memory is left as is.
    pub fn reset(&mut self) {
        self.records.clear();
        self.used = 0;
        self.hole = None;
    }

    /// Prints table usage.
    #[cfg(feature = "debug_overlay")]
    pub fn print(&self, overlay: &mut TextOverlay, x: usize, y: usize) {
        overlay.text(x, y, "PARAM TABLE USAGE");
        overlay.text(x, y + 2, "Size:");
        overlay.int(x + 12, y + 2, self.capacity() as i64);
        overlay.text(x, y + 3, "Used:");
        overlay.int(x + 12, y + 3, self.used as i64);
        overlay.text(x, y + 4, "Reclaim:");
        overlay.int(x + 12, y + 4, self.reclaimable() as i64);
        overlay.text(x, y + 5, "Tables:");
        overlay.int(x + 12, y + 5, self.records.len() as i64);
        overlay.text(x, y + 6, "ParamBase:");
        overlay.hex(x + 12, y + 6, self.region.base_address(), 8);
        overlay.text(x, y + 7, "ParamEnd:");
        overlay.hex(x + 12, y + 7, PARAM_TABLE_END, 8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(raw: u32) -> OwnerId {
        OwnerId::new(raw)
    }

    fn assert_disjoint(manager: &ParamTableManager) {
        let mut spans: Vec<(usize, usize)> = manager.records().map(|(_, offset, size)| (offset, offset + size)).collect();
        spans.sort_unstable();
        for pair in spans.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "overlap: {pair:?}");
        }
        if let Some(last) = spans.last() {
            assert!(last.1 <= manager.used());
        }
    }

    #[test]
    fn test_table_sizes() {
        assert_eq!(ParamMode::Affine.table_size(10), 11 * 128 * 2);
        assert_eq!(ParamMode::Affine.table_size(200), 64 * 128 * 2);
        assert_eq!(ParamMode::HBias.table_size(10), 11 * 32);
        assert_eq!(ParamMode::HBias.table_size(224), 28 * 32);
    }

    #[test]
    fn test_base_addresses() {
        assert_eq!(ParamTableManager::base_for_segments(1), 0x0003_A000);
        assert_eq!(ParamTableManager::base_for_segments(2), 0x0003_8000);
        assert_eq!(ParamTableManager::base_for_segments(0), PARAM_TABLE_END);

        let manager = ParamTableManager::new(1);
        assert_eq!(manager.capacity(), 0x3800);
        assert_eq!(manager.free_bytes(), 0x3800);
    }

    #[test]
    fn test_bump_allocation() {
        let mut manager = ParamTableManager::new(1);
        let a = manager.allocate_bytes(owner(1), 128).unwrap();
        let b = manager.allocate_bytes(owner(2), 256).unwrap();

        assert_eq!(a, ParamAllocation { offset: 0, size: 128 });
        assert_eq!(b.offset, 128);
        assert_eq!(manager.used(), 384);
        assert_eq!(manager.address(owner(2)), Some(0x0003_A000 + 128));
    }

    #[test]
    fn test_allocation_must_end_below_table_end() {
        let mut manager = ParamTableManager::new(1);
        let capacity = manager.capacity();

        let err = manager.allocate_bytes(owner(1), capacity).unwrap_err();
        assert_eq!(err, VramError::OutOfParamMemory { requested: capacity, available: capacity });
        assert!(manager.allocate_bytes(owner(1), capacity - 1).is_ok());
    }

    #[test]
    fn test_hole_scenario() {
        let mut manager = ParamTableManager::new(1);
        manager.allocate_bytes(owner(1), 128).unwrap();
        manager.allocate_bytes(owner(2), 256).unwrap();
        manager.allocate_bytes(owner(3), 64).unwrap();
        manager.write(owner(3), 0, &[0xAB; 64]).unwrap();
        let free_before = manager.free_bytes();

        assert!(manager.free(owner(2)));
        assert_eq!(manager.state(), CompactionState::Compacting(Hole { anchor: 128, reclaimable: 256 }));

        let step = manager.process_compaction_step();
        assert_eq!(step, CompactionStep::Relocated { owner: owner(3), from: 384, to: 128, bytes: 64 });
        assert_eq!(manager.state(), CompactionState::Compacting(Hole { anchor: 192, reclaimable: 256 }));
        assert_eq!(manager.read(owner(3)), Some(&[0xAB; 64][..]));

        assert_eq!(manager.process_compaction_step(), CompactionStep::Closed { reclaimed: 256 });
        assert_eq!(manager.used(), 192);
        assert_eq!(manager.free_bytes(), free_before + 256);
        assert_eq!(manager.state(), CompactionState::Idle);
        assert_eq!(manager.process_compaction_step(), CompactionStep::Idle);
    }

    #[test]
    fn test_free_below_anchor_moves_anchor_down() {
        let mut manager = ParamTableManager::new(1);
        for (raw, size) in [(1, 64), (2, 64), (3, 64), (4, 64)] {
            manager.allocate_bytes(owner(raw), size).unwrap();
        }

        manager.free(owner(3));
        manager.free(owner(4));
        assert_eq!(manager.state(), CompactionState::Compacting(Hole { anchor: 128, reclaimable: 128 }));
        manager.free(owner(1));
        assert_eq!(manager.state(), CompactionState::Compacting(Hole { anchor: 0, reclaimable: 192 }));

        assert_eq!(manager.compact_fully(), 1);
        assert_eq!(manager.offset(owner(2)), Some(0));
        assert_eq!(manager.used(), 64);
    }

    #[test]
    fn test_compaction_moves_each_table_above_the_hole_once() {
        let mut manager = ParamTableManager::new(2);
        let sizes = [96, 352, 32, 512, 160, 64, 224, 288];
        for (raw, size) in sizes.iter().enumerate() {
            manager.allocate_bytes(owner(raw as u32), *size).unwrap();
        }
        manager.free(owner(1));
        manager.free(owner(4));
        manager.free(owner(6));

        // Table 0 sits below the hole, so four moves plus the close
        let live = manager.record_count();
        let mut calls = 0;
        while manager.state() != CompactionState::Idle {
            manager.process_compaction_step();
            calls += 1;
            assert_disjoint(&manager);
            assert!(calls <= live + 1);
        }
        assert_eq!(calls, live);

        let live_bytes: usize = manager.records().map(|(_, _, size)| size).sum();
        assert_eq!(manager.used(), live_bytes);
        let mut offsets: Vec<usize> = manager.records().map(|(_, offset, _)| offset).collect();
        offsets.sort_unstable();
        assert_eq!(offsets, vec![0, 96, 128, 640, 704]);
    }

    #[test]
    fn test_compaction_takes_live_plus_one_steps_when_every_table_moves() {
        let mut manager = ParamTableManager::new(2);
        let sizes = [96, 352, 32, 512, 160, 64, 224, 288];
        for (raw, size) in sizes.iter().enumerate() {
            manager.allocate_bytes(owner(raw as u32), *size).unwrap();
        }
        manager.free(owner(0));
        manager.free(owner(4));
        manager.free(owner(6));

        // Hole anchored at 0: each of the N live tables moves on its own
        // call, and closing the hole takes call N + 1
        let live = manager.record_count();
        let mut steps = Vec::new();
        while manager.state() != CompactionState::Idle {
            steps.push(manager.process_compaction_step());
            assert_disjoint(&manager);
            assert!(steps.len() <= live + 1);
        }
        assert_eq!(steps.len(), live + 1);
        assert!(steps[..live].iter().all(|step| matches!(step, CompactionStep::Relocated { .. })));
        assert_eq!(steps[live], CompactionStep::Closed { reclaimed: 96 + 160 + 224 });

        let mut offsets: Vec<usize> = manager.records().map(|(_, offset, _)| offset).collect();
        offsets.sort_unstable();
        assert_eq!(offsets, vec![0, 352, 384, 896, 960]);
        assert_eq!(manager.used(), 1248);
    }

    #[test]
    fn test_allocations_during_compaction() {
        let mut manager = ParamTableManager::new(1);
        manager.allocate_bytes(owner(1), 64).unwrap();
        manager.allocate_bytes(owner(2), 64).unwrap();
        manager.free(owner(1));

        manager.allocate_bytes(owner(3), 32).unwrap();
        assert_eq!(manager.offset(owner(3)), Some(128));

        manager.compact_fully();
        assert_eq!(manager.offset(owner(2)), Some(0));
        assert_eq!(manager.offset(owner(3)), Some(64));
        assert_eq!(manager.used(), 96);
        assert_disjoint(&manager);
    }

    #[test]
    fn test_churn_keeps_tables_disjoint() {
        let mut manager = ParamTableManager::new(1);
        let mut live: Vec<u32> = Vec::new();
        let mut next_owner = 0;
        let mut seed = 0x9E37_79B9_u32;

        for _ in 0..1500 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            match seed % 4 {
                0 if !live.is_empty() => {
                    let raw = live.swap_remove(seed as usize % live.len());
                    assert!(manager.free(owner(raw)));
                }
                1 => {
                    manager.process_compaction_step();
                }
                _ => {
                    let rows = 1 + seed as usize % 40;
                    if manager.allocate(owner(next_owner), rows, ParamMode::HBias).is_ok() {
                        live.push(next_owner);
                    }
                    next_owner += 1;
                }
            }
            assert_disjoint(&manager);
        }

        manager.compact_fully();
        let live_bytes: usize = manager.records().map(|(_, _, size)| size).sum();
        assert_eq!(manager.used(), live_bytes);
    }

    #[test]
    fn test_write_bounds() {
        let mut manager = ParamTableManager::new(1);
        manager.allocate_bytes(owner(1), 32).unwrap();

        assert!(manager.write(owner(1), 16, &[1; 16]).is_ok());
        assert!(matches!(manager.write(owner(1), 17, &[1; 16]), Err(VramError::InvalidRequest(_))));
    }

    #[test]
    fn test_setup_moves_and_clears() {
        let mut manager = ParamTableManager::new(1);
        manager.allocate_bytes(owner(1), 32).unwrap();
        manager.write(owner(1), 0, &[7; 32]).unwrap();

        manager.setup(2);
        assert_eq!(manager.base_address(), 0x0003_8000);
        assert_eq!(manager.record_count(), 0);
        assert_eq!(manager.used(), 0);
        assert!(manager.region().as_bytes().iter().all(|byte| *byte == 0));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "freeing param table of unknown owner")]
    fn test_double_free_asserts() {
        let mut manager = ParamTableManager::new(1);
        manager.allocate_bytes(owner(1), 32).unwrap();
        manager.free(owner(1));
        manager.free(owner(1));
    }

    #[cfg(feature = "debug_overlay")]
    #[test]
    fn test_print_usage() {
        let mut manager = ParamTableManager::new(1);
        manager.allocate_bytes(owner(1), 448).unwrap();
        let mut overlay = TextOverlay::default();

        manager.print(&mut overlay, 1, 1);
        assert!(overlay.contains("PARAM TABLE USAGE"));
        assert_eq!(overlay.line(4), " Used:       448");
        assert_eq!(overlay.line(7), " ParamBase:  0003A000");
    }
}
