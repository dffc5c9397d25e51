//! # Object Segment Manager
//!
//! Splits the 1024-entry object attribute table into up to four segments,
//! one per SPT register. Each segment is drawn at a fixed depth, so sprites
//! ask for the segment closest to their own z.
//!
//! Objects inside a segment are packed from its first slot. Removing an
//! owner's objects shifts every later owner down, and the caller is told
//! who moved so they can render at their new slots.

use std::cmp::Reverse;

use tracing::{debug, error, warn};
use vram_shared::constants::{
    OBJECT_BYTES, OBJECT_MEMORY_BYTES, OBJECT_SEGMENTS, OBJECT_SPACE_BASE_ADDRESS, TOTAL_OBJECTS,
};
use vram_shared::{HardwareRegion, OwnerId};

use super::attributes::ObjectAttributes;
#[cfg(feature = "debug_overlay")]
use crate::diagnostics::TextOverlay;
use crate::error::{VramError, VramResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ObjectEntry {
    owner: OwnerId,
    first: usize,
    count: usize,
}

/// One segment of the object attribute table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSegment {
    index: usize,
    first_object_index: usize,
    capacity: usize,
    used: usize,
    z_position: i32,
    entries: Vec<ObjectEntry>,
}

impl ObjectSegment {
    fn new(index: usize, first_object_index: usize, capacity: usize, z_position: i32) -> Self {
        Self {
            index,
            first_object_index,
            capacity,
            used: 0,
            z_position,
            entries: Vec::new(),
        }
    }

    /// Segment number (SPT register index).
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// First object slot owned by the segment.
    #[inline]
    #[must_use]
    pub const fn first_object_index(&self) -> usize {
        self.first_object_index
    }

    /// Object slots owned by the segment.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Object slots in use.
    #[inline]
    #[must_use]
    pub const fn used(&self) -> usize {
        self.used
    }

    /// Object slots still free.
    #[inline]
    #[must_use]
    pub const fn free(&self) -> usize {
        self.capacity - self.used
    }

    /// Depth the segment is drawn at.
    #[inline]
    #[must_use]
    pub const fn z_position(&self) -> i32 {
        self.z_position
    }

    /// Owners with objects in the segment.
    #[inline]
    #[must_use]
    pub fn owner_count(&self) -> usize {
        self.entries.len()
    }

    fn entry(&self, owner: OwnerId) -> Option<&ObjectEntry> {
        self.entries.iter().find(|entry| entry.owner == owner)
    }
}

/// An owner whose objects moved after a removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectRelocation {
    /// Owner to notify.
    pub owner: OwnerId,
    /// Segment the objects live in.
    pub segment: usize,
    /// Old first slot.
    pub from: usize,
    /// New first slot.
    pub to: usize,
}

/// Allocator for object attribute memory.
#[derive(Debug)]
pub struct ObjectSegmentManager {
    region: HardwareRegion,
    segments: [Option<ObjectSegment>; OBJECT_SEGMENTS],
}

impl Default for ObjectSegmentManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectSegmentManager {
    /// Creates a manager with no segments. They appear on first use.
    #[must_use]
    pub fn new() -> Self {
        Self {
            region: HardwareRegion::new("object memory", OBJECT_SPACE_BASE_ADDRESS, OBJECT_MEMORY_BYTES),
            segments: std::array::from_fn(|_| None),
        }
    }

    // =========================================================================
    // Segment setup
    // =========================================================================

    /// Creates segments `0..sizes.len()` with explicit sizes and depths,
    /// dropping any existing ones.
    ///
    /// Depths must not decrease with the segment index: higher segments are
    /// drawn first, behind lower ones.
    ///
    /// # Errors
    ///
    /// `ObjectBudgetExceeded` if the sizes add up past 1024 objects,
    /// `InvalidSegmentOrder` for decreasing depths, `InvalidRequest` for
    /// mismatched lengths or more than four segments.
    pub fn setup_segments(&mut self, sizes: &[usize], z_positions: &[i32]) -> VramResult<()> {
        if sizes.len() != z_positions.len() || sizes.len() > OBJECT_SEGMENTS {
            return Err(VramError::InvalidRequest("object segment sizes and depths must pair up, at most four"));
        }

        let requested: usize = sizes.iter().sum();
        if requested > TOTAL_OBJECTS {
            error!(requested, available = TOTAL_OBJECTS, "object segment sizes exceed the table");
            return Err(VramError::ObjectBudgetExceeded { requested, available: TOTAL_OBJECTS });
        }

        for (segment, pair) in z_positions.windows(2).enumerate() {
            if pair[1] < pair[0] {
                error!(segment = segment + 1, z = pair[1], previous = pair[0], "object segments out of order");
                return Err(VramError::InvalidSegmentOrder { segment: segment + 1, z: pair[1], previous: pair[0] });
            }
        }

        self.reset();
        let mut first = 0;
        for (index, (&capacity, &z)) in sizes.iter().zip(z_positions).enumerate() {
            self.segments[index] = Some(ObjectSegment::new(index, first, capacity, z));
            first += capacity;
        }

        debug!(segments = sizes.len(), objects = requested, "object segments set up");
        Ok(())
    }

    /// Creates every missing segment, sharing out what is left of the table.
    fn ensure_segments(&mut self) {
        let mut first = 0;
        let mut z = 0;
        for index in 0..OBJECT_SEGMENTS {
            if let Some(segment) = &self.segments[index] {
                first = segment.first_object_index + segment.capacity;
                z = segment.z_position;
                continue;
            }

            let missing = OBJECT_SEGMENTS - index;
            let capacity = (TOTAL_OBJECTS - first) / missing;
            debug!(segment = index, first, capacity, z, "object segment created");
            self.segments[index] = Some(ObjectSegment::new(index, first, capacity, z));
            first += capacity;
        }
    }

    /// Picks a segment with room for `count` objects.
    ///
    /// With a depth hint the segment with the closest depth wins, higher
    /// index on ties. Without one the first segment with room wins.
    ///
    /// # Errors
    ///
    /// `ObjectSegmentsDepleted` if no segment has room.
    pub fn get_container(&mut self, count: usize, z_hint: Option<i32>) -> VramResult<usize> {
        if count == 0 {
            return Err(VramError::InvalidRequest("object count must be non-zero"));
        }
        self.ensure_segments();

        let candidates = self.segments.iter().flatten().filter(|segment| segment.free() >= count);
        let chosen = match z_hint {
            None => candidates.map(ObjectSegment::index).next(),
            Some(z) => candidates
                .min_by_key(|segment| (segment.z_position.abs_diff(z), Reverse(segment.index)))
                .map(ObjectSegment::index),
        };

        chosen.ok_or_else(|| {
            let largest_free = self.segments.iter().flatten().map(ObjectSegment::free).max().unwrap_or(0);
            error!(requested = count, largest_free, "object segments depleted");
            VramError::ObjectSegmentsDepleted { requested: count, largest_free }
        })
    }

    // =========================================================================
    // Objects
    // =========================================================================

    /// Appends `count` objects for `owner`. Returns the first object slot.
    ///
    /// # Errors
    ///
    /// `ObjectSegmentsDepleted` if the segment is full, `InvalidRequest`
    /// for missing segments, zero counts and owners already present.
    pub fn add_object(&mut self, segment: usize, owner: OwnerId, count: usize) -> VramResult<usize> {
        if count == 0 {
            return Err(VramError::InvalidRequest("object count must be non-zero"));
        }
        let Some(container) = self.segments.get_mut(segment).and_then(Option::as_mut) else {
            return Err(VramError::InvalidRequest("object segment does not exist"));
        };
        if container.entry(owner).is_some() {
            debug_assert!(false, "owner {owner:?} already has objects in segment {segment}");
            return Err(VramError::InvalidRequest("owner already has objects in this segment"));
        }
        if container.free() < count {
            error!(segment, requested = count, free = container.free(), "object segment full");
            return Err(VramError::ObjectSegmentsDepleted { requested: count, largest_free: container.free() });
        }

        let first = container.first_object_index + container.used;
        container.entries.push(ObjectEntry { owner, first, count });
        container.used += count;

        debug!(segment, owner = owner.raw(), first, objects = count, "objects added");
        Ok(first)
    }

    /// Removes the owner's objects and packs later owners down.
    ///
    /// Returns every owner that moved. The freed tail slots are hidden.
    pub fn remove_object(&mut self, segment: usize, owner: OwnerId) -> Vec<ObjectRelocation> {
        let Some(container) = self.segments.get_mut(segment).and_then(Option::as_mut) else {
            debug_assert!(false, "removing objects from missing segment {segment}");
            warn!(segment, "ignoring removal from missing object segment");
            return Vec::new();
        };
        let Some(position) = container.entries.iter().position(|entry| entry.owner == owner) else {
            debug_assert!(false, "owner {owner:?} has no objects in segment {segment}");
            warn!(segment, owner = owner.raw(), "ignoring removal of unknown objects");
            return Vec::new();
        };

        let removed = container.entries.remove(position);
        let tail_start = removed.first + removed.count;
        let tail_end = container.first_object_index + container.used;

        let moved = (tail_end - tail_start) * OBJECT_BYTES;
        let shifted = self
            .region
            .copy_within(tail_start * OBJECT_BYTES, removed.first * OBJECT_BYTES, moved)
            .and_then(|()| {
                self.region
                    .fill((tail_end - removed.count) * OBJECT_BYTES, removed.count * OBJECT_BYTES, 0)
            });
        if let Err(err) = shifted {
            error!(%err, segment, "object shift out of bounds");
        }

        let relocations: Vec<ObjectRelocation> = container.entries[position..]
            .iter_mut()
            .map(|entry| {
                let from = entry.first;
                entry.first -= removed.count;
                ObjectRelocation { owner: entry.owner, segment, from, to: entry.first }
            })
            .collect();
        container.used -= removed.count;

        debug!(
            segment,
            owner = owner.raw(),
            objects = removed.count,
            relocated = relocations.len(),
            "objects removed"
        );
        relocations
    }

    /// Writes the owner's `index`-th object.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for unknown owners or indices past their count.
    pub fn write_object(
        &mut self,
        segment: usize,
        owner: OwnerId,
        index: usize,
        attributes: &ObjectAttributes,
    ) -> VramResult<()> {
        let entry = self
            .segment(segment)
            .and_then(|container| container.entry(owner))
            .copied()
            .ok_or(VramError::InvalidRequest("owner has no objects in this segment"))?;
        if index >= entry.count {
            return Err(VramError::InvalidRequest("object index past the owner's count"));
        }

        self.region.write_pod((entry.first + index) * OBJECT_BYTES, attributes)?;
        Ok(())
    }

    /// Reads one object slot.
    #[must_use]
    pub fn read_object(&self, slot: usize) -> Option<ObjectAttributes> {
        self.region.read_pod(slot * OBJECT_BYTES).ok()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// First slot of the owner's objects.
    #[must_use]
    pub fn object_index(&self, segment: usize, owner: OwnerId) -> Option<usize> {
        self.segment(segment)?.entry(owner).map(|entry| entry.first)
    }

    /// Value for the segment's SPT register: the last slot it draws.
    #[must_use]
    pub fn spt_value(&self, segment: usize) -> Option<u16> {
        let container = self.segment(segment)?;
        let last = (container.first_object_index + container.capacity).checked_sub(1)?;
        u16::try_from(last).ok()
    }

    /// A segment, if created.
    #[must_use]
    pub fn segment(&self, index: usize) -> Option<&ObjectSegment> {
        self.segments.get(index)?.as_ref()
    }

    /// Number of created segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.iter().flatten().count()
    }

    /// Objects in use across all segments.
    #[must_use]
    pub fn total_used_objects(&self) -> usize {
        self.segments.iter().flatten().map(ObjectSegment::used).sum()
    }

    /// The backing object memory.
    #[inline]
    #[must_use]
    pub const fn region(&self) -> &HardwareRegion {
        &self.region
    }

    /// Returns the region if it changed since the last call.
    pub fn take_dirty_region(&mut self) -> Option<&HardwareRegion> {
        self.region.take_dirty().then_some(&self.region)
    }

    /// Drops every segment and hides every object.
    pub fn reset(&mut self) {
        self.segments = std::array::from_fn(|_| None);
        self.region.clear();
    }

    /// Prints per-segment usage.
    #[cfg(feature = "debug_overlay")]
    pub fn print(&self, overlay: &mut TextOverlay, x: usize, y: usize) {
        overlay.text(x, y, "OBJECTS' USAGE");
        overlay.text(x, y + 2, "Seg First Size Used Z");
        for index in 0..OBJECT_SEGMENTS {
            let row = y + 3 + index;
            overlay.int(x, row, index as i64);
            match self.segment(index) {
                Some(segment) => {
                    overlay.int(x + 4, row, segment.first_object_index as i64);
                    overlay.int(x + 10, row, segment.capacity as i64);
                    overlay.int(x + 15, row, segment.used as i64);
                    overlay.int(x + 20, row, i64::from(segment.z_position));
                }
                None => overlay.text(x + 4, row, "-"),
            }
        }
        overlay.text(x, y + 8, "Total used:");
        overlay.int(x + 12, y + 8, self.total_used_objects() as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(raw: u32) -> OwnerId {
        OwnerId::new(raw)
    }

    #[test]
    fn test_lazy_segments_split_budget() {
        let mut manager = ObjectSegmentManager::new();
        assert_eq!(manager.segment_count(), 0);

        assert_eq!(manager.get_container(10, None).unwrap(), 0);
        assert_eq!(manager.segment_count(), 4);
        let capacities: Vec<usize> = (0..4).map(|i| manager.segment(i).unwrap().capacity()).collect();
        assert_eq!(capacities, vec![256, 256, 256, 256]);
        assert_eq!(manager.segment(3).unwrap().first_object_index(), 768);
    }

    #[test]
    fn test_partial_setup_fills_remaining_budget() {
        let mut manager = ObjectSegmentManager::new();
        manager.setup_segments(&[512], &[-5]).unwrap();
        manager.get_container(1, None).unwrap();

        let capacities: Vec<usize> = (0..4).map(|i| manager.segment(i).unwrap().capacity()).collect();
        assert_eq!(capacities, vec![512, 170, 171, 171]);
        assert_eq!(capacities.iter().sum::<usize>(), TOTAL_OBJECTS);
        assert_eq!(manager.segment(2).unwrap().z_position(), -5);
    }

    #[test]
    fn test_closest_z_wins() {
        let mut manager = ObjectSegmentManager::new();
        manager.setup_segments(&[100, 100, 100, 100], &[-10, 0, 10, 20]).unwrap();

        assert_eq!(manager.get_container(5, Some(12)).unwrap(), 2);
        assert_eq!(manager.get_container(5, Some(1)).unwrap(), 1);
        assert_eq!(manager.get_container(5, Some(-100)).unwrap(), 0);
        assert_eq!(manager.get_container(5, None).unwrap(), 0);
    }

    #[test]
    fn test_equal_z_distance_prefers_higher_segment() {
        let mut manager = ObjectSegmentManager::new();
        manager.setup_segments(&[100, 100, 100, 100], &[-10, 0, 10, 20]).unwrap();

        // 5 sits between SPT1 and SPT2, 15 between SPT2 and SPT3
        assert_eq!(manager.get_container(5, Some(5)).unwrap(), 2);
        assert_eq!(manager.get_container(5, Some(15)).unwrap(), 3);
        assert_eq!(manager.get_container(5, Some(-5)).unwrap(), 1);
    }

    #[test]
    fn test_full_segment_is_skipped() {
        let mut manager = ObjectSegmentManager::new();
        manager.setup_segments(&[8, 8, 8, 8], &[0, 10, 20, 30]).unwrap();
        manager.add_object(1, owner(1), 6).unwrap();

        // 0 and 2 are equally close once 1 is too full
        assert_eq!(manager.get_container(4, Some(10)).unwrap(), 2);
        let err = manager.get_container(9, None).unwrap_err();
        assert_eq!(err, VramError::ObjectSegmentsDepleted { requested: 9, largest_free: 8 });
    }

    #[test]
    fn test_setup_validation() {
        let mut manager = ObjectSegmentManager::new();

        assert_eq!(
            manager.setup_segments(&[512, 512, 1], &[0, 0, 0]),
            Err(VramError::ObjectBudgetExceeded { requested: 1025, available: 1024 })
        );
        assert_eq!(
            manager.setup_segments(&[10, 10], &[5, 4]),
            Err(VramError::InvalidSegmentOrder { segment: 1, z: 4, previous: 5 })
        );
        assert!(manager.setup_segments(&[10], &[0, 1]).is_err());
    }

    #[test]
    fn test_remove_shifts_later_owners() {
        let mut manager = ObjectSegmentManager::new();
        manager.setup_segments(&[16, 16], &[0, 1]).unwrap();
        assert_eq!(manager.add_object(1, owner(1), 3).unwrap(), 16);
        assert_eq!(manager.add_object(1, owner(2), 2).unwrap(), 19);
        assert_eq!(manager.add_object(1, owner(3), 4).unwrap(), 21);

        let sprite = ObjectAttributes::new(10, 0, 20, 42, 1);
        manager.write_object(1, owner(3), 0, &sprite).unwrap();
        manager.write_object(1, owner(3), 3, &sprite).unwrap();

        let relocations = manager.remove_object(1, owner(1));
        assert_eq!(
            relocations,
            vec![
                ObjectRelocation { owner: owner(2), segment: 1, from: 19, to: 16 },
                ObjectRelocation { owner: owner(3), segment: 1, from: 21, to: 18 },
            ]
        );
        assert_eq!(manager.object_index(1, owner(3)), Some(18));
        assert_eq!(manager.read_object(18), Some(sprite));
        assert_eq!(manager.read_object(21), Some(sprite));
        // Vacated tail is hidden
        for slot in 22..25 {
            assert_eq!(manager.read_object(slot), Some(ObjectAttributes::HIDDEN));
        }
        assert_eq!(manager.segment(1).unwrap().used(), 6);
    }

    #[test]
    fn test_remove_last_owner_moves_nothing() {
        let mut manager = ObjectSegmentManager::new();
        let segment = manager.get_container(4, None).unwrap();
        manager.add_object(segment, owner(1), 2).unwrap();
        manager.add_object(segment, owner(2), 2).unwrap();

        assert!(manager.remove_object(segment, owner(2)).is_empty());
        assert_eq!(manager.total_used_objects(), 2);
    }

    #[test]
    fn test_write_object_bounds() {
        let mut manager = ObjectSegmentManager::new();
        let segment = manager.get_container(2, None).unwrap();
        manager.add_object(segment, owner(1), 2).unwrap();

        let sprite = ObjectAttributes::new(0, 0, 0, 1, 0);
        assert!(manager.write_object(segment, owner(1), 2, &sprite).is_err());
        assert!(manager.write_object(segment, owner(9), 0, &sprite).is_err());
    }

    #[test]
    fn test_spt_values() {
        let mut manager = ObjectSegmentManager::new();
        manager.setup_segments(&[100, 200, 300, 424], &[0, 0, 0, 0]).unwrap();

        assert_eq!(manager.spt_value(0), Some(99));
        assert_eq!(manager.spt_value(1), Some(299));
        assert_eq!(manager.spt_value(3), Some(1023));
        assert_eq!(manager.spt_value(4), None);
    }

    #[test]
    fn test_reset_drops_segments() {
        let mut manager = ObjectSegmentManager::new();
        let segment = manager.get_container(2, None).unwrap();
        manager.add_object(segment, owner(1), 2).unwrap();
        manager.write_object(segment, owner(1), 0, &ObjectAttributes::new(1, 0, 1, 1, 0)).unwrap();

        manager.reset();
        assert_eq!(manager.segment_count(), 0);
        assert_eq!(manager.read_object(0), Some(ObjectAttributes::HIDDEN));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "has no objects in segment")]
    fn test_double_remove_asserts() {
        let mut manager = ObjectSegmentManager::new();
        let segment = manager.get_container(1, None).unwrap();
        manager.add_object(segment, owner(1), 1).unwrap();
        manager.remove_object(segment, owner(1));
        manager.remove_object(segment, owner(1));
    }

    #[cfg(feature = "debug_overlay")]
    #[test]
    fn test_print_usage() {
        let mut manager = ObjectSegmentManager::new();
        manager.setup_segments(&[64], &[3]).unwrap();
        manager.add_object(0, owner(1), 5).unwrap();
        let mut overlay = TextOverlay::default();

        manager.print(&mut overlay, 0, 0);
        assert!(overlay.contains("OBJECTS' USAGE"));
        assert_eq!(overlay.line(3), "0   0     64   5    3");
        assert_eq!(overlay.line(4), "1   -");
    }
}
