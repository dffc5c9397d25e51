//! # Hardware Region
//!
//! Host-side stand-in for one VRAM window: a fixed base address and a
//! bounds-checked byte array. Allocators hold offsets into a region, never
//! pointers, so all of their logic runs without real hardware.

use std::ops::Range;

use bytemuck::Pod;
use thiserror::Error;

/// Errors raised by region accesses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    /// An access fell outside the region.
    #[error("{region}: {len} bytes at offset {offset} exceed region size {size}")]
    OutOfBounds {
        /// Region name.
        region: &'static str,
        /// Requested offset.
        offset: usize,
        /// Requested length.
        len: usize,
        /// Region size.
        size: usize,
    },
}

/// Result type for region accesses.
pub type RegionResult<T> = Result<T, RegionError>;

/// A fixed-size, byte-addressable hardware memory window.
///
/// The region remembers whether it was written since the last time the
/// display side took a copy (see [`HardwareRegion::take_dirty`]).
#[derive(Clone, Debug)]
pub struct HardwareRegion {
    /// Name used in diagnostics.
    name: &'static str,
    /// Address of byte 0 in the hardware map.
    base_address: u32,
    /// Backing storage.
    bytes: Box<[u8]>,
    /// Written since the last publication.
    dirty: bool,
}

impl HardwareRegion {
    /// Creates a zeroed region.
    #[must_use]
    pub fn new(name: &'static str, base_address: u32, size: usize) -> Self {
        Self {
            name,
            base_address,
            bytes: vec![0u8; size].into_boxed_slice(),
            dirty: false,
        }
    }

    /// Returns the region name.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the hardware address of byte 0.
    #[inline]
    #[must_use]
    pub const fn base_address(&self) -> u32 {
        self.base_address
    }

    /// Returns the size in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for a zero-sized region.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hardware address of an offset inside the region.
    #[inline]
    #[must_use]
    pub const fn address_of(&self, offset: usize) -> u32 {
        self.base_address + offset as u32
    }

    /// Whole region contents.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn span(&self, offset: usize, len: usize) -> RegionResult<Range<usize>> {
        match offset.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(offset..end),
            _ => Err(RegionError::OutOfBounds {
                region: self.name,
                offset,
                len,
                size: self.bytes.len(),
            }),
        }
    }

    /// Reads `len` bytes at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::OutOfBounds`] if the range leaves the region.
    pub fn read(&self, offset: usize, len: usize) -> RegionResult<&[u8]> {
        let span = self.span(offset, len)?;
        Ok(&self.bytes[span])
    }

    /// Writes `data` at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::OutOfBounds`] if the range leaves the region.
    pub fn write(&mut self, offset: usize, data: &[u8]) -> RegionResult<()> {
        let span = self.span(offset, data.len())?;
        self.bytes[span].copy_from_slice(data);
        self.dirty = true;
        Ok(())
    }

    /// Writes one plain-old-data value at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::OutOfBounds`] if the value does not fit.
    pub fn write_pod<T: Pod>(&mut self, offset: usize, value: &T) -> RegionResult<()> {
        self.write(offset, bytemuck::bytes_of(value))
    }

    /// Reads one plain-old-data value at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::OutOfBounds`] if the value does not fit.
    pub fn read_pod<T: Pod>(&self, offset: usize) -> RegionResult<T> {
        let bytes = self.read(offset, std::mem::size_of::<T>())?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// Fills `len` bytes at `offset` with `value`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::OutOfBounds`] if the range leaves the region.
    pub fn fill(&mut self, offset: usize, len: usize, value: u8) -> RegionResult<()> {
        let span = self.span(offset, len)?;
        self.bytes[span].fill(value);
        self.dirty = true;
        Ok(())
    }

    /// Moves `len` bytes from `src` to `dst`. Overlapping ranges are allowed.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::OutOfBounds`] if either range leaves the region.
    pub fn copy_within(&mut self, src: usize, dst: usize, len: usize) -> RegionResult<()> {
        let from = self.span(src, len)?;
        self.span(dst, len)?;
        self.bytes.copy_within(from, dst);
        self.dirty = true;
        Ok(())
    }

    /// Zeroes the whole region.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
        self.dirty = true;
    }

    /// Returns whether the region changed since the last publication.
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns and resets the dirty flag.
    #[inline]
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_write_read() {
        let mut region = HardwareRegion::new("test", 0x1000, 64);
        region.write(8, &[1, 2, 3]).unwrap();
        assert_eq!(region.read(8, 3).unwrap(), &[1, 2, 3]);
        assert_eq!(region.address_of(8), 0x1008);
        assert!(region.is_dirty());
    }

    #[test]
    fn test_region_bounds() {
        let mut region = HardwareRegion::new("test", 0, 16);
        let err = region.write(14, &[0; 4]).unwrap_err();
        assert_eq!(
            err,
            RegionError::OutOfBounds { region: "test", offset: 14, len: 4, size: 16 }
        );
        assert!(region.read(usize::MAX, 2).is_err());
        assert!(!region.is_dirty());
    }

    #[test]
    fn test_region_copy_within_overlapping() {
        let mut region = HardwareRegion::new("test", 0, 8);
        region.write(0, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        region.copy_within(2, 0, 6).unwrap();
        assert_eq!(region.as_bytes(), &[3, 4, 5, 6, 7, 8, 7, 8]);
        assert!(region.copy_within(4, 0, 5).is_err());
    }

    #[test]
    fn test_region_pod_and_dirty() {
        let mut region = HardwareRegion::new("test", 0, 8);
        region.write_pod(2, &0xBEEF_u16).unwrap();
        assert_eq!(region.read_pod::<u16>(2).unwrap(), 0xBEEF);
        assert!(region.take_dirty());
        assert!(!region.is_dirty());
    }
}
