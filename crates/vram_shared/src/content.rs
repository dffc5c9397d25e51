//! # Content Sources
//!
//! Allocators deduplicate and blit by content identity. The pixel and map
//! data itself lives behind [`ContentSource`], normally ROM-resident asset
//! tables; [`ContentLibrary`] is the in-memory implementation used by tools
//! and tests.

use std::collections::HashMap;

use crate::constants::TILE_BYTES;

/// Identifies one immutable piece of texture content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(u32);

impl ContentId {
    /// Creates an id from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Identifies the engine object that owns a param table or object slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(u32);

impl OwnerId {
    /// Creates an id from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Read access to texture content.
pub trait ContentSource {
    /// Tile pixel data, [`TILE_BYTES`] per tile. Animated content stores its
    /// frames back to back.
    fn tiles(&self, id: ContentId) -> Option<&[u8]>;

    /// Bgmap cells in row-major order. Character indices are relative to the
    /// first tile of the texture's charset.
    fn cells(&self, id: ContentId) -> Option<&[u16]>;
}

/// `HashMap`-backed [`ContentSource`].
#[derive(Clone, Debug, Default)]
pub struct ContentLibrary {
    tiles: HashMap<ContentId, Box<[u8]>>,
    cells: HashMap<ContentId, Box<[u16]>>,
}

impl ContentLibrary {
    /// Creates an empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers tile data. Length must be a whole number of tiles.
    ///
    /// # Panics
    ///
    /// Panics if `data` is not a multiple of [`TILE_BYTES`] long.
    pub fn insert_tiles(&mut self, id: ContentId, data: impl Into<Box<[u8]>>) {
        let data = data.into();
        assert!(data.len() % TILE_BYTES == 0, "tile data must be whole tiles");
        self.tiles.insert(id, data);
    }

    /// Registers bgmap cell data.
    pub fn insert_cells(&mut self, id: ContentId, data: impl Into<Box<[u16]>>) {
        self.cells.insert(id, data.into());
    }

    /// Number of registered tile blobs.
    #[must_use]
    pub fn tile_entries(&self) -> usize {
        self.tiles.len()
    }

    /// Number of registered cell blobs.
    #[must_use]
    pub fn cell_entries(&self) -> usize {
        self.cells.len()
    }
}

impl ContentSource for ContentLibrary {
    fn tiles(&self, id: ContentId) -> Option<&[u8]> {
        self.tiles.get(&id).map(AsRef::as_ref)
    }

    fn cells(&self, id: ContentId) -> Option<&[u16]> {
        self.cells.get(&id).map(AsRef::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_lookup() {
        let mut library = ContentLibrary::new();
        library.insert_tiles(ContentId::new(1), vec![7u8; TILE_BYTES * 2]);
        library.insert_cells(ContentId::new(1), vec![0u16, 1, 2, 3]);

        assert_eq!(library.tiles(ContentId::new(1)).map(<[u8]>::len), Some(32));
        assert_eq!(library.cells(ContentId::new(1)), Some(&[0u16, 1, 2, 3][..]));
        assert!(library.tiles(ContentId::new(2)).is_none());
    }

    #[test]
    #[should_panic(expected = "whole tiles")]
    fn test_library_rejects_partial_tiles() {
        let mut library = ContentLibrary::new();
        library.insert_tiles(ContentId::new(1), vec![0u8; 10]);
    }
}
