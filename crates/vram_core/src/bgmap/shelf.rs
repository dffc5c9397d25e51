//! Shelf packing inside one 64x64 bgmap segment.
//!
//! A segment is cut into horizontal bands. Each band has an x cursor, and
//! its height is fixed by the first texture placed in it. Textures go into
//! the first band tall enough with room left on the right.

use vram_shared::constants::{BGMAP_BANDS_PER_SEGMENT, BGMAP_SEGMENT_CELLS, BGMAP_SEGMENT_COLS};

/// Packing state of one segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ShelfPacker {
    /// X cursor per band.
    x: [usize; BGMAP_BANDS_PER_SEGMENT],
    /// Top row per band; zero past the last opened band.
    y: [usize; BGMAP_BANDS_PER_SEGMENT],
    used_cells: usize,
}

impl ShelfPacker {
    pub(crate) const fn new() -> Self {
        Self {
            x: [0; BGMAP_BANDS_PER_SEGMENT],
            y: [0; BGMAP_BANDS_PER_SEGMENT],
            used_cells: 0,
        }
    }

    #[inline]
    pub(crate) const fn used_cells(&self) -> usize {
        self.used_cells
    }

    /// Finds room for a `cols` x `rows` footprint whose bottom stays
    /// within `max_row`. Returns its top-left corner.
    pub(crate) fn place(&mut self, cols: usize, rows: usize, max_row: usize) -> Option<(usize, usize)> {
        if cols * rows > BGMAP_SEGMENT_CELLS - self.used_cells {
            return None;
        }

        for band in 0..BGMAP_BANDS_PER_SEGMENT - 1 {
            let top = self.y[band];
            let next = self.y[band + 1];
            let open = next == 0;

            if rows > max_row.saturating_sub(top) {
                // Every later band starts lower
                return None;
            }
            if !open && rows > next - top {
                continue;
            }
            if cols > BGMAP_SEGMENT_COLS - self.x[band] {
                continue;
            }

            let origin = (self.x[band], top);
            self.x[band] += cols;
            if open {
                self.y[band + 1] = top + rows;
            }
            self.used_cells += cols * rows;
            return Some(origin);
        }

        None
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_band_left_to_right() {
        let mut shelf = ShelfPacker::new();

        assert_eq!(shelf.place(32, 8, 64), Some((0, 0)));
        assert_eq!(shelf.place(32, 4, 64), Some((32, 0)));
        // Band 0 is full, opens band 1 under it
        assert_eq!(shelf.place(10, 8, 64), Some((0, 8)));
        assert_eq!(shelf.used_cells(), 32 * 8 + 32 * 4 + 10 * 8);
    }

    #[test]
    fn test_taller_texture_skips_short_band() {
        let mut shelf = ShelfPacker::new();
        shelf.place(8, 4, 64).unwrap();
        shelf.place(8, 20, 64).unwrap();

        // Too tall for band 0, fits beside the 20-row texture in band 1
        assert_eq!(shelf.place(8, 10, 64), Some((8, 4)));
    }

    #[test]
    fn test_respects_max_row() {
        let mut shelf = ShelfPacker::new();
        assert_eq!(shelf.place(64, 30, 36), Some((0, 0)));
        assert_eq!(shelf.place(64, 7, 36), None);
        assert_eq!(shelf.place(64, 6, 36), Some((0, 30)));
    }

    #[test]
    fn test_full_segment() {
        let mut shelf = ShelfPacker::new();
        assert_eq!(shelf.place(64, 64, 64), Some((0, 0)));
        assert_eq!(shelf.place(1, 1, 64), None);

        shelf.reset();
        assert_eq!(shelf.place(1, 1, 64), Some((0, 0)));
    }
}
