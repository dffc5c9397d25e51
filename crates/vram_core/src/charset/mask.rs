//! Occupancy bitmask for one char segment.

use vram_shared::constants::CHARS_PER_SEGMENT;

const WORD_BITS: usize = 32;
const WORDS: usize = CHARS_PER_SEGMENT / WORD_BITS;

/// One bit per tile, set while the tile belongs to a charset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SegmentMask {
    words: [u32; WORDS],
    used: usize,
}

impl SegmentMask {
    pub(crate) const fn new() -> Self {
        Self { words: [0; WORDS], used: 0 }
    }

    #[inline]
    pub(crate) const fn used(&self) -> usize {
        self.used
    }

    #[inline]
    pub(crate) const fn free(&self) -> usize {
        CHARS_PER_SEGMENT - self.used
    }

    #[inline]
    pub(crate) const fn is_set(&self, tile: usize) -> bool {
        self.words[tile / WORD_BITS] & (1 << (tile % WORD_BITS)) != 0
    }

    /// Returns the lowest offset starting `count` clear bits.
    pub(crate) fn find_run(&self, count: usize) -> Option<usize> {
        if count == 0 || count > self.free() {
            return None;
        }

        let mut start = 0;
        let mut run = 0;
        let mut tile = 0;
        while tile < CHARS_PER_SEGMENT {
            // Skip whole words that are full
            if tile % WORD_BITS == 0 && self.words[tile / WORD_BITS] == u32::MAX {
                run = 0;
                tile += WORD_BITS;
                continue;
            }

            if self.is_set(tile) {
                run = 0;
            } else {
                if run == 0 {
                    start = tile;
                }
                run += 1;
                if run == count {
                    return Some(start);
                }
            }
            tile += 1;
        }

        None
    }

    /// Longest clear run, for diagnostics.
    pub(crate) fn largest_free_run(&self) -> usize {
        let mut best = 0;
        let mut run = 0;
        for tile in 0..CHARS_PER_SEGMENT {
            if self.is_set(tile) {
                run = 0;
            } else {
                run += 1;
                best = best.max(run);
            }
        }
        best
    }

    pub(crate) fn mark(&mut self, offset: usize, count: usize) {
        for tile in offset..offset + count {
            debug_assert!(!self.is_set(tile), "tile {tile} already taken");
            self.words[tile / WORD_BITS] |= 1 << (tile % WORD_BITS);
        }
        self.used += count;
    }

    pub(crate) fn release(&mut self, offset: usize, count: usize) {
        for tile in offset..offset + count {
            debug_assert!(self.is_set(tile), "tile {tile} already free");
            self.words[tile / WORD_BITS] &= !(1 << (tile % WORD_BITS));
        }
        self.used -= count;
    }

    pub(crate) fn reset(&mut self) {
        self.words = [0; WORDS];
        self.used = 0;
    }
}
