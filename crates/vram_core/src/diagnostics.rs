//! # Text Overlay
//!
//! A character grid the allocators print their status into. The engine
//! shows it on the printing layer in debug builds, and on a fatal
//! depletion right before halting.

use vram_shared::constants::{SCREEN_HEIGHT_IN_CHARS, SCREEN_WIDTH_IN_CHARS};

/// A fixed-size grid of ASCII cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextOverlay {
    cols: usize,
    rows: usize,
    cells: Vec<u8>,
}

impl TextOverlay {
    /// Creates a blank overlay.
    #[must_use]
    pub fn new(cols: usize, rows: usize) -> Self {
        Self { cols, rows, cells: vec![b' '; cols * rows] }
    }

    /// Overlay width in characters.
    #[inline]
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Overlay height in characters.
    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Blanks every cell.
    pub fn clear(&mut self) {
        self.cells.fill(b' ');
    }

    /// Prints text at (x, y). Anything past the right edge is clipped.
    pub fn text(&mut self, x: usize, y: usize, text: &str) {
        if y >= self.rows {
            return;
        }
        for (i, byte) in text.bytes().enumerate() {
            let col = x + i;
            if col >= self.cols {
                break;
            }
            self.cells[y * self.cols + col] = if byte.is_ascii() { byte } else { b'?' };
        }
    }

    /// Prints a decimal number.
    pub fn int(&mut self, x: usize, y: usize, value: i64) {
        self.text(x, y, &value.to_string());
    }

    /// Prints a zero-padded hex number.
    pub fn hex(&mut self, x: usize, y: usize, value: u32, digits: usize) {
        self.text(x, y, &format!("{value:0digits$X}"));
    }

    /// Returns one row without trailing blanks.
    #[must_use]
    pub fn line(&self, y: usize) -> String {
        if y >= self.rows {
            return String::new();
        }
        let row = &self.cells[y * self.cols..(y + 1) * self.cols];
        String::from_utf8_lossy(row).trim_end().to_string()
    }

    /// Returns true if any row contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        (0..self.rows).any(|y| self.line(y).contains(needle))
    }

    /// Renders all rows, newline separated.
    #[must_use]
    pub fn render(&self) -> String {
        (0..self.rows).map(|y| self.line(y)).collect::<Vec<_>>().join("\n")
    }
}

impl Default for TextOverlay {
    fn default() -> Self {
        Self::new(SCREEN_WIDTH_IN_CHARS, SCREEN_HEIGHT_IN_CHARS)
    }
}
