//! Object attribute entries as the display controller reads them.

use bytemuck::{Pod, Zeroable};

/// Left-eye display bit in `jp`.
pub const JLON: u16 = 0x8000;
/// Right-eye display bit in `jp`.
pub const JRON: u16 = 0x4000;

const POSITION_MASK: u16 = 0x03FF;
const PARALLAX_MASK: u16 = 0x03FF;
const Y_MASK: u16 = 0x00FF;
const CHAR_MASK: u16 = 0x07FF;
const PALETTE_SHIFT: u16 = 14;

/// One 8-byte object attribute entry.
///
/// An all-zero entry is hidden: both display bits are clear.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ObjectAttributes {
    /// Horizontal position (10-bit signed).
    pub jx: u16,
    /// Display bits and parallax (10-bit signed).
    pub jp: u16,
    /// Vertical position (8-bit signed).
    pub jy: u16,
    /// Palette, flip bits and char index.
    pub jca: u16,
}

impl ObjectAttributes {
    /// An entry the hardware skips.
    pub const HIDDEN: Self = Self { jx: 0, jp: 0, jy: 0, jca: 0 };

    /// Builds a visible entry shown to both eyes.
    #[must_use]
    pub const fn new(x: i16, parallax: i16, y: i16, char_index: u16, palette: u8) -> Self {
        Self {
            jx: x as u16 & POSITION_MASK,
            jp: JLON | JRON | (parallax as u16 & PARALLAX_MASK),
            jy: y as u16 & Y_MASK,
            jca: ((palette as u16 & 0x03) << PALETTE_SHIFT) | (char_index & CHAR_MASK),
        }
    }

    /// Returns true if either eye shows the object.
    #[inline]
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.jp & (JLON | JRON) != 0
    }

    /// Char index the object draws.
    #[inline]
    #[must_use]
    pub const fn char_index(&self) -> u16 {
        self.jca & CHAR_MASK
    }
}
