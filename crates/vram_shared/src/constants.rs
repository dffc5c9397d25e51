//! # Hardware Constants
//!
//! Bit-exact layout of the four memory windows the display controller reads.
//!
//! **CRITICAL:** These values describe silicon, not tuning knobs.
//! Anything configurable lives in the `vram` crate's config instead.

// =============================================================================
// SCREEN
// =============================================================================

/// Screen width in pixels.
pub const SCREEN_WIDTH: usize = 384;

/// Screen height in pixels.
pub const SCREEN_HEIGHT: usize = 224;

/// Screen width in 8x8 characters.
pub const SCREEN_WIDTH_IN_CHARS: usize = SCREEN_WIDTH / 8;

/// Screen height in 8x8 characters.
pub const SCREEN_HEIGHT_IN_CHARS: usize = SCREEN_HEIGHT / 8;

// =============================================================================
// CHARACTER (TILE) MEMORY
// =============================================================================

/// Bytes per 8x8 tile (2 bits per pixel).
pub const TILE_BYTES: usize = 16;

/// Number of character segments.
pub const CHAR_SEGMENTS: usize = 4;

/// Tiles per character segment.
pub const CHARS_PER_SEGMENT: usize = 512;

/// Bytes per character segment.
pub const CHAR_SEGMENT_BYTES: usize = CHARS_PER_SEGMENT * TILE_BYTES;

/// Total tiles across all segments.
pub const CHAR_MEMORY_TOTAL_CHARS: usize = CHAR_SEGMENTS * CHARS_PER_SEGMENT;

/// Hardware address of character segment 0.
pub const CHAR_SPACE_BASE_ADDRESS: u32 = 0x0000_6000;

/// Distance between two character segments in the address map.
///
/// Segments are interleaved with frame buffers, so they are not contiguous.
pub const CHAR_SEGMENT_STRIDE: u32 = 0x0000_8000;

/// Hardware address of a character segment.
#[inline]
#[must_use]
pub const fn char_segment_address(segment: usize) -> u32 {
    CHAR_SPACE_BASE_ADDRESS + segment as u32 * CHAR_SEGMENT_STRIDE
}

// =============================================================================
// BGMAP MEMORY
// =============================================================================

/// Columns in a bgmap segment.
pub const BGMAP_SEGMENT_COLS: usize = 64;

/// Rows in a bgmap segment.
pub const BGMAP_SEGMENT_ROWS: usize = 64;

/// Bytes per bgmap cell.
pub const BGMAP_ENTRY_BYTES: usize = 2;

/// Cells per bgmap segment.
pub const BGMAP_SEGMENT_CELLS: usize = BGMAP_SEGMENT_COLS * BGMAP_SEGMENT_ROWS;

/// Bytes per bgmap segment.
pub const BGMAP_SEGMENT_BYTES: usize = BGMAP_SEGMENT_CELLS * BGMAP_ENTRY_BYTES;

/// Hardware address of bgmap segment 0.
pub const BGMAP_SPACE_BASE_ADDRESS: u32 = 0x0002_0000;

/// Upper bound on bgmap segments usable for textures.
pub const MAX_BGMAP_SEGMENTS: usize = 14;

/// Horizontal bands tracked per bgmap segment by the shelf packer.
pub const BGMAP_BANDS_PER_SEGMENT: usize = 16;

/// Bits of a bgmap cell holding the character index.
pub const BGMAP_CHAR_MASK: u16 = 0x07FF;

/// Shift of the palette selector inside a bgmap cell.
pub const BGMAP_PALETTE_SHIFT: u16 = 14;

// =============================================================================
// PARAM TABLE
// =============================================================================

/// One past the last byte of the param table (top of bgmap memory).
pub const PARAM_TABLE_END: u32 = 0x0003_D800;

/// Extra rows added to every param table so row writes never spill.
pub const PARAM_TABLE_PADDING_ROWS: usize = 1;

/// Largest scale factor affine tables are sized for.
pub const MAXIMUM_SCALE: usize = 2;

/// Row cap for affine tables.
pub const AFFINE_MAX_ROWS: usize = 64;

/// Row cap for h-bias tables.
pub const HBIAS_MAX_ROWS: usize = 28;

/// Affine bytes per texture row: 8 pixel lines times 16 bytes.
pub const AFFINE_BYTES_PER_ROW: usize = 8 * 16;

/// H-bias bytes per texture row: 8 pixel lines times 4 bytes.
pub const HBIAS_BYTES_PER_ROW: usize = 8 * 4;

// =============================================================================
// OBJECT ATTRIBUTE MEMORY
// =============================================================================

/// Hardware address of object attribute memory.
pub const OBJECT_SPACE_BASE_ADDRESS: u32 = 0x0003_E000;

/// Total object slots.
pub const TOTAL_OBJECTS: usize = 1024;

/// Bytes per object attribute entry.
pub const OBJECT_BYTES: usize = 8;

/// Bytes of object attribute memory.
pub const OBJECT_MEMORY_BYTES: usize = TOTAL_OBJECTS * OBJECT_BYTES;

/// Number of object segments (SPT0..SPT3).
pub const OBJECT_SEGMENTS: usize = 4;

const _: () = assert!(CHAR_SEGMENT_BYTES == 8192);
const _: () = assert!(BGMAP_SEGMENT_BYTES == 8192);
const _: () = assert!(OBJECT_MEMORY_BYTES == 8192);
const _: () = assert!(
    (PARAM_TABLE_END - BGMAP_SPACE_BASE_ADDRESS) as usize / BGMAP_SEGMENT_BYTES >= MAX_BGMAP_SEGMENTS
);
