//! # VRAM Core
//!
//! The four allocators that share out the display controller's memory
//! windows among sprites and textures.
//!
//! | Allocator | Window | Strategy |
//! |---|---|---|
//! | [`CharSetManager`] | char memory, 4 x 512 tiles | first fit over bitmasks, shared charsets deduplicated |
//! | [`BgmapTextureManager`] | bgmap segments, 64 x 64 cells | shelf packing, freed regions cached for reuse |
//! | [`ParamTableManager`] | param table | bump allocation, one-table-per-frame compaction |
//! | [`ObjectSegmentManager`] | object attributes, 1024 entries | four depth-ordered segments |
//!
//! ## Rules
//!
//! 1. Every allocator owns its window. Nothing else writes there.
//! 2. All calls come from the main thread, during the logic phase.
//! 3. Running out of memory is fatal. Callers halt, they do not retry.
//! 4. Double frees and stale handles are bugs: they assert in debug
//!    builds and are ignored in release builds.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod bgmap;
pub mod charset;
pub mod diagnostics;
pub mod error;
pub mod memory;
pub mod objects;
pub mod param;

pub use bgmap::{BgmapHandle, BgmapRegistration, BgmapRequest, BgmapTextureManager};
pub use charset::{
    CharSetAllocation, CharSetHandle, CharSetManager, CharSetPolicy, CharSetRelocation, CharSetRequest,
};
pub use diagnostics::TextOverlay;
pub use error::{VramError, VramResult};
pub use objects::{ObjectAttributes, ObjectRelocation, ObjectSegment, ObjectSegmentManager};
pub use param::{CompactionState, CompactionStep, ParamAllocation, ParamMode, ParamTableManager};
