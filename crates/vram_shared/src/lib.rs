//! # VRAM Shared
//!
//! Facts every allocator agrees on:
//!
//! - the bit-exact layout of the four hardware windows ([`constants`])
//! - the host-side region model standing in for them ([`region`])
//! - where texture content comes from ([`content`])
//!
//! ## CRITICAL RULE
//!
//! No allocation policy lives here. If it decides *where* something goes,
//! it belongs in `vram_core`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod content;
pub mod region;

pub use content::{ContentId, ContentLibrary, ContentSource, OwnerId};
pub use region::{HardwareRegion, RegionError, RegionResult};
