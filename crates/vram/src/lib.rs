//! # VRAM
//!
//! The engine-facing side of video memory.
//!
//! - [`VideoMemory`]: one instance of each allocator, the frame driver and
//!   fatal-error handling
//! - [`VramConfig`]: the TOML-loaded memory layout
//! - [`sync`]: the latch the display side reads finished frames from
//!
//! ## Usage
//!
//! ```ignore
//! let config = VramConfig::load("vram.toml")?;
//! let mut vram = VideoMemory::new(&config)?;
//!
//! loop {
//!     // logic phase: allocate, free, write
//!     let report = vram.end_frame();
//!     if report.halted {
//!         break;
//!     }
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod frame;
pub mod sync;
pub mod video_memory;

pub use config::{ConfigError, ConfigResult, ObjectSegmentConfig, VramConfig};
pub use frame::FrameReport;
pub use sync::{DisplayImage, DisplayLatch, DisplayReader, LatchUpdate};
pub use video_memory::VideoMemory;

pub use vram_core;
pub use vram_shared;
