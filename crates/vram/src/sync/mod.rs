//! # Synchronization Primitives
//!
//! The one place VRAM crosses a thread boundary: publishing the finished
//! frame's memory to the display side.

mod display_latch;

pub use display_latch::{DisplayImage, DisplayLatch, DisplayReader, LatchUpdate};
