//! # Memory Management
//!
//! Record storage shared by the allocators.
//!
//! ## Design Philosophy
//!
//! Record slots are reserved once when an allocator is built. During a
//! stage:
//! - No heap allocations on allocate/free
//! - Handles, not pointers, so relocation never dangles

mod pool;

pub use pool::{RecordHandle, RecordPool};
