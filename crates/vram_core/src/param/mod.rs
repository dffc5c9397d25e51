//! # Param Table
//!
//! Affine and h-bias table allocation with per-frame compaction.

mod manager;

pub use manager::{
    CompactionState, CompactionStep, Hole, ParamAllocation, ParamMode, ParamTableManager,
};
