//! # Char Memory
//!
//! Tile allocation across the four character segments.

mod manager;
mod mask;

pub use manager::{
    CharSetAllocation, CharSetHandle, CharSetManager, CharSetPolicy, CharSetRelocation, CharSetRequest,
};
