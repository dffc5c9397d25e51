//! # Bgmap Memory
//!
//! Texture placement and recycling across bgmap segments.

mod manager;
mod shelf;

pub use manager::{BgmapHandle, BgmapRegistration, BgmapRequest, BgmapTextureManager};
