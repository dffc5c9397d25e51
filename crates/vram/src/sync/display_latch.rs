//! # Display Latch
//!
//! Hands a consistent copy of VRAM from the main thread to whoever plays
//! the display controller (a viewer, a recorder, a test).
//!
//! ## Architecture
//!
//! ```text
//!   main thread                          display side
//!  ┌───────────────┐                   ┌───────────────┐
//!  │  allocators   │   end of frame    │ DisplayReader │
//!  │ dirty regions ├──── publish ─────►│  read guard   │
//!  └───────────────┘    write lock     └───────────────┘
//!                           │
//!                  ┌────────┴────────┐
//!                  │  DisplayImage   │
//!                  │  RwLock + Arc   │
//!                  └─────────────────┘
//! ```
//!
//! ## Thread Safety
//!
//! - `DisplayLatch::publish`: main thread only, once per frame
//! - `DisplayReader`: any number, any thread
//!
//! Readers never see a frame half-published: every dirty region is copied
//! under one write lock.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use vram_shared::constants::OBJECT_SEGMENTS;
use vram_shared::HardwareRegion;

/// The display side's copy of VRAM.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayImage {
    /// Frame the image was published at.
    pub frame: u64,
    /// Char memory.
    pub char_memory: Box<[u8]>,
    /// Bgmap segments available to textures.
    pub bgmap_memory: Box<[u8]>,
    /// Param table.
    pub param_table: Box<[u8]>,
    /// Object attribute memory.
    pub object_memory: Box<[u8]>,
    /// SPT register values.
    pub spt: [u16; OBJECT_SEGMENTS],
}

/// Regions changed during a frame. `None` means unchanged.
#[derive(Debug, Default)]
pub struct LatchUpdate<'a> {
    /// Char memory, if written.
    pub char_memory: Option<&'a HardwareRegion>,
    /// Bgmap memory, if written.
    pub bgmap_memory: Option<&'a HardwareRegion>,
    /// Param table, if written.
    pub param_table: Option<&'a HardwareRegion>,
    /// Object memory, if written.
    pub object_memory: Option<&'a HardwareRegion>,
    /// SPT register values.
    pub spt: [u16; OBJECT_SEGMENTS],
}

/// Write side of the latch, owned by the video memory context.
#[derive(Debug)]
pub struct DisplayLatch {
    image: Arc<RwLock<DisplayImage>>,
}

impl DisplayLatch {
    /// Creates a latch holding an all-zero image.
    #[must_use]
    pub fn new(char_bytes: usize, bgmap_bytes: usize, param_bytes: usize, object_bytes: usize) -> Self {
        let image = DisplayImage {
            frame: 0,
            char_memory: vec![0; char_bytes].into_boxed_slice(),
            bgmap_memory: vec![0; bgmap_bytes].into_boxed_slice(),
            param_table: vec![0; param_bytes].into_boxed_slice(),
            object_memory: vec![0; object_bytes].into_boxed_slice(),
            spt: [0; OBJECT_SEGMENTS],
        };
        Self { image: Arc::new(RwLock::new(image)) }
    }

    /// Creates a reader handle.
    #[must_use]
    pub fn reader(&self) -> DisplayReader {
        DisplayReader { image: Arc::clone(&self.image) }
    }

    /// Copies the changed regions into the image. Returns how many changed.
    pub fn publish(&self, frame: u64, update: &LatchUpdate<'_>) -> usize {
        let mut guard = self.image.write();
        let image = &mut *guard;
        let mut published = 0;

        for (target, source) in [
            (&mut image.char_memory, update.char_memory),
            (&mut image.bgmap_memory, update.bgmap_memory),
            (&mut image.param_table, update.param_table),
            (&mut image.object_memory, update.object_memory),
        ] {
            let Some(region) = source else {
                continue;
            };
            if target.len() == region.len() {
                target.copy_from_slice(region.as_bytes());
            } else {
                // The param table can be set up at a new size between stages
                *target = region.as_bytes().into();
            }
            published += 1;
        }

        image.frame = frame;
        image.spt = update.spt;
        published
    }
}

/// Read side of the latch.
#[derive(Clone, Debug)]
pub struct DisplayReader {
    image: Arc<RwLock<DisplayImage>>,
}

impl DisplayReader {
    /// Locks the image for reading. Hold the guard for as short as possible:
    /// publishing waits on it.
    #[must_use]
    pub fn read(&self) -> RwLockReadGuard<'_, DisplayImage> {
        self.image.read()
    }

    /// Frame of the last published image.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.image.read().frame
    }

    /// Copies the whole image out.
    #[must_use]
    pub fn snapshot(&self) -> DisplayImage {
        self.image.read().clone()
    }
}
