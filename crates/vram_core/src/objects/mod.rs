//! # Object Memory
//!
//! Object attribute table segments and the entries written into them.

mod attributes;
mod manager;

pub use attributes::{ObjectAttributes, JLON, JRON};
pub use manager::{ObjectRelocation, ObjectSegment, ObjectSegmentManager};
