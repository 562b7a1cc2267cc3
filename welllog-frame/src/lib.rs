//! Well-log frame access engine
//!
//! This crate plans byte-exact read/skip/extrapolate sequences over frame data
//! and materializes the decoded values into an addressable frame store.

pub mod accumulator;
pub mod layout;
pub mod planner;
pub mod reader;
pub mod store;

pub use accumulator::{Accumulator, AccumulatorKind};
pub use layout::{Addressing, ChannelLayout, FrameLayout, InterleavedTable};
pub use planner::{AccessEvent, AccessPlan, AccessPlanner, FrameRange};
pub use reader::{load_frames, ExecutionSummary, FrameReader, ReadError};
pub use store::{BatchPoint, FrameStore, SubChannelSpan, SubChannelView};
