//! Time subsystem.
//!
//! Provides frame pacing for synthetic producers without coupling to a runtime.
//! Intended usage:
//! - one `FrameClock` per producer thread
//! - sleep for `until_next()`, then call `tick()` once per emitted frame

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
