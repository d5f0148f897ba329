//! Framebridge crate.
//!
//! Takes RGBA frames from a single producer, draws them onto any number of
//! window sinks and converts them into packed pixel buffers (RGB, RGB565,
//! YUV 4:2:0 / 4:4:4 / 4:2:2) for frame listeners. All GPU work runs on one
//! worker thread owned by `FrameBridge`.

pub mod bridge;
pub mod coords;
pub mod device;
pub mod input;
pub mod logging;
pub mod reader;
pub mod render;
pub mod sink;
pub mod source;
pub mod time;
pub mod transform;

pub use bridge::{BridgeConfig, FrameBridge};
pub use coords::{ColorRgba, Size};
pub use input::{CropRect, InputFrame, InputSurface};
pub use reader::{Delivery, FrameListener, FrameView, ListenerId, ReaderSpec};
pub use render::{ColorSpace, PixelEncoding};
pub use sink::{Drawable, SinkSpec};
pub use source::{PatternConfig, PatternSource, TexSource, TexSourceCallback};
pub use transform::{Fit, Rotation, Transform};
