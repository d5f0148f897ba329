//! Presentation sinks: caller-owned drawables bound to GPU surfaces.

mod drawable;
mod registry;
mod table;

pub use drawable::{Drawable, DrawableId};
pub use registry::Registry;
pub use table::{SinkSpec, SinkTable};
