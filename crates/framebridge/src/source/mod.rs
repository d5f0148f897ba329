//! Producer boundary.
//!
//! A `TexSource` feeds frames into an `InputSurface` from its own thread and
//! reports size changes and failures through `TexSourceCallback`.

mod pattern;

use std::sync::Arc;

use anyhow::Result;

use crate::input::InputSurface;

pub use pattern::{render_bars, PatternConfig, PatternSource, BAR_COLORS};

/// Producer notifications.
pub trait TexSourceCallback: Send + Sync {
    /// Content size and the rotation, in degrees, needed to display it upright.
    fn on_size_change(&self, width: u32, height: u32, rotation_degrees: i32);

    fn on_error(&self, cause: &anyhow::Error);
}

/// Something that pushes frames into the bridge.
pub trait TexSource: Send {
    fn start(&mut self, surface: InputSurface, callback: Arc<dyn TexSourceCallback>) -> Result<()>;

    /// Stops producing. Safe after a failed start or without any start.
    fn stop(&mut self);
}
