use std::time::Duration;

use crate::coords::ColorRgba;
use crate::device::ContextInit;
use crate::render::{ColorSpace, PixelEncoding};

/// Frame bridge configuration.
///
/// Defaults suit a desktop GPU: all encodings compiled, BT.709, black
/// background, FIFO presentation.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Name of the render worker thread.
    pub thread_name: String,

    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    pub force_fallback_adapter: bool,

    /// Clear colour behind transformed content.
    pub background: ColorRgba,

    /// Initial YUV coefficient set.
    pub color_space: ColorSpace,

    /// Present mode for on-screen sinks.
    pub present_mode: wgpu::PresentMode,

    /// Encodings to compile. `None` compiles all of them.
    pub encodings: Option<Vec<PixelEncoding>>,

    /// How often a blocking call checks whether the worker is still alive.
    pub await_poll_interval: Duration,

    /// Worker wake-up period while readbacks are in flight.
    pub readback_poll_interval: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            thread_name: "framebridge-render".to_string(),
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            background: ColorRgba::black(),
            color_space: ColorSpace::default(),
            present_mode: wgpu::PresentMode::Fifo,
            encodings: None,
            await_poll_interval: Duration::from_millis(50),
            readback_poll_interval: Duration::from_millis(2),
        }
    }
}

impl BridgeConfig {
    pub(crate) fn context_init(&self) -> ContextInit {
        ContextInit {
            backends: self.backends,
            power_preference: self.power_preference,
            force_fallback_adapter: self.force_fallback_adapter,
            encodings: self
                .encodings
                .clone()
                .unwrap_or_else(|| PixelEncoding::ALL.to_vec()),
            color_space: self.color_space,
            background: self.background,
            present_mode: self.present_mode,
            ..ContextInit::default()
        }
    }
}
