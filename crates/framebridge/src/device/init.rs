use crate::coords::ColorRgba;
use crate::render::{ColorSpace, PixelEncoding};

/// Initialization parameters for the rendering context.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct ContextInit {
    /// Backends the instance may pick an adapter from.
    pub backends: wgpu::Backends,

    pub power_preference: wgpu::PowerPreference,

    /// Accept only a software adapter. Useful for CI machines without a GPU.
    pub force_fallback_adapter: bool,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability unless a feature is strictly necessary.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Encodings compiled at startup. Requests for other encodings are logged
    /// and skipped.
    pub encodings: Vec<PixelEncoding>,

    /// Initial YUV coefficient set.
    pub color_space: ColorSpace,

    /// Clear colour behind the transformed content.
    pub background: ColorRgba,

    /// Present mode for on-screen sinks.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for sink surfaces.
    ///
    /// If provided but unsupported on a surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Desired maximum frame latency for sink surfaces.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for ContextInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            encodings: PixelEncoding::ALL.to_vec(),
            color_space: ColorSpace::default(),
            background: ColorRgba::black(),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            desired_maximum_frame_latency: 2,
        }
    }
}
