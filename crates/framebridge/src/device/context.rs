use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::coords::{ColorRgba, Size};
use crate::render::geometry::{self, GeometryBuffers};
use crate::render::program::{self, ConversionProgram, ProgramError, ProgramSet};
use crate::render::{ColorSpace, LayoutFamily, PixelEncoding};
use crate::sink::Drawable;

use super::ContextInit;
use super::surface;

/// Render-target format of offscreen readers and staging textures.
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Owns wgpu core objects and the conversion programs.
///
/// This type is the low-level rendering context:
/// - creates and stores Instance/Adapter/Device/Queue (headless)
/// - owns the shared geometry buffers, sampler and bind group layout
/// - builds one `ProgramSet` per render-target format on demand
///
/// It is created on, and never leaves, the bridge worker thread.
pub struct RenderingContext {
    /// wgpu instance used to create the adapter and sink surfaces.
    instance: wgpu::Instance,

    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,

    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,

    /// RGBA pass drawing the transformed input into a staging texture.
    compose: wgpu::RenderPipeline,

    programs: HashMap<wgpu::TextureFormat, ProgramSet>,
    encodings: Vec<PixelEncoding>,
    geometry: GeometryBuffers,

    color_space: ColorSpace,
    background: ColorRgba,

    present_mode: wgpu::PresentMode,
    alpha_mode: Option<wgpu::CompositeAlphaMode>,
    desired_maximum_frame_latency: u32,

    released: bool,
}

impl RenderingContext {
    /// Creates a headless GPU context and compiles the offscreen program set.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(init: ContextInit) -> Result<Self> {
        let ContextInit {
            backends,
            power_preference,
            force_fallback_adapter,
            required_features,
            required_limits,
            encodings,
            color_space,
            background,
            present_mode,
            alpha_mode,
            desired_maximum_frame_latency,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("framebridge device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let info = adapter.get_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);

        let module = program::validate_wgsl(program::CONVERT_WGSL)
            .context("conversion shader rejected")?;
        program::check_entry_points(&module, &encodings)
            .context("conversion shader incomplete")?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("framebridge convert shader"),
            source: wgpu::ShaderSource::Wgsl(program::CONVERT_WGSL.into()),
        });

        let bind_group_layout = geometry::create_bind_group_layout(&device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("framebridge convert pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("framebridge input sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let compose = program::build_pipeline(
            &device,
            &shader,
            &pipeline_layout,
            LayoutFamily::Swizzle,
            OFFSCREEN_FORMAT,
        );

        let geometry = GeometryBuffers::new(&device, color_space.uniform());

        let mut ctx = Self {
            instance,
            adapter,
            device,
            queue,
            shader,
            bind_group_layout,
            pipeline_layout,
            sampler,
            compose,
            programs: HashMap::new(),
            encodings,
            geometry,
            color_space,
            background,
            present_mode,
            alpha_mode,
            desired_maximum_frame_latency,
            released: false,
        };

        ctx.ensure_programs(OFFSCREEN_FORMAT)
            .context("failed to build offscreen programs")?;

        Ok(ctx)
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub(crate) fn geometry(&self) -> &GeometryBuffers {
        &self.geometry
    }

    pub(crate) fn compose_pipeline(&self) -> &wgpu::RenderPipeline {
        &self.compose
    }

    pub(crate) fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub(crate) fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn encodings(&self) -> &[PixelEncoding] {
        &self.encodings
    }

    /// Builds the program set for `format` if it does not exist yet.
    pub fn ensure_programs(&mut self, format: wgpu::TextureFormat) -> Result<(), ProgramError> {
        if self.released || self.programs.contains_key(&format) {
            return Ok(());
        }

        let set = ProgramSet::build(
            &self.device,
            &self.shader,
            &self.pipeline_layout,
            format,
            &self.encodings,
        )?;
        log::info!("compiled {} conversion programs for {format:?}", set.len());
        self.programs.insert(format, set);
        Ok(())
    }

    pub fn program(
        &self,
        format: wgpu::TextureFormat,
        encoding: PixelEncoding,
    ) -> Option<&ConversionProgram> {
        self.programs.get(&format)?.get(encoding)
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    /// Swaps the YUV coefficients. Takes effect from the next submit.
    pub fn set_color_space(&mut self, color_space: ColorSpace) {
        if self.released {
            return;
        }
        self.color_space = color_space;
        self.geometry.write_color(&self.queue, &color_space.uniform());
    }

    pub fn background(&self) -> ColorRgba {
        self.background
    }

    pub fn set_background(&mut self, color: ColorRgba) {
        self.background = color;
    }

    pub(crate) fn create_texture(
        &self,
        label: &str,
        size: Size,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: size.to_extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        })
    }

    /// Creates a presentable surface for `drawable`.
    ///
    /// The surface holds its own reference to the drawable.
    pub(crate) fn create_surface(
        &self,
        drawable: Arc<dyn Drawable>,
    ) -> Result<wgpu::Surface<'static>> {
        self.instance
            .create_surface(drawable)
            .context("failed to create wgpu surface")
    }

    /// Surface configuration for a freshly created sink surface.
    pub(crate) fn surface_config(
        &self,
        surface: &wgpu::Surface<'_>,
        size: Size,
    ) -> Result<wgpu::SurfaceConfiguration> {
        let caps = surface.get_capabilities(&self.adapter);
        let format =
            surface::choose_surface_format(&caps).context("no supported surface formats")?;

        Ok(wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface::choose_present_mode(&caps, self.present_mode),
            alpha_mode: surface::choose_alpha_mode(&caps, self.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: self.desired_maximum_frame_latency,
        })
    }

    /// Pumps device callbacks (buffer maps) without blocking.
    pub fn pump(&self) {
        if let Err(e) = self.device.poll(wgpu::PollType::Poll) {
            log::warn!("device poll failed: {e}");
        }
    }

    /// Drops every program set. Later draws find no program and are skipped.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.programs.clear();
        log::info!("rendering context released");
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}
