use std::collections::HashMap;

use crate::coords::Size;
use crate::render::encoding::{LayoutFamily, PixelEncoding};
use crate::render::geometry::QuadVertex;

pub(crate) const CONVERT_WGSL: &str = include_str!("shaders/convert.wgsl");

/// Shader construction failure.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("shader parse failed:\n{0}")]
    Parse(String),
    #[error("shader validation failed: {0}")]
    Validation(String),
    #[error("entry point `{0}` missing from shader module")]
    MissingEntryPoint(&'static str),
    #[error("pipeline creation for {format:?} failed: {message}")]
    Pipeline {
        format: wgpu::TextureFormat,
        message: String,
    },
}

/// Parses and validates WGSL on the CPU.
///
/// Running this before handing the source to wgpu turns shader errors into a
/// `Result` instead of an uncaptured device error.
pub fn validate_wgsl(source: &str) -> Result<naga::Module, ProgramError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| ProgramError::Parse(e.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    )
    .validate(&module)
    .map_err(|e| ProgramError::Validation(e.as_inner().to_string()))?;

    Ok(module)
}

fn require_entry(module: &naga::Module, name: &'static str) -> Result<(), ProgramError> {
    if module.entry_points.iter().any(|ep| ep.name == name) {
        Ok(())
    } else {
        Err(ProgramError::MissingEntryPoint(name))
    }
}

/// Checks that every entry point `encodings` need is present.
pub(crate) fn check_entry_points(
    module: &naga::Module,
    encodings: &[PixelEncoding],
) -> Result<(), ProgramError> {
    require_entry(module, LayoutFamily::Swizzle.vertex_entry())?;
    require_entry(module, LayoutFamily::Swizzle.fragment_entry())?;
    for enc in encodings {
        let family = enc.family();
        require_entry(module, family.vertex_entry())?;
        require_entry(module, family.fragment_entry())?;
    }
    Ok(())
}

/// Builds one render pipeline for `family` targeting `format`.
pub(crate) fn build_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    family: LayoutFamily,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let label = format!("framebridge {} pipeline ({format:?})", family.fragment_entry());
    let uses_quad = family == LayoutFamily::Swizzle;
    let quad_layout = [QuadVertex::layout()];
    let buffers: &[wgpu::VertexBufferLayout<'_>] = if uses_quad { &quad_layout } else { &[] };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),

        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(family.vertex_entry()),
            compilation_options: Default::default(),
            buffers,
        },

        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(family.fragment_entry()),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: if uses_quad {
                wgpu::PrimitiveTopology::TriangleStrip
            } else {
                wgpu::PrimitiveTopology::TriangleList
            },
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

/// Compiled program for one encoding and one render-target format.
pub struct ConversionProgram {
    encoding: PixelEncoding,
    pipeline: wgpu::RenderPipeline,
}

impl ConversionProgram {
    pub fn encoding(&self) -> PixelEncoding {
        self.encoding
    }

    pub fn viewport_size(&self, content: Size) -> Size {
        self.encoding.viewport_size(content)
    }

    /// Records the draw. Bind group and uniforms must already be current.
    pub(crate) fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        bind_group: &wgpu::BindGroup,
        quad: &wgpu::Buffer,
    ) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        if self.encoding.family() == LayoutFamily::Swizzle {
            pass.set_vertex_buffer(0, quad.slice(..));
            pass.draw(0..4, 0..1);
        } else {
            pass.draw(0..3, 0..1);
        }
    }
}

/// Programs for every enabled encoding, all targeting one texture format.
pub struct ProgramSet {
    format: wgpu::TextureFormat,
    programs: HashMap<PixelEncoding, ConversionProgram>,
}

impl ProgramSet {
    /// Builds all programs or none.
    ///
    /// Pipelines are created inside a validation error scope. If the device
    /// rejects any of them the whole partial set is dropped.
    pub(crate) fn build(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        layout: &wgpu::PipelineLayout,
        format: wgpu::TextureFormat,
        encodings: &[PixelEncoding],
    ) -> Result<Self, ProgramError> {
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut programs = HashMap::with_capacity(encodings.len());
        for &encoding in encodings {
            let pipeline = build_pipeline(device, shader, layout, encoding.family(), format);
            programs.insert(encoding, ConversionProgram { encoding, pipeline });
        }

        if let Some(error) = pollster::block_on(scope.pop()) {
            log::error!(
                "program set for {format:?} rejected, dropping {} programs",
                programs.len()
            );
            return Err(ProgramError::Pipeline {
                format,
                message: error.to_string(),
            });
        }

        log::debug!("built {} programs for {format:?}", programs.len());
        Ok(Self { format, programs })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn get(&self, encoding: PixelEncoding) -> Option<&ConversionProgram> {
        self.programs.get(&encoding)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
