//! Shared vertex and uniform storage, reused by every draw.
//!
//! Buffers are rewritten before each submit; `queue.write_buffer` contents
//! become visible at the next `queue.submit`, so one submit per destination
//! keeps draws from observing each other's parameters.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::coords::{Mat4, Size};
use crate::render::color_space::ColorUniform;
use crate::render::encoding::PixelEncoding;

// ── quad vertex ───────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    /// Normalized device coordinates.
    pub pos: [f32; 2],
    /// Unit texture coordinates, top-left origin.
    pub uv: [f32; 2],
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

// ── uniforms ──────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniform {
    pub mvp: [[f32; 4]; 4],
    pub tex_matrix: [[f32; 4]; 4],
}

impl FrameUniform {
    pub fn new(tex_matrix: Mat4) -> Self {
        Self {
            mvp: Mat4::identity().cols,
            tex_matrix: tex_matrix.cols,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PackUniform {
    pub src_size: [f32; 4],
    pub order: [u32; 4],
    pub flags: [u32; 4],
}

impl PackUniform {
    /// Parameters for a draw of `encoding` reading a source of `src` texels.
    pub fn for_encoding(encoding: PixelEncoding, src: Size) -> Self {
        let w = src.width.max(1) as f32;
        let h = src.height.max(1) as f32;
        Self {
            src_size: [w, h, 1.0 / w, 1.0 / h],
            order: encoding.component_order(),
            flags: [encoding.forces_opaque() as u32, 0, 0, 0],
        }
    }

    /// Plain RGBA compose into a staging texture.
    pub fn compose(src: Size) -> Self {
        Self::for_encoding(PixelEncoding::Rgba8888, src)
    }
}

fn min_binding_size<T>() -> Option<std::num::NonZeroU64> {
    std::num::NonZeroU64::new(std::mem::size_of::<T>() as u64)
}

/// Bind group layout shared by every conversion program.
///
/// 0: source texture, 1: sampler, 2: `FrameUniform`, 3: `ColorUniform`,
/// 4: `PackUniform`.
pub(crate) fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let stages = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
    let uniform = |binding: u32, size: Option<std::num::NonZeroU64>| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: stages,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: size,
        },
        count: None,
    };

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("framebridge convert bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: stages,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: stages,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            uniform(2, min_binding_size::<FrameUniform>()),
            uniform(3, min_binding_size::<ColorUniform>()),
            uniform(4, min_binding_size::<PackUniform>()),
        ],
    })
}

// ── buffers ───────────────────────────────────────────────────────────────

/// Which parameter buffer a bind group reads at binding 4.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum ParamSlot {
    /// Draws sampling the input texture.
    Compose,
    /// Draws reading a staging texture.
    Pack,
}

pub struct GeometryBuffers {
    vertices: wgpu::Buffer,
    frame: wgpu::Buffer,
    color: wgpu::Buffer,
    compose_params: wgpu::Buffer,
    pack_params: wgpu::Buffer,
}

impl GeometryBuffers {
    pub(crate) fn new(device: &wgpu::Device, color: ColorUniform) -> Self {
        let uniform = |label: &str, size: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        let vertices = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("framebridge quad vbo"),
            size: (std::mem::size_of::<QuadVertex>() * 4) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let color = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("framebridge color ubo"),
            contents: bytemuck::bytes_of(&color),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            vertices,
            frame: uniform("framebridge frame ubo", std::mem::size_of::<FrameUniform>()),
            color,
            compose_params: uniform("framebridge compose params", std::mem::size_of::<PackUniform>()),
            pack_params: uniform("framebridge pack params", std::mem::size_of::<PackUniform>()),
        }
    }

    pub(crate) fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertices
    }

    pub(crate) fn write_vertices(&self, queue: &wgpu::Queue, quad: &[QuadVertex; 4]) {
        queue.write_buffer(&self.vertices, 0, bytemuck::cast_slice(quad));
    }

    pub(crate) fn write_frame(&self, queue: &wgpu::Queue, frame: &FrameUniform) {
        queue.write_buffer(&self.frame, 0, bytemuck::bytes_of(frame));
    }

    pub(crate) fn write_color(&self, queue: &wgpu::Queue, color: &ColorUniform) {
        queue.write_buffer(&self.color, 0, bytemuck::bytes_of(color));
    }

    pub(crate) fn write_params(&self, queue: &wgpu::Queue, slot: ParamSlot, params: &PackUniform) {
        let buf = match slot {
            ParamSlot::Compose => &self.compose_params,
            ParamSlot::Pack => &self.pack_params,
        };
        queue.write_buffer(buf, 0, bytemuck::bytes_of(params));
    }

    /// Bind group reading `view` with the parameter buffer for `slot`.
    pub(crate) fn bind(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        view: &wgpu::TextureView,
        slot: ParamSlot,
    ) -> wgpu::BindGroup {
        let params = match slot {
            ParamSlot::Compose => &self.compose_params,
            ParamSlot::Pack => &self.pack_params,
        };
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(match slot {
                ParamSlot::Compose => "framebridge input bind group",
                ParamSlot::Pack => "framebridge staging bind group",
            }),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.frame.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: self.color.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: params.as_entire_binding(),
                },
            ],
        })
    }
}
