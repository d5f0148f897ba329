use crate::coords::{Mat4, Size};
use crate::device::{RenderingContext, OFFSCREEN_FORMAT};
use crate::render::geometry::ParamSlot;
use crate::render::pass::InputBinding;

use super::{CropRect, InputFrame};

struct Allocation {
    size: Size,
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// GPU copy of the latest producer frame.
///
/// The allocation is the default size when the frame fits inside it, otherwise
/// the frame's own size. Content size and sampling matrix are only refreshed
/// by `latch`.
pub struct StreamingTexture {
    default_size: Size,
    allocation: Option<Allocation>,
    tex_matrix: Mat4,
    content: Size,
}

impl Default for StreamingTexture {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingTexture {
    pub fn new() -> Self {
        Self {
            default_size: Size::zero(),
            allocation: None,
            tex_matrix: Mat4::identity(),
            content: Size::zero(),
        }
    }

    pub fn set_default_size(&mut self, size: Size) {
        self.default_size = size;
    }

    pub fn default_size(&self) -> Size {
        self.default_size
    }

    /// Uploads `frame` and refreshes the sampling matrix and content size.
    pub(crate) fn latch(&mut self, ctx: &RenderingContext, frame: &InputFrame) {
        let wanted = allocation_size(self.default_size, frame.size);
        if self.allocation.as_ref().map(|a| a.size) != Some(wanted) {
            log::debug!("input texture allocated at {wanted}");
            self.allocation = Some(allocate(ctx, wanted));
        }
        let Some(alloc) = self.allocation.as_ref() else { return };

        ctx.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &alloc.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(frame.stride),
                rows_per_image: Some(frame.size.height),
            },
            frame.size.to_extent(),
        );

        self.tex_matrix = sample_matrix(alloc.size, frame.region());
        self.content = content_from_matrix(&self.tex_matrix, alloc.size);
    }

    /// Matrix applied to unit texture coordinates when sampling.
    pub fn sample_matrix(&self) -> Mat4 {
        self.tex_matrix
    }

    /// Content size as of the last latch.
    pub fn content_size(&self) -> Size {
        self.content
    }

    pub(crate) fn binding(&self) -> Option<InputBinding<'_>> {
        let alloc = self.allocation.as_ref()?;
        Some(InputBinding {
            bind_group: &alloc.bind_group,
            content: self.content,
            tex_matrix: self.tex_matrix,
        })
    }

    pub(crate) fn release(&mut self) {
        self.allocation = None;
        self.content = Size::zero();
    }
}

fn allocate(ctx: &RenderingContext, size: Size) -> Allocation {
    let texture = ctx.create_texture(
        "framebridge input",
        size,
        OFFSCREEN_FORMAT,
        wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = ctx.geometry().bind(
        ctx.device(),
        ctx.bind_group_layout(),
        ctx.sampler(),
        &view,
        ParamSlot::Compose,
    );
    Allocation { size, texture, bind_group }
}

pub(crate) fn allocation_size(default_size: Size, frame: Size) -> Size {
    if default_size.width >= frame.width && default_size.height >= frame.height {
        default_size
    } else {
        frame
    }
}

/// Maps unit coordinates onto `region` inside an allocation of `alloc` texels.
pub fn sample_matrix(alloc: Size, region: CropRect) -> Mat4 {
    let aw = alloc.width.max(1) as f32;
    let ah = alloc.height.max(1) as f32;
    Mat4::scale_offset(
        region.width as f32 / aw,
        region.height as f32 / ah,
        region.x as f32 / aw,
        region.y as f32 / ah,
    )
}

/// Recovers the content size from the matrix scale terms.
pub fn content_from_matrix(m: &Mat4, alloc: Size) -> Size {
    let w = (m.cols[0][0].abs() * alloc.width as f32).round();
    let h = (m.cols[1][1].abs() * alloc.height as f32).round();
    Size::new(w as u32, h as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_size_is_used_when_frame_fits() {
        assert_eq!(allocation_size(Size::new(1920, 1080), Size::new(1280, 720)), Size::new(1920, 1080));
        assert_eq!(allocation_size(Size::new(640, 480), Size::new(1280, 720)), Size::new(1280, 720));
        assert_eq!(allocation_size(Size::zero(), Size::new(8, 8)), Size::new(8, 8));
    }

    #[test]
    fn content_size_survives_matrix_round_trip() {
        let alloc = Size::new(1920, 1080);
        let m = sample_matrix(alloc, CropRect::new(0, 0, 1280, 720));
        assert_eq!(content_from_matrix(&m, alloc), Size::new(1280, 720));
    }

    #[test]
    fn crop_offsets_sampling() {
        let alloc = Size::new(100, 50);
        let m = sample_matrix(alloc, CropRect::new(10, 5, 50, 25));
        let uv = m.mul_vec4([0.0, 0.0, 0.0, 1.0]);
        assert!((uv[0] - 0.1).abs() < 1e-6 && (uv[1] - 0.1).abs() < 1e-6);
        let uv = m.mul_vec4([1.0, 1.0, 0.0, 1.0]);
        assert!((uv[0] - 0.6).abs() < 1e-6 && (uv[1] - 0.6).abs() < 1e-6);
    }
}
