use crate::coords::{Mat4, Size};
use crate::device::{RenderingContext, OFFSCREEN_FORMAT};
use crate::render::encoding::{LayoutFamily, PixelEncoding};
use crate::render::geometry::{FrameUniform, PackUniform, ParamSlot};
use crate::render::program::ProgramError;
use crate::render::vertex::VertexSolver;
use crate::transform::Transform;

/// Per-destination draw failure. Logged by the caller; other destinations
/// still draw.
#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    #[error("no program compiled for {encoding} on {format:?}")]
    MissingProgram {
        encoding: PixelEncoding,
        format: wgpu::TextureFormat,
    },
    #[error("output size {0} is empty")]
    EmptyOutput(Size),
    #[error("no input frame latched yet")]
    NoInput,
    #[error("staging texture missing for {0}")]
    NoStaging(PixelEncoding),
    #[error("surface acquire failed: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error("rendering context released")]
    Released,
}

/// Composed RGBA image at the logical output size, read by the packing pass.
pub struct StagingTexture {
    size: Size,
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

impl StagingTexture {
    pub(crate) fn new(ctx: &RenderingContext, size: Size) -> Self {
        let texture = ctx.create_texture(
            "framebridge staging",
            size,
            OFFSCREEN_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = ctx.geometry().bind(
            ctx.device(),
            ctx.bind_group_layout(),
            ctx.sampler(),
            &view,
            ParamSlot::Pack,
        );
        Self { size, _texture: texture, view, bind_group }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Keeps `slot` matching `encoding` and `output`, reallocating on size change.
    pub(crate) fn ensure(
        slot: &mut Option<StagingTexture>,
        ctx: &RenderingContext,
        encoding: PixelEncoding,
        output: Size,
    ) {
        if !encoding.needs_neighbor_lookup() {
            *slot = None;
            return;
        }
        if slot.as_ref().is_some_and(|s| s.size == output) {
            return;
        }
        *slot = Some(StagingTexture::new(ctx, output));
    }
}

/// Latched input as the conversion passes see it.
pub(crate) struct InputBinding<'a> {
    pub bind_group: &'a wgpu::BindGroup,
    pub content: Size,
    pub tex_matrix: Mat4,
}

/// One conversion destination.
pub(crate) struct ConversionTarget<'a> {
    pub view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    /// Logical output size; the packed viewport is derived from it.
    pub output: Size,
    pub staging: Option<&'a StagingTexture>,
}

/// Records the passes converting the input into `target`.
///
/// Writes the shared geometry buffers; the caller submits `encoder` before
/// the next destination is encoded.
pub(crate) fn encode_conversion(
    ctx: &RenderingContext,
    encoder: &mut wgpu::CommandEncoder,
    input: &InputBinding<'_>,
    encoding: PixelEncoding,
    transform: Option<&Transform>,
    solver: &mut VertexSolver,
    target: &ConversionTarget<'_>,
) -> Result<(), DrawError> {
    if ctx.is_released() {
        return Err(DrawError::Released);
    }
    if !target.output.is_positive() {
        return Err(DrawError::EmptyOutput(target.output));
    }
    let program = ctx
        .program(target.format, encoding)
        .ok_or(DrawError::MissingProgram { encoding, format: target.format })?;

    let geometry = ctx.geometry();
    let queue = ctx.queue();
    let quad = solver.solve(input.content, target.output, transform);
    geometry.write_vertices(queue, &quad);
    geometry.write_frame(queue, &FrameUniform::new(input.tex_matrix));

    let background = ctx.background().to_array().map(f64::from);

    if encoding.family() == LayoutFamily::Swizzle {
        geometry.write_params(
            queue,
            ParamSlot::Compose,
            &PackUniform::for_encoding(encoding, input.content),
        );
        let clear = encoding.swizzle_color(background);
        let mut pass = begin_pass(encoder, target.view, clear, "framebridge swizzle pass");
        program.draw(&mut pass, input.bind_group, geometry.vertex_buffer());
        return Ok(());
    }

    let staging = target.staging.ok_or(DrawError::NoStaging(encoding))?;

    geometry.write_params(queue, ParamSlot::Compose, &PackUniform::compose(input.content));
    {
        let mut pass = begin_pass(encoder, &staging.view, background, "framebridge compose pass");
        pass.set_pipeline(ctx.compose_pipeline());
        pass.set_bind_group(0, input.bind_group, &[]);
        pass.set_vertex_buffer(0, geometry.vertex_buffer().slice(..));
        pass.draw(0..4, 0..1);
    }

    geometry.write_params(
        queue,
        ParamSlot::Pack,
        &PackUniform::for_encoding(encoding, staging.size),
    );
    let mut pass = begin_pass(encoder, target.view, [0.0; 4], "framebridge pack pass");
    program.draw(&mut pass, &staging.bind_group, geometry.vertex_buffer());
    Ok(())
}

fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    clear: [f64; 4],
    label: &str,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color {
                    r: clear[0],
                    g: clear[1],
                    b: clear[2],
                    a: clear[3],
                }),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}
