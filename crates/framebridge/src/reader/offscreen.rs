use std::sync::Arc;

use crate::coords::Size;
use crate::device::{RenderingContext, OFFSCREEN_FORMAT};
use crate::input::StreamingTexture;
use crate::render::pass::{self, ConversionTarget, DrawError, StagingTexture};
use crate::render::{PixelEncoding, VertexSolver};
use crate::transform::Transform;

use super::listener::{call_guarded, Delivery, FrameListener, FrameView, ListenerId};
use super::mailbox::Mailbox;
use super::readback::{MapPoll, Readback};

/// Requested output of one frame listener.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ReaderSpec {
    pub encoding: PixelEncoding,
    /// Per-component override of the input content size.
    pub size: Option<Size>,
    pub transform: Option<Transform>,
    pub delivery: Delivery,
}

impl ReaderSpec {
    pub fn new(encoding: PixelEncoding) -> Self {
        Self {
            encoding,
            size: None,
            transform: None,
            delivery: Delivery::default(),
        }
    }
}

struct SizedTarget {
    output: Size,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    staging: Option<StagingTexture>,
    readback: Readback,
}

enum ReaderState {
    Absent,
    Sized(SizedTarget),
}

enum Outlet {
    Inline(Arc<dyn FrameListener>),
    Dedicated(Mailbox),
}

/// Converts each frame for one listener and reads it back to the CPU.
///
/// `Absent` until the effective size is known and positive; any size change
/// drops the target and starts over.
pub(crate) struct OffscreenReader {
    id: ListenerId,
    spec: ReaderSpec,
    outlet: Outlet,
    solver: VertexSolver,
    state: ReaderState,
    /// Grows to the largest frame seen.
    bytes: Vec<u8>,
    input_size: Size,
}

impl OffscreenReader {
    pub(crate) fn new(
        listener: Arc<dyn FrameListener>,
        spec: ReaderSpec,
        input_size: Size,
    ) -> std::io::Result<Self> {
        let id = ListenerId::of(&listener);
        let outlet = match spec.delivery {
            Delivery::Inline => Outlet::Inline(listener),
            Delivery::Dedicated => {
                let name = format!("framebridge-{}", spec.encoding.name().to_lowercase());
                Outlet::Dedicated(Mailbox::spawn(listener, name)?)
            }
        };
        Ok(Self {
            id,
            spec,
            outlet,
            solver: VertexSolver::new(),
            state: ReaderState::Absent,
            bytes: Vec::new(),
            input_size,
        })
    }

    pub(crate) fn id(&self) -> ListenerId {
        self.id
    }

    pub(crate) fn spec(&self) -> &ReaderSpec {
        &self.spec
    }

    /// Output size given the latest known input size.
    pub(crate) fn effective_size(&self) -> Size {
        Size::resolve(self.spec.size, self.input_size)
    }

    pub(crate) fn is_sized(&self) -> bool {
        matches!(self.state, ReaderState::Sized(_))
    }

    pub(crate) fn has_pending(&self) -> bool {
        match &self.state {
            ReaderState::Sized(t) => t.readback.is_pending(),
            ReaderState::Absent => false,
        }
    }

    /// Records a new input size; drops the target if the output changes.
    pub(crate) fn update_input_size(&mut self, input_size: Size) {
        self.input_size = input_size;
        let effective = self.effective_size();
        if let ReaderState::Sized(t) = &self.state {
            if t.output != effective {
                log::debug!("reader {:?}: output {} -> {effective}", self.id, t.output);
                self.state = ReaderState::Absent;
            }
        }
    }

    /// Converts the latched input and starts its readback.
    ///
    /// A frame arriving while the previous readback is still in flight is
    /// skipped for this reader.
    pub(crate) fn draw(
        &mut self,
        ctx: &RenderingContext,
        input: &StreamingTexture,
    ) -> Result<(), DrawError> {
        let output = self.effective_size();
        if !output.is_positive() {
            return Ok(());
        }
        let encoding = self.spec.encoding;
        let viewport = encoding.viewport_size(output);
        if !viewport.is_positive() {
            return Err(DrawError::EmptyOutput(viewport));
        }
        let binding = input.binding().ok_or(DrawError::NoInput)?;

        if !self.is_sized() {
            self.state = ReaderState::Sized(create_target(ctx, encoding, output, viewport));
            log::debug!("reader {:?}: sized {output} ({viewport} texels)", self.id);
        }
        let ReaderState::Sized(target) = &mut self.state else {
            return Ok(());
        };
        if target.readback.is_pending() {
            log::trace!("reader {:?}: readback in flight; frame skipped", self.id);
            return Ok(());
        }

        let mut encoder = ctx
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("framebridge reader encoder"),
            });

        pass::encode_conversion(
            ctx,
            &mut encoder,
            &binding,
            encoding,
            self.spec.transform.as_ref(),
            &mut self.solver,
            &ConversionTarget {
                view: &target.view,
                format: OFFSCREEN_FORMAT,
                output,
                staging: target.staging.as_ref(),
            },
        )?;
        target.readback.encode_copy(&mut encoder, &target.texture);

        ctx.queue().submit(std::iter::once(encoder.finish()));
        target.readback.request_map();
        Ok(())
    }

    /// Delivers a completed readback, if any. No-op when nothing is mapped.
    pub(crate) fn drain(&mut self) {
        let ReaderState::Sized(target) = &mut self.state else {
            return;
        };
        if !target.readback.is_pending() {
            return;
        }
        match target.readback.poll() {
            MapPoll::Pending | MapPoll::Failed => return,
            MapPoll::Ready => target.readback.take_into(&mut self.bytes),
        }

        let view = FrameView {
            bytes: &self.bytes,
            width: target.output.width,
            height: target.output.height,
            encoding: self.spec.encoding,
        };
        match &self.outlet {
            Outlet::Inline(listener) => call_guarded(listener.as_ref(), view),
            Outlet::Dedicated(mailbox) => mailbox.post(view),
        }
    }

    /// Releases the GPU target and stops delivery.
    pub(crate) fn close(&mut self) {
        self.state = ReaderState::Absent;
        if let Outlet::Dedicated(mailbox) = &self.outlet {
            mailbox.close();
        }
    }
}

fn create_target(
    ctx: &RenderingContext,
    encoding: PixelEncoding,
    output: Size,
    viewport: Size,
) -> SizedTarget {
    let texture = ctx.create_texture(
        "framebridge reader target",
        viewport,
        OFFSCREEN_FORMAT,
        wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let mut staging = None;
    StagingTexture::ensure(&mut staging, ctx, encoding, output);
    SizedTarget {
        output,
        texture,
        view,
        staging,
        readback: Readback::new(ctx.device(), viewport),
    }
}
