use std::sync::Arc;
use std::time::Duration;

use crate::coords::{ColorRgba, Size};
use crate::device::RenderingContext;
use crate::input::{InputSurface, StreamingTexture};
use crate::reader::{FrameListener, ListenerId, OffscreenReader, ReaderSpec};
use crate::render::{ColorSpace, PixelEncoding};
use crate::sink::{Drawable, DrawableId, Registry, SinkSpec, SinkTable};

use super::runtime::Worker;

/// Everything the render worker owns.
pub(crate) struct BridgeState {
    ctx: RenderingContext,
    input: StreamingTexture,
    surface: InputSurface,
    sinks: SinkTable,
    readers: Registry<ListenerId, OffscreenReader>,
    /// Input size as of the last size change seen by readers.
    last_observed: Size,
    readback_poll: Duration,
    frames: u64,
    released: bool,
}

impl BridgeState {
    pub(crate) fn new(ctx: RenderingContext, surface: InputSurface, readback_poll: Duration) -> Self {
        Self {
            ctx,
            input: StreamingTexture::new(),
            surface,
            sinks: SinkTable::new(),
            readers: Registry::new(),
            last_observed: Size::zero(),
            readback_poll,
            frames: 0,
            released: false,
        }
    }

    fn supports(&self, encoding: PixelEncoding) -> bool {
        self.ctx.encodings().contains(&encoding)
    }

    /// Latches the newest producer frame and draws every destination.
    pub(crate) fn on_frame_available(&mut self) {
        let Some(frame) = self.surface.take_frame() else {
            return;
        };
        if self.released {
            return;
        }

        self.input.latch(&self.ctx, &frame);
        let content = self.input.content_size();
        if content != self.last_observed {
            self.on_input_size_change(content);
        }
        self.frames += 1;

        self.sinks.draw_all(&mut self.ctx, &self.input);

        for reader in self.readers.values_mut() {
            if let Err(e) = reader.draw(&self.ctx, &self.input) {
                log::warn!("reader {:?} skipped: {e}", reader.id());
            }
        }
        self.drain_readers();
    }

    fn on_input_size_change(&mut self, size: Size) {
        log::info!("input size {} -> {size}", self.last_observed);
        self.last_observed = size;
        for reader in self.readers.values_mut() {
            reader.update_input_size(size);
        }
    }

    pub(crate) fn set_default_input_size(&mut self, size: Size) {
        self.input.set_default_size(size);
        if size != self.last_observed {
            self.on_input_size_change(size);
        }
    }

    pub(crate) fn put_sink(&mut self, drawable: Arc<dyn Drawable>, spec: SinkSpec) {
        if self.released {
            return;
        }
        if !self.supports(spec.encoding) {
            log::error!("sink encoding {} is not compiled; ignored", spec.encoding);
            return;
        }
        if let Err(e) = self.sinks.put(&self.ctx, drawable, spec) {
            log::error!("failed to add sink: {e:#}");
        }
    }

    pub(crate) fn remove_sink(&mut self, id: DrawableId) -> bool {
        self.sinks.remove(id)
    }

    pub(crate) fn sink_ids(&self) -> Vec<DrawableId> {
        self.sinks.ids()
    }

    pub(crate) fn add_reader(&mut self, listener: Arc<dyn FrameListener>, spec: ReaderSpec) {
        if self.released {
            return;
        }
        if !self.supports(spec.encoding) {
            log::error!("listener encoding {} is not compiled; ignored", spec.encoding);
            return;
        }

        let id = ListenerId::of(&listener);
        if let Some(existing) = self.readers.get_mut(&id) {
            if existing.spec() == &spec {
                return;
            }
        }
        if let Some(mut old) = self.readers.remove(&id) {
            old.close();
        }

        match OffscreenReader::new(listener, spec, self.last_observed) {
            Ok(reader) => {
                let _ = self.readers.insert(id, reader);
                log::info!("listener {id:?} added for {}", spec.encoding);
            }
            Err(e) => log::error!("failed to start delivery thread: {e}"),
        }
    }

    pub(crate) fn remove_reader(&mut self, id: ListenerId) -> bool {
        match self.readers.remove(&id) {
            Some(mut reader) => {
                reader.close();
                log::info!("listener {id:?} removed");
                true
            }
            None => false,
        }
    }

    pub(crate) fn reader_count(&self) -> usize {
        self.readers.len()
    }

    /// `(effective size, sized)` per reader, in registration order.
    pub(crate) fn reader_states(&self) -> Vec<(Size, bool)> {
        self.readers
            .values()
            .map(|r| (r.effective_size(), r.is_sized()))
            .collect()
    }

    pub(crate) fn set_background(&mut self, color: ColorRgba) {
        self.ctx.set_background(color);
    }

    pub(crate) fn set_color_space(&mut self, color_space: ColorSpace) {
        self.ctx.set_color_space(color_space);
    }

    pub(crate) fn frames(&self) -> u64 {
        self.frames
    }

    fn drain_readers(&mut self) {
        if !self.readers.values().any(OffscreenReader::has_pending) {
            return;
        }
        self.ctx.pump();
        for reader in self.readers.values_mut() {
            reader.drain();
        }
    }

    /// Tears down readers, then sinks, then the context.
    pub(crate) fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        for (_, mut reader) in self.readers.drain() {
            reader.close();
        }
        self.sinks.clear();
        self.input.release();
        self.ctx.release();
        log::info!("frame bridge released after {} frames", self.frames);
    }
}

impl Worker for BridgeState {
    fn park_timeout(&self) -> Option<Duration> {
        self.readers
            .values()
            .any(OffscreenReader::has_pending)
            .then_some(self.readback_poll)
    }

    fn on_wake(&mut self) {
        self.drain_readers();
    }

    fn on_shutdown(&mut self) {
        self.release();
    }
}
