use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::coords::{ColorRgba, Size};
use crate::device::RenderingContext;
use crate::input::InputSurface;
use crate::reader::{FrameListener, ListenerId, ReaderSpec};
use crate::render::ColorSpace;
use crate::sink::{Drawable, DrawableId, SinkSpec};

use super::runtime::Runtime;
use super::state::BridgeState;
use super::BridgeConfig;

/// Fans one streaming input out to on-screen sinks and frame listeners.
///
/// All GPU work happens on one worker thread. Setters are queued and return
/// immediately; removals and `release` block until the worker has applied
/// them (or has exited).
pub struct FrameBridge {
    runtime: Arc<Runtime<BridgeState>>,
    input: InputSurface,
    released: AtomicBool,
}

impl FrameBridge {
    /// Starts the worker and creates the GPU context on it.
    ///
    /// Returns `None` when no adapter or device is available; the cause is
    /// logged.
    pub fn create(config: BridgeConfig) -> Option<Self> {
        let init = config.context_init();
        let input = InputSurface::new();
        let worker_input = input.clone();
        let readback_poll = config.readback_poll_interval;

        let runtime = Runtime::spawn(&config.thread_name, config.await_poll_interval, move || {
            let ctx = pollster::block_on(RenderingContext::new(init))?;
            Ok(BridgeState::new(ctx, worker_input, readback_poll))
        });
        let runtime = match runtime {
            Ok(rt) => Arc::new(rt),
            Err(e) => {
                log::error!("frame bridge unavailable: {e:#}");
                return None;
            }
        };

        let weak = Arc::downgrade(&runtime);
        input.set_notify(move || {
            if let Some(rt) = weak.upgrade() {
                rt.post(BridgeState::on_frame_available);
            }
        });

        log::info!("frame bridge started on `{}`", config.thread_name);
        Some(Self {
            runtime,
            input,
            released: AtomicBool::new(false),
        })
    }

    /// The producer handle. Every call returns a handle to the same surface.
    pub fn create_input_surface(&self) -> InputSurface {
        self.input.clone()
    }

    /// Hints the input allocation size and updates listeners right away.
    pub fn set_default_input_size(&self, width: u32, height: u32) {
        let size = Size::new(width, height);
        self.runtime.post(move |s| s.set_default_input_size(size));
    }

    /// Adds or updates an on-screen sink. Queued.
    pub fn put_output_sink(&self, drawable: Arc<dyn Drawable>, spec: SinkSpec) {
        self.runtime.post(move |s| s.put_sink(drawable, spec));
    }

    /// Removes a sink and waits until the worker has let go of its surface.
    ///
    /// Returns `false` for unknown drawables or when the worker is gone.
    pub fn remove_output_sink(&self, drawable: &Arc<dyn Drawable>) -> bool {
        let id = DrawableId::of(drawable);
        self.runtime
            .await_run(move |s| s.remove_sink(id))
            .unwrap_or(false)
    }

    /// Registered sinks in draw order.
    pub fn output_sinks(&self) -> Vec<DrawableId> {
        self.runtime
            .await_run(|s| s.sink_ids())
            .unwrap_or_default()
    }

    /// Registers `listener` for frames converted per `spec`. Queued.
    ///
    /// Registering the same listener again with a different spec replaces it.
    pub fn add_frame_listener(
        &self,
        spec: ReaderSpec,
        listener: Arc<dyn FrameListener>,
    ) -> ListenerId {
        let id = ListenerId::of(&listener);
        self.runtime.post(move |s| s.add_reader(listener, spec));
        id
    }

    /// Unregisters `listener`. Once this returns its callback is not running
    /// and will not run again.
    ///
    /// A listener with dedicated delivery must not remove itself from inside
    /// `on_frame`, since the worker would wait on the callback waiting on it.
    pub fn remove_frame_listener(&self, listener: &Arc<dyn FrameListener>) -> bool {
        let id = ListenerId::of(listener);
        self.runtime
            .await_run(move |s| s.remove_reader(id))
            .unwrap_or(false)
    }

    pub fn frame_listener_count(&self) -> usize {
        self.runtime.await_run(|s| s.reader_count()).unwrap_or(0)
    }

    /// `(effective size, has GPU target)` of each listener, in order.
    pub fn frame_listener_states(&self) -> Vec<(Size, bool)> {
        self.runtime
            .await_run(|s| s.reader_states())
            .unwrap_or_default()
    }

    /// Frames latched so far.
    pub fn frames_rendered(&self) -> u64 {
        self.runtime.await_run(|s| s.frames()).unwrap_or(0)
    }

    pub fn set_background_color(&self, color: ColorRgba) {
        if !color.is_finite() {
            log::warn!("ignoring non-finite background {color:?}");
            return;
        }
        self.runtime.post(move |s| s.set_background(color));
    }

    pub fn set_color_space(&self, color_space: ColorSpace) {
        self.runtime.post(move |s| s.set_color_space(color_space));
    }

    /// Tears everything down and stops the worker. Idempotent.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        self.input.release();
        let _ = self.runtime.await_run(|s| s.release());
        self.runtime.shutdown();
        log::info!("frame bridge stopped");
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Drop for FrameBridge {
    fn drop(&mut self) {
        self.release();
    }
}
