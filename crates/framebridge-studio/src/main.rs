//! Interactive viewer: colour bars in a window plus an NV12 listener.
//!
//! Keys: `F` cycles the fit policy, `R` rotates by 90 degrees, `Esc` quits.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use framebridge::logging::{init_logging, LoggingConfig};
use framebridge::{
    BridgeConfig, Drawable, Fit, FrameBridge, FrameListener, FrameView, PatternConfig,
    PatternSource, PixelEncoding, ReaderSpec, Size, SinkSpec, TexSource, TexSourceCallback,
    Transform,
};

/// Logs the mean luma of every 60th NV12 frame.
#[derive(Default)]
struct LumaStats {
    frames: AtomicU64,
}

impl FrameListener for LumaStats {
    fn on_frame(&self, frame: FrameView<'_>) {
        let n = self.frames.fetch_add(1, Ordering::Relaxed) + 1;
        if n % 60 != 0 {
            return;
        }
        let luma_len = (frame.width as usize * frame.height as usize).min(frame.bytes.len());
        let luma = &frame.bytes[..luma_len];
        let sum: u64 = luma.iter().map(|&b| b as u64).sum();
        let mean = if luma.is_empty() { 0.0 } else { sum as f64 / luma.len() as f64 };
        log::info!(
            "{} frame #{n}: {}x{}, {} bytes, mean luma {mean:.1}",
            frame.encoding,
            frame.width,
            frame.height,
            frame.bytes.len()
        );
    }
}

struct SourceLog;

impl TexSourceCallback for SourceLog {
    fn on_size_change(&self, width: u32, height: u32, rotation_degrees: i32) {
        log::info!("source size {width}x{height}, rotation {rotation_degrees}");
    }

    fn on_error(&self, cause: &anyhow::Error) {
        log::error!("source failed: {cause:#}");
    }
}

struct Studio {
    bridge: FrameBridge,
    source: PatternSource,
    stats: Arc<dyn FrameListener>,
    window: Option<Arc<Window>>,
    transform: Transform,
}

impl Studio {
    fn new(bridge: FrameBridge) -> Self {
        Self {
            bridge,
            source: PatternSource::new(PatternConfig::default()),
            stats: Arc::new(LumaStats::default()),
            window: None,
            transform: Transform::fit(Fit::CropCenter),
        }
    }

    fn drawable(&self) -> Option<Arc<dyn Drawable>> {
        self.window.as_ref().map(|w| Arc::clone(w) as Arc<dyn Drawable>)
    }

    fn put_sink(&self) {
        let Some(drawable) = self.drawable() else {
            return;
        };
        let spec = SinkSpec {
            transform: Some(self.transform),
            ..SinkSpec::default()
        };
        self.bridge.put_output_sink(drawable, spec);
        if let Some(w) = &self.window {
            w.set_title(&format!(
                "framebridge studio · {:?} · {}°",
                self.transform.fit,
                self.transform.rotation.degrees()
            ));
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("framebridge studio")
            .with_inner_size(LogicalSize::new(720.0, 960.0));
        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;
        self.window = Some(Arc::new(window));
        self.put_sink();

        let spec = ReaderSpec {
            size: Some(Size::new(640, 360)),
            ..ReaderSpec::new(PixelEncoding::Nv12)
        };
        self.bridge.add_frame_listener(spec, Arc::clone(&self.stats));

        self.source
            .start(self.bridge.create_input_surface(), Arc::new(SourceLog))
            .context("failed to start pattern source")?;
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(drawable) = self.drawable() {
            self.bridge.remove_output_sink(&drawable);
        }
        self.source.stop();
        self.bridge.release();
        self.window = None;
        event_loop.exit();
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        match key {
            KeyCode::KeyF => {
                self.transform.fit = self.transform.fit.next();
                self.put_sink();
            }
            KeyCode::KeyR => {
                self.transform.rotation = self.transform.rotation.next();
                self.put_sink();
            }
            KeyCode::Escape => self.shutdown(event_loop),
            _ => {}
        }
    }
}

impl ApplicationHandler for Studio {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Err(e) = self.start(event_loop) {
            log::error!("{e:#}");
            self.shutdown(event_loop);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                log::debug!("window resized to {}", Size::from(size));
                self.put_sink();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.on_key(event_loop, code),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let bridge = FrameBridge::create(BridgeConfig::default())
        .context("no usable GPU adapter for the frame bridge")?;

    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut studio = Studio::new(bridge);
    event_loop
        .run_app(&mut studio)
        .context("winit event loop terminated with error")?;
    Ok(())
}
