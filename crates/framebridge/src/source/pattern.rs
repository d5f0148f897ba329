use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{bail, Context, Result};

use crate::coords::Size;
use crate::input::{CropRect, InputFrame, InputSurface};
use crate::time::FrameClock;

use super::{TexSource, TexSourceCallback};

/// SMPTE-style bar colours, left to right.
pub const BAR_COLORS: [[u8; 4]; 8] = [
    [255, 255, 255, 255],
    [255, 255, 0, 255],
    [0, 255, 255, 255],
    [0, 255, 0, 255],
    [255, 0, 255, 255],
    [255, 0, 0, 255],
    [0, 0, 255, 255],
    [0, 0, 0, 255],
];

/// Fills `out` with eight vertical bars scrolled left by `phase` pixels.
pub fn render_bars(size: Size, phase: u32, out: &mut Vec<u8>) {
    let (w, h) = (size.width as usize, size.height as usize);
    out.clear();
    out.reserve(w * h * 4);
    if w == 0 {
        return;
    }

    let mut row = Vec::with_capacity(w * 4);
    for x in 0..w {
        let shifted = (x + phase as usize) % w;
        row.extend_from_slice(&BAR_COLORS[shifted * BAR_COLORS.len() / w]);
    }
    for _ in 0..h {
        out.extend_from_slice(&row);
    }
}

#[derive(Debug, Clone)]
pub struct PatternConfig {
    pub size: Size,
    pub fps: u32,
    /// Pixels the bars move per frame.
    pub speed: u32,
    pub crop: Option<CropRect>,
    /// Reported through `on_size_change`.
    pub rotation_degrees: i32,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            size: Size::new(1280, 720),
            fps: 30,
            speed: 4,
            crop: None,
            rotation_degrees: 0,
        }
    }
}

/// Synthetic producer drawing moving colour bars on its own thread.
pub struct PatternSource {
    config: PatternConfig,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PatternSource {
    pub fn new(config: PatternConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl TexSource for PatternSource {
    fn start(&mut self, surface: InputSurface, callback: Arc<dyn TexSourceCallback>) -> Result<()> {
        if self.handle.is_some() {
            bail!("pattern source already started");
        }
        let config = self.config.clone();
        if !config.size.is_positive() {
            bail!("pattern size {} is empty", config.size);
        }

        let content = config.crop.map_or(config.size, |c| c.size());
        callback.on_size_change(content.width, content.height, config.rotation_degrees);

        self.running.store(true, Ordering::Release);
        let running = Arc::clone(&self.running);
        let spawned = std::thread::Builder::new()
            .name("framebridge-pattern".to_string())
            .spawn(move || produce(config, surface, callback, running));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::Release);
                return Err(e).context("failed to spawn pattern thread");
            }
        };

        self.handle = Some(handle);
        log::info!("pattern source started");
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("pattern thread panicked");
            }
            log::info!("pattern source stopped");
        }
    }
}

impl Drop for PatternSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn produce(
    config: PatternConfig,
    surface: InputSurface,
    callback: Arc<dyn TexSourceCallback>,
    running: Arc<AtomicBool>,
) {
    let mut clock = FrameClock::new(config.fps);
    let mut phase = 0u32;

    while running.load(Ordering::Acquire) {
        let wait = clock.until_next(std::time::Instant::now());
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        let ft = clock.tick();

        let mut data = Vec::new();
        render_bars(config.size, phase, &mut data);
        phase = phase.wrapping_add(config.speed) % config.size.width.max(1);

        let mut frame = InputFrame::new(config.size, data);
        if let Some(crop) = config.crop {
            frame = frame.with_crop(crop);
        }

        if let Err(e) = surface.submit_frame(frame) {
            callback.on_error(&e);
            break;
        }
        if ft.frame_index % 300 == 0 {
            log::debug!("pattern frame {} ({:.1}s)", ft.frame_index, ft.elapsed);
        }
    }
    running.store(false, Ordering::Release);
}
