#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use framebridge::device::{ContextInit, RenderingContext};
use framebridge::logging::{init_logging, LoggingConfig};
use framebridge::render::pack_rgb565;
use framebridge::{
    BridgeConfig, ColorSpace, FrameBridge, FrameListener, FrameView, InputFrame, InputSurface,
    PixelEncoding, Size,
};

/// Starts a bridge, or returns `None` on machines without a usable adapter.
pub fn bridge_with(config: BridgeConfig) -> Option<FrameBridge> {
    init_logging(LoggingConfig::for_tests());
    let bridge = FrameBridge::create(config);
    if bridge.is_none() {
        eprintln!("no usable GPU adapter; skipping");
    }
    bridge
}

pub fn bridge() -> Option<FrameBridge> {
    bridge_with(BridgeConfig::default())
}

/// Bare rendering context without the bridge worker.
pub fn context() -> Option<RenderingContext> {
    init_logging(LoggingConfig::for_tests());
    match pollster::block_on(RenderingContext::new(ContextInit::default())) {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("no usable GPU adapter ({e:#}); skipping");
            None
        }
    }
}

/// Owned copy of one delivered frame.
#[derive(Debug, Clone)]
pub struct Captured {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub encoding: PixelEncoding,
}

struct Capture {
    tx: crossbeam_channel::Sender<Captured>,
}

impl FrameListener for Capture {
    fn on_frame(&self, frame: FrameView<'_>) {
        let _ = self.tx.send(Captured {
            bytes: frame.bytes.to_vec(),
            width: frame.width,
            height: frame.height,
            encoding: frame.encoding,
        });
    }
}

/// A listener forwarding copies of every frame to the returned channel.
pub fn capture() -> (Arc<dyn FrameListener>, Receiver<Captured>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (Arc::new(Capture { tx }), rx)
}

pub fn solid_frame(size: Size, rgba: [u8; 4]) -> InputFrame {
    InputFrame::new(size, rgba.repeat(size.area() as usize))
}

/// Submits frames from `make` until a delivered frame satisfies `accept`.
pub fn pump_until(
    surface: &InputSurface,
    make: impl Fn() -> InputFrame,
    rx: &Receiver<Captured>,
    accept: impl Fn(&Captured) -> bool,
) -> Option<Captured> {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        surface.submit_frame(make()).expect("submit");
        while let Ok(c) = rx.recv_timeout(Duration::from_millis(50)) {
            if accept(&c) {
                return Some(c);
            }
        }
    }
    None
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// CPU reference of a solid `rgba` frame at `size` converted to `encoding`.
pub fn expected_solid(
    encoding: PixelEncoding,
    size: Size,
    rgba: [u8; 4],
    color_space: ColorSpace,
) -> Vec<u8> {
    let n = size.area() as usize;
    let [r, g, b, a] = rgba;
    let norm = |c: u8| c as f32 / 255.0;
    let yuv = color_space.rgb_to_yuv([norm(r), norm(g), norm(b)]);
    let (y, u, v) = (to_u8(yuv[0]), to_u8(yuv[1]), to_u8(yuv[2]));

    use PixelEncoding::*;
    match encoding {
        Rgba8888 => [r, g, b, a].repeat(n),
        Rgbx8888 => [r, g, b, 255].repeat(n),
        Bgra8888 => [b, g, r, a].repeat(n),
        Bgrx8888 => [b, g, r, 255].repeat(n),
        Rgb888 => [r, g, b].repeat(n),
        Rgb565 => pack_rgb565(norm(r), norm(g), norm(b)).to_le_bytes().repeat(n),
        Yu12 => [vec![y; n], vec![u; n / 4], vec![v; n / 4]].concat(),
        Yv12 => [vec![y; n], vec![v; n / 4], vec![u; n / 4]].concat(),
        Nv12 => [vec![y; n], [u, v].repeat(n / 4)].concat(),
        Nv21 => [vec![y; n], [v, u].repeat(n / 4)].concat(),
        I444 => [vec![y; n], vec![u; n], vec![v; n]].concat(),
        Yuyv => [y, u, y, v].repeat(n / 2),
        Yvyu => [y, v, y, u].repeat(n / 2),
        Uyvy => [u, y, v, y].repeat(n / 2),
        Vyuy => [v, y, u, y].repeat(n / 2),
    }
}

/// Panics at the first byte differing from `expected` by more than `tolerance`.
pub fn assert_close(label: &str, actual: &[u8], expected: &[u8], tolerance: u8) {
    assert_eq!(actual.len(), expected.len(), "{label}: length");
    if let Some((i, (a, e))) = actual
        .iter()
        .zip(expected)
        .enumerate()
        .find(|(_, (a, e))| a.abs_diff(**e) > tolerance)
    {
        panic!("{label}: byte {i} is {a}, expected {e}");
    }
}
