mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use framebridge::{
    ColorRgba, Delivery, Drawable, FrameListener, FrameView, PatternConfig, PatternSource, PixelEncoding,
    ReaderSpec, Size, SinkSpec, TexSource, TexSourceCallback,
};
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};

use common::{capture, pump_until, solid_frame};

/// A drawable whose native window is already gone.
struct DeadWindow;

impl HasWindowHandle for DeadWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl HasDisplayHandle for DeadWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl Drawable for DeadWindow {
    fn surface_size(&self) -> Size {
        Size::zero()
    }

    fn is_valid(&self) -> bool {
        false
    }
}

#[test]
fn release_is_idempotent() {
    let Some(bridge) = common::bridge() else {
        return;
    };
    let surface = bridge.create_input_surface();
    assert!(surface.same_surface(&bridge.create_input_surface()));

    bridge.release();
    bridge.release();
    assert!(bridge.is_released());
    assert!(surface.is_released());
    assert!(surface.submit_frame(solid_frame(Size::new(4, 4), [0; 4])).is_err());

    // Calls after teardown return defaults instead of hanging.
    assert_eq!(bridge.frame_listener_count(), 0);
    assert!(bridge.output_sinks().is_empty());
}

#[test]
fn dead_drawable_is_rejected_without_blocking() {
    let Some(bridge) = common::bridge() else {
        return;
    };
    let dead: Arc<dyn Drawable> = Arc::new(DeadWindow);
    bridge.put_output_sink(Arc::clone(&dead), SinkSpec::default());
    bridge.put_output_sink(Arc::clone(&dead), SinkSpec::default());

    let started = Instant::now();
    assert!(bridge.output_sinks().is_empty());
    assert!(!bridge.remove_output_sink(&dead));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn listener_registration_is_keyed_by_identity() {
    let Some(bridge) = common::bridge() else {
        return;
    };
    let (a, _ra) = capture();
    let (b, _rb) = capture();

    bridge.add_frame_listener(ReaderSpec::new(PixelEncoding::Rgba8888), a.clone());
    bridge.add_frame_listener(ReaderSpec::new(PixelEncoding::Nv21), a.clone());
    bridge.add_frame_listener(ReaderSpec::new(PixelEncoding::Yuyv), b.clone());
    assert_eq!(bridge.frame_listener_count(), 2);

    assert!(bridge.remove_frame_listener(&a));
    assert!(!bridge.remove_frame_listener(&a));
    assert_eq!(bridge.frame_listener_count(), 1);
}

#[test]
fn default_input_size_reaches_readers_before_the_first_frame() {
    let Some(bridge) = common::bridge() else {
        return;
    };
    let (listener, _rx) = capture();
    bridge.add_frame_listener(ReaderSpec::new(PixelEncoding::Yu12), listener);
    assert_eq!(bridge.frame_listener_states(), vec![(Size::zero(), false)]);

    bridge.set_default_input_size(320, 240);
    assert_eq!(
        bridge.frame_listener_states(),
        vec![(Size::new(320, 240), false)]
    );
}

#[test]
fn inline_listener_may_call_back_into_the_bridge() {
    let Some(bridge) = common::bridge() else {
        return;
    };
    let bridge = Arc::new(bridge);
    let seen = Arc::new(AtomicUsize::new(0));

    let listener: Arc<dyn FrameListener> = {
        let weak = Arc::downgrade(&bridge);
        let seen = Arc::clone(&seen);
        Arc::new(move |frame: FrameView<'_>| {
            assert_eq!(frame.encoding, PixelEncoding::Bgrx8888);
            seen.fetch_add(1, Ordering::SeqCst);
            if let Some(bridge) = weak.upgrade() {
                // Downgraded to a queued call on the worker thread.
                bridge.set_background_color(ColorRgba::white());
                let _ = bridge.frame_listener_count();
            }
        })
    };
    let spec = ReaderSpec {
        delivery: Delivery::Inline,
        ..ReaderSpec::new(PixelEncoding::Bgrx8888)
    };
    bridge.add_frame_listener(spec, listener);

    let surface = bridge.create_input_surface();
    let deadline = Instant::now() + Duration::from_secs(10);
    while seen.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
        surface
            .submit_frame(solid_frame(Size::new(16, 16), [10, 20, 30, 255]))
            .expect("submit");
        std::thread::sleep(Duration::from_millis(20));
    }
    assert!(seen.load(Ordering::SeqCst) > 0);
    assert!(bridge.frames_rendered() > 0);
    bridge.release();
}

#[derive(Default)]
struct Boom {
    calls: AtomicUsize,
}

impl FrameListener for Boom {
    fn on_frame(&self, _frame: FrameView<'_>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("listener failure");
    }
}

#[test]
fn panicking_listener_does_not_stop_delivery() {
    let Some(bridge) = common::bridge() else {
        return;
    };
    let boom = Arc::new(Boom::default());
    let boom_dyn: Arc<dyn FrameListener> = boom.clone();
    bridge.add_frame_listener(ReaderSpec::new(PixelEncoding::Rgb888), boom_dyn);

    let (listener, rx) = capture();
    bridge.add_frame_listener(ReaderSpec::new(PixelEncoding::Rgb888), listener);

    let surface = bridge.create_input_surface();
    let frame = || solid_frame(Size::new(16, 8), [1, 2, 3, 255]);
    assert!(pump_until(&surface, frame, &rx, |_| true).is_some());
    assert!(pump_until(&surface, frame, &rx, |_| true).is_some());
    assert!(boom.calls.load(Ordering::SeqCst) > 0);
}

/// Holds each frame for a while and records whether a call is in progress.
struct Lingering {
    entered: crossbeam_channel::Sender<()>,
    active: AtomicBool,
    calls: AtomicUsize,
}

impl FrameListener for Lingering {
    fn on_frame(&self, _frame: FrameView<'_>) {
        self.active.store(true, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.entered.send(());
        std::thread::sleep(Duration::from_millis(150));
        self.active.store(false, Ordering::SeqCst);
    }
}

fn removal_waits_for_callback(delivery: Delivery) {
    let Some(bridge) = common::bridge() else {
        return;
    };
    let (entered, entered_rx) = crossbeam_channel::unbounded();
    let lingering = Arc::new(Lingering {
        entered,
        active: AtomicBool::new(false),
        calls: AtomicUsize::new(0),
    });
    let listener: Arc<dyn FrameListener> = lingering.clone();
    let spec = ReaderSpec {
        delivery,
        ..ReaderSpec::new(PixelEncoding::Rgba8888)
    };
    bridge.add_frame_listener(spec, Arc::clone(&listener));

    let surface = bridge.create_input_surface();
    let frame = || solid_frame(Size::new(8, 8), [40, 80, 120, 255]);
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut entered_once = false;
    while !entered_once && Instant::now() < deadline {
        surface.submit_frame(frame()).expect("submit");
        entered_once = entered_rx.recv_timeout(Duration::from_millis(20)).is_ok();
    }
    assert!(entered_once, "listener never called");

    assert!(bridge.remove_frame_listener(&listener));
    assert!(!lingering.active.load(Ordering::SeqCst));

    let calls = lingering.calls.load(Ordering::SeqCst);
    for _ in 0..5 {
        surface.submit_frame(frame()).expect("submit");
        std::thread::sleep(Duration::from_millis(20));
    }
    let _ = bridge.frames_rendered();
    assert_eq!(lingering.calls.load(Ordering::SeqCst), calls);
    bridge.release();
}

#[test]
fn remove_waits_for_dedicated_callback() {
    removal_waits_for_callback(Delivery::Dedicated);
}

#[test]
fn remove_waits_for_inline_callback() {
    removal_waits_for_callback(Delivery::Inline);
}

#[derive(Default)]
struct SizeLog {
    sizes: parking_lot::Mutex<Vec<(u32, u32, i32)>>,
    errors: AtomicUsize,
}

impl TexSourceCallback for SizeLog {
    fn on_size_change(&self, width: u32, height: u32, rotation_degrees: i32) {
        self.sizes.lock().push((width, height, rotation_degrees));
    }

    fn on_error(&self, _cause: &anyhow::Error) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn pattern_source_drives_listeners() {
    let Some(bridge) = common::bridge() else {
        return;
    };
    let (listener, rx) = capture();
    bridge.add_frame_listener(ReaderSpec::new(PixelEncoding::Rgba8888), listener);

    let log = Arc::new(SizeLog::default());
    let mut source = PatternSource::new(PatternConfig {
        size: Size::new(64, 32),
        fps: 60,
        crop: Some(framebridge::CropRect::new(8, 0, 48, 32)),
        ..PatternConfig::default()
    });
    source
        .start(bridge.create_input_surface(), log.clone())
        .expect("start");

    let got = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("no frame from pattern source");
    assert_eq!((got.width, got.height), (48, 32));
    assert_eq!(log.sizes.lock().as_slice(), &[(48, 32, 0)]);

    // Releasing the bridge makes the next submit fail.
    bridge.release();
    let deadline = Instant::now() + Duration::from_secs(5);
    while log.errors.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(log.errors.load(Ordering::SeqCst), 1);
    source.stop();
}
