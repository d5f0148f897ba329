use std::sync::Arc;

use crate::render::PixelEncoding;

/// Read-only view of one converted frame.
///
/// Valid for the duration of the callback only; copy out what must outlive it.
#[derive(Debug, Copy, Clone)]
pub struct FrameView<'a> {
    /// Tightly packed bytes in `encoding`'s layout.
    pub bytes: &'a [u8],
    /// Logical frame width in pixels.
    pub width: u32,
    /// Logical frame height in pixels.
    pub height: u32,
    pub encoding: PixelEncoding,
}

/// Receives converted frames.
pub trait FrameListener: Send + Sync {
    fn on_frame(&self, frame: FrameView<'_>);
}

impl<F> FrameListener for F
where
    F: Fn(FrameView<'_>) + Send + Sync,
{
    fn on_frame(&self, frame: FrameView<'_>) {
        self(frame)
    }
}

/// Identity key of a listener.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

impl ListenerId {
    pub fn of(listener: &Arc<dyn FrameListener>) -> Self {
        ListenerId(Arc::as_ptr(listener) as *const () as usize)
    }
}

/// Thread a listener is called on.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Delivery {
    /// On the bridge worker, right after readback. Blocks rendering while the
    /// listener runs.
    Inline,
    /// On a per-listener thread fed through a one-slot mailbox. Frames the
    /// listener is too slow for are overwritten.
    #[default]
    Dedicated,
}

/// Calls `listener`, logging a panic instead of unwinding into the caller.
pub(crate) fn call_guarded(listener: &dyn FrameListener, frame: FrameView<'_>) {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| listener.on_frame(frame)));
    if let Err(payload) = result {
        log::error!("frame listener panicked: {}", panic_message(&*payload));
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn closures_are_listeners() {
        let seen = Arc::new(AtomicU32::new(0));
        let s = Arc::clone(&seen);
        let listener: Arc<dyn FrameListener> = Arc::new(move |f: FrameView<'_>| {
            s.store(f.width * f.height, Ordering::SeqCst);
        });

        listener.on_frame(FrameView {
            bytes: &[],
            width: 3,
            height: 5,
            encoding: PixelEncoding::Nv12,
        });
        assert_eq!(seen.load(Ordering::SeqCst), 15);
    }

    #[test]
    fn identity_follows_the_arc() {
        let a: Arc<dyn FrameListener> = Arc::new(|_: FrameView<'_>| {});
        let b: Arc<dyn FrameListener> = Arc::new(|_: FrameView<'_>| {});
        assert_eq!(ListenerId::of(&a), ListenerId::of(&Arc::clone(&a)));
        assert_ne!(ListenerId::of(&a), ListenerId::of(&b));
    }

    #[test]
    fn guarded_call_swallows_panics() {
        fn boom(_: FrameView<'_>) {
            panic!("boom");
        }
        call_guarded(
            &boom,
            FrameView { bytes: &[], width: 1, height: 1, encoding: PixelEncoding::Rgba8888 },
        );
    }
}
