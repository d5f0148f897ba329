use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use parking_lot::Mutex;

use super::InputFrame;

type Notify = Box<dyn Fn() + Send + Sync>;

struct Shared {
    slot: Mutex<Option<InputFrame>>,
    /// Set while a latch request is queued on the worker.
    pending: AtomicBool,
    notify: Mutex<Option<Notify>>,
    released: AtomicBool,
}

/// Producer-side handle of the bridge's streaming texture.
///
/// Cheap to clone and safe to use from any thread. Frames are latest-wins:
/// a frame submitted before the previous one was latched replaces it, and at
/// most one latch request is queued at a time.
#[derive(Clone)]
pub struct InputSurface {
    shared: Arc<Shared>,
}

impl InputSurface {
    pub(crate) fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(None),
                pending: AtomicBool::new(false),
                notify: Mutex::new(None),
                released: AtomicBool::new(false),
            }),
        }
    }

    /// Installs the callback that schedules a latch on the worker.
    pub(crate) fn set_notify(&self, notify: impl Fn() + Send + Sync + 'static) {
        *self.shared.notify.lock() = Some(Box::new(notify));
    }

    /// Deposits a frame for the next latch.
    pub fn submit_frame(&self, frame: InputFrame) -> Result<()> {
        if self.is_released() {
            bail!("input surface released");
        }
        frame.validate()?;

        *self.shared.slot.lock() = Some(frame);

        if !self.shared.pending.swap(true, Ordering::AcqRel) {
            if let Some(notify) = self.shared.notify.lock().as_ref() {
                notify();
            }
        }
        Ok(())
    }

    /// Takes the newest frame and re-arms notification.
    pub(crate) fn take_frame(&self) -> Option<InputFrame> {
        self.shared.pending.store(false, Ordering::Release);
        self.shared.slot.lock().take()
    }

    pub fn is_released(&self) -> bool {
        self.shared.released.load(Ordering::Acquire)
    }

    pub(crate) fn release(&self) {
        self.shared.released.store(true, Ordering::Release);
        self.shared.notify.lock().take();
        self.shared.slot.lock().take();
    }

    /// Two handles are equal when they feed the same bridge.
    pub fn same_surface(&self, other: &InputSurface) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl std::fmt::Debug for InputSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputSurface")
            .field("pending", &self.shared.pending.load(Ordering::Relaxed))
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::coords::Size;

    fn frame(w: u32) -> InputFrame {
        InputFrame::new(Size::new(w, 1), vec![0; w as usize * 4])
    }

    #[test]
    fn notifications_coalesce_until_taken() {
        let surface = InputSurface::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        surface.set_notify(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        surface.submit_frame(frame(1)).unwrap();
        surface.submit_frame(frame(2)).unwrap();
        surface.submit_frame(frame(3)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Latest wins.
        let latched = surface.take_frame().unwrap();
        assert_eq!(latched.size.width, 3);
        assert!(surface.take_frame().is_none());

        surface.submit_frame(frame(4)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invalid_frames_are_rejected_without_notify() {
        let surface = InputSurface::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        surface.set_notify(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let bad = InputFrame::new(Size::new(4, 4), vec![0; 3]);
        assert!(surface.submit_frame(bad).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn released_surface_refuses_frames() {
        let surface = InputSurface::new();
        let clone = surface.clone();
        surface.release();
        assert!(clone.is_released());
        assert!(clone.submit_frame(frame(1)).is_err());
        assert!(clone.same_surface(&surface));
    }
}
