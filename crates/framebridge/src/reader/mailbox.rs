use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;

use crate::render::PixelEncoding;

use super::listener::{call_guarded, FrameListener, FrameView};

struct OwnedFrame {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    encoding: PixelEncoding,
}

#[derive(Default)]
struct Slot {
    frame: Option<OwnedFrame>,
    /// Buffer handed back by the dispatcher for reuse.
    spare: Vec<u8>,
}

struct Inner {
    slot: Mutex<Slot>,
    closed: AtomicBool,
}

/// One-slot overwrite mailbox feeding a listener on its own thread.
///
/// `post` never blocks on the listener. Closing (or dropping) the mailbox
/// waits for a callback already in flight to return, unless it is called
/// from inside that callback.
pub(crate) struct Mailbox {
    inner: Arc<Inner>,
    wake: Sender<()>,
    dispatcher: ThreadId,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Mailbox {
    pub(crate) fn spawn(listener: Arc<dyn FrameListener>, name: String) -> std::io::Result<Self> {
        let inner = Arc::new(Inner {
            slot: Mutex::new(Slot::default()),
            closed: AtomicBool::new(false),
        });
        let (wake, wake_rx) = crossbeam_channel::bounded(1);

        let worker_inner = Arc::clone(&inner);
        let handle = std::thread::Builder::new()
            .name(name)
            .spawn(move || dispatch(worker_inner, wake_rx, listener))?;

        Ok(Self {
            inner,
            wake,
            dispatcher: handle.thread().id(),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Copies `frame` into the slot, replacing any frame not yet consumed.
    pub(crate) fn post(&self, frame: FrameView<'_>) {
        if self.inner.closed.load(Ordering::Acquire) {
            return;
        }

        {
            let mut slot = self.inner.slot.lock();
            let mut bytes = match slot.frame.take() {
                Some(stale) => stale.bytes,
                None => std::mem::take(&mut slot.spare),
            };
            bytes.clear();
            bytes.extend_from_slice(frame.bytes);
            slot.frame = Some(OwnedFrame {
                bytes,
                width: frame.width,
                height: frame.height,
                encoding: frame.encoding,
            });
        }

        match self.wake.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => {
                log::debug!("frame dispatcher gone; frame dropped");
            }
        }
    }

    /// Stops delivery. No callback runs once this returns.
    pub(crate) fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        let _ = self.wake.try_send(());
        if std::thread::current().id() == self.dispatcher {
            return;
        }
        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                log::error!("frame dispatcher panicked");
            }
        }
    }
}

impl Drop for Mailbox {
    fn drop(&mut self) {
        self.close();
    }
}

fn dispatch(inner: Arc<Inner>, wake: Receiver<()>, listener: Arc<dyn FrameListener>) {
    while wake.recv().is_ok() {
        if inner.closed.load(Ordering::Acquire) {
            break;
        }

        let Some(frame) = inner.slot.lock().frame.take() else {
            continue;
        };

        call_guarded(
            listener.as_ref(),
            FrameView {
                bytes: &frame.bytes,
                width: frame.width,
                height: frame.height,
                encoding: frame.encoding,
            },
        );

        inner.slot.lock().spare = frame.bytes;
    }
    log::debug!("frame dispatcher exiting");
}
