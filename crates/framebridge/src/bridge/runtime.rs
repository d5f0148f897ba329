//! Single worker thread owning a state value.
//!
//! Every operation on the state is a task queued to the worker, either
//! fire-and-forget (`post`) or awaited (`await_run`). Tasks run under a panic
//! guard; a panicking task is logged and the worker keeps going.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::reader::panic_message;

/// Hooks the worker loop calls between tasks.
pub(crate) trait Worker: 'static {
    /// Maximum time to park waiting for a task; `None` parks indefinitely.
    fn park_timeout(&self) -> Option<Duration> {
        None
    }

    /// Runs after every task and after every park timeout.
    fn on_wake(&mut self) {}

    /// Runs once before the worker exits.
    fn on_shutdown(&mut self) {}
}

type Task<S> = Box<dyn FnOnce(&mut S) + Send>;

enum Message<S> {
    Run(Task<S>),
    Shutdown,
}

pub(crate) struct Runtime<S> {
    tx: Sender<Message<S>>,
    thread_id: ThreadId,
    finished: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    poll_interval: Duration,
}

impl<S: Worker> Runtime<S> {
    /// Spawns the worker and builds its state on it.
    ///
    /// Returns once `init` has finished; its error is returned here.
    pub(crate) fn spawn<F>(name: &str, poll_interval: Duration, init: F) -> Result<Self>
    where
        F: FnOnce() -> Result<S> + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::unbounded::<Message<S>>();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), String>>(1);
        let finished = Arc::new(AtomicBool::new(false));

        let worker_finished = Arc::clone(&finished);
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let state = match init() {
                    Ok(state) => {
                        let _ = ready_tx.send(Ok(()));
                        state
                    }
                    Err(e) => {
                        worker_finished.store(true, Ordering::Release);
                        let _ = ready_tx.send(Err(format!("{e:#}")));
                        return;
                    }
                };
                run(state, rx);
                worker_finished.store(true, Ordering::Release);
            })
            .with_context(|| format!("failed to spawn worker thread `{name}`"))?;

        let thread_id = handle.thread().id();
        let init_result = ready_rx
            .recv()
            .map_err(|_| anyhow!("worker `{name}` exited during initialization"))
            .and_then(|r| r.map_err(|e| anyhow!(e)));

        if let Err(e) = init_result {
            let _ = handle.join();
            return Err(e);
        }

        log::debug!("worker `{name}` started");
        Ok(Self {
            tx,
            thread_id,
            finished,
            handle: Mutex::new(Some(handle)),
            poll_interval,
        })
    }
}

impl<S: 'static> Runtime<S> {
    pub(crate) fn is_worker_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Queues `task`. Dropped silently once the worker has exited.
    pub(crate) fn post(&self, task: impl FnOnce(&mut S) + Send + 'static) {
        if self.is_finished() || self.tx.send(Message::Run(Box::new(task))).is_err() {
            log::debug!("worker gone; task dropped");
        }
    }

    /// Queues `f` and waits for its result.
    ///
    /// Returns `None` when the worker exits or `f` panics. Called from the
    /// worker itself, `f` is queued without waiting and `None` is returned.
    pub(crate) fn await_run<R: Send + 'static>(
        &self,
        f: impl FnOnce(&mut S) -> R + Send + 'static,
    ) -> Option<R> {
        if self.is_worker_thread() {
            self.post(move |s| {
                let _ = f(s);
            });
            return None;
        }

        let (tx, rx) = crossbeam_channel::bounded(1);
        self.post(move |s| {
            let _ = tx.send(f(s));
        });

        loop {
            match rx.recv_timeout(self.poll_interval) {
                Ok(r) => return Some(r),
                Err(RecvTimeoutError::Timeout) => {
                    if self.is_finished() {
                        return None;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Stops the worker after the queued tasks and joins it.
    ///
    /// Idempotent. From the worker thread the join is skipped.
    pub(crate) fn shutdown(&self) {
        let _ = self.tx.send(Message::Shutdown);
        if self.is_worker_thread() {
            return;
        }
        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                log::error!("worker thread panicked during shutdown");
            }
        }
    }
}

fn run<S: Worker>(mut state: S, rx: Receiver<Message<S>>) {
    loop {
        let message = match state.park_timeout() {
            Some(timeout) => match rx.recv_timeout(timeout) {
                Ok(m) => Some(m),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match rx.recv() {
                Ok(m) => Some(m),
                Err(_) => break,
            },
        };

        match message {
            Some(Message::Run(task)) => run_guarded(&mut state, task),
            Some(Message::Shutdown) => break,
            None => {}
        }
        state.on_wake();
    }

    state.on_shutdown();
    log::debug!("worker exiting");
}

fn run_guarded<S>(state: &mut S, task: Task<S>) {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| task(state)));
    if let Err(payload) = result {
        log::error!("worker task panicked: {}", panic_message(&*payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        log: Vec<u32>,
        wakes: u32,
        shutdown_flag: Option<Arc<AtomicBool>>,
    }

    impl Worker for Counter {
        fn on_wake(&mut self) {
            self.wakes += 1;
        }

        fn on_shutdown(&mut self) {
            if let Some(flag) = &self.shutdown_flag {
                flag.store(true, Ordering::SeqCst);
            }
        }
    }

    fn spawn_counter() -> Runtime<Counter> {
        Runtime::spawn("test-worker", Duration::from_millis(50), || Ok(Counter::default()))
            .expect("spawn")
    }

    #[test]
    fn tasks_run_in_fifo_order() {
        let rt = spawn_counter();
        for i in 0..10 {
            rt.post(move |s| s.log.push(i));
        }
        let log = rt.await_run(|s| s.log.clone()).unwrap();
        assert_eq!(log, (0..10).collect::<Vec<_>>());
        rt.shutdown();
    }

    #[test]
    fn panicking_task_does_not_kill_worker() {
        let rt = spawn_counter();
        assert_eq!(rt.await_run(|_| -> u32 { panic!("task failure") }), None);
        assert_eq!(rt.await_run(|s| s.wakes > 0), Some(true));
        rt.shutdown();
    }

    #[test]
    fn init_error_is_returned() {
        let r: Result<Runtime<Counter>> =
            Runtime::spawn("test-init", Duration::from_millis(50), || anyhow::bail!("no device"));
        let err = r.err().expect("init must fail");
        assert!(err.to_string().contains("no device"));
    }

    #[test]
    fn shutdown_is_idempotent_and_runs_hook() {
        let flag = Arc::new(AtomicBool::new(false));
        let f = Arc::clone(&flag);
        let rt = Runtime::spawn("test-shutdown", Duration::from_millis(50), move || {
            Ok(Counter { shutdown_flag: Some(f), ..Default::default() })
        })
        .unwrap();

        rt.shutdown();
        rt.shutdown();
        assert!(flag.load(Ordering::SeqCst));
        assert!(rt.is_finished());
        assert_eq!(rt.await_run(|s| s.wakes), None);
    }

    #[test]
    fn await_from_worker_is_downgraded() {
        let rt = Arc::new(spawn_counter());
        let inner = Arc::clone(&rt);
        // Runs on the worker; the nested await must not block.
        let nested = rt.await_run(move |_| inner.await_run(|s| s.log.push(7)));
        assert_eq!(nested, Some(None));
        let log = rt.await_run(|s| s.log.clone()).unwrap();
        assert_eq!(log, vec![7]);
        rt.shutdown();
    }
}
