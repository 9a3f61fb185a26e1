use std::any::Any;
use std::collections::VecDeque;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Condvar, Mutex};
use crate::core::error::{Error, ErrorKind, Result};

/// Failures kept until [`WorkQueue::take_failures`] drains them; later ones
/// are logged and dropped.
pub const FAILURE_CAPACITY: usize = 1024;

/// Unit of work run by a pool worker.
pub type Task = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

struct QueueState {
    tasks: VecDeque<Task>,
    shutdown: bool,
}

struct Shared {
    queue: Mutex<QueueState>,
    available: Condvar,

    /// Tasks submitted but not yet finished (queued or running)
    pending: Mutex<usize>,
    idle: Condvar,

    failures_tx: Sender<Error>,
    failures_rx: Receiver<Error>,
}

impl Shared {
    fn stop(&self) {
        self.queue.lock().shutdown = true;
        self.available.notify_all();
    }

    fn record_failure(&self, error: Error) {
        match self.failures_tx.try_send(error) {
            Ok(()) => {}
            Err(TrySendError::Full(error)) => {
                tracing::debug!("Failure buffer full, dropping: {}", error);
            }
            // The receiver lives in `shared`
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    fn task_done(&self) {
        let mut pending = self.pending.lock();
        *pending -= 1;
        if *pending == 0 {
            self.idle.notify_all();
        }
    }
}

/// Fixed-size worker pool over a FIFO task queue
///
/// `finish` waits for every submitted task, including tasks submitted by
/// running tasks: the pending count is raised before a task is queued and
/// lowered only after its body returns. A task that errors or panics is
/// logged and recorded (see [`WorkQueue::take_failures`]); the worker keeps
/// running. At most [`FAILURE_CAPACITY`] failures are buffered, so the owner
/// of a long-lived queue should drain them periodically.
pub struct WorkQueue {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

impl WorkQueue {
    /// Start a pool of `threads` workers (at least one).
    pub fn new(threads: usize) -> Result<Self> {
        let size = threads.max(1);
        let (failures_tx, failures_rx) = bounded(FAILURE_CAPACITY);

        let shared = Arc::new(Shared {
            queue: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                shutdown: false,
            }),
            available: Condvar::new(),
            pending: Mutex::new(0),
            idle: Condvar::new(),
            failures_tx,
            failures_rx,
        });

        let workers = Self::start_workers(&shared, size, |id, shared| {
            thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || Self::worker_loop(id, shared))
        })?;

        tracing::debug!("Work queue started with {} workers", size);

        Ok(WorkQueue {
            shared,
            workers: Mutex::new(workers),
            size,
        })
    }

    /// Spawn `size` workers. If one cannot be spawned, the ones already
    /// running are stopped and joined before the error is returned.
    fn start_workers<F>(shared: &Arc<Shared>, size: usize, mut spawn: F) -> Result<Vec<JoinHandle<()>>>
    where
        F: FnMut(usize, Arc<Shared>) -> io::Result<JoinHandle<()>>,
    {
        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            match spawn(id, shared.clone()) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    shared.stop();
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(Error::new(
                        ErrorKind::Internal,
                        format!("Failed to spawn worker {}: {}", id, e),
                    ));
                }
            }
        }
        Ok(workers)
    }

    /// Queue `task` for asynchronous execution.
    ///
    /// Tasks submitted after [`WorkQueue::shutdown`] are dropped without running.
    pub fn execute<F>(&self, task: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let mut queue = self.shared.queue.lock();
        if queue.shutdown {
            tracing::warn!("Work queue is shut down, dropping task");
            return;
        }

        *self.shared.pending.lock() += 1;
        queue.tasks.push_back(Box::new(task));
        drop(queue);

        self.shared.available.notify_one();
    }

    /// Block until no submitted task is queued or running.
    ///
    /// Must not be called from inside a task of this queue: the calling task
    /// itself counts as pending.
    pub fn finish(&self) {
        let mut pending = self.shared.pending.lock();
        while *pending > 0 {
            self.shared.idle.wait(&mut pending);
        }
    }

    /// Ask workers to exit once the queue is drained.
    pub fn shutdown(&self) {
        self.shared.stop();
    }

    /// Wait for all workers to exit. Call after [`WorkQueue::shutdown`].
    pub fn join(&self) {
        let me = thread::current().id();
        let workers: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();

        for handle in workers {
            // A worker dropping the last handle to the pool cannot join itself
            if handle.thread().id() == me {
                continue;
            }
            if handle.join().is_err() {
                tracing::error!("Worker thread exited abnormally");
            }
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Tasks submitted but not yet completed.
    pub fn pending(&self) -> usize {
        *self.shared.pending.lock()
    }

    /// Drain the failures recorded since the last call.
    pub fn take_failures(&self) -> Vec<Error> {
        self.shared.failures_rx.try_iter().collect()
    }

    fn worker_loop(id: usize, shared: Arc<Shared>) {
        loop {
            let task = {
                let mut queue = shared.queue.lock();
                loop {
                    if let Some(task) = queue.tasks.pop_front() {
                        break Some(task);
                    }
                    if queue.shutdown {
                        break None;
                    }
                    shared.available.wait(&mut queue);
                }
            };

            let Some(task) = task else {
                break;
            };

            let failure = match panic::catch_unwind(AssertUnwindSafe(task)) {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e),
                Err(payload) => Some(Error::new(
                    ErrorKind::TaskFailed,
                    format!("task panicked: {}", panic_message(payload.as_ref())),
                )),
            };

            if let Some(error) = failure {
                tracing::warn!("Worker {} task failed: {}", id, error);
                shared.record_failure(error);
            }

            shared.task_done();
        }

        tracing::trace!("Worker {} exiting", id);
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        self.shutdown();
        self.join();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
