//! Actor wrapper: one owned target, one worker thread, one FIFO queue.
//!
//! Callers enqueue closures against the target; the worker drains them in
//! strict enqueue order and resolves a future for each value-returning
//! call. The queue is one ring lane in the same shape as a pipe lane, with
//! the producer side serialized by a lock so any number of caller threads
//! may enqueue. That single-writer discipline is what makes the target
//! safe to mutate without any locking of its own.
//!
//! A panic inside one invocation is contained: it fails that invocation's
//! future (or is logged for void casts) and the worker moves on.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::future::{Future, TaskError};
use crate::metrics::{ActorMetrics, MetricsSnapshot};
use crate::ring::{Gate, Ring};
use crate::thread::{self, Thread, ThreadError};

/// Invocation queue depth, matching one pipe lane.
pub const QUEUE_CAPACITY: usize = 256;

/// Queued unit of work. Reports a contained panic message back to the
/// run loop for accounting.
type Invocation<T> = Box<dyn FnOnce(&mut T) -> Result<(), String> + Send + 'static>;

struct Shared<T> {
    queue: Ring<Invocation<T>, QUEUE_CAPACITY>,
    gate: Gate,
    /// Serializes producers; the FIFO order is the order enqueues
    /// complete under this lock.
    enqueue: Mutex<()>,
    terminate: AtomicBool,
    metrics: ActorMetrics,
}

/// An object with its own thread and run loop.
///
/// All mutation of the target happens on the worker thread. Share the
/// handle between caller threads with an `Arc`; enqueueing takes `&self`.
pub struct Actor<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    worker: Option<Thread<T>>,
}

impl<T: Send + 'static> Actor<T> {
    /// Move `target` onto a dedicated worker thread and return its handle.
    pub fn spawn(target: T) -> Actor<T> {
        let shared = Arc::new(Shared {
            queue: Ring::new(),
            gate: Gate::new(),
            enqueue: Mutex::new(()),
            terminate: AtomicBool::new(false),
            metrics: ActorMetrics::new(),
        });

        let loop_shared = Arc::clone(&shared);
        let worker = thread::spawn(move || run_loop(loop_shared, target));

        Actor {
            shared,
            worker: Some(worker),
        }
    }

    /// Queue `f` and hand back a future for its result.
    ///
    /// Returns immediately; the worker resolves the future after `f`
    /// actually runs, in strict enqueue order. A panic inside `f` fails
    /// the future with [`TaskError::Panicked`] instead of killing the
    /// worker. If the actor has shut down the future settles
    /// [`TaskError::Abandoned`].
    ///
    /// Shared reads via [`Future::value`] require `R: Clone`; for a
    /// non-`Clone` result, move it out with [`Future::into_value`].
    pub fn call<R, F>(&self, f: F) -> Future<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut T) -> R + Send + 'static,
    {
        let (promise, future) = Future::pair();
        let invocation: Invocation<T> = Box::new(move |target: &mut T| {
            match panic::catch_unwind(AssertUnwindSafe(|| f(target))) {
                Ok(value) => {
                    promise.resolve(value);
                    Ok(())
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    promise.fail(TaskError::Panicked(message.clone()));
                    Err(message)
                }
            }
        });
        // A rejected invocation drops the promise, which settles the
        // future as Abandoned.
        let _ = self.enqueue(invocation);
        future
    }

    /// Queue `f` with no completion token.
    ///
    /// Returns immediately. A panic inside `f` is contained, counted, and
    /// reported on the log side channel. After shutdown the invocation is
    /// dropped.
    pub fn cast<F>(&self, f: F)
    where
        F: FnOnce(&mut T) + Send + 'static,
    {
        let invocation: Invocation<T> = Box::new(move |target: &mut T| {
            panic::catch_unwind(AssertUnwindSafe(|| f(target)))
                .map_err(|payload| panic_message(payload.as_ref()))
        });
        let _ = self.enqueue(invocation);
    }

    /// Current dispatch counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Invocations queued but not yet executed.
    pub fn backlog(&self) -> u32 {
        self.shared.queue.len()
    }

    /// Stop the worker and hand the target back.
    ///
    /// Everything already queued still executes before the worker exits.
    /// Calls racing with shutdown are dropped; their futures settle
    /// [`TaskError::Abandoned`].
    pub fn shutdown(mut self) -> Result<T, ThreadError> {
        self.begin_shutdown();
        match self.worker.take() {
            Some(worker) => worker.join(),
            None => Err(ThreadError::Killed),
        }
    }

    fn begin_shutdown(&self) {
        self.shared.terminate.store(true, Ordering::SeqCst);
        self.shared.gate.close();
    }

    /// Bounded-blocking enqueue under the producer lock.
    fn enqueue(&self, invocation: Invocation<T>) -> Result<(), Invocation<T>> {
        let _producer = self
            .shared
            .enqueue
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.shared.terminate.load(Ordering::SeqCst) {
            return Err(invocation);
        }

        let mut invocation = invocation;
        loop {
            match self.shared.queue.try_push(invocation) {
                Ok(()) => {
                    self.shared.metrics.record_enqueued();
                    self.shared.gate.wake();
                    return Ok(());
                }
                Err(back) => {
                    invocation = back;
                    if !self.shared.gate.park_until(|| !self.shared.queue.is_full()) {
                        return Err(invocation);
                    }
                }
            }
        }
    }
}

impl<T: Send + 'static> Drop for Actor<T> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.begin_shutdown();
            let _ = worker.join();
        }
    }
}

fn run_loop<T: Send + 'static>(shared: Arc<Shared<T>>, mut target: T) -> T {
    loop {
        match shared.queue.try_pop() {
            Some(invocation) => {
                shared.gate.wake();
                execute(&shared, invocation, &mut target);
            }
            None => {
                if shared.terminate.load(Ordering::SeqCst) {
                    break;
                }
                shared.gate.park_until(|| !shared.queue.is_empty());
            }
        }
    }

    // Producers that won the race against shutdown still get served.
    while let Some(invocation) = shared.queue.try_pop() {
        shared.gate.wake();
        execute(&shared, invocation, &mut target);
    }

    log::debug!(
        "actor worker exiting after {} invocations",
        shared.metrics.snapshot().executed
    );
    target
}

fn execute<T>(shared: &Shared<T>, invocation: Invocation<T>, target: &mut T) {
    if let Err(message) = invocation(target) {
        shared.metrics.record_contained_panic();
        log::error!("actor invocation panicked (worker continues): {message}");
    }
    shared.metrics.record_executed();
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("non-string panic payload")
    }
}
