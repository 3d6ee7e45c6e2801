//! Native thread wrapper with a one-shot exit-value slot.
//!
//! [`spawn`] detaches a thread, establishes a per-thread scratch scope for
//! the life of the entry call, and hands back a [`Thread`] handle. The
//! handle's [`Thread::join`] yields whatever the entry call returned, the
//! value passed to [`exit_with`], or a sentinel after [`Thread::kill`].
//! Double-join is unrepresentable: `join` consumes the handle.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self as os_thread, ThreadId};

/// How a thread ended without producing a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadError {
    /// Entry call panicked with an unrelated payload.
    Panicked,
    /// `kill` abandoned the thread before it produced a value.
    Killed,
}

/// One-shot exit slot. First fill wins; later fills are dropped.
struct ExitCell<V> {
    slot: Mutex<Option<Result<V, ThreadError>>>,
    cond: Condvar,
}

impl<V> ExitCell<V> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            cond: Condvar::new(),
        }
    }

    fn fill(&self, value: Result<V, ThreadError>) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(value);
        }
        drop(slot);
        self.cond.notify_all();
    }

    fn wait_take(&self) -> Result<V, ThreadError> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(value) = slot.take() {
                return value;
            }
            slot = self
                .cond
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Panic payload carrying an `exit_with` value out to the spawn wrapper.
struct ExitSignal<V>(V);

/// Handle to a thread created by [`spawn`].
pub struct Thread<V> {
    handle: Option<os_thread::JoinHandle<()>>,
    exit: Arc<ExitCell<V>>,
    id: ThreadId,
}

/// Detach a new thread running `entry`.
///
/// A per-thread scope (see [`with_scratch`]) is established before the
/// entry call and torn down after it, even when the call panics.
///
/// # Panics
///
/// Panics if the OS refuses to create a thread. Resource exhaustion at
/// this level is fatal to the calling operation.
pub fn spawn<V, F>(entry: F) -> Thread<V>
where
    V: Send + 'static,
    F: FnOnce() -> V + Send + 'static,
{
    let exit = Arc::new(ExitCell::new());
    let cell = Arc::clone(&exit);

    let handle = os_thread::Builder::new()
        .name("spindle".into())
        .spawn(move || {
            let _scope = ScopeGuard::enter();
            match panic::catch_unwind(AssertUnwindSafe(entry)) {
                Ok(value) => cell.fill(Ok(value)),
                Err(payload) => match payload.downcast::<ExitSignal<V>>() {
                    Ok(signal) => cell.fill(Ok(signal.0)),
                    Err(_) => cell.fill(Err(ThreadError::Panicked)),
                },
            }
        })
        .expect("native thread creation failed");

    Thread {
        id: handle.thread().id(),
        handle: Some(handle),
        exit,
    }
}

impl<V: Send + 'static> Thread<V> {
    /// True if the caller is the thread behind this handle.
    #[inline]
    pub fn is_current(&self) -> bool {
        os_thread::current().id() == self.id
    }

    /// Block until the thread terminates; yield its exit value.
    ///
    /// Returns the entry call's return value, the value handed to
    /// [`exit_with`], or a sentinel. Never panics; a killed thread
    /// reports `Err(ThreadError::Killed)`.
    pub fn join(mut self) -> Result<V, ThreadError> {
        let value = self.exit.wait_take();
        if !matches!(value, Err(ThreadError::Killed)) {
            // Reap the OS thread. The wrapper caught every unwind, so
            // this join cannot carry a panic payload.
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
        value
    }

    /// Abandon the thread. Last resort.
    ///
    /// The handle settles to `Killed` immediately; a subsequent [`join`]
    /// returns the sentinel without waiting for the OS thread, and no
    /// exit value the thread later produces is observable. The thread
    /// itself runs until its entry call returns — there is no way to
    /// force-terminate a native thread without risking the whole
    /// process — so any state it is still mutating must be treated as
    /// unspecified. Pair with a cooperative signal (pipe disconnect,
    /// actor shutdown) to make the thread actually stop.
    ///
    /// [`join`]: Thread::join
    pub fn kill(&self) {
        self.exit.fill(Err(ThreadError::Killed));
    }
}

impl<V> std::fmt::Debug for Thread<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thread").field("id", &self.id).finish()
    }
}

/// Terminate the calling thread immediately, handing `value` to a joiner.
///
/// Unwinds to the spawn wrapper without tripping the panic hook. No-op
/// when the caller was not created by [`spawn`]. The value type must match
/// the thread's declared exit type; a mismatch joins as `Err(Panicked)`.
pub fn exit_with<V: Send + 'static>(value: V) {
    if in_spawned_thread() {
        panic::resume_unwind(Box::new(ExitSignal(value)));
    }
}

thread_local! {
    static IN_SPAWNED: Cell<bool> = const { Cell::new(false) };
    static SCRATCH: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
}

/// True when the calling thread was created by [`spawn`].
#[inline]
pub fn in_spawned_thread() -> bool {
    IN_SPAWNED.with(Cell::get)
}

/// Per-thread scratch buffer, alive for the duration of the entry call.
/// Cleared when the thread's entry call finishes, even on panic.
/// Must not be called reentrantly from inside `f`.
pub fn with_scratch<R>(f: impl FnOnce(&mut Vec<u8>) -> R) -> R {
    SCRATCH.with(|buf| f(&mut buf.borrow_mut()))
}

/// Scope established around a spawned thread's entry call.
struct ScopeGuard;

impl ScopeGuard {
    fn enter() -> Self {
        IN_SPAWNED.with(|flag| flag.set(true));
        ScopeGuard
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SCRATCH.with(|buf| {
            let mut buf = buf.borrow_mut();
            buf.clear();
            buf.shrink_to_fit();
        });
        IN_SPAWNED.with(|flag| flag.set(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_returns_entry_value() {
        let t = spawn(|| 6 * 7);
        assert_eq!(t.join(), Ok(42));
    }

    #[test]
    fn test_exit_with_short_circuits() {
        let t = spawn(|| -> u32 {
            exit_with(7u32);
            unreachable!("exit_with terminates a spawned thread")
        });
        assert_eq!(t.join(), Ok(7));
    }

    #[test]
    fn test_exit_with_is_noop_outside_spawned_thread() {
        // Test harness threads are not spindle threads; must return.
        exit_with(0u32);
    }

    #[test]
    fn test_panic_joins_as_sentinel() {
        let t = spawn(|| -> u32 { panic!("entry failure") });
        assert_eq!(t.join(), Err(ThreadError::Panicked));
    }

    #[test]
    fn test_scratch_isolated_per_thread() {
        let t = spawn(|| {
            with_scratch(|buf| buf.extend_from_slice(b"abc"));
            with_scratch(|buf| buf.len())
        });
        assert_eq!(t.join(), Ok(3));
    }

    #[test]
    fn test_is_current_from_outside() {
        let t = spawn(|| std::thread::sleep(std::time::Duration::from_millis(10)));
        assert!(!t.is_current());
        assert!(t.join().is_ok());
    }

    #[test]
    fn test_kill_yields_sentinel() {
        let t = spawn(|| -> u8 {
            loop {
                os_thread::park();
            }
        });
        t.kill();
        assert_eq!(t.join(), Err(ThreadError::Killed));
    }
}
