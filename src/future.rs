//! Single-resolution future. The producer half resolves exactly once; any
//! number of readers block until it does, then read forever after.
//!
//! Resolution is enforced by move: [`Promise::resolve`] consumes the
//! promise, so resolving twice does not compile. Dropping an unresolved
//! promise settles the future as [`TaskError::Abandoned`] so readers never
//! hang on a producer that went away.

use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// Why a future settled without a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The producing invocation panicked. Panic message attached.
    Panicked(String),
    /// The producer went away without resolving.
    Abandoned,
    /// Another reader already moved the value out via `into_value`.
    Taken,
}

enum State<T> {
    Pending,
    Ready(T),
    Failed(TaskError),
}

struct Shared<T> {
    state: Mutex<State<T>>,
    cond: Condvar,
}

impl<T> Shared<T> {
    fn settle(&self, next: State<T>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, State::Pending) {
            *state = next;
        }
        drop(state);
        self.cond.notify_all();
    }
}

/// Reader handle. Cheap to clone; all clones observe the same resolution.
pub struct Future<T> {
    shared: Arc<Shared<T>>,
}

/// Producer handle. Not cloneable; consumed on resolution.
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
    settled: bool,
}

impl<T> Future<T> {
    /// Create a linked promise/future pair.
    pub fn pair() -> (Promise<T>, Future<T>) {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::Pending),
            cond: Condvar::new(),
        });
        (
            Promise {
                shared: Arc::clone(&shared),
                settled: false,
            },
            Future { shared },
        )
    }

    /// Block until the future settles, then return its value. Repeated
    /// calls never block again. Shared reads hand out clones; for a
    /// value that is not `Clone`, move it out with [`into_value`].
    ///
    /// [`into_value`]: Future::into_value
    pub fn value(&self) -> Result<T, TaskError>
    where
        T: Clone,
    {
        let mut state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            match &*state {
                State::Ready(v) => return Ok(v.clone()),
                State::Failed(e) => return Err(e.clone()),
                State::Pending => {
                    state = self
                        .shared
                        .cond
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Non-blocking probe. None while the producer is still working.
    pub fn try_value(&self) -> Option<Result<T, TaskError>>
    where
        T: Clone,
    {
        let state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match &*state {
            State::Pending => None,
            State::Ready(v) => Some(Ok(v.clone())),
            State::Failed(e) => Some(Err(e.clone())),
        }
    }

    /// Block until the future settles, then move the value out.
    ///
    /// Works for any `T`, `Clone` or not. Any other clone of this future
    /// that reads afterwards observes [`TaskError::Taken`]; use
    /// [`value`] when several readers need the result.
    ///
    /// [`value`]: Future::value
    pub fn into_value(self) -> Result<T, TaskError> {
        let mut state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            match std::mem::replace(&mut *state, State::Failed(TaskError::Taken)) {
                State::Ready(v) => return Ok(v),
                State::Failed(e) => {
                    *state = State::Failed(e.clone());
                    return Err(e);
                }
                State::Pending => {
                    *state = State::Pending;
                    state = self
                        .shared
                        .cond
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Block until the future settles, without touching the value.
    pub fn wait(&self) {
        let mut state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while matches!(*state, State::Pending) {
            state = self
                .shared
                .cond
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// True once settled. Non-blocking.
    #[inline]
    pub fn is_ready(&self) -> bool {
        !matches!(
            *self
                .shared
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
            State::Pending
        )
    }

    /// True while the producer has not settled the future yet.
    #[inline]
    pub fn is_pending(&self) -> bool {
        !self.is_ready()
    }
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Future {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Promise<T> {
    /// Store the value and wake every blocked reader.
    pub fn resolve(mut self, value: T) {
        self.settled = true;
        self.shared.settle(State::Ready(value));
    }

    /// Settle the future with an error marker instead of a value.
    pub fn fail(mut self, error: TaskError) {
        self.settled = true;
        self.shared.settle(State::Failed(error));
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        if !self.settled {
            self.shared.settle(State::Failed(TaskError::Abandoned));
        }
    }
}
