//! Lock-free SPSC ring lane with free-running u32 counters.
//! One shape for everything: both pipe lanes and the actor queue.
//!
//! The counters never reset. Empty is `producer == consumer`, full is
//! `producer - consumer == N` under wrapping arithmetic, so correctness
//! holds across the 2^32 boundary indefinitely.

use core::cell::UnsafeCell;
use core::sync::atomic::{fence, AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

/// Cache-line aligned wrapper to prevent false sharing.
#[repr(align(64))]
pub struct CachePadded<T>(pub T);

impl<T> CachePadded<T> {
    pub const fn new(val: T) -> Self {
        Self(val)
    }
}

impl<T> core::ops::Deref for CachePadded<T> {
    type Target = T;
    #[inline(always)]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> core::ops::DerefMut for CachePadded<T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

/// Fixed-capacity SPSC lane. Power-of-two capacity for fast modulo.
///
/// One thread pushes, one thread pops. Each slot is written exactly once
/// by the producer and taken exactly once by the consumer before reuse.
/// That discipline is the caller's contract; the lane does not check it.
pub struct Ring<T, const N: usize> {
    slots: [UnsafeCell<Option<T>>; N],
    producer: CachePadded<AtomicU32>,
    consumer: CachePadded<AtomicU32>,
}

unsafe impl<T: Send, const N: usize> Send for Ring<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for Ring<T, N> {}

impl<T, const N: usize> Ring<T, N> {
    const MASK: u32 = (N as u32) - 1;

    const _ASSERT_POWER_OF_TWO: () = {
        assert!(N > 0 && (N & (N - 1)) == 0, "N must be a power of two");
        assert!(N <= (1 << 31), "N must leave headroom below 2^32");
    };

    pub fn new() -> Self {
        Self::with_counter_origin(0)
    }

    /// Lane whose counters start at `origin` instead of zero. Lets tests
    /// drive the lane across the u32 wraparound boundary.
    pub fn with_counter_origin(origin: u32) -> Self {
        let _ = Self::_ASSERT_POWER_OF_TWO;
        Self {
            slots: core::array::from_fn(|_| UnsafeCell::new(None)),
            producer: CachePadded::new(AtomicU32::new(origin)),
            consumer: CachePadded::new(AtomicU32::new(origin)),
        }
    }

    /// Try to push an item. Returns the item back if the lane is full.
    #[inline]
    pub fn try_push(&self, item: T) -> Result<(), T> {
        let producer = self.producer.load(Ordering::Relaxed);
        let consumer = self.consumer.load(Ordering::Acquire);

        // Full when producer - consumer == N under wrapping arithmetic.
        if producer.wrapping_sub(consumer) >= N as u32 {
            return Err(item);
        }

        unsafe {
            *self.slots[(producer & Self::MASK) as usize].get() = Some(item);
        }

        self.producer
            .store(producer.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Try to pop the next item. Returns None if the lane is empty.
    #[inline]
    pub fn try_pop(&self) -> Option<T> {
        let consumer = self.consumer.load(Ordering::Relaxed);
        let producer = self.producer.load(Ordering::Acquire);

        if consumer == producer {
            return None;
        }

        let item = unsafe { (*self.slots[(consumer & Self::MASK) as usize].get()).take() };
        debug_assert!(item.is_some(), "occupied slot must hold an item");

        self.consumer
            .store(consumer.wrapping_add(1), Ordering::Release);
        item
    }

    #[inline(always)]
    pub fn len(&self) -> u32 {
        let producer = self.producer.load(Ordering::Acquire);
        let consumer = self.consumer.load(Ordering::Acquire);
        producer.wrapping_sub(consumer)
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.len() >= N as u32
    }
}

impl<T, const N: usize> Default for Ring<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for Ring<T, N> {
    fn drop(&mut self) {
        while self.try_pop().is_some() {}
    }
}

/// Mutex + condvar pair used only when one side has to park.
///
/// `sleepers` is the hand-off flag between the lockless fast path and the
/// parked slow path: a parker advertises itself under the lock before
/// re-checking the lane, a waker publishes its counter bump, fences, and
/// takes the lock only when someone is actually parked. Either the parker
/// sees the bump or the waker sees the sleeper; a wakeup cannot be lost.
pub struct Gate {
    lock: Mutex<()>,
    cond: Condvar,
    sleepers: AtomicUsize,
    closed: AtomicBool,
}

impl Gate {
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            cond: Condvar::new(),
            sleepers: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    #[inline(always)]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wake anything parked. Costs one fence and one load when nobody is.
    #[inline]
    pub fn wake(&self) {
        fence(Ordering::SeqCst);
        if self.sleepers.load(Ordering::SeqCst) != 0 {
            let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.cond.notify_all();
        }
    }

    /// Close the gate and wake everyone. Parked calls return `false`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.cond.notify_all();
    }

    /// Park until `ready()` holds or the gate closes.
    /// Returns whether `ready()` held.
    pub fn park_until<F: Fn() -> bool>(&self, ready: F) -> bool {
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.sleepers.fetch_add(1, Ordering::SeqCst);
        fence(Ordering::SeqCst);
        let held = loop {
            if ready() {
                break true;
            }
            if self.closed.load(Ordering::SeqCst) {
                break false;
            }
            guard = self
                .cond
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        };
        self.sleepers.fetch_sub(1, Ordering::SeqCst);
        held
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}
