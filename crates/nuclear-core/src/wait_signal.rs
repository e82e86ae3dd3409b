//! Futex-backed wait/wake signal.
//!
//! [`WaitSignal`] is the blocking primitive every node and barrier is built
//! on. It holds no mutex: the state is two `AtomicU32`s and blocking goes
//! straight to the OS futex (`futex(2)` on Linux, `WaitOnAddress` on Windows,
//! `__ulock_wait` on macOS) through the `atomic-wait` crate.
//!
//! # Semantics
//!
//! Wakes are **sticky until consumed**:
//!
//! - A wake issued while no thread is waiting stays pending. The next
//!   [`wait()`](WaitSignal::wait) returns immediately and consumes it.
//! - Wakes issued before a `wait()` coalesce; one `wait()` consumes all of them.
//! - [`wake_all()`](WaitSignal::wake_all) releases every thread blocked at the
//!   moment of the wake. [`wake_one()`](WaitSignal::wake_one) releases at least
//!   one of them.
//!
//! Every wake bumps a generation counter; a waiter snapshots the last
//! consumed generation on entry and sleeps only while the counter still
//! equals that snapshot. The futex re-checks the counter atomically before
//! sleeping, so a wake racing a wait can never be missed.
//!
//! A wake is a release operation and a returning `wait()` is an acquire
//! operation: whatever the waking thread wrote before waking is visible to the
//! woken thread.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Blocking wait/wake object with sticky, coalescing wakes.
pub struct WaitSignal {
    /// Bumped by every wake; the futex word.
    generation: AtomicU32,
    /// Generation most recently consumed by a returning `wait()`.
    consumed: AtomicU32,
}

impl WaitSignal {
    /// Creates a signal with no pending wake.
    pub const fn new() -> Self {
        Self {
            generation: AtomicU32::new(0),
            consumed: AtomicU32::new(0),
        }
    }

    /// Blocks until a wake is pending, then consumes it.
    ///
    /// Returns immediately if a wake was issued since the last consumed one.
    pub fn wait(&self) {
        let seen = self.consumed.load(Ordering::Acquire);
        loop {
            let current = self.generation.load(Ordering::Acquire);
            if current != seen {
                self.consume(current);
                return;
            }
            atomic_wait::wait(&self.generation, current);
        }
    }

    /// Issues a wake and releases one blocked waiter.
    pub fn wake_one(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        atomic_wait::wake_one(&self.generation);
    }

    /// Issues a wake and releases every blocked waiter.
    pub fn wake_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        atomic_wait::wake_all(&self.generation);
    }

    /// Returns `true` if a wake has been issued and not yet consumed.
    pub fn is_pending(&self) -> bool {
        self.generation.load(Ordering::Acquire) != self.consumed.load(Ordering::Acquire)
    }

    /// Discards any pending wake.
    ///
    /// Only meaningful while no thread is blocked in `wait()`; nodes call it
    /// before starting a worker so a wake left over from a previous run does
    /// not trigger a spurious tick.
    pub fn clear(&self) {
        let current = self.generation.load(Ordering::Acquire);
        self.consumed.store(current, Ordering::Release);
    }

    /// Number of wakes issued so far (wrapping).
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    /// Advances `consumed` to `generation` unless another waiter already
    /// consumed a later one. Comparison is wrap-aware.
    fn consume(&self, generation: u32) {
        let _ = self
            .consumed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |consumed| {
                ((generation.wrapping_sub(consumed) as i32) > 0).then_some(generation)
            });
    }
}

impl Default for WaitSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WaitSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitSignal")
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .field("consumed", &self.consumed.load(Ordering::Relaxed))
            .finish()
    }
}
