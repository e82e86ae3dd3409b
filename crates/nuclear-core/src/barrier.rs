//! Lock-free fan-in barrier.
//!
//! A [`Barrier`] joins several upstream nodes into one downstream event. It is
//! armed with the number of expected arrivals; each upstream completion calls
//! [`arrive()`](Barrier::arrive), which atomically decrements the counter. The
//! one thread whose decrement lands exactly on zero is *elected*: it runs the
//! barrier's [`BarrierProcess`], marks the tick complete, and wakes every
//! thread blocked in [`await_all()`](Barrier::await_all). When the barrier is
//! wired into a lattice, the elected thread then fires the barrier's own
//! downstream trigger (see [`Trigger`](crate::Trigger)).
//!
//! The counter is never guarded by a lock. Arrivals synchronise through the
//! acquire-release decrement alone, which also gives the elected thread a
//! happens-before edge from every upstream `process()`.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//! use nuclear_core::{Barrier, Idle};
//!
//! let barrier = Arc::new(Barrier::new("join", Idle));
//! barrier.arm(3).unwrap();
//!
//! let upstream: Vec<_> = (0..3)
//!     .map(|_| {
//!         let barrier = Arc::clone(&barrier);
//!         thread::spawn(move || {
//!             barrier.arrive();
//!         })
//!     })
//!     .collect();
//!
//! barrier.await_all();
//! assert_eq!(barrier.fires(), 1);
//! for handle in upstream {
//!     handle.join().unwrap();
//! }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::process::BarrierProcess;
use crate::wait_signal::WaitSignal;

// The arrival counter must be a native lock-free atomic; there is no locking
// fallback.
#[cfg(not(target_has_atomic = "32"))]
compile_error!("nuclear-core requires native lock-free 32-bit atomics for barrier counters");

/// Fan-in join point driven by a lock-free arrival counter.
pub struct Barrier {
    name: String,
    /// Arrivals still expected for the current tick. May go negative on
    /// overcount.
    remaining: AtomicI32,
    /// Set by the elected thread after `process()`; cleared by `arm()`.
    complete: AtomicBool,
    signal: WaitSignal,
    processor: Box<dyn BarrierProcess>,
    fires: AtomicU64,
    errors: AtomicU64,
}

impl Barrier {
    /// Creates a barrier with the given diagnostic name and completion hook.
    ///
    /// The barrier starts disarmed and complete: [`await_all()`](Self::await_all)
    /// returns immediately until [`arm()`](Self::arm) is called.
    pub fn new(name: impl Into<String>, processor: impl BarrierProcess + 'static) -> Self {
        Self {
            name: name.into(),
            remaining: AtomicI32::new(0),
            complete: AtomicBool::new(true),
            signal: WaitSignal::new(),
            processor: Box::new(processor),
            fires: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Returns the barrier's diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the number of arrivals required to complete the next tick.
    ///
    /// Must only be called while no `arrive()` can race it: before the
    /// feeding nodes are woken for this tick, or after the previous tick has
    /// fully drained. Arming with zero completes immediately.
    pub fn arm(&self, count: usize) -> Result<()> {
        let count = i32::try_from(count).map_err(|_| Error::ArrivalOverflow(count))?;
        self.complete.store(count == 0, Ordering::Release);
        self.remaining.store(count, Ordering::Release);
        Ok(())
    }

    /// Records one upstream completion.
    ///
    /// Returns `true` on the thread elected to complete the tick, after the
    /// completion hook has run and waiters have been woken. A failing hook is
    /// logged and does not prevent the wake.
    pub fn arrive(&self) -> bool {
        let previous = self.remaining.fetch_sub(1, Ordering::AcqRel);
        if previous != 1 {
            if previous <= 0 {
                tracing::warn!(
                    barrier = %self.name,
                    remaining = previous - 1,
                    "arrival on a drained barrier; arrival count exceeds wiring"
                );
            }
            return false;
        }

        if let Err(error) = self.processor.process() {
            self.errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(barrier = %self.name, %error, "barrier process error, continuing");
        }
        self.fires.fetch_add(1, Ordering::Relaxed);
        self.complete.store(true, Ordering::Release);
        self.signal.wake_all();
        true
    }

    /// Blocks until the current tick is complete.
    ///
    /// Returns immediately if the counter has already reached zero and the
    /// completion hook has finished. Otherwise waits for the elected thread's
    /// wake. No timeout.
    pub fn await_all(&self) {
        while !self.complete.load(Ordering::Acquire) {
            self.signal.wait();
        }
    }

    /// Arrivals still expected for the current tick.
    pub fn remaining(&self) -> i32 {
        self.remaining.load(Ordering::Acquire)
    }

    /// Returns `true` once the current tick's completion hook has run.
    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    /// Number of ticks this barrier has completed.
    pub fn fires(&self) -> u64 {
        self.fires.load(Ordering::Relaxed)
    }

    /// Number of completion-hook errors logged so far.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for Barrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Barrier")
            .field("name", &self.name)
            .field("remaining", &self.remaining())
            .field("complete", &self.is_complete())
            .field("fires", &self.fires())
            .finish_non_exhaustive()
    }
}
