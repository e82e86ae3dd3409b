//! Process hooks run by nodes and barriers.
//!
//! A [`Node`](crate::Node) owns a [`Process`] and calls it on its worker thread
//! once per wake. A [`Barrier`](crate::Barrier) holds a [`BarrierProcess`] and
//! calls it on whichever upstream thread completes the fan-in, so that hook
//! takes `&self` and must be `Sync`.
//!
//! Neither hook receives arguments from the primitive. Everything a hook reads
//! or writes is reached through handles captured when it was built, typically
//! shared [`SampleBuffer`](crate::SampleBuffer)s.
//!
//! Closures implement both traits:
//!
//! ```rust
//! use nuclear_core::{Node, ProcessResult};
//!
//! let mut ticks = 0u64;
//! let node = Node::new("counter", move || -> ProcessResult {
//!     ticks += 1;
//!     Ok(())
//! });
//! assert_eq!(node.name(), "counter");
//! ```

/// Failure reported by a process hook.
///
/// Returning an error is the equivalent of a negative status code: the
/// worker logs it and still signals downstream.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// Numeric status code from the embedded computation.
    #[error("process returned error code {0}")]
    Code(i32),

    /// Free-form failure description.
    #[error("{0}")]
    Failed(String),
}

/// Result returned by process hooks.
pub type ProcessResult = Result<(), ProcessError>;

/// Work performed by a node each time it is woken.
pub trait Process: Send {
    /// Runs one tick of work.
    fn process(&mut self) -> ProcessResult;
}

impl<F> Process for F
where
    F: FnMut() -> ProcessResult + Send,
{
    fn process(&mut self) -> ProcessResult {
        self()
    }
}

/// Work performed once per completed fan-in, by the elected upstream thread.
pub trait BarrierProcess: Send + Sync {
    /// Runs once when the last expected arrival lands.
    fn process(&self) -> ProcessResult;
}

impl<F> BarrierProcess for F
where
    F: Fn() -> ProcessResult + Send + Sync,
{
    fn process(&self) -> ProcessResult {
        self()
    }
}

/// A hook that does nothing.
///
/// Used by trigger nodes and by lanes whose data is placed into their buffer
/// by another thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

impl Process for Idle {
    fn process(&mut self) -> ProcessResult {
        Ok(())
    }
}

impl BarrierProcess for Idle {
    fn process(&self) -> ProcessResult {
        Ok(())
    }
}
