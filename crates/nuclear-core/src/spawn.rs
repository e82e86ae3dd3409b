//! Worker-thread creation seam.
//!
//! Nodes never call `std::thread::spawn` directly; they hand a configured
//! [`thread::Builder`] and the worker body to a [`ThreadSpawner`]. The default
//! [`StdSpawner`] just spawns. Embedders can substitute their own spawner to
//! apply realtime scheduling, pin cores, or (in tests) inject failures.

use std::fmt;
use std::io;
use std::thread::{self, JoinHandle};

use crate::process::Process;

/// Value a worker thread returns when it exits: the processor it was running,
/// handed back so the node can be restarted.
pub struct WorkerExit {
    pub(crate) processor: Option<Box<dyn Process>>,
}

impl WorkerExit {
    pub(crate) fn new(processor: Box<dyn Process>) -> Self {
        Self {
            processor: Some(processor),
        }
    }

    pub(crate) fn empty() -> Self {
        Self { processor: None }
    }
}

impl fmt::Debug for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerExit")
            .field("has_processor", &self.processor.is_some())
            .finish()
    }
}

/// The closure a worker thread runs.
pub type WorkerBody = Box<dyn FnOnce() -> WorkerExit + Send + 'static>;

/// Creates the OS thread behind a node.
pub trait ThreadSpawner {
    /// Spawns `body` on a new thread configured by `builder`.
    ///
    /// An error leaves the node untouched and stopped.
    fn spawn(&self, builder: thread::Builder, body: WorkerBody) -> io::Result<JoinHandle<WorkerExit>>;
}

/// Spawns plain OS threads via [`thread::Builder::spawn`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StdSpawner;

impl ThreadSpawner for StdSpawner {
    fn spawn(&self, builder: thread::Builder, body: WorkerBody) -> io::Result<JoinHandle<WorkerExit>> {
        builder.spawn(body)
    }
}
