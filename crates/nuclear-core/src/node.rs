//! Worker-thread processing node.
//!
//! A [`Node`] owns one OS thread, a [`Process`] hook, and an optional
//! downstream [`Trigger`]. Once [`run()`](Node::run) starts the worker, the
//! thread loops:
//!
//! ```text
//!         wake                      process() returns (Ok or Err)
//!  Idle ────────▶ Processing ──────────────────────────────▶ Signaling
//!   ▲                                                           │
//!   └────────────── fire downstream, no stop requested ─────────┘
//!                                                               │ stop requested
//!                                        Stopping ◀─────────────┘
//!                                           │  joined by stop()
//!                                           ▼
//!                                        Stopped
//! ```
//!
//! Stop is cooperative: [`stop()`](Node::stop) clears the running flag, wakes
//! the worker, and joins it. A worker blocked in `wait()` exits without
//! calling `process()` again; a worker mid-tick finishes the tick, signals
//! downstream, then exits.
//!
//! The processor moves into the worker only after the thread was created, and
//! comes back when the worker is joined, so a node survives both a failed
//! start and a stop/rewire/restart cycle.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use crate::error::{Error, Result};
use crate::process::Process;
use crate::spawn::{StdSpawner, ThreadSpawner, WorkerBody, WorkerExit};
use crate::trigger::Trigger;
use crate::wait_signal::WaitSignal;

/// Position of a node's worker in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeState {
    /// Blocked in `wait()`, or started and about to block.
    Idle = 0,
    /// Running `process()`.
    Processing = 1,
    /// Firing the downstream trigger.
    Signaling = 2,
    /// Worker observed a stop request and is leaving its loop.
    Stopping = 3,
    /// No worker thread: never started, or joined by `stop()`.
    Stopped = 4,
}

impl NodeState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Processing,
            2 => Self::Signaling,
            3 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

/// Counters accumulated by a node's worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    /// Process steps completed.
    pub ticks: u64,
    /// Process steps that returned an error.
    pub errors: u64,
}

/// State shared between a [`Node`], its worker, and every [`NodeHandle`].
struct NodeShared {
    name: String,
    signal: WaitSignal,
    running: AtomicBool,
    state: AtomicU8,
    ticks: AtomicU64,
    errors: AtomicU64,
}

impl NodeShared {
    fn set_state(&self, state: NodeState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn state(&self) -> NodeState {
        NodeState::from_u8(self.state.load(Ordering::Acquire))
    }
}

/// Cloneable, non-owning handle used to wake a node and inspect it.
///
/// Handles are what [`Trigger`]s hold and what a driver keeps to start a tick.
#[derive(Clone)]
pub struct NodeHandle(Arc<NodeShared>);

impl NodeHandle {
    /// Wakes the node. The wake stays pending if the worker is busy.
    pub fn wake(&self) {
        self.0.signal.wake_all();
    }

    /// Wakes the node with a single-waiter futex wake.
    pub fn wake_one(&self) {
        self.0.signal.wake_one();
    }

    /// Returns the node's diagnostic name.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Returns the worker's current state.
    pub fn state(&self) -> NodeState {
        self.0.state()
    }

    /// Returns `true` while a worker thread is live.
    pub fn is_running(&self) -> bool {
        self.0.running.load(Ordering::Acquire)
    }

    /// Returns `true` if a wake is waiting to be consumed by the worker.
    pub fn has_pending_wake(&self) -> bool {
        self.0.signal.is_pending()
    }

    /// Returns the worker's counters.
    pub fn stats(&self) -> NodeStats {
        NodeStats {
            ticks: self.0.ticks.load(Ordering::Relaxed),
            errors: self.0.errors.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

/// A thread-owning processing atom.
pub struct Node {
    shared: Arc<NodeShared>,
    processor: Option<Box<dyn Process>>,
    chain_reaction: Option<Trigger>,
    stack_size: Option<usize>,
    worker: Option<JoinHandle<WorkerExit>>,
}

impl Node {
    /// Creates a stopped node with a diagnostic name and a process hook.
    pub fn new(name: impl Into<String>, processor: impl Process + 'static) -> Self {
        Self {
            shared: Arc::new(NodeShared {
                name: name.into(),
                signal: WaitSignal::new(),
                running: AtomicBool::new(false),
                state: AtomicU8::new(NodeState::Stopped as u8),
                ticks: AtomicU64::new(0),
                errors: AtomicU64::new(0),
            }),
            processor: Some(Box::new(processor)),
            chain_reaction: None,
            stack_size: None,
            worker: None,
        }
    }

    /// Sets the worker thread's stack size in bytes.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Returns the node's diagnostic name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Returns a handle for waking and inspecting this node.
    pub fn handle(&self) -> NodeHandle {
        NodeHandle(Arc::clone(&self.shared))
    }

    /// Installs the downstream target signalled after each process step.
    ///
    /// Rejected with [`Error::Running`] while the worker is live.
    pub fn set_chain_reaction(&mut self, target: Trigger) -> Result<()> {
        self.ensure_stopped()?;
        self.chain_reaction = Some(target);
        Ok(())
    }

    /// Removes the downstream target.
    pub fn clear_chain_reaction(&mut self) -> Result<()> {
        self.ensure_stopped()?;
        self.chain_reaction = None;
        Ok(())
    }

    /// Returns the installed downstream target, if any.
    pub fn chain_reaction(&self) -> Option<&Trigger> {
        self.chain_reaction.as_ref()
    }

    /// Replaces the process hook. Rejected while the worker is live.
    pub fn set_processor(&mut self, processor: impl Process + 'static) -> Result<()> {
        self.ensure_stopped()?;
        self.processor = Some(Box::new(processor));
        Ok(())
    }

    /// Starts the worker thread on a [`StdSpawner`].
    pub fn run(&mut self) -> Result<()> {
        self.run_with(&StdSpawner)
    }

    /// Starts the worker thread through `spawner`.
    ///
    /// On failure the node is left stopped with its processor intact.
    pub fn run_with(&mut self, spawner: &dyn ThreadSpawner) -> Result<()> {
        if self.worker.is_some() {
            return Err(Error::AlreadyRunning(self.name().to_owned()));
        }
        let processor = self
            .processor
            .take()
            .ok_or_else(|| Error::MissingProcessor(self.name().to_owned()))?;

        // The processor is handed over only once the thread exists.
        let (hand_off, receive) = crossbeam_channel::bounded::<Box<dyn Process>>(1);
        let shared = Arc::clone(&self.shared);
        let chain_reaction = self.chain_reaction.clone();
        let body: WorkerBody = Box::new(move || {
            let Ok(mut processor) = receive.recv() else {
                return WorkerExit::empty();
            };
            work(&shared, &mut *processor, chain_reaction.as_ref());
            WorkerExit::new(processor)
        });

        self.shared.signal.clear();
        self.shared.running.store(true, Ordering::Release);
        self.shared.set_state(NodeState::Idle);

        let mut builder = thread::Builder::new().name(self.shared.name.clone());
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }

        match spawner.spawn(builder, body) {
            Ok(handle) => {
                if let Err(returned) = hand_off.send(processor) {
                    // Worker exited before receiving; keep the processor.
                    self.processor = Some(returned.into_inner());
                }
                self.worker = Some(handle);
                tracing::debug!(node = %self.name(), "node_run: worker started");
                Ok(())
            }
            Err(source) => {
                self.shared.running.store(false, Ordering::Release);
                self.shared.set_state(NodeState::Stopped);
                self.processor = Some(processor);
                Err(Error::Spawn {
                    node: self.name().to_owned(),
                    source,
                })
            }
        }
    }

    /// Requests termination, wakes the worker, and joins it.
    ///
    /// Returns only after the thread has exited. Calling `stop()` on a node
    /// that is not running does nothing.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.shared.running.store(false, Ordering::Release);
        self.shared.signal.wake_all();

        match worker.join() {
            Ok(exit) => {
                if let Some(processor) = exit.processor {
                    self.processor = Some(processor);
                }
            }
            Err(_) => {
                tracing::error!(node = %self.name(), "worker thread panicked; processor lost");
            }
        }
        self.shared.set_state(NodeState::Stopped);
        tracing::debug!(node = %self.name(), "node_stop: worker joined");
    }

    /// Wakes the node, releasing every thread blocked on its signal.
    pub fn wake(&self) {
        self.shared.signal.wake_all();
    }

    /// Wakes the node, releasing at most one blocked thread.
    ///
    /// Only the worker ever waits on a node's signal, so this differs from
    /// [`wake()`](Self::wake) only in the futex call issued.
    pub fn wake_one(&self) {
        self.shared.signal.wake_one();
    }

    /// Returns `true` while a worker thread is live.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Returns the worker's current state.
    pub fn state(&self) -> NodeState {
        self.shared.state()
    }

    /// Returns the worker's counters.
    pub fn stats(&self) -> NodeStats {
        self.handle().stats()
    }

    fn ensure_stopped(&self) -> Result<()> {
        if self.is_running() {
            return Err(Error::Running(self.name().to_owned()));
        }
        Ok(())
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("chain_reaction", &self.chain_reaction)
            .finish_non_exhaustive()
    }
}

/// Worker loop: wait → process → signal, until the running flag clears.
fn work(shared: &NodeShared, processor: &mut dyn Process, chain_reaction: Option<&Trigger>) {
    loop {
        shared.set_state(NodeState::Idle);
        shared.signal.wait();
        if !shared.running.load(Ordering::Acquire) {
            break;
        }

        shared.set_state(NodeState::Processing);
        if let Err(error) = processor.process() {
            shared.errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(node = %shared.name, %error, "process error, continuing");
        }
        shared.ticks.fetch_add(1, Ordering::Relaxed);

        shared.set_state(NodeState::Signaling);
        if let Some(target) = chain_reaction {
            target.fire();
        }
        if !shared.running.load(Ordering::Acquire) {
            break;
        }
    }
    shared.set_state(NodeState::Stopping);
}
