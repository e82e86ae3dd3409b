//! Nuclear Core - chain-reaction processing primitives
//!
//! This crate turns a fixed-size block of work into a wave of wakes across a
//! pre-built set of worker threads. Each thread sleeps on a futex, runs its
//! hook when woken, and wakes whatever sits downstream. A lock-free counter
//! joins parallel branches back together.
//!
//! # Core Abstractions
//!
//! ## Primitives
//!
//! - [`WaitSignal`] - Futex-backed wake word; wakes are sticky until consumed
//! - [`Node`] - One worker thread: wait → [`Process`] → signal downstream
//! - [`Barrier`] - Lock-free fan-in; the last arrival runs its hook and wakes
//!   every [`await_all()`](Barrier::await_all) caller
//! - [`Trigger`] - Resolved downstream target (node, fan-out, or barrier)
//!
//! ## Assembly
//!
//! - [`Lattice`] - Arena of nodes and barriers with DAG validation and
//!   all-or-nothing start
//! - [`ChannelLattice`] - Per-channel lanes with an interleaved
//!   [`transfer()`](ChannelLattice::transfer)
//! - [`SampleBuffer`] - Lock-free sample matrix shared between driver and lanes
//!
//! ## Seams
//!
//! - [`ThreadSpawner`] - Hook for realtime scheduling or failure injection at
//!   thread creation
//!
//! # Example
//!
//! ```rust
//! use nuclear_core::{ChannelLattice, ChannelLayout};
//!
//! let mut lattice = ChannelLattice::new(ChannelLayout::new(2, 2, 4))?;
//! lattice.start()?;
//!
//! let input = [0.1, -0.1, 0.2, -0.2, 0.3, -0.3, 0.4, -0.4];
//! let mut output = [0.0; 8];
//! lattice.transfer(&input, &mut output)?;
//! assert_eq!(input, output);
//!
//! lattice.stop();
//! # Ok::<(), nuclear_core::Error>(())
//! ```

pub mod barrier;
pub mod buffer;
pub mod error;
pub mod lattice;
pub mod node;
pub mod process;
pub mod spawn;
pub mod trigger;
pub mod wait_signal;

pub use barrier::Barrier;
pub use buffer::SampleBuffer;
pub use error::{Error, Result};
pub use lattice::{
    BarrierId, ChannelLattice, ChannelLayout, Downstream, LaneFn, Lattice, MAX_CHANNELS, NodeId,
    ThreadOptions,
};
pub use node::{Node, NodeHandle, NodeState, NodeStats};
pub use process::{BarrierProcess, Idle, Process, ProcessError, ProcessResult};
pub use spawn::{StdSpawner, ThreadSpawner, WorkerBody, WorkerExit};
pub use trigger::Trigger;
pub use wait_signal::WaitSignal;
