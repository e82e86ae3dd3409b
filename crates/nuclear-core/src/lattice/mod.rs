//! Lattice assembly: wiring nodes and barriers into a tick-shaped DAG.
//!
//! A lattice is edited while stopped (add members, wire downstream targets),
//! then started all-or-nothing. Wiring is stored as arena indices
//! ([`NodeId`], [`BarrierId`], [`Downstream`]) and resolved into reference-counted
//! [`Trigger`](crate::Trigger)s at start, so teardown and rewiring can never
//! leave dangling links.
//!
//! # Shape of a tick
//!
//! ```text
//!                 ┌─▶ in-0 ─▶ out-0 ─┐
//! driver ─▶ trigger ─▶ in-1 ─▶ out-1 ─┼─▶ drain (barrier) ─▶ driver awaits
//!                 └─▶ in-2 ─▶ out-2 ─┘
//! ```
//!
//! - [`Lattice`]: the general arena: any acyclic wiring of nodes and barriers.
//! - [`ChannelLattice`]: the per-channel lane assembly above, with lane
//!   buffers, channel-count reconfiguration and an interleaved `transfer()`.
//!
//! # Example
//!
//! ```rust
//! use nuclear_core::{Barrier, Downstream, Idle, Lattice, Node};
//!
//! let mut lattice = Lattice::new();
//! let trigger = lattice.add_node(Node::new("trigger", Idle))?;
//! let a = lattice.add_node(Node::new("a", Idle))?;
//! let b = lattice.add_node(Node::new("b", Idle))?;
//! let join = lattice.add_barrier(Barrier::new("join", Idle))?;
//!
//! lattice.set_chain_reaction(trigger, Downstream::Fanout(vec![a, b]))?;
//! lattice.set_chain_reaction(a, Downstream::Barrier(join))?;
//! lattice.set_chain_reaction(b, Downstream::Barrier(join))?;
//! lattice.set_trigger(trigger)?;
//!
//! lattice.start()?;
//! lattice.tick_and_wait(join)?;
//! lattice.stop();
//! # Ok::<(), nuclear_core::Error>(())
//! ```

mod assembly;
mod channel;
mod downstream;
mod id;

pub use assembly::Lattice;
pub use channel::{ChannelLattice, ChannelLayout, LaneFn, MAX_CHANNELS, ThreadOptions};
pub use downstream::Downstream;
pub use id::{BarrierId, NodeId};
