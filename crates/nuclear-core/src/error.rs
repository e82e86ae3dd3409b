//! Error types for node, barrier and lattice operations.

use std::io;

use crate::lattice::{BarrierId, NodeId};

/// Errors reported by the chain-reaction primitives and lattice assembly.
///
/// Process-hook failures are not part of this enum: they are
/// [`ProcessError`](crate::ProcessError)s, logged by the worker and never
/// propagated, so a failing stage cannot stall the lattice.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The OS refused to create a worker thread.
    #[error("failed to spawn worker thread for node '{node}': {source}")]
    Spawn {
        /// Name of the node whose thread could not be created.
        node: String,
        /// Underlying I/O error from the thread builder.
        #[source]
        source: io::Error,
    },

    /// `run()` was called on a node whose worker is already live.
    #[error("node '{0}' is already running")]
    AlreadyRunning(String),

    /// The operation needs a running lattice.
    #[error("lattice is not running")]
    NotRunning,

    /// Wiring or processor changes are rejected while workers are live.
    #[error("'{0}' cannot be reconfigured while running")]
    Running(String),

    /// The node has no processor to hand to its worker (lost to a worker panic).
    #[error("node '{0}' has no processor")]
    MissingProcessor(String),

    /// The specified node was not found in the lattice.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The specified barrier was not found in the lattice.
    #[error("barrier {0} not found")]
    BarrierNotFound(BarrierId),

    /// The wiring contains a cycle, so a tick would never drain.
    #[error("chain reaction wiring contains a cycle through '{0}'")]
    Cycle(String),

    /// A node is woken by more than one edge. Fan-in must go through a
    /// barrier, otherwise the node runs once or twice per tick depending on
    /// whether the wakes coalesce.
    #[error("node '{0}' is woken by more than one edge; join through a barrier")]
    SharedWake(String),

    /// A member wired into a barrier is never activated by the trigger, so
    /// the barrier would wait for an arrival that never comes.
    #[error("'{0}' arrives at a barrier but is unreachable from the trigger")]
    UnreachableArrival(String),

    /// No trigger node has been designated.
    #[error("lattice has no trigger node")]
    NoTrigger,

    /// An arrival count does not fit the barrier's lock-free counter.
    #[error("arrival count {0} exceeds the barrier counter range")]
    ArrivalOverflow(usize),

    /// The arena index does not fit a `u32` member id.
    #[error("lattice member index {0} exceeds the id range")]
    CapacityExceeded(usize),

    /// A driver buffer does not match the configured lattice layout.
    #[error("buffer shape mismatch: {0}")]
    BufferShape(String),
}

/// Convenience result alias for nuclear-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn spawn_error_exposes_io_source() {
        let err = Error::Spawn {
            node: "in-0".to_string(),
            source: io::Error::other("no threads left"),
        };
        assert!(err.source().is_some());
        let msg = err.to_string();
        assert!(msg.contains("in-0"), "got: {msg}");
        assert!(msg.contains("no threads left"), "got: {msg}");
    }

    #[test]
    fn lookup_errors_display_ids() {
        assert_eq!(
            Error::NodeNotFound(NodeId(3)).to_string(),
            "node NodeId(3) not found"
        );
        assert_eq!(
            Error::BarrierNotFound(BarrierId(1)).to_string(),
            "barrier BarrierId(1) not found"
        );
    }

    #[test]
    fn plain_variants_have_no_source() {
        assert!(Error::NoTrigger.source().is_none());
        assert!(Error::Running("drain".into()).source().is_none());
    }
}
