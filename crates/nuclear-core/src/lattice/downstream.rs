//! Unresolved downstream wiring.

use super::id::{BarrierId, NodeId};

/// Where a lattice member sends its signal, as arena indices.
///
/// The lattice resolves each `Downstream` into a [`Trigger`](crate::Trigger)
/// when it starts, so rewiring a stopped lattice never leaves a worker holding
/// a stale target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Downstream {
    /// Terminal member; signals nothing.
    #[default]
    None,
    /// Wake one node.
    Node(NodeId),
    /// Wake several nodes (the 1×N trigger edge).
    Fanout(Vec<NodeId>),
    /// Arrive at a barrier.
    Barrier(BarrierId),
}

impl Downstream {
    /// Returns `true` if this wiring arrives at `barrier`.
    pub fn arrives_at(&self, barrier: BarrierId) -> bool {
        matches!(self, Self::Barrier(id) if *id == barrier)
    }

    /// Node ids woken directly by this wiring.
    pub(crate) fn nodes(&self) -> &[NodeId] {
        match self {
            Self::Node(id) => std::slice::from_ref(id),
            Self::Fanout(ids) => ids,
            Self::None | Self::Barrier(_) => &[],
        }
    }
}
