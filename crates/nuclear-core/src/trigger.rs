//! Resolved downstream targets.
//!
//! A [`Trigger`] is what a node signals after its `process()` returns: another
//! node, a fan-out set of nodes, or a barrier. Triggers hold reference-counted
//! handles, so a running worker can never observe a dangling target; the
//! [`Lattice`](crate::Lattice) stores wiring as arena indices and resolves it
//! into triggers only when it starts.

use std::fmt;
use std::sync::Arc;

use crate::barrier::Barrier;
use crate::node::NodeHandle;

/// Downstream target signalled after a process step.
#[derive(Clone)]
pub enum Trigger {
    /// Wake a single node.
    Node(NodeHandle),
    /// Wake every node in the set; siblings run in parallel with no ordering
    /// between them.
    Fanout(Arc<[NodeHandle]>),
    /// Arrive at a barrier. The thread elected by the barrier fires `then`.
    Barrier {
        /// Join point to arrive at.
        barrier: Arc<Barrier>,
        /// The barrier's own downstream, fired once per completed fan-in.
        then: Option<Box<Trigger>>,
    },
}

impl Trigger {
    /// Builds a fan-out trigger over the given nodes.
    pub fn fanout(nodes: impl IntoIterator<Item = NodeHandle>) -> Self {
        Self::Fanout(nodes.into_iter().collect())
    }

    /// Builds a barrier trigger with an optional downstream of its own.
    pub fn barrier(barrier: Arc<Barrier>, then: Option<Trigger>) -> Self {
        Self::Barrier {
            barrier,
            then: then.map(Box::new),
        }
    }

    /// Delivers the signal.
    pub fn fire(&self) {
        match self {
            Self::Node(node) => node.wake(),
            Self::Fanout(nodes) => {
                for node in nodes.iter() {
                    node.wake();
                }
            }
            Self::Barrier { barrier, then } => {
                if barrier.arrive()
                    && let Some(next) = then
                {
                    next.fire();
                }
            }
        }
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(node) => f.debug_tuple("Node").field(&node.name()).finish(),
            Self::Fanout(nodes) => f
                .debug_tuple("Fanout")
                .field(&nodes.iter().map(NodeHandle::name).collect::<Vec<_>>())
                .finish(),
            Self::Barrier { barrier, then } => f
                .debug_struct("Barrier")
                .field("barrier", &barrier.name())
                .field("then", then)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::process::Idle;

    #[test]
    fn node_trigger_leaves_a_pending_wake() {
        let node = Node::new("target", Idle);
        Trigger::Node(node.handle()).fire();
        assert!(node.handle().has_pending_wake());
    }

    #[test]
    fn fanout_wakes_every_member() {
        let nodes: Vec<Node> = (0..3).map(|i| Node::new(format!("lane-{i}"), Idle)).collect();
        let trigger = Trigger::fanout(nodes.iter().map(Node::handle));
        trigger.fire();
        assert!(nodes.iter().all(|n| n.handle().has_pending_wake()));
    }

    #[test]
    fn barrier_fires_then_only_when_elected() {
        let barrier = Arc::new(Barrier::new("join", Idle));
        let after = Node::new("after", Idle);
        let trigger = Trigger::barrier(Arc::clone(&barrier), Some(Trigger::Node(after.handle())));

        barrier.arm(2).unwrap();
        trigger.fire();
        assert!(!after.handle().has_pending_wake());
        trigger.fire();
        assert!(after.handle().has_pending_wake());
        assert_eq!(barrier.fires(), 1);
    }

    #[test]
    fn debug_names_targets() {
        let node = Node::new("out-0", Idle);
        let rendered = format!("{:?}", Trigger::Node(node.handle()));
        assert!(rendered.contains("out-0"), "got: {rendered}");
    }
}
