//! The general lattice arena.

use std::sync::Arc;

use crate::barrier::Barrier;
use crate::error::{Error, Result};
use crate::node::{Node, NodeHandle};
use crate::process::Process;
use crate::spawn::{StdSpawner, ThreadSpawner};
use crate::trigger::Trigger;

use super::downstream::Downstream;
use super::id::{BarrierId, NodeId};

struct NodeSlot {
    node: Node,
    downstream: Downstream,
}

struct BarrierSlot {
    barrier: Arc<Barrier>,
    downstream: Downstream,
}

/// Owner of a set of nodes and barriers and the wiring between them.
///
/// # Usage
///
/// 1. Add members with [`add_node()`](Self::add_node) and
///    [`add_barrier()`](Self::add_barrier)
/// 2. Wire them with [`set_chain_reaction()`](Self::set_chain_reaction) and
///    [`set_barrier_chain_reaction()`](Self::set_barrier_chain_reaction)
/// 3. Pick the entry node with [`set_trigger()`](Self::set_trigger)
/// 4. [`start()`](Self::start), then drive ticks with [`tick()`](Self::tick)
///    or [`tick_and_wait()`](Self::tick_and_wait)
///
/// Every mutation is rejected with [`Error::Running`] while the lattice is
/// started. Barrier arrival counts are never set by hand: each tick arms every
/// barrier with the number of members wired into it.
///
/// Ticks must not overlap. A driver waits for the previous tick to drain
/// (usually through `tick_and_wait`) before issuing the next one.
pub struct Lattice {
    nodes: Vec<NodeSlot>,
    barriers: Vec<BarrierSlot>,
    trigger: Option<NodeId>,
    running: bool,
}

impl Lattice {
    /// Creates an empty, stopped lattice.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            barriers: Vec::new(),
            trigger: None,
            running: false,
        }
    }

    // --- Assembly ---

    /// Adds a node and returns its id. The node must not be running.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId> {
        self.ensure_stopped()?;
        if node.is_running() {
            return Err(Error::AlreadyRunning(node.name().to_owned()));
        }
        let id = NodeId(next_index(self.nodes.len())?);
        tracing::debug!("lattice_add: node {id} '{}'", node.name());
        self.nodes.push(NodeSlot {
            node,
            downstream: Downstream::None,
        });
        Ok(id)
    }

    /// Adds a barrier and returns its id.
    pub fn add_barrier(&mut self, barrier: Barrier) -> Result<BarrierId> {
        self.ensure_stopped()?;
        let id = BarrierId(next_index(self.barriers.len())?);
        tracing::debug!("lattice_add: barrier {id} '{}'", barrier.name());
        self.barriers.push(BarrierSlot {
            barrier: Arc::new(barrier),
            downstream: Downstream::None,
        });
        Ok(id)
    }

    /// Sets what `from` signals after each process step, replacing any
    /// previous wiring.
    pub fn set_chain_reaction(&mut self, from: NodeId, to: Downstream) -> Result<()> {
        self.ensure_stopped()?;
        self.check_downstream(&to)?;
        let slot = self.nodes.get_mut(from.0 as usize).ok_or(Error::NodeNotFound(from))?;
        tracing::debug!("lattice_wire: {from} → {to:?}");
        slot.downstream = to;
        Ok(())
    }

    /// Sets what barrier `from` signals once its fan-in completes.
    pub fn set_barrier_chain_reaction(&mut self, from: BarrierId, to: Downstream) -> Result<()> {
        self.ensure_stopped()?;
        self.check_downstream(&to)?;
        let slot = self
            .barriers
            .get_mut(from.0 as usize)
            .ok_or(Error::BarrierNotFound(from))?;
        tracing::debug!("lattice_wire: {from} → {to:?}");
        slot.downstream = to;
        Ok(())
    }

    /// Designates the node woken by [`tick()`](Self::tick).
    pub fn set_trigger(&mut self, id: NodeId) -> Result<()> {
        self.ensure_stopped()?;
        self.slot(id)?;
        self.trigger = Some(id);
        Ok(())
    }

    /// Replaces a node's process hook.
    pub fn set_processor(&mut self, id: NodeId, processor: impl Process + 'static) -> Result<()> {
        self.ensure_stopped()?;
        self.nodes
            .get_mut(id.0 as usize)
            .ok_or(Error::NodeNotFound(id))?
            .node
            .set_processor(processor)
    }

    /// Removes every member and all wiring. Rejected while running.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_stopped()?;
        self.nodes.clear();
        self.barriers.clear();
        self.trigger = None;
        tracing::debug!("lattice_clear");
        Ok(())
    }

    // --- Inspection ---

    /// Returns the node with the given id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize).map(|slot| &slot.node)
    }

    /// Returns a wake/inspect handle for the given node.
    pub fn node_handle(&self, id: NodeId) -> Option<NodeHandle> {
        self.node(id).map(Node::handle)
    }

    /// Returns the barrier with the given id.
    pub fn barrier(&self, id: BarrierId) -> Option<&Arc<Barrier>> {
        self.barriers.get(id.0 as usize).map(|slot| &slot.barrier)
    }

    /// Returns the wiring of a node.
    pub fn downstream(&self, id: NodeId) -> Option<&Downstream> {
        self.nodes.get(id.0 as usize).map(|slot| &slot.downstream)
    }

    /// Returns the designated trigger node, if any.
    pub fn trigger(&self) -> Option<NodeId> {
        self.trigger
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of barriers.
    pub fn barrier_count(&self) -> usize {
        self.barriers.len()
    }

    /// Number of members wired to arrive at `barrier`: the count each tick arms
    /// it with.
    pub fn arrivals(&self, barrier: BarrierId) -> usize {
        let from_nodes = self
            .nodes
            .iter()
            .filter(|slot| slot.downstream.arrives_at(barrier))
            .count();
        let from_barriers = self
            .barriers
            .iter()
            .filter(|slot| slot.downstream.arrives_at(barrier))
            .count();
        from_nodes + from_barriers
    }

    /// Returns `true` between a successful [`start()`](Self::start) and
    /// [`stop()`](Self::stop).
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of nodes whose worker thread is live.
    pub fn live_threads(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.node.is_running()).count()
    }

    /// Checks that every tick drains exactly once.
    ///
    /// Ids are checked when wiring is set, so this looks for three things:
    ///
    /// - cycles, via Kahn's algorithm over nodes and barriers together; any
    ///   member left with unresolved in-degree lies on or behind a cycle
    /// - nodes woken by more than one edge, which would run once or twice per
    ///   tick and arrive downstream more often than the barrier was armed for
    /// - with a trigger set, members wired into a barrier that the trigger
    ///   never reaches, which would leave the barrier waiting forever
    pub fn validate(&self) -> Result<()> {
        self.check_acyclic()?;
        self.check_single_waker()?;
        if let Some(trigger) = self.trigger {
            self.check_arrivals_reachable(trigger)?;
        }
        Ok(())
    }

    // --- Lifecycle ---

    /// Starts every node on plain OS threads.
    pub fn start(&mut self) -> Result<()> {
        self.start_with(&StdSpawner)
    }

    /// Validates, resolves wiring into triggers, and starts every node
    /// through `spawner`.
    ///
    /// All-or-nothing: if any node fails to start, the nodes already started
    /// are stopped in reverse start order and the error is returned, leaving
    /// zero live worker threads.
    pub fn start_with(&mut self, spawner: &dyn ThreadSpawner) -> Result<()> {
        if self.running {
            return Err(Error::AlreadyRunning("lattice".to_owned()));
        }
        self.validate()?;

        let resolved: Vec<Option<Trigger>> = self
            .nodes
            .iter()
            .map(|slot| self.resolve(&slot.downstream))
            .collect();
        for (slot, trigger) in self.nodes.iter_mut().zip(resolved) {
            match trigger {
                Some(trigger) => slot.node.set_chain_reaction(trigger)?,
                None => slot.node.clear_chain_reaction()?,
            }
        }

        for index in 0..self.nodes.len() {
            if let Err(error) = self.nodes[index].node.run_with(spawner) {
                tracing::error!(
                    node = %self.nodes[index].node.name(),
                    %error,
                    "lattice_start: rolling back {index} started node(s)"
                );
                for slot in self.nodes[..index].iter_mut().rev() {
                    slot.node.stop();
                }
                return Err(error);
            }
        }

        self.running = true;
        tracing::debug!(
            nodes = self.nodes.len(),
            barriers = self.barriers.len(),
            "lattice_start: all workers live"
        );
        Ok(())
    }

    /// Stops and joins every worker. Idempotent.
    pub fn stop(&mut self) {
        if !self.running && self.live_threads() == 0 {
            return;
        }
        for slot in &mut self.nodes {
            slot.node.stop();
        }
        self.running = false;
        tracing::debug!("lattice_stop: all workers joined");
    }

    // --- Ticks ---

    /// Arms every barrier with its wired arrival count.
    ///
    /// [`tick()`](Self::tick) does this itself. Drivers that wake nodes
    /// directly through handles call it before their first wake.
    pub fn arm(&self) -> Result<()> {
        for (index, slot) in self.barriers.iter().enumerate() {
            let id = BarrierId(next_index(index)?);
            slot.barrier.arm(self.arrivals(id))?;
        }
        Ok(())
    }

    /// Arms the barriers and wakes the trigger node. Returns without waiting.
    pub fn tick(&self) -> Result<()> {
        if !self.running {
            return Err(Error::NotRunning);
        }
        let trigger = self.trigger.ok_or(Error::NoTrigger)?;
        self.arm()?;
        self.slot(trigger)?.node.wake();
        Ok(())
    }

    /// Runs one tick and blocks until `barrier` completes it.
    pub fn tick_and_wait(&self, barrier: BarrierId) -> Result<()> {
        let join = Arc::clone(self.barrier(barrier).ok_or(Error::BarrierNotFound(barrier))?);
        self.tick()?;
        join.await_all();
        Ok(())
    }

    // --- Internals ---

    fn ensure_stopped(&self) -> Result<()> {
        if self.running {
            return Err(Error::Running("lattice".to_owned()));
        }
        Ok(())
    }

    fn slot(&self, id: NodeId) -> Result<&NodeSlot> {
        self.nodes.get(id.0 as usize).ok_or(Error::NodeNotFound(id))
    }

    fn check_downstream(&self, downstream: &Downstream) -> Result<()> {
        for &id in downstream.nodes() {
            self.slot(id)?;
        }
        if let Downstream::Barrier(id) = downstream
            && self.barrier(*id).is_none()
        {
            return Err(Error::BarrierNotFound(*id));
        }
        Ok(())
    }

    fn wirings(&self) -> impl Iterator<Item = &Downstream> {
        self.nodes
            .iter()
            .map(|slot| &slot.downstream)
            .chain(self.barriers.iter().map(|slot| &slot.downstream))
    }

    /// Name of a vertex in the combined node-then-barrier numbering.
    fn member_name(&self, vertex: usize) -> String {
        match self.nodes.get(vertex) {
            Some(slot) => slot.node.name().to_owned(),
            None => self.barriers[vertex - self.nodes.len()].barrier.name().to_owned(),
        }
    }

    fn check_acyclic(&self) -> Result<()> {
        let node_count = self.nodes.len();
        let vertex_count = node_count + self.barriers.len();
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
        let mut in_degree = vec![0usize; vertex_count];

        for (vertex, downstream) in self.wirings().enumerate() {
            let targets: Vec<usize> = match downstream {
                Downstream::Barrier(id) => vec![node_count + id.0 as usize],
                other => other.nodes().iter().map(|id| id.0 as usize).collect(),
            };
            for target in targets {
                successors[vertex].push(target);
                in_degree[target] += 1;
            }
        }

        let mut ready: Vec<usize> = (0..vertex_count).filter(|&v| in_degree[v] == 0).collect();
        let mut visited = 0;
        while let Some(vertex) = ready.pop() {
            visited += 1;
            for &next in &successors[vertex] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(next);
                }
            }
        }

        if visited == vertex_count {
            return Ok(());
        }
        let stuck = (0..vertex_count).find(|&v| in_degree[v] > 0).unwrap_or_default();
        Err(Error::Cycle(self.member_name(stuck)))
    }

    fn check_single_waker(&self) -> Result<()> {
        let mut wakers = vec![0usize; self.nodes.len()];
        for downstream in self.wirings() {
            for id in downstream.nodes() {
                wakers[id.0 as usize] += 1;
            }
        }
        match wakers.iter().position(|&count| count > 1) {
            Some(index) => Err(Error::SharedWake(self.member_name(index))),
            None => Ok(()),
        }
    }

    fn check_arrivals_reachable(&self, trigger: NodeId) -> Result<()> {
        let node_count = self.nodes.len();
        let mut reached = vec![false; node_count + self.barriers.len()];
        let mut pending = vec![trigger.0 as usize];
        while let Some(vertex) = pending.pop() {
            if std::mem::replace(&mut reached[vertex], true) {
                continue;
            }
            let downstream = match self.nodes.get(vertex) {
                Some(slot) => &slot.downstream,
                None => &self.barriers[vertex - node_count].downstream,
            };
            match downstream {
                Downstream::Barrier(id) => pending.push(node_count + id.0 as usize),
                other => pending.extend(other.nodes().iter().map(|id| id.0 as usize)),
            }
        }

        let orphan = self
            .wirings()
            .enumerate()
            .find(|(vertex, downstream)| {
                !reached[*vertex] && matches!(downstream, Downstream::Barrier(_))
            });
        match orphan {
            Some((vertex, _)) => Err(Error::UnreachableArrival(self.member_name(vertex))),
            None => Ok(()),
        }
    }

    /// Turns arena wiring into a trigger. Terminates because `validate()`
    /// has ruled out cycles.
    fn resolve(&self, downstream: &Downstream) -> Option<Trigger> {
        match downstream {
            Downstream::None => None,
            Downstream::Node(id) => Some(Trigger::Node(self.nodes[id.0 as usize].node.handle())),
            Downstream::Fanout(ids) => Some(Trigger::fanout(
                ids.iter().map(|id| self.nodes[id.0 as usize].node.handle()),
            )),
            Downstream::Barrier(id) => {
                let slot = &self.barriers[id.0 as usize];
                Some(Trigger::barrier(
                    Arc::clone(&slot.barrier),
                    self.resolve(&slot.downstream),
                ))
            }
        }
    }
}

impl Default for Lattice {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Lattice {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Lattice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lattice")
            .field("nodes", &self.nodes.len())
            .field("barriers", &self.barriers.len())
            .field("trigger", &self.trigger)
            .field("running", &self.running)
            .finish()
    }
}

fn next_index(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::CapacityExceeded(len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Idle, ProcessResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: &Arc<AtomicUsize>) -> impl Process + 'static {
        let counter = Arc::clone(counter);
        move || -> ProcessResult {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn ids_are_sequential() {
        let mut lattice = Lattice::new();
        let a = lattice.add_node(Node::new("a", Idle)).unwrap();
        let b = lattice.add_node(Node::new("b", Idle)).unwrap();
        let j = lattice.add_barrier(Barrier::new("j", Idle)).unwrap();
        assert_eq!((a.index(), b.index(), j.index()), (0, 1, 0));
        assert_eq!(lattice.node_count(), 2);
        assert_eq!(lattice.barrier_count(), 1);
    }

    #[test]
    fn wiring_rejects_unknown_ids() {
        let mut lattice = Lattice::new();
        let a = lattice.add_node(Node::new("a", Idle)).unwrap();
        assert!(matches!(
            lattice.set_chain_reaction(a, Downstream::Node(NodeId(9))),
            Err(Error::NodeNotFound(NodeId(9)))
        ));
        assert!(matches!(
            lattice.set_chain_reaction(a, Downstream::Barrier(BarrierId(2))),
            Err(Error::BarrierNotFound(BarrierId(2)))
        ));
        assert!(matches!(
            lattice.set_chain_reaction(NodeId(5), Downstream::None),
            Err(Error::NodeNotFound(NodeId(5)))
        ));
    }

    #[test]
    fn arrivals_follow_wiring() {
        let mut lattice = Lattice::new();
        let join = lattice.add_barrier(Barrier::new("join", Idle)).unwrap();
        let inner = lattice.add_barrier(Barrier::new("inner", Idle)).unwrap();
        for name in ["a", "b", "c"] {
            let id = lattice.add_node(Node::new(name, Idle)).unwrap();
            lattice.set_chain_reaction(id, Downstream::Barrier(join)).unwrap();
        }
        lattice
            .set_barrier_chain_reaction(inner, Downstream::Barrier(join))
            .unwrap();
        assert_eq!(lattice.arrivals(join), 4);
        assert_eq!(lattice.arrivals(inner), 0);
    }

    #[test]
    fn validate_finds_node_cycle() {
        let mut lattice = Lattice::new();
        let a = lattice.add_node(Node::new("a", Idle)).unwrap();
        let b = lattice.add_node(Node::new("b", Idle)).unwrap();
        lattice.set_chain_reaction(a, Downstream::Node(b)).unwrap();
        lattice.set_chain_reaction(b, Downstream::Node(a)).unwrap();
        assert!(matches!(lattice.validate(), Err(Error::Cycle(_))));
        assert!(matches!(lattice.start(), Err(Error::Cycle(_))));
        assert_eq!(lattice.live_threads(), 0);
    }

    #[test]
    fn validate_finds_cycle_through_barrier() {
        let mut lattice = Lattice::new();
        let a = lattice.add_node(Node::new("a", Idle)).unwrap();
        let join = lattice.add_barrier(Barrier::new("join", Idle)).unwrap();
        lattice.set_chain_reaction(a, Downstream::Barrier(join)).unwrap();
        lattice
            .set_barrier_chain_reaction(join, Downstream::Node(a))
            .unwrap();
        assert!(matches!(lattice.validate(), Err(Error::Cycle(_))));
    }

    #[test]
    fn diamond_is_acyclic() {
        let mut lattice = Lattice::new();
        let t = lattice.add_node(Node::new("t", Idle)).unwrap();
        let a = lattice.add_node(Node::new("a", Idle)).unwrap();
        let b = lattice.add_node(Node::new("b", Idle)).unwrap();
        let join = lattice.add_barrier(Barrier::new("join", Idle)).unwrap();
        lattice.set_chain_reaction(t, Downstream::Fanout(vec![a, b])).unwrap();
        lattice.set_chain_reaction(a, Downstream::Barrier(join)).unwrap();
        lattice.set_chain_reaction(b, Downstream::Barrier(join)).unwrap();
        lattice.validate().unwrap();
    }

    #[test]
    fn validate_rejects_fan_in_without_barrier() {
        let mut lattice = Lattice::new();
        let t = lattice.add_node(Node::new("t", Idle)).unwrap();
        let a = lattice.add_node(Node::new("a", Idle)).unwrap();
        let b = lattice.add_node(Node::new("b", Idle)).unwrap();
        let c = lattice.add_node(Node::new("c", Idle)).unwrap();
        let join = lattice.add_barrier(Barrier::new("join", Idle)).unwrap();
        lattice.set_chain_reaction(t, Downstream::Fanout(vec![a, b])).unwrap();
        lattice.set_chain_reaction(a, Downstream::Node(c)).unwrap();
        lattice.set_chain_reaction(b, Downstream::Node(c)).unwrap();
        lattice.set_chain_reaction(c, Downstream::Barrier(join)).unwrap();
        lattice.set_trigger(t).unwrap();

        assert!(matches!(lattice.validate(), Err(Error::SharedWake(name)) if name == "c"));
        assert!(matches!(lattice.start(), Err(Error::SharedWake(_))));
        assert_eq!(lattice.live_threads(), 0);

        // Joining through a barrier instead is accepted.
        lattice.set_chain_reaction(a, Downstream::Barrier(join)).unwrap();
        lattice.set_chain_reaction(b, Downstream::Barrier(join)).unwrap();
        lattice.set_barrier_chain_reaction(join, Downstream::Node(c)).unwrap();
        lattice.set_chain_reaction(c, Downstream::None).unwrap();
        lattice.validate().unwrap();
    }

    #[test]
    fn validate_rejects_repeated_fanout_target() {
        let mut lattice = Lattice::new();
        let t = lattice.add_node(Node::new("t", Idle)).unwrap();
        let a = lattice.add_node(Node::new("a", Idle)).unwrap();
        lattice.set_chain_reaction(t, Downstream::Fanout(vec![a, a])).unwrap();
        assert!(matches!(lattice.validate(), Err(Error::SharedWake(name)) if name == "a"));
    }

    #[test]
    fn validate_rejects_arrival_the_trigger_never_reaches() {
        let mut lattice = Lattice::new();
        let t = lattice.add_node(Node::new("t", Idle)).unwrap();
        let orphan = lattice.add_node(Node::new("orphan", Idle)).unwrap();
        let join = lattice.add_barrier(Barrier::new("join", Idle)).unwrap();
        lattice.set_chain_reaction(t, Downstream::Barrier(join)).unwrap();
        lattice.set_chain_reaction(orphan, Downstream::Barrier(join)).unwrap();
        assert_eq!(lattice.arrivals(join), 2);

        // Handle-driven lattices have no trigger to measure reachability from.
        lattice.validate().unwrap();

        lattice.set_trigger(t).unwrap();
        assert!(
            matches!(lattice.validate(), Err(Error::UnreachableArrival(name)) if name == "orphan")
        );
        assert!(matches!(lattice.start(), Err(Error::UnreachableArrival(_))));
        assert_eq!(lattice.live_threads(), 0);

        lattice.set_chain_reaction(orphan, Downstream::None).unwrap();
        lattice.start().unwrap();
        lattice.tick_and_wait(join).unwrap();
        lattice.stop();
        assert_eq!(lattice.barrier(join).unwrap().fires(), 1);
    }

    #[test]
    fn validate_rejects_unreachable_barrier_chain() {
        let mut lattice = Lattice::new();
        let t = lattice.add_node(Node::new("t", Idle)).unwrap();
        let done = lattice.add_barrier(Barrier::new("done", Idle)).unwrap();
        let stray = lattice.add_barrier(Barrier::new("stray", Idle)).unwrap();
        lattice.set_chain_reaction(t, Downstream::Barrier(done)).unwrap();
        lattice
            .set_barrier_chain_reaction(stray, Downstream::Barrier(done))
            .unwrap();
        lattice.set_trigger(t).unwrap();
        assert!(
            matches!(lattice.validate(), Err(Error::UnreachableArrival(name)) if name == "stray")
        );
    }

    #[test]
    fn ids_beyond_u32_are_rejected() {
        assert_eq!(next_index(7).unwrap(), 7);
        assert_eq!(next_index(u32::MAX as usize).unwrap(), u32::MAX);
        #[cfg(target_pointer_width = "64")]
        assert!(matches!(
            next_index(u32::MAX as usize + 1),
            Err(Error::CapacityExceeded(_))
        ));
    }

    #[test]
    fn tick_requires_running_lattice_and_trigger() {
        let mut lattice = Lattice::new();
        assert!(matches!(lattice.tick(), Err(Error::NotRunning)));
        lattice.add_node(Node::new("lonely", Idle)).unwrap();
        lattice.start().unwrap();
        assert!(matches!(lattice.tick(), Err(Error::NoTrigger)));
        lattice.stop();
    }

    #[test]
    fn mutation_rejected_while_running() {
        let mut lattice = Lattice::new();
        let a = lattice.add_node(Node::new("a", Idle)).unwrap();
        lattice.start().unwrap();
        assert!(matches!(lattice.add_node(Node::new("b", Idle)), Err(Error::Running(_))));
        assert!(matches!(lattice.set_trigger(a), Err(Error::Running(_))));
        assert!(matches!(lattice.clear(), Err(Error::Running(_))));
        assert!(matches!(lattice.start(), Err(Error::AlreadyRunning(_))));
        lattice.stop();
        lattice.set_trigger(a).unwrap();
    }

    #[test]
    fn chain_runs_each_stage_once_per_tick() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut lattice = Lattice::new();
        let trigger = lattice.add_node(Node::new("trigger", Idle)).unwrap();
        let work = lattice.add_node(Node::new("work", counting(&counter))).unwrap();
        let done = lattice.add_barrier(Barrier::new("done", Idle)).unwrap();
        lattice.set_chain_reaction(trigger, Downstream::Node(work)).unwrap();
        lattice.set_chain_reaction(work, Downstream::Barrier(done)).unwrap();
        lattice.set_trigger(trigger).unwrap();

        lattice.start().unwrap();
        assert_eq!(lattice.live_threads(), 2);
        for _ in 0..10 {
            lattice.tick_and_wait(done).unwrap();
        }
        lattice.stop();

        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert_eq!(lattice.barrier(done).unwrap().fires(), 10);
        assert_eq!(lattice.live_threads(), 0);
    }

    #[test]
    fn barrier_downstream_fires_after_fan_in() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut lattice = Lattice::new();
        let trigger = lattice.add_node(Node::new("trigger", Idle)).unwrap();
        let a = lattice.add_node(Node::new("a", Idle)).unwrap();
        let b = lattice.add_node(Node::new("b", Idle)).unwrap();
        let after = lattice.add_node(Node::new("after", counting(&counter))).unwrap();
        let join = lattice.add_barrier(Barrier::new("join", Idle)).unwrap();
        let done = lattice.add_barrier(Barrier::new("done", Idle)).unwrap();
        lattice.set_chain_reaction(trigger, Downstream::Fanout(vec![a, b])).unwrap();
        lattice.set_chain_reaction(a, Downstream::Barrier(join)).unwrap();
        lattice.set_chain_reaction(b, Downstream::Barrier(join)).unwrap();
        lattice
            .set_barrier_chain_reaction(join, Downstream::Node(after))
            .unwrap();
        lattice.set_chain_reaction(after, Downstream::Barrier(done)).unwrap();
        lattice.set_trigger(trigger).unwrap();

        lattice.start().unwrap();
        for _ in 0..5 {
            lattice.tick_and_wait(done).unwrap();
        }
        lattice.stop();
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert_eq!(lattice.barrier(join).unwrap().fires(), 5);
    }

    #[test]
    fn restart_after_stop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut lattice = Lattice::new();
        let trigger = lattice.add_node(Node::new("trigger", counting(&counter))).unwrap();
        let done = lattice.add_barrier(Barrier::new("done", Idle)).unwrap();
        lattice.set_chain_reaction(trigger, Downstream::Barrier(done)).unwrap();
        lattice.set_trigger(trigger).unwrap();

        for _ in 0..3 {
            lattice.start().unwrap();
            lattice.tick_and_wait(done).unwrap();
            lattice.stop();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn clear_empties_the_arena() {
        let mut lattice = Lattice::new();
        let a = lattice.add_node(Node::new("a", Idle)).unwrap();
        lattice.set_trigger(a).unwrap();
        lattice.clear().unwrap();
        assert_eq!(lattice.node_count(), 0);
        assert_eq!(lattice.trigger(), None);
    }
}
