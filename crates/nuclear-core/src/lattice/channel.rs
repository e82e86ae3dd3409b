//! Per-channel lane lattice with an interleaved transfer API.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::barrier::Barrier;
use crate::buffer::SampleBuffer;
use crate::error::{Error, Result};
use crate::node::{Node, NodeStats};
use crate::process::{Idle, Process, ProcessResult};
use crate::spawn::{StdSpawner, ThreadSpawner};

use super::assembly::Lattice;
use super::downstream::Downstream;
use super::id::{BarrierId, NodeId};

/// Highest channel count a [`ChannelLayout`] accepts, on either side.
pub const MAX_CHANNELS: usize = 128;

/// Per-lane computation applied by input nodes: `(lane, samples)`.
pub type LaneFn = Arc<dyn Fn(usize, &mut [f32]) -> ProcessResult + Send + Sync>;

/// Channel counts and period size of a [`ChannelLattice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    /// Interleaved input channels.
    pub in_channels: usize,
    /// Interleaved output channels.
    pub out_channels: usize,
    /// Maximum frames per transfer.
    pub period_frames: usize,
}

impl ChannelLayout {
    /// Creates a layout.
    pub fn new(in_channels: usize, out_channels: usize, period_frames: usize) -> Self {
        Self {
            in_channels,
            out_channels,
            period_frames,
        }
    }

    /// Number of wired lanes: `min(in_channels, out_channels)`.
    pub fn lanes(&self) -> usize {
        self.in_channels.min(self.out_channels)
    }

    fn check(&self) -> Result<()> {
        for (side, channels) in [("input", self.in_channels), ("output", self.out_channels)] {
            if !(1..=MAX_CHANNELS).contains(&channels) {
                return Err(Error::BufferShape(format!(
                    "{channels} {side} channels outside 1..={MAX_CHANNELS}"
                )));
            }
        }
        if self.period_frames == 0 {
            return Err(Error::BufferShape("period must hold at least one frame".to_owned()));
        }
        Ok(())
    }
}

/// Worker-thread options applied to every node a [`ChannelLattice`] builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadOptions {
    /// Thread names are `{prefix}-trigger`, `{prefix}-in-N`, `{prefix}-out-N`.
    pub name_prefix: String,
    /// Worker stack size in bytes; platform default when `None`.
    pub stack_size: Option<usize>,
}

impl Default for ThreadOptions {
    fn default() -> Self {
        Self {
            name_prefix: "nuclear".to_owned(),
            stack_size: None,
        }
    }
}

/// A trigger fanning out to one input node per lane, each chained to an
/// output node, all joined by a `drain` barrier.
///
/// Input lane `i` copies channel `i` of the driver's input into its lane
/// buffer (optionally through a [`LaneFn`]); output lane `i` copies the lane
/// buffer into channel `i` of the shared output. Output channels beyond the
/// wired lanes stay silent.
pub struct ChannelLattice {
    lattice: Lattice,
    layout: ChannelLayout,
    threads: ThreadOptions,
    lane_fn: Option<LaneFn>,
    lanes: Vec<Arc<SampleBuffer>>,
    output: Arc<SampleBuffer>,
    frames: Arc<AtomicUsize>,
    trigger: NodeId,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    drain: BarrierId,
}

impl ChannelLattice {
    /// Builds a stopped lattice for `layout` with default thread options.
    pub fn new(layout: ChannelLayout) -> Result<Self> {
        Self::with_options(layout, ThreadOptions::default(), None)
    }

    /// Builds a stopped lattice with explicit thread options and lane function.
    pub fn with_options(
        layout: ChannelLayout,
        threads: ThreadOptions,
        lane_fn: Option<LaneFn>,
    ) -> Result<Self> {
        let mut this = Self {
            lattice: Lattice::new(),
            layout,
            threads,
            lane_fn,
            lanes: Vec::new(),
            output: Arc::new(SampleBuffer::new(0, 0)),
            frames: Arc::new(AtomicUsize::new(0)),
            trigger: NodeId(0),
            inputs: Vec::new(),
            outputs: Vec::new(),
            drain: BarrierId(0),
        };
        this.configure(layout)?;
        Ok(this)
    }

    /// Rebuilds the lattice for a new layout. Rejected while running.
    pub fn configure(&mut self, layout: ChannelLayout) -> Result<()> {
        if self.lattice.is_running() {
            return Err(Error::Running("channel lattice".to_owned()));
        }
        layout.check()?;
        self.lattice.clear()?;

        let prefix = self.threads.name_prefix.clone();
        let period = layout.period_frames;
        let lanes = layout.lanes();

        self.output = Arc::new(SampleBuffer::new(period, layout.out_channels));
        self.lanes = (0..lanes)
            .map(|_| Arc::new(SampleBuffer::new(period, 1)))
            .collect();

        let trigger = self.node(format!("{prefix}-trigger"), Idle);
        self.trigger = self.lattice.add_node(trigger)?;
        self.drain = self
            .lattice
            .add_barrier(Barrier::new(format!("{prefix}-drain"), Idle))?;

        self.inputs.clear();
        self.outputs.clear();
        for lane in 0..lanes {
            let input = self.node(format!("{prefix}-in-{lane}"), self.input_lane(lane));
            let output = self.node(format!("{prefix}-out-{lane}"), self.output_lane(lane));
            let input = self.lattice.add_node(input)?;
            let output = self.lattice.add_node(output)?;
            self.lattice.set_chain_reaction(input, Downstream::Node(output))?;
            self.lattice
                .set_chain_reaction(output, Downstream::Barrier(self.drain))?;
            self.inputs.push(input);
            self.outputs.push(output);
        }
        self.lattice
            .set_chain_reaction(self.trigger, Downstream::Fanout(self.inputs.clone()))?;
        self.lattice.set_trigger(self.trigger)?;

        self.layout = layout;
        tracing::debug!(
            in_channels = layout.in_channels,
            out_channels = layout.out_channels,
            period_frames = period,
            lanes,
            "channel_lattice_configure"
        );
        Ok(())
    }

    /// Starts every lane on plain OS threads.
    pub fn start(&mut self) -> Result<()> {
        self.start_with(&StdSpawner)
    }

    /// Starts every lane through `spawner`, all-or-nothing.
    pub fn start_with(&mut self, spawner: &dyn ThreadSpawner) -> Result<()> {
        self.lattice.start_with(spawner)?;
        tracing::info!(
            lanes = self.layout.lanes(),
            threads = self.lattice.live_threads(),
            "channel lattice started"
        );
        Ok(())
    }

    /// Stops and joins every lane.
    pub fn stop(&mut self) {
        self.lattice.stop();
    }

    /// Returns `true` while the lanes are running.
    pub fn is_running(&self) -> bool {
        self.lattice.is_running()
    }

    /// The current layout.
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// The underlying lattice, for inspection.
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// The barrier every output lane arrives at.
    pub fn drain(&self) -> BarrierId {
        self.drain
    }

    /// Number of completed transfers since construction.
    pub fn transfers(&self) -> u64 {
        self.lattice.barrier(self.drain).map_or(0, |drain| drain.fires())
    }

    /// Counters of every input lane followed by every output lane.
    pub fn lane_stats(&self) -> Vec<NodeStats> {
        self.inputs
            .iter()
            .chain(&self.outputs)
            .filter_map(|&id| self.lattice.node(id).map(Node::stats))
            .collect()
    }

    /// Runs one period through the lanes.
    ///
    /// `input` holds interleaved frames of `in_channels`; `output` must hold
    /// the same number of frames of `out_channels`. At most `period_frames`
    /// frames per call. Returns the number of frames transferred once every
    /// output lane has finished.
    pub fn transfer(&self, input: &[f32], output: &mut [f32]) -> Result<usize> {
        if !self.lattice.is_running() {
            return Err(Error::NotRunning);
        }
        let ChannelLayout {
            in_channels,
            out_channels,
            period_frames,
        } = self.layout;

        if input.len() % in_channels != 0 {
            return Err(Error::BufferShape(format!(
                "input length {} is not a multiple of {in_channels} channels",
                input.len()
            )));
        }
        let frames = input.len() / in_channels;
        if frames > period_frames {
            return Err(Error::BufferShape(format!(
                "{frames} frames exceed the {period_frames}-frame period"
            )));
        }
        if output.len() != frames * out_channels {
            return Err(Error::BufferShape(format!(
                "output length {} does not hold {frames} frames of {out_channels} channels",
                output.len()
            )));
        }
        if frames == 0 {
            return Ok(0);
        }

        self.frames.store(frames, Ordering::Relaxed);
        for (lane, buffer) in self.lanes.iter().enumerate() {
            buffer.write_from_interleaved(0, input, lane, in_channels, frames);
        }
        self.lattice.tick_and_wait(self.drain)?;
        self.output.read_interleaved(frames, output);
        Ok(frames)
    }

    fn node(&self, name: String, processor: impl Process + 'static) -> Node {
        let node = Node::new(name, processor);
        match self.threads.stack_size {
            Some(bytes) => node.with_stack_size(bytes),
            None => node,
        }
    }

    fn input_lane(&self, lane: usize) -> impl Process + 'static {
        let lane_fn = self.lane_fn.clone();
        let buffer = Arc::clone(&self.lanes[lane]);
        let frames = Arc::clone(&self.frames);
        let mut scratch = vec![0.0; if lane_fn.is_some() { buffer.rows() } else { 0 }];
        move || -> ProcessResult {
            // Without a lane function the driver's copy is already in place.
            let Some(lane_fn) = &lane_fn else {
                return Ok(());
            };
            let block = &mut scratch[..frames.load(Ordering::Relaxed)];
            buffer.read_column(0, block);
            let result = lane_fn(lane, block);
            buffer.write_column(0, block);
            result
        }
    }

    fn output_lane(&self, lane: usize) -> impl Process + 'static {
        let buffer = Arc::clone(&self.lanes[lane]);
        let output = Arc::clone(&self.output);
        let frames = Arc::clone(&self.frames);
        move || -> ProcessResult {
            for row in 0..frames.load(Ordering::Relaxed) {
                output.set(row, lane, buffer.get(row, 0));
            }
            Ok(())
        }
    }
}

impl fmt::Debug for ChannelLattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelLattice")
            .field("layout", &self.layout)
            .field("threads", &self.threads)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
