//! Lock-free sample matrix shared between a driver and its nodes.
//!
//! A [`SampleBuffer`] is a `rows × cols` matrix of `f32`, stored column-major
//! as bit-cast `AtomicU32` cells. No lock guards it. Ownership of the region moves by
//! convention: the driver writes before waking the trigger, each node finishes
//! its reads and writes before signalling downstream. Cell accesses are
//! relaxed; the release/acquire pair of the wake provides the ordering.
//!
//! Rows are frames, columns are channels. A lane buffer is `period × 1`; the
//! shared output of a [`ChannelLattice`](crate::ChannelLattice) is
//! `period × channels` and is read back interleaved.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Column-major `f32` matrix with atomic cells.
pub struct SampleBuffer {
    rows: usize,
    cols: usize,
    cells: Box<[AtomicU32]>,
}

impl SampleBuffer {
    /// Creates a zero-filled `rows × cols` buffer.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: zeroed(rows * cols),
        }
    }

    /// Reshapes the buffer, discarding its contents.
    ///
    /// Takes `&mut self`: a buffer shared with running workers through an
    /// `Arc` cannot be resized, which keeps reshaping away from live ticks.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        if rows * cols != self.cells.len() {
            self.cells = zeroed(rows * cols);
        } else {
            self.fill(0.0);
        }
        self.rows = rows;
        self.cols = cols;
    }

    /// Number of rows (frames).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (channels).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Reads one sample.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is out of range.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        f32::from_bits(self.cells[self.index(row, col)].load(Ordering::Relaxed))
    }

    /// Writes one sample.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is out of range.
    #[inline]
    pub fn set(&self, row: usize, col: usize, value: f32) {
        self.cells[self.index(row, col)].store(value.to_bits(), Ordering::Relaxed);
    }

    /// Sets every cell to `value`.
    pub fn fill(&self, value: f32) {
        let bits = value.to_bits();
        for cell in self.cells.iter() {
            cell.store(bits, Ordering::Relaxed);
        }
    }

    /// Copies `samples` into the first `samples.len()` rows of `col`.
    pub fn write_column(&self, col: usize, samples: &[f32]) {
        debug_assert!(samples.len() <= self.rows, "column overflow");
        for (row, &sample) in samples.iter().enumerate() {
            self.set(row, col, sample);
        }
    }

    /// Copies the first `out.len()` rows of `col` into `out`.
    pub fn read_column(&self, col: usize, out: &mut [f32]) {
        debug_assert!(out.len() <= self.rows, "column overflow");
        for (row, sample) in out.iter_mut().enumerate() {
            *sample = self.get(row, col);
        }
    }

    /// Copies channel `channel` out of an interleaved frame buffer with
    /// `stride` channels into column `col`, for `frames` frames.
    pub fn write_from_interleaved(
        &self,
        col: usize,
        interleaved: &[f32],
        channel: usize,
        stride: usize,
        frames: usize,
    ) {
        for row in 0..frames {
            self.set(row, col, interleaved[row * stride + channel]);
        }
    }

    /// Writes the first `frames` rows into an interleaved buffer whose stride
    /// equals this buffer's column count.
    pub fn read_interleaved(&self, frames: usize, out: &mut [f32]) {
        debug_assert!(out.len() >= frames * self.cols, "interleaved output too short");
        for row in 0..frames {
            for col in 0..self.cols {
                out[row * self.cols + col] = self.get(row, col);
            }
        }
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "sample ({row}, {col}) outside {}x{} buffer",
            self.rows,
            self.cols
        );
        col * self.rows + row
    }
}

impl fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish_non_exhaustive()
    }
}

fn zeroed(len: usize) -> Box<[AtomicU32]> {
    (0..len).map(|_| AtomicU32::new(0.0f32.to_bits())).collect()
}
