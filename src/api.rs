//! Ergonomic builder and serializable counter snapshot over the core.
//!
//! This module wraps [`crate::accelerator::Accelerator`] with a small surface
//! an external driver (XML reader/writer, CLI, test harness) can use without
//! reaching into the grid itself:
//! - [`AcceleratorBuilder`] hides the `(dimensions, stride)` constructor
//!   behind a fluent, named-field alternative.
//! - [`Counters`] is a serde-friendly snapshot of the grid-wide aggregated
//!   cost counters, ready to hand off to
//!   whatever I/O layer a caller wants.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::accelerator::Accelerator;
use crate::cost::CostTracker;
use crate::error::AccelError;

/// Fluent constructor for an [`Accelerator`].
///
/// Defaults: `stride = (1, 1)`. Dimensions must be supplied.
///
/// ```
/// use rowstationary::AcceleratorBuilder;
///
/// let accelerator = AcceleratorBuilder::new(2, 2).stride(1, 1).build().unwrap();
/// assert_eq!((accelerator.width(), accelerator.height()), (2, 2));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AcceleratorBuilder {
    width: usize,
    height: usize,
    stride: (usize, usize),
}

impl AcceleratorBuilder {
    /// Start building a `width × height` grid with the default unit stride.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, stride: (1, 1) }
    }

    /// Override the `(row_stride, col_stride)` used for convolution and
    /// diagonal ifmap propagation.
    pub fn stride(mut self, row_stride: usize, col_stride: usize) -> Self {
        self.stride = (row_stride, col_stride);
        self
    }

    /// Build the [`Accelerator`]. Fails if any dimension or stride
    /// component is zero.
    pub fn build(self) -> Result<Accelerator, AccelError> {
        Accelerator::new((self.width, self.height), self.stride)
    }
}

/// A serializable, grid-wide snapshot of [`CostTracker`]'s counters.
///
/// Field names match the external counters mapping
/// (`counters() -> {spad_reads, spad_writes, ...}`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// SPAD reads across the whole grid.
    pub spad_reads: usize,
    /// SPAD writes across the whole grid.
    pub spad_writes: usize,
    /// IPE reads across the whole grid.
    pub ipe_reads: usize,
    /// IPE writes across the whole grid.
    pub ipe_writes: usize,
    /// GLB reads across the whole grid (always `0` in the base dataflow).
    pub glb_reads: usize,
    /// GLB writes across the whole grid (always `0` in the base dataflow).
    pub glb_writes: usize,
    /// DRAM reads across the whole grid.
    pub dram_reads: usize,
    /// DRAM writes across the whole grid.
    pub dram_writes: usize,
    /// Total scalar add operations across the whole grid.
    pub add_ops: u64,
    /// Total scalar multiply operations across the whole grid.
    pub mult_ops: u64,
}

impl From<&CostTracker> for Counters {
    fn from(tracker: &CostTracker) -> Self {
        Self {
            spad_reads: tracker.spad_reads(),
            spad_writes: tracker.spad_writes(),
            ipe_reads: tracker.ipe_reads(),
            ipe_writes: tracker.ipe_writes(),
            glb_reads: tracker.glb_reads(),
            glb_writes: tracker.glb_writes(),
            dram_reads: tracker.dram_reads(),
            dram_writes: tracker.dram_writes(),
            add_ops: tracker.add(),
            mult_ops: tracker.mult(),
        }
    }
}

impl Accelerator {
    /// Aggregate every PE's cost tracker into a serializable snapshot.
    ///
    /// Equivalent to `Counters::from(&self.counters())`, exposed directly on
    /// `Accelerator` since this is the shape an external driver actually
    /// wants (the external `counters()` entry point).
    pub fn counters_snapshot(&self) -> Counters {
        Counters::from(&self.counters())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;

    #[test]
    fn builder_rejects_zero_dimensions() {
        assert!(AcceleratorBuilder::new(0, 1).build().is_err());
    }

    #[test]
    fn builder_defaults_to_unit_stride() {
        let acc = AcceleratorBuilder::new(2, 3).build().unwrap();
        assert_eq!((acc.width(), acc.height()), (2, 3));
    }

    #[test]
    fn counters_snapshot_matches_single_pe_scenario() {
        let mut acc = AcceleratorBuilder::new(1, 1).build().unwrap();
        acc.set_kernel(Matrix::from_rows(vec![vec![1, 2]]));
        acc.set_ifmap(Matrix::from_rows(vec![vec![0, 1, 2, 3, 4]]));
        acc.conv().unwrap();

        let counters = acc.counters_snapshot();
        assert_eq!(counters.dram_writes, 2);
        assert_eq!(counters.dram_reads, 0);
        assert_eq!(counters.spad_writes, 4);
        assert_eq!(counters.spad_reads, 12);
        assert_eq!(counters.add_ops, 4);
        assert_eq!(counters.mult_ops, 8);
    }
}
