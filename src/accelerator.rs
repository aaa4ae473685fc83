//! The `width × height` PE grid and its outer convolution loop.
//!
//! Ported from `examples/original_source/model/accelerator.py::Accelerator`.

#![forbid(unsafe_code)]

use crate::cost::{CostTracker, Tier};
use crate::coordinator::PipeCoordinator;
use crate::error::AccelError;
use crate::matrix::Matrix;
use crate::pe::ProcessingElement;
use tracing::{debug, info, trace, warn};

/// A row-stationary 2D PE array performing single-channel 2D convolution.
///
/// `dimensions = (width, height)`: `width` columns, `height` rows. Row `0`
/// is the bottom of the array, row `height - 1` is the top (the grid's own
/// `(row, col)` indexing, not the caller-facing `(W, H)` constructor order).
#[derive(Debug)]
pub struct Accelerator {
    width: usize,
    height: usize,
    stride: (usize, usize),
    grid: Vec<ProcessingElement>,
    kernel: Option<Matrix>,
    ifmap: Option<Matrix>,
    ofmap: Option<Matrix>,
    kernel_set: bool,
    ifmap_set: bool,
    pipe_coordinator: Option<PipeCoordinator>,
}

impl Accelerator {
    /// Build an empty `dimensions.0 × dimensions.1` grid with the given
    /// `(row_stride, col_stride)`. Fails if either dimension or stride
    /// component is zero.
    pub fn new(dimensions: (usize, usize), stride: (usize, usize)) -> Result<Self, AccelError> {
        let (width, height) = dimensions;
        if width == 0 || height == 0 || stride.0 == 0 || stride.1 == 0 {
            return Err(AccelError::InvalidShape { dimensions, stride });
        }
        let mut grid = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                grid.push(ProcessingElement::new((row, col), stride));
            }
        }
        Ok(Self {
            width,
            height,
            stride,
            grid,
            kernel: None,
            ifmap: None,
            ofmap: None,
            kernel_set: false,
            ifmap_set: false,
            pipe_coordinator: None,
        })
    }

    #[inline]
    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// Grid width (number of columns).
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height (number of rows).
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The most recently computed ofmap, if `conv()` has completed.
    pub fn ofmap(&self) -> Option<&Matrix> {
        self.ofmap.as_ref()
    }

    /// Predicted ofmap shape given the currently set kernel and ifmap.
    /// `None` until both are set.
    pub fn ofmap_dimensions(&self) -> Option<(usize, usize)> {
        let kernel = self.kernel.as_ref()?;
        let ifmap = self.ifmap.as_ref()?;
        let (sr, sc) = self.stride;
        let oh = (ifmap.rows() - kernel.rows() + sr) / sr;
        let ow = (ifmap.cols() - kernel.cols() + sc) / sc;
        Some((oh, ow))
    }

    /// Seed the grid's column-0 PEs with one kernel row each, bottom PE
    /// getting the kernel's last row (`kernel.rows()[i]` goes to PE
    /// `(height - 1 - i, 0)`).
    pub fn set_kernel(&mut self, kernel: Matrix) {
        for (i, row) in kernel.rows_iter().enumerate() {
            let pe_row = self.height - 1 - i;
            let idx = self.idx(pe_row, 0);
            self.grid[idx].set_kernel(row.to_vec(), Tier::Dram);
        }
        self.kernel = Some(kernel);
        self.kernel_set = true;
    }

    /// Attach a fresh [`PipeCoordinator`] for this ifmap, prime it, and
    /// deliver its first round of rows to the edge PEs.
    pub fn set_ifmap(&mut self, ifmap: Matrix) {
        let mut coordinator = PipeCoordinator::new(self.width, self.height, ifmap.cols());
        coordinator.setup(&ifmap);
        coordinator.update_pes(&mut self.grid, self.width);
        self.pipe_coordinator = Some(coordinator);
        self.ifmap = Some(ifmap);
        self.ifmap_set = true;
    }

    /// Run `conv()` on every ready PE in `row`.
    pub fn run_ready_pes(&mut self, row: usize) {
        for col in 0..self.width {
            let idx = self.idx(row, col);
            if self.grid[idx].ready() {
                self.grid[idx].conv().expect("checked ready above");
            }
        }
    }

    /// Shift `row`'s psums up into `row + 1` (no-op for the top row).
    pub fn propagate_psums(&mut self, row: usize) {
        if row + 1 >= self.height {
            return;
        }
        for col in 0..self.width {
            let src = self.idx(row, col);
            let dst = self.idx(row + 1, col);
            let (left, right) = self.grid.split_at_mut(dst);
            left[src].t_shift_psum_to(&mut right[0]);
        }
    }

    /// Shift each row's column-0 kernel row rightward across that row.
    ///
    /// Deliberately sequential, not snapshotted: processing column `c`
    /// reads column `c`'s *current* kernel, which the previous iteration
    /// (column `c - 1`) just overwrote with column 0's original row. The
    /// net effect of one call is that every PE in the row ends up holding
    /// column 0's kernel row — the intended row-stationary replication,
    /// not a one-step diagonal shift.
    pub fn propagate_kernel(&mut self) {
        for row in 0..self.height {
            let base = row * self.width;
            for col in 0..self.width.saturating_sub(1) {
                let (left, right) = self.grid[base..base + self.width].split_at_mut(col + 1);
                left[col].t_shift_kernel_to(&mut right[0]);
            }
        }
    }

    /// Diagonally shift ifmaps: `(row, col)` receives from
    /// `(row - stride.0, col - stride.1)` if that source is in-bounds and
    /// has an ifmap set. Then advances every edge pipe by one entry.
    ///
    /// Iterates rows top-to-bottom; a source is always strictly below its
    /// destination (`stride.0 >= 1`), so it is never read after having
    /// already been overwritten earlier in the same call.
    pub fn propagate_ifmaps(&mut self) {
        let (sr, sc) = self.stride;
        for row in (0..self.height).rev() {
            for col in 0..self.width {
                let src_row = row.checked_sub(sr);
                let src_col = col.checked_sub(sc);
                let (Some(src_row), Some(src_col)) = (src_row, src_col) else { continue };
                let src = self.idx(src_row, src_col);
                if !self.grid[src].has_ifmap() {
                    trace!(row, col, "propagate_ifmaps: diagonal source has no ifmap yet, skipping");
                    continue;
                }
                let dst = self.idx(row, col);
                // src_row < row always (stride.0 >= 1), so src < dst always.
                let (left, right) = self.grid.split_at_mut(dst);
                left[src].t_shift_ifmap_to(&mut right[0]);
            }
        }
        if let Some(coordinator) = self.pipe_coordinator.as_mut() {
            coordinator.update_pes(&mut self.grid, self.width);
        }
    }

    fn scale_ofmap_index(ifmap_index: Option<usize>, seed_scale: f64) -> Option<usize> {
        if seed_scale as i64 == 0 {
            return ifmap_index;
        }
        let idx = ifmap_index?;
        let scaled = (idx as f64 / seed_scale) as i64 - 1;
        if scaled < 0 {
            None
        } else {
            Some(scaled as usize)
        }
    }

    /// Run the full convolution: bottom-to-top compute/propagate-psum sweep,
    /// zero the bottom row, harvest the top row into the ofmap, then shift
    /// kernel and ifmap for the next step. Fails (without mutating state) if
    /// a kernel and ifmap have not both been set.
    pub fn conv(&mut self) -> Result<Matrix, AccelError> {
        if !(self.kernel_set && self.ifmap_set) {
            return Err(AccelError::NotReady { kernel_set: self.kernel_set, ifmap_set: self.ifmap_set });
        }

        let (oh, ow) = self.ofmap_dimensions().expect("kernel and ifmap are set");
        info!(width = self.width, height = self.height, oh, ow, "conv: starting");
        let mut ofmap = Matrix::zeros(oh, ow);

        let ifmap_width = self.ifmap.as_ref().unwrap().cols() as f64;
        let seed_scale = self.ifmap.as_ref().unwrap().get(0, 0) as f64 / ifmap_width;

        for step in 0..oh {
            debug!(step, "conv: outer step");
            for row in 0..self.height {
                self.run_ready_pes(row);
                self.propagate_psums(row);
            }

            for col in 0..self.width {
                let idx = self.idx(0, col);
                self.grid[idx].set_psum_zero();
            }

            for col in 0..self.width {
                let idx = self.idx(self.height - 1, col);
                let pe = &mut self.grid[idx];
                match Self::scale_ofmap_index(pe.ifmap_index(), seed_scale) {
                    Some(ofmap_index) if ofmap_index < oh => {
                        if let Some(psum) = pe.get_psum(Tier::Dram) {
                            ofmap.set_row(ofmap_index, &psum);
                        }
                    }
                    Some(ofmap_index) => {
                        warn!(col, ofmap_index, oh, "conv: ofmap index out of range, dropping row");
                    }
                    None => {}
                }
            }

            self.propagate_kernel();
            self.propagate_ifmaps();
        }

        self.ofmap = Some(ofmap.clone());
        info!(oh, ow, "conv: finished");
        Ok(ofmap)
    }

    /// Aggregate every PE's cost tracker into one.
    pub fn counters(&self) -> CostTracker {
        let mut total = CostTracker::new();
        for pe in &self.grid {
            total.merge(pe.cost_tracker());
        }
        total
    }
}
