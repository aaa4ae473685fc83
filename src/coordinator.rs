//! Builds the set of "edge" input PEs (left column + bottom row, minus the
//! shared corner), wires their [`Pipe`]s, and advances every pipe in
//! lockstep once per outer convolution step.
//!
//! Ported from `examples/original_source/model/ifmap_pipes.py::PipeCoordinator`.

#![forbid(unsafe_code)]

use crate::cost::Tier;
use crate::matrix::Matrix;
use crate::pe::ProcessingElement;
use crate::pipe::Pipe;

/// Coordinates ifmap delivery for one `Accelerator::set_ifmap` call.
///
/// Edge keys and pipes are kept as parallel `Vec`s (not a map) to preserve
/// insertion order exactly the way the original relies on Python's
/// insertion-ordered `dict` for `ifmap_pes`.
#[derive(Debug)]
pub struct PipeCoordinator {
    ifmap_width: usize,
    edge_keys: Vec<(usize, usize)>,
    pipes: Vec<Pipe>,
}

impl PipeCoordinator {
    /// Build the coordinator for a `width × height` grid whose ifmap rows
    /// are `ifmap_width` wide. Edge keys are computed immediately; pipes
    /// are attached by [`setup`](Self::setup).
    pub fn new(width: usize, height: usize, ifmap_width: usize) -> Self {
        let edge_keys = Self::compute_edge_keys(width, height);
        Self { ifmap_width, edge_keys, pipes: Vec::new() }
    }

    /// Top-to-bottom column-0 PEs, then the bottom row's remaining columns
    /// (the edge set an external PipeCoordinator feeds).
    fn compute_edge_keys(width: usize, height: usize) -> Vec<(usize, usize)> {
        let mut keys = Vec::with_capacity(height + width.saturating_sub(1));
        for row in (0..height).rev() {
            keys.push((row, 0));
        }
        for col in 1..width {
            keys.push((0, col));
        }
        keys
    }

    /// The edge PE addresses, in insertion order.
    pub fn edge_keys(&self) -> &[(usize, usize)] {
        &self.edge_keys
    }

    /// Three-phase setup: attach one pipe per edge PE, pad each by its
    /// column's diagonal delay, then fill with the interleaved ifmap rows.
    pub fn setup(&mut self, ifmap: &Matrix) {
        self.attach_pipes();
        self.pad_with_zeros();
        self.fill(ifmap);
    }

    fn attach_pipes(&mut self) {
        self.pipes = self.edge_keys.iter().map(|_| Pipe::new(self.ifmap_width)).collect();
    }

    fn pad_with_zeros(&mut self) {
        for (pipe, &(_, col)) in self.pipes.iter_mut().zip(self.edge_keys.iter()) {
            pipe.pad_with_zeros(col);
        }
    }

    fn fill(&mut self, ifmap: &Matrix) {
        let n_rows = ifmap.rows();
        let height = self.edge_keys.iter().filter(|&&(_, c)| c == 0).count();
        for (k, pipe) in self.pipes.iter_mut().enumerate() {
            let mut r = k;
            while r < n_rows {
                pipe.append(ifmap.row(r).to_vec());
                r += height;
            }
        }
    }

    /// Pop one entry from every pipe and deliver it to its owning PE,
    /// tagged `dram`. Must be called exactly once per outer step, for all
    /// pipes, before that step's computation.
    pub fn update_pes(&mut self, grid: &mut [ProcessingElement], grid_width: usize) {
        for (pipe, &(row, col)) in self.pipes.iter_mut().zip(self.edge_keys.iter()) {
            let (ifmap_row, index) = pipe.pop();
            grid[row * grid_width + col].set_ifmap(ifmap_row, Tier::Dram, index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: usize, height: usize) -> Vec<ProcessingElement> {
        let mut g = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                g.push(ProcessingElement::new((row, col), (1, 1)));
            }
        }
        g
    }

    #[test]
    fn edge_keys_match_python_ordering() {
        let c = PipeCoordinator::new(2, 2, 28);
        assert_eq!(c.edge_keys(), &[(1, 0), (0, 0), (0, 1)]);
    }

    #[test]
    fn three_edge_pes_for_2x2() {
        let c = PipeCoordinator::new(2, 2, 28);
        assert_eq!(c.edge_keys().len(), 3);
    }

    #[test]
    fn padding_lengths_match_column_distance() {
        let mut c = PipeCoordinator::new(2, 2, 28);
        c.attach_pipes();
        c.pad_with_zeros();
        assert_eq!(c.pipes[0].len(), 0); // (1,0)
        assert_eq!(c.pipes[1].len(), 0); // (0,0)
        assert_eq!(c.pipes[2].len(), 1); // (0,1)
    }

    #[test]
    fn fill_interleaves_rows_by_height() {
        let ifmap = Matrix::from_rows(vec![
            (0..28).collect(),
            (28..56).collect(),
            (56..84).collect(),
            (84..112).collect(),
            (112..140).collect(),
        ]);
        let mut c = PipeCoordinator::new(2, 2, 28);
        c.setup(&ifmap);

        assert_eq!(c.pipes[0].pop().1, Some(0));
        assert_eq!(c.pipes[0].pop().1, Some(2));
        assert_eq!(c.pipes[0].pop().1, Some(4));

        assert_eq!(c.pipes[1].pop().1, Some(1));
        assert_eq!(c.pipes[1].pop().1, Some(3));

        assert_eq!(c.pipes[2].pop().1, None);
        assert_eq!(c.pipes[2].pop().1, Some(2));
        assert_eq!(c.pipes[2].pop().1, Some(4));
    }

    #[test]
    fn update_pes_delivers_one_entry_per_pipe() {
        let ifmap = Matrix::from_rows(vec![(0..3).collect(), (3..6).collect()]);
        let mut c = PipeCoordinator::new(2, 2, 3);
        c.setup(&ifmap);

        let mut g = grid(2, 2);
        c.update_pes(&mut g, 2);

        assert_eq!(g[1 * 2 + 0].get_ifmap(Tier::Acc), Some(vec![0, 1, 2]));
        assert_eq!(g[0 * 2 + 0].get_ifmap(Tier::Acc), Some(vec![3, 4, 5]));
        assert_eq!(g[0 * 2 + 1].get_ifmap(Tier::Acc), Some(vec![0, 0, 0]));
    }
}
