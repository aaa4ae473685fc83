//! A single processing element: one kernel row, one ifmap row, one psum
//! accumulator, plus its own [`CostTracker`].
//!
//! Ported from `examples/original_source/model/processing_element.py`. The
//! original dynamically decorates six accessor methods and two compute
//! operators after `__init__` so a shared `CostTracker` can intercept every
//! call; this crate instead has each accessor invoke
//! `self.cost_tracker.record_*` explicitly, with the tier tag part of
//! every accessor's signature rather than a keyword-only argument resolved
//! by reflection.

#![forbid(unsafe_code)]

use crate::cost::{CostTracker, Tier};
use crate::error::PeError;

/// One cell of the PE grid.
#[derive(Debug, Clone)]
pub struct ProcessingElement {
    uuid: (usize, usize),
    stride: (usize, usize),
    ifmap_index: Option<usize>,
    kernel: Option<Vec<i64>>,
    ifmap: Option<Vec<i64>>,
    psum: Option<Vec<i64>>,
    kernel_set: bool,
    ifmap_set: bool,
    cost_tracker: CostTracker,
}

impl ProcessingElement {
    /// Build a fresh, empty PE at `uuid = (row, col)` with the given
    /// `(row_stride, col_stride)`.
    pub fn new(uuid: (usize, usize), stride: (usize, usize)) -> Self {
        Self {
            uuid,
            stride,
            ifmap_index: None,
            kernel: None,
            ifmap: None,
            psum: None,
            kernel_set: false,
            ifmap_set: false,
            cost_tracker: CostTracker::new(),
        }
    }

    /// This PE's `(row, col)` address. Immutable for the PE's lifetime.
    #[inline]
    pub fn uuid(&self) -> (usize, usize) {
        self.uuid
    }

    /// The ifmap row index most recently delivered to this PE (`None` for a
    /// zero-padding entry, or before any ifmap has been set).
    #[inline]
    pub fn ifmap_index(&self) -> Option<usize> {
        self.ifmap_index
    }

    /// `true` once both a kernel row and an ifmap row have been set at
    /// least once.
    #[inline]
    pub fn ready(&self) -> bool {
        self.kernel_set && self.ifmap_set
    }

    /// This PE's local ofmap width: `(|ifmap| - |kernel| + sc) / sc`.
    /// `None` until the PE is [`ready`](Self::ready).
    pub fn ofmap_len(&self) -> Option<usize> {
        let kernel = self.kernel.as_ref()?;
        let ifmap = self.ifmap.as_ref()?;
        let sc = self.stride.1;
        Some((ifmap.len() - kernel.len() + sc) / sc)
    }

    /// `true` once an ifmap row has been set (independent of the kernel).
    #[inline]
    pub fn has_ifmap(&self) -> bool {
        self.ifmap.is_some()
    }

    /// Read-only access to this PE's cost tracker.
    #[inline]
    pub fn cost_tracker(&self) -> &CostTracker {
        &self.cost_tracker
    }

    /// Store a kernel row. Resets the psum to zero if the PE is (now)
    /// ready — ported as-is from `set_psum_if_ready`, which the original
    /// calls unconditionally from both `set_kernel` and `set_ifmap`; this is
    /// what keeps every PE's psum fresh after each neighbor shift.
    pub fn set_kernel(&mut self, kernel: Vec<i64>, tier: Tier) {
        self.kernel = Some(kernel);
        self.kernel_set = true;
        self.cost_tracker.record_write(tier, "kernel");
        self.reset_psum_if_ready();
    }

    /// Read this PE's kernel row.
    pub fn get_kernel(&mut self, tier: Tier) -> Option<Vec<i64>> {
        self.cost_tracker.record_read(tier, "kernel");
        self.kernel.clone()
    }

    /// Store an ifmap row and its originating row index (`None` for a
    /// zero-padding delivery). Resets the psum to zero if the PE is (now)
    /// ready.
    pub fn set_ifmap(&mut self, ifmap: Vec<i64>, tier: Tier, ifmap_index: Option<usize>) {
        self.ifmap = Some(ifmap);
        self.ifmap_index = ifmap_index;
        self.ifmap_set = true;
        self.cost_tracker.record_write(tier, "ifmap");
        self.reset_psum_if_ready();
    }

    /// Read this PE's ifmap row.
    pub fn get_ifmap(&mut self, tier: Tier) -> Option<Vec<i64>> {
        self.cost_tracker.record_read(tier, "ifmap");
        self.ifmap.clone()
    }

    /// Read this PE's psum accumulator.
    pub fn get_psum(&mut self, tier: Tier) -> Option<Vec<i64>> {
        self.cost_tracker.record_read(tier, "psum");
        self.psum.clone()
    }

    /// Overwrite this PE's psum accumulator. Always bills a write, even when
    /// `psum` is `None` (matches the original's unconditional
    /// `set_psum(self.get_psum(mem="acc"), mem="ipe")` shift, which copies
    /// whatever the source holds, including nothing yet).
    pub fn set_psum(&mut self, psum: Option<Vec<i64>>, tier: Tier) {
        self.cost_tracker.record_write(tier, "psum");
        self.psum = psum;
    }

    /// Zero the psum in place. Takes no tier tag; not billed as a memory
    /// access.
    pub fn set_psum_zero(&mut self) {
        if let Some(len) = self.ofmap_len() {
            self.psum = Some(vec![0; len]);
        }
    }

    fn reset_psum_if_ready(&mut self) {
        if self.ready() {
            self.set_psum_zero();
        }
    }

    /// Vectorized multiply: dot product of `kernel` and a same-length ifmap
    /// window. Counts as `kernel.len()` scalar multiplies.
    fn mult(&mut self, kernel: &[i64], window: &[i64]) -> i64 {
        self.cost_tracker.bump_mult(kernel.len());
        kernel.iter().zip(window).map(|(a, b)| a * b).sum()
    }

    /// Scalar add. Counts as one add operation.
    fn add(&mut self, a: i64, b: i64) -> i64 {
        self.cost_tracker.bump_add();
        a + b
    }

    /// The per-PE 1D convolution-accumulate. Fails if the PE is not ready;
    /// state is left unchanged on failure.
    pub fn conv(&mut self) -> Result<(), PeError> {
        if !self.ready() {
            return Err(PeError::NotReady { kernel_set: self.kernel_set, ifmap_set: self.ifmap_set });
        }
        if self.psum.is_none() {
            self.set_psum_zero();
        }

        let ifmap_len = self.ifmap.as_ref().unwrap().len();
        let kernel_len = self.kernel.as_ref().unwrap().len();
        let sc = self.stride.1;

        let mut i = 0usize;
        while i < ifmap_len {
            if i + kernel_len > ifmap_len {
                i += sc;
                continue;
            }

            let kernel = self.get_kernel(Tier::Spad).expect("ready PE always has a kernel");
            let ifmap = self.get_ifmap(Tier::Spad).expect("ready PE always has an ifmap");
            let window = &ifmap[i..i + kernel_len];
            let mult_result = self.mult(&kernel, window);

            let mut psum = self.get_psum(Tier::Spad).expect("psum initialized above");
            let j = i / sc;
            psum[j] = self.add(mult_result, psum[j]);
            self.set_psum(Some(psum), Tier::Spad);

            i += sc;
        }

        Ok(())
    }

    /// Ship a copy of this PE's kernel row into `other`, billed as an IPE
    /// write on the destination (own read is tagged `Acc` and is free).
    pub fn t_shift_kernel_to(&mut self, other: &mut ProcessingElement) {
        if let Some(kernel) = self.get_kernel(Tier::Acc) {
            other.set_kernel(kernel, Tier::Ipe);
        }
    }

    /// Ship a copy of this PE's ifmap row (and its row index) into `other`.
    pub fn t_shift_ifmap_to(&mut self, other: &mut ProcessingElement) {
        let index = self.ifmap_index;
        if let Some(ifmap) = self.get_ifmap(Tier::Acc) {
            other.set_ifmap(ifmap, Tier::Ipe, index);
        }
    }

    /// Ship a copy of this PE's psum into `other`, unconditionally — even
    /// when this PE has no psum yet, `other` is overwritten with `None` and
    /// still billed an IPE write (matches the original, which shifts
    /// whatever `get_psum` returns with no readiness check).
    pub fn t_shift_psum_to(&mut self, other: &mut ProcessingElement) {
        let psum = self.get_psum(Tier::Acc);
        other.set_psum(psum, Tier::Ipe);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pe_with(kernel: Vec<i64>, ifmap: Vec<i64>, stride: (usize, usize)) -> ProcessingElement {
        let mut pe = ProcessingElement::new((0, 0), stride);
        pe.set_kernel(kernel, Tier::Dram);
        pe.set_ifmap(ifmap, Tier::Dram, Some(0));
        pe
    }

    #[test]
    fn ready_tracks_both_sets() {
        let mut pe = ProcessingElement::new((0, 0), (1, 1));
        assert!(!pe.ready());
        pe.set_kernel(vec![1, 2], Tier::Dram);
        assert!(!pe.ready());
        pe.set_ifmap(vec![0, 1, 2, 3, 4], Tier::Dram, Some(0));
        assert!(pe.ready());
    }

    #[test]
    fn ofmap_len_small_example() {
        let pe = pe_with(vec![1, 2], vec![0, 1, 2, 3, 4], (1, 1));
        assert_eq!(pe.ofmap_len(), Some(4));
    }

    #[test]
    fn ofmap_len_large_example() {
        let pe = pe_with(vec![1, 2], (0..28).collect(), (1, 1));
        assert_eq!(pe.ofmap_len(), Some(27));
    }

    #[test]
    fn conv_computes_small_psum() {
        let mut pe = pe_with(vec![1, 2], vec![0, 1, 2, 3, 4], (1, 1));
        pe.conv().unwrap();
        assert_eq!(pe.get_psum(Tier::Acc).unwrap(), vec![2, 5, 8, 11]);
    }

    #[test]
    fn conv_computes_large_psum_and_counters() {
        let mut pe = pe_with(vec![1, 2], (0..28).collect(), (1, 1));
        pe.conv().unwrap();
        let expected: Vec<i64> = (2..83).step_by(3).collect();
        assert_eq!(pe.get_psum(Tier::Acc).unwrap(), expected);
        assert_eq!(pe.cost_tracker().add(), 27);
        assert_eq!(pe.cost_tracker().mult(), 54);
    }

    #[test]
    fn conv_counters_match_small_example() {
        let mut pe = pe_with(vec![1, 2], vec![0, 1, 2, 3, 4], (1, 1));
        pe.conv().unwrap();
        let ct = pe.cost_tracker();
        assert_eq!(ct.dram_writes(), 2);
        assert_eq!(ct.dram_reads(), 0);
        assert_eq!(ct.ipe_writes(), 0);
        assert_eq!(ct.ipe_reads(), 0);
        assert_eq!(ct.spad_writes(), 4);
        assert_eq!(ct.spad_reads(), 12);
        assert_eq!(ct.add(), 4);
        assert_eq!(ct.mult(), 8);
    }

    #[test]
    fn conv_fails_when_not_ready() {
        let mut pe = ProcessingElement::new((0, 0), (1, 1));
        assert_eq!(
            pe.conv(),
            Err(PeError::NotReady { kernel_set: false, ifmap_set: false })
        );
    }

    #[test]
    fn pe_top_alone_matches_single_pe_conv() {
        let mut top = pe_with(vec![1, 2], (0..28).collect(), (1, 1));
        top.conv().unwrap();
        assert_eq!(top.get_psum(Tier::Acc).unwrap(), (2..83).step_by(3).collect::<Vec<_>>());
    }

    #[test]
    fn two_pes_connected_by_psum_shift() {
        let mut top = pe_with(vec![1, 2], (0..28).collect(), (1, 1));
        let mut bottom = pe_with(vec![3, 4], (28..56).collect(), (1, 1));

        bottom.conv().unwrap();
        bottom.t_shift_psum_to(&mut top);
        top.conv().unwrap();

        assert_eq!(bottom.get_psum(Tier::Acc).unwrap(), (200..389).step_by(7).collect::<Vec<_>>());
        assert_eq!(top.get_psum(Tier::Acc).unwrap(), (202..472).step_by(10).collect::<Vec<_>>());
    }
}
