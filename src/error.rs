//! Crate-wide error types.
//!
//! One `thiserror::Error` enum per layer, mirroring the rest of this crate's
//! error style: flat variants, no boxing, `Debug` + `Display` for free.
//! Tier-tag misuse is deliberately *not* one of these — it is a programming
//! error and panics (see [`crate::cost`]).

#![forbid(unsafe_code)]

/// Errors from a single [`crate::pe::ProcessingElement`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PeError {
    /// `conv()` was called before both a kernel and an ifmap row were set.
    #[error("PE not ready: kernel_set={kernel_set}, ifmap_set={ifmap_set}")]
    NotReady {
        /// Whether a kernel row has been set at least once.
        kernel_set: bool,
        /// Whether an ifmap row has been set at least once.
        ifmap_set: bool,
    },
}

/// Errors from [`crate::accelerator::Accelerator`] setup and the outer loop.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccelError {
    /// `conv()` was called before both `set_kernel` and `set_ifmap`.
    #[error("accelerator not ready: kernel_set={kernel_set}, ifmap_set={ifmap_set}")]
    NotReady {
        /// Whether `set_kernel` has been called.
        kernel_set: bool,
        /// Whether `set_ifmap` has been called.
        ifmap_set: bool,
    },
    /// `dimensions` or `stride` were non-positive.
    #[error("invalid accelerator shape: dimensions={dimensions:?}, stride={stride:?}")]
    InvalidShape {
        /// Requested `(width, height)`.
        dimensions: (usize, usize),
        /// Requested `(row_stride, col_stride)`.
        stride: (usize, usize),
    },
}
