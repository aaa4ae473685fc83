//! Crate root: public surface for the row-stationary PE-array simulator.
//!
//! This module is the **single canonical entry-point** for downstream users
//! of the library. It re-exports the core types needed to build a grid, feed
//! it a kernel and an ifmap, run a convolution, and harvest per-PE cost
//! counters.
//!
//! ## Invariants
//!
//! - **Single channel, integer arithmetic.** There is no notion of tensor
//!   depth; kernel, ifmap, and ofmap are all flat 2D `i64` matrices. Overflow
//!   is not checked (inputs are expected to stay within native integer
//!   width).
//! - **Determinism.** The simulator is single-threaded; identical inputs
//!   produce byte-for-byte identical ofmaps and counters on every run.
//! - **Tier discipline.** Every PE memory accessor is tagged with a
//!   [`cost::Tier`]. Because `Tier` is a closed enum rather than a string,
//!   "unknown tier" — a fatal programming error in the system this crate
//!   models — is unrepresentable at the type level; there is nothing to
//!   panic on.
//! - **No UB, ever.** `#![forbid(unsafe_code)]` applies crate-wide.

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms)]

/// Public builder/aggregate surface (`AcceleratorBuilder`, `Counters`).
pub mod api;
/// The PE grid and its outer convolution loop.
pub mod accelerator;
/// Per-PE cost bookkeeping: memory-tier tags and the transaction tracker.
pub mod cost;
/// Edge-PE discovery, pipe construction, and lockstep pipe advancement.
pub mod coordinator;
/// Crate-wide error types.
pub mod error;
/// Dense row-major integer matrix used for kernel/ifmap/ofmap storage.
pub mod matrix;
/// A single processing element: kernel row, ifmap row, psum, cost tracker.
pub mod pe;
/// FIFO delivering ifmap rows to one edge PE, one entry per global step.
pub mod pipe;

pub use accelerator::Accelerator;
pub use api::{AcceleratorBuilder, Counters};
pub use cost::{CostTracker, Tier};
pub use error::{AccelError, PeError};
pub use matrix::Matrix;
pub use pe::ProcessingElement;
